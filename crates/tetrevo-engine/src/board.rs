use std::fmt;

use crate::tetramino::TetraminoKind;

/// Board evaluation criteria, in genome order.
///
/// The discriminant is the index of the criterion's weight (and exponent /
/// displacement, for the variants that carry them) inside a genome, so this
/// order is shared between [`BoardStats`] and every rating function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum Criterion {
    PileHeight = 0,
    Holes,
    ConnectedHoles,
    RemovedLines,
    AltitudeDifference,
    MaxWellDepth,
    SumWellDepth,
    LandingHeight,
    Blocks,
    WeightedBlocks,
    RowTransitions,
    ColumnTransitions,
}

impl Criterion {
    /// Number of criteria (genome length).
    pub const LEN: usize = 12;
}

/// Structural statistics of a board, produced by [`Board::analyse`].
///
/// `removed_lines` and `landing_height` describe the placement that led to
/// this board rather than the board itself; `analyse` leaves them at zero and
/// the rating function fills them in.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BoardStats {
    pub pile_height: i32,
    pub holes: i32,
    pub connected_holes: i32,
    pub removed_lines: i32,
    pub altitude_difference: i32,
    pub max_well_depth: i32,
    pub sum_well_depth: i32,
    pub landing_height: i32,
    pub total_blocks: i32,
    pub weighted_blocks: i32,
    pub row_transitions: i32,
    pub column_transitions: i32,
}

impl BoardStats {
    /// The statistics as an array indexed by [`Criterion`].
    #[must_use]
    pub fn as_array(&self) -> [i32; Criterion::LEN] {
        [
            self.pile_height,
            self.holes,
            self.connected_holes,
            self.removed_lines,
            self.altitude_difference,
            self.max_well_depth,
            self.sum_well_depth,
            self.landing_height,
            self.total_blocks,
            self.weighted_blocks,
            self.row_transitions,
            self.column_transitions,
        ]
    }
}

/// A fixed-size Tetris board with an incrementally maintained column cache.
///
/// Row 0 is the top of the board. Alongside the cell grid the board keeps,
/// per column, the row index of the topmost occupied cell (`height` when the
/// column is empty). Every mutating operation keeps the cache consistent, so
/// reads never trigger a rescan of filled regions.
///
/// A board is a value: `Clone` duplicates the grid, never aliases it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    width: usize,
    height: usize,
    cells: Vec<bool>,
    top_row: Vec<usize>,
}

impl Board {
    /// Creates an empty board. Dimensions are fixed for the board's lifetime.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is smaller than 4 (the largest tetramino
    /// bounding box). Configuration layers reject such sizes before a board
    /// is ever constructed.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        assert!(width >= 4, "board width must be at least 4, got {width}");
        assert!(height >= 4, "board height must be at least 4, got {height}");
        Self {
            width,
            height,
            cells: vec![false; width * height],
            top_row: vec![height; width],
        }
    }

    /// Creates a board from ASCII art for tests: `#` occupied, `.` empty.
    ///
    /// Dimensions are inferred from the art; all rows must have the same
    /// number of cells.
    ///
    /// # Panics
    ///
    /// Panics on ragged rows or dimensions smaller than 4.
    #[must_use]
    pub fn from_ascii(art: &str) -> Self {
        let rows: Vec<Vec<char>> = art
            .lines()
            .map(|line| {
                line.chars()
                    .filter(|c| *c == '#' || *c == '.')
                    .collect::<Vec<_>>()
            })
            .filter(|cells| !cells.is_empty())
            .collect();
        assert!(!rows.is_empty(), "board art must contain at least one row");
        let width = rows[0].len();

        let mut board = Self::new(width, rows.len());
        for (y, row) in rows.iter().enumerate() {
            assert_eq!(
                row.len(),
                width,
                "each row must have exactly {width} cells, got {} at row {y}",
                row.len()
            );
            for (x, &ch) in row.iter().enumerate() {
                if ch == '#' {
                    board.set_cell(x, y, true);
                    board.top_row[x] = board.top_row[x].min(y);
                }
            }
        }
        board
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Whether the cell at `(x, y)` is occupied.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of bounds.
    #[must_use]
    pub fn cell(&self, x: usize, y: usize) -> bool {
        assert!(x < self.width && y < self.height);
        self.cells[y * self.width + x]
    }

    fn set_cell(&mut self, x: usize, y: usize, value: bool) {
        assert!(x < self.width && y < self.height);
        self.cells[y * self.width + x] = value;
    }

    /// Resets every cell to empty and the cache to its empty sentinel.
    pub fn clear(&mut self) {
        self.cells.fill(false);
        self.top_row.fill(self.height);
    }

    /// Deep-copies grid and cache from another board.
    ///
    /// # Panics
    ///
    /// Panics if the boards have different dimensions; that is a caller bug,
    /// not a recoverable condition.
    pub fn copy_from(&mut self, other: &Board) {
        assert!(
            self.width == other.width && self.height == other.height,
            "copy_from requires identical dimensions ({}x{} vs {}x{})",
            self.width,
            self.height,
            other.width,
            other.height
        );
        self.cells.copy_from_slice(&other.cells);
        self.top_row.copy_from_slice(&other.top_row);
    }

    /// Places a tetramino with the bottom edge of its bounding box on row `y`.
    ///
    /// The search guarantees placements are legal before committing them, so
    /// an occupied or out-of-bounds target cell is a caller bug.
    ///
    /// # Panics
    ///
    /// Panics if any target cell is out of bounds or already occupied.
    pub fn add(&mut self, kind: TetraminoKind, rotation: usize, x: usize, y: usize) {
        let (width, height) = kind.size(rotation);
        assert!(x + width <= self.width, "piece sticks out horizontally");
        assert!(y < self.height, "piece bottom row out of bounds");
        assert!(y + 1 >= height, "piece sticks out over the top");

        let y_top = y + 1 - height;
        for &(dx, dy) in kind.cells(rotation) {
            let px = x + dx;
            let py = y_top + dy;
            assert!(!self.cell(px, py), "cell ({px}, {py}) already occupied");
            self.set_cell(px, py, true);
            self.top_row[px] = self.top_row[px].min(py);
        }
    }

    /// Removes every fully occupied row, shifting the rows above it down, and
    /// returns the number of rows removed.
    pub fn clear_rows(&mut self) -> usize {
        let width = self.width;
        let mut cleared = 0;

        for y in 0..self.height {
            let row = &self.cells[y * width..(y + 1) * width];
            if row.iter().all(|&cell| cell) {
                self.cells.copy_within(0..y * width, width);
                self.cells[..width].fill(false);
                cleared += 1;
            }
        }

        if cleared > 0 {
            // A surviving column top can only move down, and never above
            // old_top + cleared, so the rescan starts there.
            for x in 0..width {
                let start = (self.top_row[x] + cleared).min(self.height);
                self.top_row[x] = (start..self.height)
                    .find(|&y| self.cell(x, y))
                    .unwrap_or(self.height);
            }
        }

        cleared
    }

    /// Computes the resting row for a piece dropped from above at column `x`.
    ///
    /// Returns the row index of the bottom edge of the piece's bounding box,
    /// or `None` when the piece cannot be dropped there at all: `x` leaves no
    /// horizontal room, or the pile is so high that every candidate position
    /// overlaps. `None` is the expected outcome the search prunes on, not an
    /// error.
    ///
    /// The scan is seeded from the column cache restricted to the piece's
    /// footprint, so only the contested rows near the surface are examined.
    #[must_use]
    pub fn drop_row(&self, kind: TetraminoKind, rotation: usize, x: usize) -> Option<usize> {
        let (width, height) = kind.size(rotation);
        if x + width > self.width {
            return None;
        }

        let min_top = self.top_row[x..x + width]
            .iter()
            .copied()
            .min()
            .expect("piece footprint is at least one column");
        if min_top < height {
            // Not enough room between the pile and the top of the board.
            return None;
        }

        // The piece is entirely above the footprint's pile here, so the
        // start position never collides; descend until the next row does.
        let mut y_top = min_top - height;
        while y_top < self.height - height {
            let next = y_top + 1;
            let collides = kind
                .cells(rotation)
                .iter()
                .any(|&(dx, dy)| self.cell(x + dx, next + dy));
            if collides {
                break;
            }
            y_top = next;
        }

        Some(y_top + height - 1)
    }

    /// Analyses the board in a single pass over the columns, using the cache
    /// to skip the empty region above each pile.
    ///
    /// Transition counts treat the border beyond the last scanned cell as
    /// empty, so a filled trailing cell contributes one trailing transition.
    #[must_use]
    pub fn analyse(&self) -> BoardStats {
        let width = self.width;
        let height = self.height;
        let top = |x: usize| to_stat(self.top_row[x]);

        let mut holes = 0;
        let mut connected_holes = 0;
        let mut max_well_depth = 0;
        let mut sum_well_depth = 0;
        let mut total_blocks = 0;
        let mut weighted_blocks = 0;
        let mut column_transitions = 0;

        let mut min_top = self.height;
        let mut max_top = 0;
        for &t in &self.top_row {
            if t != height {
                total_blocks += 1;
            }
            weighted_blocks += to_stat(height - t);
            min_top = min_top.min(t);
            max_top = max_top.max(t);
        }

        for x in 0..width {
            // A well is how far this column's surface sits below the lower of
            // its flanking columns; edge columns have a single neighbor.
            let well_depth = if x == 0 {
                top(0) - top(1)
            } else if x == width - 1 {
                top(x) - top(x - 1)
            } else {
                top(x) - top(x - 1).max(top(x + 1))
            };
            sum_well_depth += well_depth.max(0);
            max_well_depth = max_well_depth.max(well_depth);

            let top_row = self.top_row[x];
            if top_row == height {
                continue;
            }
            if top_row > 0 {
                // Air above the pile flips to the topmost cell.
                column_transitions += 1;
            }

            // Walk down from the cell below the pile surface, tracking the
            // cell above to spot holes and the starts of vertical gaps.
            let mut cell_above = true;
            for y in top_row + 1..height {
                let cell = self.cell(x, y);
                if cell != cell_above {
                    column_transitions += 1;
                }
                if cell {
                    total_blocks += 1;
                    weighted_blocks += to_stat(height - y);
                } else {
                    holes += 1;
                    if cell_above {
                        connected_holes += 1;
                    }
                }
                cell_above = cell;
            }
            if cell_above {
                column_transitions += 1;
            }
        }

        let mut row_transitions = 0;
        for y in 0..height {
            let mut prev = self.cell(0, y);
            for x in 1..width {
                let cell = self.cell(x, y);
                if cell != prev {
                    row_transitions += 1;
                }
                prev = cell;
            }
            if prev {
                row_transitions += 1;
            }
        }

        BoardStats {
            pile_height: to_stat(height - min_top),
            holes,
            connected_holes,
            removed_lines: 0,
            altitude_difference: to_stat(max_top) - to_stat(min_top),
            max_well_depth,
            sum_well_depth,
            landing_height: 0,
            total_blocks,
            weighted_blocks,
            row_transitions,
            column_transitions,
        }
    }
}

fn to_stat(value: usize) -> i32 {
    i32::try_from(value).expect("board dimensions fit in i32")
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height {
            for x in 0..self.width {
                f.write_str(if self.cell(x, y) { "#" } else { "." })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
