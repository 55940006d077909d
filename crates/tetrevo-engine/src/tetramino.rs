use rand::{Rng, distr::StandardUniform, prelude::Distribution};
use serde::{Deserialize, Serialize};

/// One of the 7 tetramino kinds.
///
/// The discriminant doubles as the wire index used by piece sources and game
/// requests, so the order is part of the external contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum TetraminoKind {
    /// Four in a row.
    I = 0,
    /// S-piece.
    S = 1,
    /// Z-piece.
    Z = 2,
    /// 2x2 square.
    O = 3,
    /// L-piece.
    L = 4,
    /// T-piece.
    T = 5,
    /// J-piece.
    J = 6,
}

impl Distribution<TetraminoKind> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> TetraminoKind {
        TetraminoKind::from_index(rng.random_range(0..TetraminoKind::LEN))
            .expect("index drawn from 0..LEN")
    }
}

impl TetraminoKind {
    /// Number of tetramino kinds (7).
    pub const LEN: usize = 7;

    /// Maps a wire index in `[0, 7)` back to a kind.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(TetraminoKind::I),
            1 => Some(TetraminoKind::S),
            2 => Some(TetraminoKind::Z),
            3 => Some(TetraminoKind::O),
            4 => Some(TetraminoKind::L),
            5 => Some(TetraminoKind::T),
            6 => Some(TetraminoKind::J),
            _ => None,
        }
    }

    /// Number of distinct rotations for this kind (1-4).
    #[must_use]
    pub fn rotation_count(self) -> usize {
        SHAPES[self as usize].len()
    }

    /// The four occupied cell offsets of the given rotation, relative to the
    /// top-left corner of its tight bounding box.
    ///
    /// # Panics
    ///
    /// Panics if `rotation >= rotation_count()`.
    #[must_use]
    pub fn cells(self, rotation: usize) -> &'static [(usize, usize); 4] {
        &SHAPES[self as usize][rotation].cells
    }

    /// `(width, height)` of the tight bounding box of the given rotation.
    ///
    /// # Panics
    ///
    /// Panics if `rotation >= rotation_count()`.
    #[must_use]
    pub fn size(self, rotation: usize) -> (usize, usize) {
        let shape = &SHAPES[self as usize][rotation];
        (shape.width, shape.height)
    }
}

#[derive(Debug, Clone, Copy)]
struct RotationShape {
    cells: [(usize, usize); 4],
    width: usize,
    height: usize,
}

/// Extracts the occupied offsets and bounding box from a tight bool grid.
const fn shape<const W: usize, const H: usize>(rows: [[bool; W]; H]) -> RotationShape {
    let mut cells = [(0, 0); 4];
    let mut count = 0;
    let mut y = 0;
    while y < H {
        let mut x = 0;
        while x < W {
            if rows[y][x] {
                assert!(count < 4, "a tetramino has exactly 4 cells");
                cells[count] = (x, y);
                count += 1;
            }
            x += 1;
        }
        y += 1;
    }
    assert!(count == 4, "a tetramino has exactly 4 cells");
    RotationShape {
        cells,
        width: W,
        height: H,
    }
}

const C: bool = true;
const E: bool = false;

// Rotations are listed clockwise starting from the spawn orientation.
// Bounding boxes are tight, so a rotation's width is exactly the horizontal
// space it needs on the board.

const I_SHAPES: [RotationShape; 2] = [
    shape([[C, C, C, C]]),
    shape([[C], [C], [C], [C]]),
];

const S_SHAPES: [RotationShape; 2] = [
    shape([[E, C, C], [C, C, E]]),
    shape([[C, E], [C, C], [E, C]]),
];

const Z_SHAPES: [RotationShape; 2] = [
    shape([[C, C, E], [E, C, C]]),
    shape([[E, C], [C, C], [C, E]]),
];

const O_SHAPES: [RotationShape; 1] = [shape([[C, C], [C, C]])];

const L_SHAPES: [RotationShape; 4] = [
    shape([[E, E, C], [C, C, C]]),
    shape([[C, E], [C, E], [C, C]]),
    shape([[C, C, C], [C, E, E]]),
    shape([[C, C], [E, C], [E, C]]),
];

const T_SHAPES: [RotationShape; 4] = [
    shape([[E, C, E], [C, C, C]]),
    shape([[C, E], [C, C], [C, E]]),
    shape([[C, C, C], [E, C, E]]),
    shape([[E, C], [C, C], [E, C]]),
];

const J_SHAPES: [RotationShape; 4] = [
    shape([[C, E, E], [C, C, C]]),
    shape([[C, C], [C, E], [C, E]]),
    shape([[C, C, C], [E, E, C]]),
    shape([[E, C], [E, C], [C, C]]),
];

const SHAPES: [&[RotationShape]; TetraminoKind::LEN] = [
    &I_SHAPES, &S_SHAPES, &Z_SHAPES, &O_SHAPES, &L_SHAPES, &T_SHAPES, &J_SHAPES,
];

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_KINDS: [TetraminoKind; TetraminoKind::LEN] = [
        TetraminoKind::I,
        TetraminoKind::S,
        TetraminoKind::Z,
        TetraminoKind::O,
        TetraminoKind::L,
        TetraminoKind::T,
        TetraminoKind::J,
    ];

    #[test]
    fn test_index_round_trip() {
        for (index, kind) in ALL_KINDS.into_iter().enumerate() {
            assert_eq!(kind as usize, index);
            assert_eq!(TetraminoKind::from_index(index), Some(kind));
        }
        assert_eq!(TetraminoKind::from_index(7), None);
    }

    #[test]
    fn test_rotation_counts() {
        assert_eq!(TetraminoKind::I.rotation_count(), 2);
        assert_eq!(TetraminoKind::S.rotation_count(), 2);
        assert_eq!(TetraminoKind::Z.rotation_count(), 2);
        assert_eq!(TetraminoKind::O.rotation_count(), 1);
        assert_eq!(TetraminoKind::L.rotation_count(), 4);
        assert_eq!(TetraminoKind::T.rotation_count(), 4);
        assert_eq!(TetraminoKind::J.rotation_count(), 4);
    }

    #[test]
    fn test_cells_fit_bounding_box() {
        for kind in ALL_KINDS {
            for rotation in 0..kind.rotation_count() {
                let (width, height) = kind.size(rotation);
                assert!(width <= 4 && height <= 4);

                let cells = kind.cells(rotation);
                let mut max_x = 0;
                let mut max_y = 0;
                for &(x, y) in cells {
                    max_x = max_x.max(x);
                    max_y = max_y.max(y);
                }
                // The bounding box is tight
                assert_eq!(max_x + 1, width, "{kind:?} rotation {rotation}");
                assert_eq!(max_y + 1, height, "{kind:?} rotation {rotation}");
            }
        }
    }

    #[test]
    fn test_i_piece_orientations() {
        assert_eq!(TetraminoKind::I.size(0), (4, 1));
        assert_eq!(TetraminoKind::I.size(1), (1, 4));
        assert_eq!(
            TetraminoKind::I.cells(1),
            &[(0, 0), (0, 1), (0, 2), (0, 3)]
        );
    }

    #[test]
    fn test_t_piece_spawn_is_point_up() {
        assert_eq!(TetraminoKind::T.size(0), (3, 2));
        assert_eq!(
            TetraminoKind::T.cells(0),
            &[(1, 0), (0, 1), (1, 1), (2, 1)]
        );
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&TetraminoKind::T).unwrap();
        assert_eq!(json, "\"T\"");
        let kind: TetraminoKind = serde_json::from_str(&json).unwrap();
        assert_eq!(kind, TetraminoKind::T);
    }
}
