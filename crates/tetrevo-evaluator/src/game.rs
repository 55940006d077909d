//! Two-piece-lookahead placement search.
//!
//! A [`Game`] plays greedy Tetris: on every step it exhaustively rates every
//! `(rotation, x)` placement of the current piece and, for each, every
//! placement of the next piece against the resulting board, then commits only
//! the current piece's half of the best-scoring combination. The lookahead
//! piece becomes the next current piece, so the piece stream is consumed
//! exactly once.
//!
//! The number of blocks placed before no placement remains is the fitness
//! signal the genetic algorithm consumes.

use tetrevo_engine::{Board, PieceSource, TetraminoKind};

use crate::rating::BoardRater;

/// Whether a game is still accepting pieces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Playing,
    /// Terminal: some piece could not be placed anywhere.
    GameOver,
}

/// A single game session: a board plus the search scratch space.
///
/// The two scratch boards are reused for every candidate of every step, so a
/// whole playout allocates exactly three boards regardless of length. A game
/// is owned by one thread and carries no shared state.
#[derive(Debug)]
pub struct Game {
    board: Board,
    first_scratch: Board,
    second_scratch: Board,
    state: GameState,
    blocks_placed: u64,
}

impl Game {
    /// Creates a game on an empty board of the given dimensions.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is smaller than 4.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            board: Board::new(width, height),
            first_scratch: Board::new(width, height),
            second_scratch: Board::new(width, height),
            state: GameState::Playing,
            blocks_placed: 0,
        }
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn state(&self) -> GameState {
        self.state
    }

    /// Blocks placed so far (the fitness signal).
    #[must_use]
    pub fn blocks_placed(&self) -> u64 {
        self.blocks_placed
    }

    /// Plays a full game from an empty board until no placement exists, and
    /// returns the number of blocks placed.
    ///
    /// The source is rewound first, so replaying with the same source and
    /// rater reproduces the game move for move.
    pub fn play<S>(&mut self, rater: &BoardRater, source: &mut S) -> u64
    where
        S: PieceSource + ?Sized,
    {
        source.reset();
        self.board.clear();
        self.state = GameState::Playing;
        self.blocks_placed = 0;

        let mut current = source.next_piece();
        loop {
            let next = source.next_piece();
            if !self.step(rater, current, next) {
                self.state = GameState::GameOver;
                return self.blocks_placed;
            }
            self.blocks_placed += 1;
            current = next;
        }
    }

    /// Runs one search-and-commit step; `false` means game over.
    ///
    /// Candidates are visited in ascending `(rotation1, x1, rotation2, x2)`
    /// order and the minimum is tracked with a strict comparison, so ties
    /// deterministically keep the first minimum encountered.
    fn step(&mut self, rater: &BoardRater, current: TetraminoKind, next: TetraminoKind) -> bool {
        let width = self.board.width();
        let mut best: Option<(f64, usize, usize)> = None;

        for rotation1 in 0..current.rotation_count() {
            let current_width = current.size(rotation1).0;
            for x1 in 0..=width - current_width {
                self.first_scratch.copy_from(&self.board);
                let Some(first_score) =
                    rater.rate_placement(&mut self.first_scratch, current, rotation1, x1)
                else {
                    continue;
                };

                for rotation2 in 0..next.rotation_count() {
                    let next_width = next.size(rotation2).0;
                    for x2 in 0..=width - next_width {
                        self.second_scratch.copy_from(&self.first_scratch);
                        let Some(second_score) =
                            rater.rate_placement(&mut self.second_scratch, next, rotation2, x2)
                        else {
                            continue;
                        };

                        let total = first_score + second_score;
                        if best.is_none_or(|(score, _, _)| total < score) {
                            best = Some((total, rotation1, x1));
                        }
                    }
                }
            }
        }

        let Some((_, rotation, x)) = best else {
            return false;
        };

        // Only the first piece's placement is committed; the lookahead piece
        // carries over as the next step's current piece.
        let y = self
            .board
            .drop_row(current, rotation, x)
            .expect("winning placement was validated during the search");
        self.board.add(current, rotation, x, y);
        self.board.clear_rows();
        true
    }
}

#[cfg(test)]
mod tests {
    use tetrevo_engine::{Criterion, RandomPieceSource, SequencePieceSource};

    use crate::rating::RatingKind;

    use super::*;

    fn survival_rater() -> BoardRater {
        // Low piles, few holes, cleared lines rewarded: a sane hand-written
        // player good enough to exercise multi-step games.
        let mut weights = vec![0; Criterion::LEN];
        weights[Criterion::PileHeight as usize] = 10;
        weights[Criterion::Holes as usize] = 30;
        weights[Criterion::ConnectedHoles as usize] = 10;
        weights[Criterion::RemovedLines as usize] = -20;
        weights[Criterion::AltitudeDifference as usize] = 5;
        BoardRater::new(RatingKind::Linear, weights, vec![], vec![])
    }

    fn doom_rater() -> BoardRater {
        // Tall piles preferred: games end within a handful of pieces.
        let mut weights = vec![0; Criterion::LEN];
        weights[Criterion::PileHeight as usize] = -100;
        BoardRater::new(RatingKind::Linear, weights, vec![], vec![])
    }

    #[test]
    fn test_game_reaches_game_over() {
        let rater = doom_rater();
        let mut game = Game::new(4, 4);
        let blocks = game.play(&rater, &mut RandomPieceSource::new(99));
        assert_eq!(game.state(), GameState::GameOver);
        assert!(blocks > 0);
        assert_eq!(blocks, game.blocks_placed());
    }

    #[test]
    fn test_game_is_deterministic_for_a_seed() {
        let rater = doom_rater();
        let mut game = Game::new(5, 10);
        let first = game.play(&rater, &mut RandomPieceSource::new(1234));
        let second = game.play(&rater, &mut RandomPieceSource::new(1234));
        assert_eq!(first, second);
    }

    #[test]
    fn test_survival_genome_outlasts_doom_genome() {
        let mut game = Game::new(4, 6);
        let survival = game.play(&survival_rater(), &mut RandomPieceSource::new(5));
        let doom = game.play(&doom_rater(), &mut RandomPieceSource::new(5));
        assert!(survival > doom);
    }

    #[test]
    fn test_game_with_sequence_source() {
        let rater = doom_rater();
        let mut source = SequencePieceSource::new(vec![
            TetraminoKind::S,
            TetraminoKind::Z,
            TetraminoKind::O,
            TetraminoKind::I,
        ]);
        let mut game = Game::new(4, 6);
        let first = game.play(&rater, &mut source);
        assert!(first > 0);
        assert_eq!(game.state(), GameState::GameOver);

        // The source is rewound by play, so the game replays identically.
        let second = game.play(&rater, &mut source);
        assert_eq!(first, second);
    }

    #[test]
    fn test_doom_player_with_skew_pieces_tops_out() {
        // S pieces cannot stack flat, so a pile-maximizing player fed only
        // S pieces runs out of room within a handful of placements, and the
        // scripted game replays identically.
        let rater = doom_rater();
        let mut game = Game::new(4, 4);
        let mut source = SequencePieceSource::new(vec![TetraminoKind::S]);
        let blocks = game.play(&rater, &mut source);
        assert_eq!(game.state(), GameState::GameOver);
        assert!(blocks >= 1);

        let replay = game.play(&rater, &mut source);
        assert_eq!(blocks, replay);
    }
}
