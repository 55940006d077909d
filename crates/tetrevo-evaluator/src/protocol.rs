//! The game evaluation contract.
//!
//! When playouts are distributed to external workers, a [`GameRequest`]
//! describes one complete game — board size, player genome, piece stream —
//! and a [`GameResponse`] carries the block count back. The types are plain
//! serde data; whatever transport moves them only ever calls [`evaluate`].

use serde::{Deserialize, Serialize};
use tetrevo_engine::{Criterion, RandomPieceSource, SequencePieceSource, TetraminoKind};

use crate::{
    game::Game,
    rating::{BoardRater, RatingKind},
};

/// Smallest supported board dimension (the largest piece bounding box).
pub const MIN_BOARD_DIMENSION: usize = 4;
/// Largest supported board dimension.
pub const MAX_BOARD_DIMENSION: usize = 100;

/// A player genome as it travels in a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSpec {
    pub kind: RatingKind,
    pub weights: Vec<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exponents: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub displacements: Vec<f64>,
}

/// Piece stream specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PieceSourceSpec {
    /// Seeded pseudo-random stream.
    Seeded { seed: u32 },
    /// Explicit finite sequence, consumed cyclically.
    Sequence { pieces: Vec<TetraminoKind> },
}

/// One game to play on behalf of a remote caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRequest {
    pub player_id: u64,
    pub selector_id: u64,
    pub board_width: usize,
    pub board_height: usize,
    pub player: PlayerSpec,
    pub piece_source: PieceSourceSpec,
}

/// The outcome of a requested game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResponse {
    pub player_id: u64,
    pub selector_id: u64,
    pub blocks_placed: u64,
}

/// Why a request was rejected before any game ran.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum RequestError {
    #[display("unsupported board size {width}x{height}")]
    UnsupportedBoardSize { width: usize, height: usize },
    #[display("expected {expected} weights, got {actual}")]
    WeightCountMismatch { expected: usize, actual: usize },
    #[display("{kind} rating requires {expected} exponents, got {actual}")]
    ExponentCountMismatch {
        kind: RatingKind,
        expected: usize,
        actual: usize,
    },
    #[display("{kind} rating requires {expected} displacements, got {actual}")]
    DisplacementCountMismatch {
        kind: RatingKind,
        expected: usize,
        actual: usize,
    },
    #[display("piece sequence must not be empty")]
    EmptyPieceSequence,
}

/// Plays the requested game to its natural end and reports the block count.
///
/// This is the whole worker interface: validation failures abort before a
/// board is ever constructed, and a valid request always runs to GameOver.
pub fn evaluate(request: &GameRequest) -> Result<GameResponse, RequestError> {
    validate(request)?;

    let player = &request.player;
    let rater = BoardRater::new(
        player.kind,
        player.weights.clone(),
        player.exponents.clone(),
        player.displacements.clone(),
    );

    let mut game = Game::new(request.board_width, request.board_height);
    let blocks_placed = match &request.piece_source {
        PieceSourceSpec::Seeded { seed } => {
            game.play(&rater, &mut RandomPieceSource::new(*seed))
        }
        PieceSourceSpec::Sequence { pieces } => {
            game.play(&rater, &mut SequencePieceSource::new(pieces.clone()))
        }
    };

    Ok(GameResponse {
        player_id: request.player_id,
        selector_id: request.selector_id,
        blocks_placed,
    })
}

fn validate(request: &GameRequest) -> Result<(), RequestError> {
    let supported = MIN_BOARD_DIMENSION..=MAX_BOARD_DIMENSION;
    if !supported.contains(&request.board_width) || !supported.contains(&request.board_height) {
        return Err(RequestError::UnsupportedBoardSize {
            width: request.board_width,
            height: request.board_height,
        });
    }

    let player = &request.player;
    if player.weights.len() != Criterion::LEN {
        return Err(RequestError::WeightCountMismatch {
            expected: Criterion::LEN,
            actual: player.weights.len(),
        });
    }
    if player.kind.has_exponents() && player.exponents.len() != Criterion::LEN {
        return Err(RequestError::ExponentCountMismatch {
            kind: player.kind,
            expected: Criterion::LEN,
            actual: player.exponents.len(),
        });
    }
    if player.kind.has_displacements() && player.displacements.len() != Criterion::LEN {
        return Err(RequestError::DisplacementCountMismatch {
            kind: player.kind,
            expected: Criterion::LEN,
            actual: player.displacements.len(),
        });
    }

    if let PieceSourceSpec::Sequence { pieces } = &request.piece_source {
        if pieces.is_empty() {
            return Err(RequestError::EmptyPieceSequence);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doom_request() -> GameRequest {
        let mut weights = vec![0; Criterion::LEN];
        weights[Criterion::PileHeight as usize] = -100;
        GameRequest {
            player_id: 3,
            selector_id: 8,
            board_width: 5,
            board_height: 10,
            player: PlayerSpec {
                kind: RatingKind::Linear,
                weights,
                exponents: vec![],
                displacements: vec![],
            },
            piece_source: PieceSourceSpec::Seeded { seed: 77 },
        }
    }

    #[test]
    fn test_request_round_trips_through_json() {
        let request = doom_request();
        let json = serde_json::to_string(&request).unwrap();
        let parsed: GameRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, request);
        // Unused gene arrays stay off the wire entirely.
        assert!(!json.contains("exponents"));
        assert!(!json.contains("displacements"));
    }

    #[test]
    fn test_evaluate_echoes_ids_and_is_deterministic() {
        let request = doom_request();
        let first = evaluate(&request).unwrap();
        let second = evaluate(&request).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.player_id, 3);
        assert_eq!(first.selector_id, 8);
        assert!(first.blocks_placed > 0);
    }

    #[test]
    fn test_evaluate_with_fixed_sequence() {
        let mut request = doom_request();
        request.board_width = 4;
        request.board_height = 6;
        request.piece_source = PieceSourceSpec::Sequence {
            pieces: vec![TetraminoKind::S, TetraminoKind::Z, TetraminoKind::O],
        };
        let response = evaluate(&request).unwrap();
        assert!(response.blocks_placed > 0);
    }

    #[test]
    fn test_evaluate_rejects_unsupported_board_size() {
        let mut request = doom_request();
        request.board_width = 3;
        assert!(matches!(
            evaluate(&request),
            Err(RequestError::UnsupportedBoardSize { width: 3, .. })
        ));
    }

    #[test]
    fn test_evaluate_rejects_wrong_gene_counts() {
        let mut request = doom_request();
        request.player.weights.pop();
        assert!(matches!(
            evaluate(&request),
            Err(RequestError::WeightCountMismatch { actual: 11, .. })
        ));

        let mut request = doom_request();
        request.player.kind = RatingKind::Exponential;
        assert!(matches!(
            evaluate(&request),
            Err(RequestError::ExponentCountMismatch { actual: 0, .. })
        ));
    }

    #[test]
    fn test_evaluate_rejects_empty_sequence() {
        let mut request = doom_request();
        request.piece_source = PieceSourceSpec::Sequence { pieces: vec![] };
        assert!(matches!(
            evaluate(&request),
            Err(RequestError::EmptyPieceSequence)
        ));
    }
}
