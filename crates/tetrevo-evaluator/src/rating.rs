//! Board rating: mapping a statistics vector and a genome to a scalar score.
//!
//! Lower scores are better. The three algorithm variants share one genome
//! shape and one scoring routine that branches on the variant tag; which gene
//! arrays a variant actually consumes is reported by
//! [`RatingKind::has_exponents`] and [`RatingKind::has_displacements`].

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tetrevo_engine::{Board, BoardStats, Criterion, TetraminoKind};

/// Selector for the board rating algorithm.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum RatingKind {
    /// `Σ weight[i] · stat[i]`
    #[display("linear")]
    Linear,
    /// `Σ weight[i] · stat[i]^exponent[i]`
    #[display("exponential")]
    Exponential,
    /// `Σ weight[i] · (stat[i] - displacement[i])^exponent[i]`
    #[display("exponential-with-displacement")]
    ExponentialWithDisplacement,
}

impl RatingKind {
    /// Whether genomes of this variant carry exponent genes.
    #[must_use]
    pub fn has_exponents(self) -> bool {
        matches!(
            self,
            RatingKind::Exponential | RatingKind::ExponentialWithDisplacement
        )
    }

    /// Whether genomes of this variant carry displacement genes.
    #[must_use]
    pub fn has_displacements(self) -> bool {
        matches!(self, RatingKind::ExponentialWithDisplacement)
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("unknown rating algorithm: {name}")]
pub struct UnknownAlgorithmError {
    name: String,
}

impl FromStr for RatingKind {
    type Err = UnknownAlgorithmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "l" | "linear" => Ok(RatingKind::Linear),
            "e" | "exponential" => Ok(RatingKind::Exponential),
            "ed" | "exponential-with-displacement" => Ok(RatingKind::ExponentialWithDisplacement),
            _ => Err(UnknownAlgorithmError {
                name: s.to_owned(),
            }),
        }
    }
}

/// Rates candidate placements against a fixed genome.
///
/// A rater is built once per playout from an individual's genes and then
/// applied to every candidate board of the search.
#[derive(Debug, Clone)]
pub struct BoardRater {
    kind: RatingKind,
    weights: Vec<i32>,
    exponents: Vec<f64>,
    displacements: Vec<f64>,
}

impl BoardRater {
    /// # Panics
    ///
    /// Panics when a gene array the variant consumes does not have one entry
    /// per criterion; validated request data never reaches this point
    /// malformed.
    #[must_use]
    pub fn new(
        kind: RatingKind,
        weights: Vec<i32>,
        exponents: Vec<f64>,
        displacements: Vec<f64>,
    ) -> Self {
        assert_eq!(weights.len(), Criterion::LEN, "one weight per criterion");
        if kind.has_exponents() {
            assert_eq!(
                exponents.len(),
                Criterion::LEN,
                "one exponent per criterion"
            );
        }
        if kind.has_displacements() {
            assert_eq!(
                displacements.len(),
                Criterion::LEN,
                "one displacement per criterion"
            );
        }
        Self {
            kind,
            weights,
            exponents,
            displacements,
        }
    }

    #[must_use]
    pub fn kind(&self) -> RatingKind {
        self.kind
    }

    /// Scores a statistics vector; lower is better.
    #[must_use]
    pub fn score(&self, stats: &BoardStats) -> f64 {
        let stats = stats.as_array();
        match self.kind {
            RatingKind::Linear => self
                .weights
                .iter()
                .zip(stats)
                .map(|(&weight, stat)| f64::from(weight) * f64::from(stat))
                .sum(),
            RatingKind::Exponential => self
                .weights
                .iter()
                .zip(stats)
                .zip(&self.exponents)
                .map(|((&weight, stat), &exponent)| {
                    f64::from(weight) * signed_pow(f64::from(stat), exponent)
                })
                .sum(),
            RatingKind::ExponentialWithDisplacement => self
                .weights
                .iter()
                .zip(stats)
                .zip(&self.exponents)
                .zip(&self.displacements)
                .map(|(((&weight, stat), &exponent), &displacement)| {
                    f64::from(weight) * signed_pow(f64::from(stat) - displacement, exponent)
                })
                .sum(),
        }
    }

    /// Drops a piece at `(rotation, x)`, commits it, clears rows, and scores
    /// the resulting board.
    ///
    /// Returns `None` when the piece cannot land there; the search prunes
    /// that branch. The board is left holding the placement outcome, so
    /// callers hand in a scratch copy.
    #[must_use]
    pub fn rate_placement(
        &self,
        board: &mut Board,
        piece: TetraminoKind,
        rotation: usize,
        x: usize,
    ) -> Option<f64> {
        let landing_row = board.drop_row(piece, rotation, x)?;
        board.add(piece, rotation, x, landing_row);
        let removed_lines = board.clear_rows();

        let mut stats = board.analyse();
        stats.removed_lines = i32::try_from(removed_lines).expect("row count fits in i32");
        stats.landing_height = i32::try_from(landing_row).expect("row index fits in i32");
        Some(self.score(&stats))
    }
}

/// Sign-preserving power: `signum(base) · |base|^exponent`.
///
/// Statistics such as the unclipped max well depth can go negative while
/// evolved exponents are rarely integral; `powf` on a negative base would
/// yield NaN and make a legal placement indistinguishable from an impossible
/// one. Keeping the sign keeps the result finite and order-preserving.
fn signed_pow(base: f64, exponent: f64) -> f64 {
    if base < 0.0 {
        -(-base).powf(exponent)
    } else {
        base.powf(exponent)
    }
}
