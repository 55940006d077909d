use rand::{Rng, SeedableRng as _};
use rand_pcg::Pcg32;

use crate::tetramino::TetraminoKind;

/// A stream of tetramino kinds feeding a game.
///
/// Sources are owned by a single playout; independently seeded sources keep
/// parallel playouts from interfering with each other.
pub trait PieceSource {
    /// Returns the next piece in the stream.
    fn next_piece(&mut self) -> TetraminoKind;

    /// Rewinds the stream to its initial position.
    fn reset(&mut self);
}

/// Uniform pseudo-random piece stream with a reproducible 32-bit seed.
///
/// The same seed always produces the same sequence, which is what makes
/// evolution runs repeatable and lets distributed workers replay a game from
/// a request alone.
#[derive(Debug, Clone)]
pub struct RandomPieceSource {
    seed: u32,
    rng: Pcg32,
}

impl RandomPieceSource {
    #[must_use]
    pub fn new(seed: u32) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(u64::from(seed)),
        }
    }

    #[must_use]
    pub fn seed(&self) -> u32 {
        self.seed
    }
}

impl PieceSource for RandomPieceSource {
    fn next_piece(&mut self) -> TetraminoKind {
        self.rng.random()
    }

    fn reset(&mut self) {
        self.rng = Pcg32::seed_from_u64(u64::from(self.seed));
    }
}

/// Finite explicit piece sequence, consumed cyclically.
///
/// Besides serving fixed test streams, a sequence is itself an evolvable
/// genome: hostile piece orders can be bred against a player population to
/// probe its robustness. The genetic operators take a caller-owned generator
/// so concurrent evolutions never share mutable random state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencePieceSource {
    sequence: Vec<TetraminoKind>,
    next_index: usize,
}

impl SequencePieceSource {
    /// # Panics
    ///
    /// Panics if the sequence is empty.
    #[must_use]
    pub fn new(sequence: Vec<TetraminoKind>) -> Self {
        assert!(!sequence.is_empty(), "piece sequence must not be empty");
        Self {
            sequence,
            next_index: 0,
        }
    }

    /// Creates a sequence of `len` uniformly drawn pieces.
    #[must_use]
    pub fn random<R>(len: usize, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        Self::new((0..len).map(|_| rng.random()).collect())
    }

    #[must_use]
    pub fn sequence(&self) -> &[TetraminoKind] {
        &self.sequence
    }

    /// Replaces each gene with probability `rate` by a fresh uniform draw.
    pub fn mutate<R>(&mut self, rate: f64, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        for gene in &mut self.sequence {
            if rng.random_bool(rate) {
                *gene = rng.random();
            }
        }
    }

    /// Uniform crossover of two parent sequences of equal length.
    ///
    /// # Panics
    ///
    /// Panics if the parents have different lengths.
    #[must_use]
    pub fn crossover<R>(one: &Self, two: &Self, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        assert_eq!(one.sequence.len(), two.sequence.len());
        let sequence = one
            .sequence
            .iter()
            .zip(&two.sequence)
            .map(|(&a, &b)| if rng.random_bool(0.5) { a } else { b })
            .collect();
        Self::new(sequence)
    }
}

impl PieceSource for SequencePieceSource {
    fn next_piece(&mut self) -> TetraminoKind {
        let piece = self.sequence[self.next_index];
        self.next_index = (self.next_index + 1) % self.sequence.len();
        piece
    }

    fn reset(&mut self) {
        self.next_index = 0;
    }
}
