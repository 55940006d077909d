//! The evolvable player genome and its genetic operators.
//!
//! An [`Individual`] is a fixed-length integer weight vector plus, depending
//! on the rating variant, real-valued exponent and displacement vectors of
//! the same length. Fitness is the mean block count of the games it played;
//! it is assigned exactly once and stays immutable until the individual is
//! replaced wholesale with the next generation.
//!
//! Every operator takes a caller-owned random generator, so concurrent
//! evolutions never contend on shared generator state.

use std::ops::RangeInclusive;

use rand::Rng;
use rand_distr::Normal;
use tetrevo_engine::Criterion;
use tetrevo_evaluator::{BoardRater, RatingKind};

/// Initialization range for weight genes.
pub const WEIGHT_RANGE: RangeInclusive<i32> = -1000..=1000;
/// Initialization range for exponent genes.
pub const EXPONENT_RANGE: RangeInclusive<f64> = 0.0..=2.0;
/// Initialization range for displacement genes.
pub const DISPLACEMENT_RANGE: RangeInclusive<f64> = -10.0..=10.0;

/// How a mutated gene gets its new value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationPolicy {
    /// Multiply the parent's gene by a draw from `Normal(1.0, std_dev)`.
    Scale,
    /// Redraw the gene from its initialization range.
    Replace,
}

/// How a child's genes are picked from its two parents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossoverPolicy {
    /// Per-gene uniform choice between the parents.
    Uniform,
    /// Genes before a random split index come from the first parent, the
    /// rest from the second; each gene array draws its own split.
    OnePoint,
}

/// Mutation configuration, applied per gene with probability `rate`.
///
/// The scale policy uses a separate standard deviation per gene array,
/// because weights live on a very different scale than exponents.
#[derive(Debug, Clone, Copy)]
pub struct MutationParams {
    pub policy: MutationPolicy,
    pub rate: f64,
    pub weight_std_dev: f64,
    pub exponent_std_dev: f64,
    pub displacement_std_dev: f64,
}

/// A candidate board-rating genome with an optional evaluated fitness.
#[derive(Debug, Clone)]
pub struct Individual {
    kind: RatingKind,
    weights: Vec<i32>,
    exponents: Vec<f64>,
    displacements: Vec<f64>,
    fitness: Option<f64>,
}

impl Individual {
    /// Creates an individual with uniformly drawn genes.
    ///
    /// Exponent and displacement genes exist exactly when the rating variant
    /// consumes them.
    #[must_use]
    pub fn random<R>(kind: RatingKind, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let weights = (0..Criterion::LEN)
            .map(|_| rng.random_range(WEIGHT_RANGE))
            .collect();
        let exponents = if kind.has_exponents() {
            (0..Criterion::LEN)
                .map(|_| rng.random_range(EXPONENT_RANGE))
                .collect()
        } else {
            vec![]
        };
        let displacements = if kind.has_displacements() {
            (0..Criterion::LEN)
                .map(|_| rng.random_range(DISPLACEMENT_RANGE))
                .collect()
        } else {
            vec![]
        };
        Self::from_genes(kind, weights, exponents, displacements)
    }

    /// Creates an individual from explicit genes, carrying no fitness.
    ///
    /// # Panics
    ///
    /// Panics when a gene array the variant consumes does not have one entry
    /// per criterion.
    #[must_use]
    pub fn from_genes(
        kind: RatingKind,
        weights: Vec<i32>,
        exponents: Vec<f64>,
        displacements: Vec<f64>,
    ) -> Self {
        assert_eq!(weights.len(), Criterion::LEN);
        assert_eq!(
            exponents.len(),
            if kind.has_exponents() { Criterion::LEN } else { 0 }
        );
        assert_eq!(
            displacements.len(),
            if kind.has_displacements() { Criterion::LEN } else { 0 }
        );
        Self {
            kind,
            weights,
            exponents,
            displacements,
            fitness: None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> RatingKind {
        self.kind
    }

    #[must_use]
    pub fn weights(&self) -> &[i32] {
        &self.weights
    }

    #[must_use]
    pub fn exponents(&self) -> &[f64] {
        &self.exponents
    }

    #[must_use]
    pub fn displacements(&self) -> &[f64] {
        &self.displacements
    }

    /// Builds the board rater that plays with this individual's genes.
    #[must_use]
    pub fn rater(&self) -> BoardRater {
        BoardRater::new(
            self.kind,
            self.weights.clone(),
            self.exponents.clone(),
            self.displacements.clone(),
        )
    }

    /// Mutates each gene independently with probability `params.rate`.
    pub fn mutate<R>(&mut self, params: &MutationParams, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        match params.policy {
            MutationPolicy::Scale => {
                let weight_noise = Normal::new(1.0, params.weight_std_dev)
                    .expect("weight std dev must be finite and non-negative");
                for weight in &mut self.weights {
                    if rng.random_bool(params.rate) {
                        *weight = scale_weight(*weight, rng.sample(weight_noise));
                    }
                }

                let exponent_noise = Normal::new(1.0, params.exponent_std_dev)
                    .expect("exponent std dev must be finite and non-negative");
                for exponent in &mut self.exponents {
                    if rng.random_bool(params.rate) {
                        *exponent *= rng.sample(exponent_noise);
                    }
                }

                let displacement_noise = Normal::new(1.0, params.displacement_std_dev)
                    .expect("displacement std dev must be finite and non-negative");
                for displacement in &mut self.displacements {
                    if rng.random_bool(params.rate) {
                        *displacement *= rng.sample(displacement_noise);
                    }
                }
            }
            MutationPolicy::Replace => {
                for weight in &mut self.weights {
                    if rng.random_bool(params.rate) {
                        *weight = rng.random_range(WEIGHT_RANGE);
                    }
                }
                for exponent in &mut self.exponents {
                    if rng.random_bool(params.rate) {
                        *exponent = rng.random_range(EXPONENT_RANGE);
                    }
                }
                for displacement in &mut self.displacements {
                    if rng.random_bool(params.rate) {
                        *displacement = rng.random_range(DISPLACEMENT_RANGE);
                    }
                }
            }
        }
    }

    /// Produces a child by recombining two parents; the child carries no
    /// fitness.
    ///
    /// # Panics
    ///
    /// Panics if the parents were built for different rating variants.
    #[must_use]
    pub fn crossover<R>(
        one: &Individual,
        two: &Individual,
        policy: CrossoverPolicy,
        rng: &mut R,
    ) -> Individual
    where
        R: Rng + ?Sized,
    {
        assert_eq!(one.kind, two.kind, "parents must share a rating variant");
        Self::from_genes(
            one.kind,
            cross_genes(&one.weights, &two.weights, policy, rng),
            cross_genes(&one.exponents, &two.exponents, policy, rng),
            cross_genes(&one.displacements, &two.displacements, policy, rng),
        )
    }

    /// Sets fitness to the mean of the recorded block counts.
    ///
    /// # Panics
    ///
    /// Panics if no outcome is given or fitness was already assigned;
    /// re-evaluating an individual within a generation is a driver bug.
    #[expect(clippy::cast_precision_loss)]
    pub fn set_fitness(&mut self, outcomes: &[u64]) {
        assert!(!outcomes.is_empty(), "fitness needs at least one outcome");
        assert!(
            self.fitness.is_none(),
            "fitness is assigned exactly once per evaluation cycle"
        );
        let total: u64 = outcomes.iter().sum();
        self.fitness = Some(total as f64 / outcomes.len() as f64);
    }

    #[must_use]
    pub fn has_fitness(&self) -> bool {
        self.fitness.is_some()
    }

    /// # Panics
    ///
    /// Panics when fitness has not been assigned yet; evaluate first.
    #[must_use]
    pub fn fitness(&self) -> f64 {
        self.fitness.expect("fitness queried before evaluation")
    }
}

/// Two individuals compare equal only when both carry a fitness and agree on
/// it and on every gene; fresh individuals are incomparable until evaluated.
impl PartialEq for Individual {
    fn eq(&self, other: &Self) -> bool {
        let (Some(own), Some(theirs)) = (self.fitness, other.fitness) else {
            return false;
        };
        own == theirs
            && self.kind == other.kind
            && self.weights == other.weights
            && self.exponents == other.exponents
            && self.displacements == other.displacements
    }
}

#[expect(clippy::cast_possible_truncation)]
fn scale_weight(weight: i32, factor: f64) -> i32 {
    (f64::from(weight) * factor).round() as i32
}

fn cross_genes<T, R>(one: &[T], two: &[T], policy: CrossoverPolicy, rng: &mut R) -> Vec<T>
where
    T: Copy,
    R: Rng + ?Sized,
{
    assert_eq!(one.len(), two.len());
    match policy {
        CrossoverPolicy::Uniform => one
            .iter()
            .zip(two)
            .map(|(&a, &b)| if rng.random_bool(0.5) { a } else { b })
            .collect(),
        CrossoverPolicy::OnePoint => {
            let split = rng.random_range(0..=one.len());
            let mut genes = Vec::with_capacity(one.len());
            genes.extend_from_slice(&one[..split]);
            genes.extend_from_slice(&two[split..]);
            genes
        }
    }
}
