//! The generational evolution loop.
//!
//! Each generation: evaluate every unevaluated individual by playing games
//! in parallel, surface an observability snapshot through a callback, then
//! breed a same-size child population by fitness-proportionate selection,
//! crossover, and mutation, and replace the old population wholesale.

use std::time::{Duration, Instant};

use rand::Rng;
use tetrevo_engine::RandomPieceSource;
use tetrevo_evaluator::RatingKind;

use crate::{
    individual::{CrossoverPolicy, Individual, MutationParams},
    population::Population,
};

/// Everything the driver needs to know, validated up front.
#[derive(Debug, Clone)]
pub struct EvolutionConfig {
    pub rating_kind: RatingKind,
    pub board_width: usize,
    pub board_height: usize,
    pub population_size: usize,
    pub generations: usize,
    /// Games played per individual; fitness is their mean block count.
    pub games_per_individual: usize,
    pub mutation: MutationParams,
    pub crossover: CrossoverPolicy,
}

/// Read-only snapshot of one evaluated generation.
///
/// Purely an observability artifact: nothing in the evolution loop feeds it
/// back into selection or mutation.
#[derive(Debug, Clone)]
pub struct GenerationSummary {
    pub generation: usize,
    pub best_fitness: f64,
    pub mean_fitness: f64,
    pub worst_fitness: f64,
    pub weight_diversity: f64,
    pub exponent_diversity: Option<f64>,
    pub displacement_diversity: Option<f64>,
    pub best_weights: Vec<i32>,
    pub best_exponents: Vec<f64>,
    pub best_displacements: Vec<f64>,
    pub elapsed: Duration,
}

/// Orchestrates generations over a population.
#[derive(Debug)]
pub struct EvolutionDriver {
    config: EvolutionConfig,
    population: Population,
}

impl EvolutionDriver {
    /// Creates a driver over a freshly randomized population.
    ///
    /// # Panics
    ///
    /// Panics on a degenerate configuration (fewer than two individuals, no
    /// generations, or no games per individual).
    #[must_use]
    pub fn new<R>(config: EvolutionConfig, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let population = Population::random(config.rating_kind, config.population_size, rng);
        Self::with_population(config, population)
    }

    /// Creates a driver over an explicit starting population.
    ///
    /// # Panics
    ///
    /// Panics on a degenerate configuration or when the population size does
    /// not match the configuration.
    #[must_use]
    pub fn with_population(config: EvolutionConfig, population: Population) -> Self {
        assert!(config.population_size >= 2, "breeding needs two parents");
        assert!(config.generations >= 1);
        assert!(config.games_per_individual >= 1);
        assert_eq!(population.len(), config.population_size);
        Self { config, population }
    }

    #[must_use]
    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    #[must_use]
    pub fn population(&self) -> &Population {
        &self.population
    }

    /// Runs the configured number of generations, invoking `on_generation`
    /// with a summary after each evaluation barrier.
    ///
    /// Every individual of a generation faces the same freshly seeded piece
    /// sequences, so fitness differences reflect genome differences. The
    /// final generation is evaluated but not bred, leaving the population
    /// queryable afterwards.
    pub fn run<R, F>(&mut self, rng: &mut R, mut on_generation: F)
    where
        R: Rng + ?Sized,
        F: FnMut(&GenerationSummary),
    {
        for generation in 0..self.config.generations {
            let start = Instant::now();

            let sources: Vec<RandomPieceSource> = (0..self.config.games_per_individual)
                .map(|_| RandomPieceSource::new(rng.random()))
                .collect();
            self.population.evaluate_fitness(
                self.config.board_width,
                self.config.board_height,
                &sources,
            );

            on_generation(&self.summarize(generation, start.elapsed()));

            if generation + 1 < self.config.generations {
                self.population = self.breed(rng);
            }
        }
    }

    fn summarize(&self, generation: usize, elapsed: Duration) -> GenerationSummary {
        let best = self.population.fittest();
        GenerationSummary {
            generation,
            best_fitness: best.fitness(),
            mean_fitness: self.population.mean_fitness(),
            worst_fitness: self.population.least_fit().fitness(),
            weight_diversity: self.population.weight_diversity(),
            exponent_diversity: self.population.exponent_diversity(),
            displacement_diversity: self.population.displacement_diversity(),
            best_weights: best.weights().to_vec(),
            best_exponents: best.exponents().to_vec(),
            best_displacements: best.displacements().to_vec(),
            elapsed,
        }
    }

    /// Builds the next generation: select two distinct parents, cross them,
    /// mutate the child, repeat until the population is refilled.
    fn breed<R>(&self, rng: &mut R) -> Population
    where
        R: Rng + ?Sized,
    {
        let mut next = Vec::with_capacity(self.config.population_size);
        for _ in 0..self.config.population_size {
            let parent_one = self.population.select_fitness_proportionate(rng, None);
            let parent_two = self
                .population
                .select_fitness_proportionate(rng, Some(parent_one));

            let mut child =
                Individual::crossover(parent_one, parent_two, self.config.crossover, rng);
            child.mutate(&self.config.mutation, rng);
            next.push(child);
        }
        Population::from_individuals(next)
    }
}
