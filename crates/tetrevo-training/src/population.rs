//! An ordered population of individuals and its selection machinery.

use std::thread;

use rand::Rng;
use tetrevo_engine::{Criterion, PieceSource};
use tetrevo_evaluator::{Game, RatingKind};
use tetrevo_stats::DescriptiveStats;

use crate::individual::Individual;

/// A fixed-size, ordered collection of individuals.
///
/// Populations are replaced wholesale between generations; a new population
/// never aliases the individuals of the old one.
#[derive(Debug, Clone)]
pub struct Population {
    individuals: Vec<Individual>,
}

impl Population {
    /// Creates a population of randomly initialized individuals.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero.
    #[must_use]
    pub fn random<R>(kind: RatingKind, size: usize, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        Self::from_individuals((0..size).map(|_| Individual::random(kind, rng)).collect())
    }

    /// Wraps an explicit set of individuals.
    ///
    /// # Panics
    ///
    /// Panics if `individuals` is empty.
    #[must_use]
    pub fn from_individuals(individuals: Vec<Individual>) -> Self {
        assert!(!individuals.is_empty(), "a population is never empty");
        Self { individuals }
    }

    #[must_use]
    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    /// Plays the given games for every individual still lacking fitness.
    ///
    /// One playout thread per pending individual, joined before returning:
    /// the scope exit is the generation barrier. Each thread clones the
    /// shared sources so no generator state crosses threads, and every
    /// individual faces the same piece sequences. Individuals that already
    /// carry fitness are not re-played.
    ///
    /// # Panics
    ///
    /// Panics if `sources` is empty.
    pub fn evaluate_fitness<S>(&mut self, board_width: usize, board_height: usize, sources: &[S])
    where
        S: PieceSource + Clone + Send + Sync,
    {
        assert!(!sources.is_empty(), "each individual plays at least one game");

        thread::scope(|scope| {
            for individual in &mut self.individuals {
                if individual.has_fitness() {
                    continue;
                }
                let rater = individual.rater();
                scope.spawn(move || {
                    let mut game = Game::new(board_width, board_height);
                    let outcomes: Vec<u64> = sources
                        .iter()
                        .map(|source| {
                            let mut source = source.clone();
                            game.play(&rater, &mut source)
                        })
                        .collect();
                    individual.set_fitness(&outcomes);
                });
            }
        });
    }

    /// The individual with the highest fitness.
    ///
    /// # Panics
    ///
    /// Panics if any individual lacks fitness; evaluate first.
    #[must_use]
    pub fn fittest(&self) -> &Individual {
        self.individuals
            .iter()
            .max_by(|a, b| a.fitness().total_cmp(&b.fitness()))
            .expect("a population is never empty")
    }

    /// The individual with the lowest fitness.
    ///
    /// # Panics
    ///
    /// Panics if any individual lacks fitness; evaluate first.
    #[must_use]
    pub fn least_fit(&self) -> &Individual {
        self.individuals
            .iter()
            .min_by(|a, b| a.fitness().total_cmp(&b.fitness()))
            .expect("a population is never empty")
    }

    /// Mean fitness across the population.
    ///
    /// # Panics
    ///
    /// Panics if any individual lacks fitness; evaluate first.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn mean_fitness(&self) -> f64 {
        let total: f64 = self.individuals.iter().map(Individual::fitness).sum();
        total / self.individuals.len() as f64
    }

    /// Selects an individual with probability proportional to its fitness
    /// share, walking the population in order.
    ///
    /// Individuals equal to `excluding` are skipped, which lets a second
    /// parent draw exclude the first.
    ///
    /// # Panics
    ///
    /// Panics when no candidate can be selected: zero total fitness or
    /// everything excluded. That is a population-invariant violation, not a
    /// recoverable condition.
    pub fn select_fitness_proportionate<R>(
        &self,
        rng: &mut R,
        excluding: Option<&Individual>,
    ) -> &Individual
    where
        R: Rng + ?Sized,
    {
        let excluded = |individual: &Individual| excluding.is_some_and(|e| e == individual);

        let total: f64 = self
            .individuals
            .iter()
            .filter(|individual| !excluded(individual))
            .map(Individual::fitness)
            .sum();
        assert!(
            total > 0.0,
            "fitness-proportionate selection requires positive total fitness"
        );

        let mut selection = rng.random_range(0.0..total);
        for individual in &self.individuals {
            if excluded(individual) {
                continue;
            }
            if individual.fitness() >= selection {
                return individual;
            }
            selection -= individual.fitness();
        }

        panic!("fitness-proportionate selection found no individual");
    }

    /// Mean per-gene standard deviation of the weight genes.
    #[must_use]
    pub fn weight_diversity(&self) -> f64 {
        self.diversity(Criterion::LEN, |individual, i| {
            f64::from(individual.weights()[i])
        })
        .expect("weight genes are always present")
    }

    /// Mean per-gene standard deviation of the exponent genes, if the
    /// variant carries them.
    #[must_use]
    pub fn exponent_diversity(&self) -> Option<f64> {
        let count = self.individuals[0].exponents().len();
        self.diversity(count, |individual, i| individual.exponents()[i])
    }

    /// Mean per-gene standard deviation of the displacement genes, if the
    /// variant carries them.
    #[must_use]
    pub fn displacement_diversity(&self) -> Option<f64> {
        let count = self.individuals[0].displacements().len();
        self.diversity(count, |individual, i| individual.displacements()[i])
    }

    #[expect(clippy::cast_precision_loss)]
    fn diversity<F>(&self, gene_count: usize, gene: F) -> Option<f64>
    where
        F: Fn(&Individual, usize) -> f64,
    {
        if gene_count == 0 {
            return None;
        }
        let total: f64 = (0..gene_count)
            .map(|i| {
                DescriptiveStats::new(self.individuals.iter().map(|individual| {
                    gene(individual, i)
                }))
                .expect("a population is never empty")
                .std_dev
            })
            .sum();
        Some(total / gene_count as f64)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;
    use tetrevo_engine::RandomPieceSource;

    use super::*;

    fn fixed_individual(pile_weight: i32, fitness: Option<u64>) -> Individual {
        let mut weights = vec![0; Criterion::LEN];
        weights[Criterion::PileHeight as usize] = pile_weight;
        let mut individual =
            Individual::from_genes(RatingKind::Linear, weights, vec![], vec![]);
        if let Some(fitness) = fitness {
            individual.set_fitness(&[fitness]);
        }
        individual
    }

    #[test]
    fn test_fittest_and_least_fit() {
        let population = Population::from_individuals(vec![
            fixed_individual(1, Some(5)),
            fixed_individual(2, Some(7)),
            fixed_individual(3, Some(3)),
        ]);
        assert_eq!(population.fittest().fitness(), 7.0);
        assert_eq!(population.least_fit().fitness(), 3.0);
        assert_eq!(population.mean_fitness(), 5.0);
    }

    #[test]
    fn test_selection_with_single_candidate_returns_it() {
        let mut rng = Pcg32::seed_from_u64(1);
        let population = Population::from_individuals(vec![fixed_individual(1, Some(9))]);
        for _ in 0..16 {
            let selected = population.select_fitness_proportionate(&mut rng, None);
            assert_eq!(selected.fitness(), 9.0);
        }
    }

    #[test]
    fn test_selection_excludes_the_given_individual() {
        let mut rng = Pcg32::seed_from_u64(2);
        let population = Population::from_individuals(vec![
            fixed_individual(1, Some(5)),
            fixed_individual(2, Some(7)),
        ]);
        let first = &population.individuals()[0];
        for _ in 0..16 {
            let selected = population.select_fitness_proportionate(&mut rng, Some(first));
            assert_eq!(selected.fitness(), 7.0);
        }
    }

    #[test]
    fn test_selection_is_fitness_weighted() {
        let mut rng = Pcg32::seed_from_u64(3);
        let population = Population::from_individuals(vec![
            fixed_individual(1, Some(1)),
            fixed_individual(2, Some(99)),
        ]);
        let mut heavy_hits = 0;
        for _ in 0..200 {
            if population
                .select_fitness_proportionate(&mut rng, None)
                .fitness()
                > 1.0
            {
                heavy_hits += 1;
            }
        }
        // The 99-fitness individual should dominate the draws.
        assert!(heavy_hits > 150, "got {heavy_hits} of 200");
    }

    #[test]
    #[should_panic(expected = "positive total fitness")]
    fn test_selection_with_zero_total_fitness_is_fatal() {
        let mut rng = Pcg32::seed_from_u64(4);
        let population = Population::from_individuals(vec![fixed_individual(1, Some(0))]);
        population.select_fitness_proportionate(&mut rng, None);
    }

    #[test]
    fn test_diversity_of_identical_genomes_is_zero() {
        let population = Population::from_individuals(vec![
            fixed_individual(5, None),
            fixed_individual(5, None),
            fixed_individual(5, None),
        ]);
        assert_eq!(population.weight_diversity(), 0.0);
        assert_eq!(population.exponent_diversity(), None);
        assert_eq!(population.displacement_diversity(), None);
    }

    #[test]
    fn test_diversity_grows_with_gene_spread() {
        let narrow = Population::from_individuals(vec![
            fixed_individual(5, None),
            fixed_individual(6, None),
        ]);
        let wide = Population::from_individuals(vec![
            fixed_individual(-500, None),
            fixed_individual(500, None),
        ]);
        assert!(wide.weight_diversity() > narrow.weight_diversity());
    }

    #[test]
    fn test_evaluate_fitness_fills_every_pending_individual() {
        let mut population = Population::from_individuals(vec![
            fixed_individual(-100, None),
            fixed_individual(-101, None),
        ]);
        let sources = vec![RandomPieceSource::new(1), RandomPieceSource::new(2)];
        population.evaluate_fitness(4, 4, &sources);
        assert!(population.individuals().iter().all(Individual::has_fitness));
        assert!(population.individuals().iter().all(|i| i.fitness() > 0.0));
    }

    #[test]
    fn test_evaluate_fitness_skips_already_evaluated_individuals() {
        let mut population = Population::from_individuals(vec![
            fixed_individual(-100, Some(1_000_000)),
            fixed_individual(-101, None),
        ]);
        let sources = vec![RandomPieceSource::new(3)];
        population.evaluate_fitness(4, 4, &sources);

        // The pre-evaluated fitness must survive untouched; a real playout on
        // a 4x4 board could never reach it.
        assert_eq!(population.individuals()[0].fitness(), 1_000_000.0);
        assert!(population.individuals()[1].has_fitness());
    }

    #[test]
    fn test_random_population_has_no_fitness() {
        let mut rng = Pcg32::seed_from_u64(5);
        let population = Population::random(RatingKind::Linear, 4, &mut rng);
        assert_eq!(population.len(), 4);
        assert!(population.individuals().iter().all(|i| !i.has_fitness()));
    }
}
