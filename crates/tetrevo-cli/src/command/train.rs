use std::{path::PathBuf, str::FromStr};

use chrono::{DateTime, Utc};
use rand::{SeedableRng as _, rngs::StdRng};
use serde::Serialize;
use tetrevo_evaluator::{MAX_BOARD_DIMENSION, MIN_BOARD_DIMENSION, RatingKind};
use tetrevo_training::{
    CrossoverPolicy, EvolutionConfig, EvolutionDriver, GenerationSummary, MutationParams,
    MutationPolicy,
};

use crate::util;

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::FromStr)]
enum MutationPolicyArg {
    Scale,
    Replace,
}

impl From<MutationPolicyArg> for MutationPolicy {
    fn from(arg: MutationPolicyArg) -> Self {
        match arg {
            MutationPolicyArg::Scale => MutationPolicy::Scale,
            MutationPolicyArg::Replace => MutationPolicy::Replace,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::FromStr)]
enum CrossoverPolicyArg {
    Uniform,
    Onepoint,
}

impl From<CrossoverPolicyArg> for CrossoverPolicy {
    fn from(arg: CrossoverPolicyArg) -> Self {
        match arg {
            CrossoverPolicyArg::Uniform => CrossoverPolicy::Uniform,
            CrossoverPolicyArg::Onepoint => CrossoverPolicy::OnePoint,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct BoardSize {
    width: usize,
    height: usize,
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("board size must look like WIDTHxHEIGHT, e.g. 10x20")]
struct BoardSizeParseError;

impl FromStr for BoardSize {
    type Err = BoardSizeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (width, height) = s.split_once('x').ok_or(BoardSizeParseError)?;
        Ok(Self {
            width: width.parse().map_err(|_| BoardSizeParseError)?,
            height: height.parse().map_err(|_| BoardSizeParseError)?,
        })
    }
}

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    /// Board rating function: linear (l), exponential (e) or
    /// exponential-with-displacement (ed)
    #[arg(long, default_value = "linear")]
    algo: RatingKind,
    /// Board size as WIDTHxHEIGHT
    #[arg(long, default_value = "10x20")]
    size: BoardSize,
    /// Number of individuals in the player population
    #[arg(long, default_value_t = 128)]
    population: usize,
    /// Number of generations to run for
    #[arg(long, default_value_t = 30)]
    generations: usize,
    /// Games per individual; fitness is their mean block count
    #[arg(long, default_value_t = 3)]
    games: usize,
    /// Per-gene mutation probability
    #[arg(long, default_value_t = 0.1)]
    mutation_rate: f64,
    /// Mutation policy: scale or replace
    #[arg(long, default_value = "scale")]
    mutation_policy: MutationPolicyArg,
    /// Standard deviation for weight mutation (scale policy)
    #[arg(long, default_value_t = 0.5)]
    mutation_stddev: f64,
    /// Standard deviation for exponent mutation (scale policy)
    #[arg(long, default_value_t = 0.1)]
    exponent_stddev: f64,
    /// Standard deviation for displacement mutation (scale policy)
    #[arg(long, default_value_t = 0.5)]
    displacement_stddev: f64,
    /// Crossover policy: uniform or onepoint
    #[arg(long, default_value = "uniform")]
    crossover: CrossoverPolicyArg,
    /// Master seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
    /// Output file path for the trained model
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct TrainedModel {
    algorithm: RatingKind,
    board_width: usize,
    board_height: usize,
    trained_at: DateTime<Utc>,
    generations: usize,
    fitness: f64,
    weights: Vec<i32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    exponents: Vec<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    displacements: Vec<f64>,
}

pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let supported = MIN_BOARD_DIMENSION..=MAX_BOARD_DIMENSION;
    anyhow::ensure!(
        supported.contains(&arg.size.width) && supported.contains(&arg.size.height),
        "unsupported board size {}x{}: each dimension must be within {}..={}",
        arg.size.width,
        arg.size.height,
        MIN_BOARD_DIMENSION,
        MAX_BOARD_DIMENSION,
    );
    anyhow::ensure!(arg.population >= 2, "population needs at least two individuals");
    anyhow::ensure!(arg.generations >= 1, "at least one generation is required");
    anyhow::ensure!(arg.games >= 1, "each individual must play at least one game");
    anyhow::ensure!(
        (0.0..=1.0).contains(&arg.mutation_rate),
        "mutation rate must be within 0..=1"
    );

    let config = EvolutionConfig {
        rating_kind: arg.algo,
        board_width: arg.size.width,
        board_height: arg.size.height,
        population_size: arg.population,
        generations: arg.generations,
        games_per_individual: arg.games,
        mutation: MutationParams {
            policy: arg.mutation_policy.into(),
            rate: arg.mutation_rate,
            weight_std_dev: arg.mutation_stddev,
            exponent_std_dev: arg.exponent_stddev,
            displacement_std_dev: arg.displacement_stddev,
        },
        crossover: arg.crossover.into(),
    };

    eprintln!("# Board rating function {}", arg.algo);
    eprintln!("# Board size {}x{}", arg.size.width, arg.size.height);
    eprintln!("# Population size {}", arg.population);
    eprintln!("# Generations {}", arg.generations);
    eprintln!("# Games per individual {}", arg.games);
    eprintln!("# Mutation rate {}", arg.mutation_rate);
    eprintln!("# Mutation std dev (weights) {}", arg.mutation_stddev);
    if arg.algo.has_exponents() {
        eprintln!("# Mutation std dev (exponents) {}", arg.exponent_stddev);
    }
    if arg.algo.has_displacements() {
        eprintln!("# Mutation std dev (displacements) {}", arg.displacement_stddev);
    }
    eprintln!();

    let mut rng = match arg.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let mut driver = EvolutionDriver::new(config, &mut rng);
    driver.run(&mut rng, print_summary);

    let best = driver.population().fittest();
    let model = TrainedModel {
        algorithm: arg.algo,
        board_width: arg.size.width,
        board_height: arg.size.height,
        trained_at: Utc::now(),
        generations: arg.generations,
        fitness: best.fitness(),
        weights: best.weights().to_vec(),
        exponents: best.exponents().to_vec(),
        displacements: best.displacements().to_vec(),
    };
    util::save_json(&model, arg.output.as_deref())?;

    eprintln!();
    eprintln!("Training completed");
    if let Some(path) = &arg.output {
        eprintln!("  Model: {}", path.display());
    }
    eprintln!("  Best fitness: {:.1} blocks", model.fitness);

    Ok(())
}

fn print_summary(summary: &GenerationSummary) {
    eprintln!("Generation #{}:", summary.generation);
    eprintln!(
        "  Fitness: max {:.1} mean {:.1} min {:.1}",
        summary.best_fitness, summary.mean_fitness, summary.worst_fitness
    );
    eprintln!("  Best weights: {:?}", summary.best_weights);
    if !summary.best_exponents.is_empty() {
        eprintln!("  Best exponents: {:.3?}", summary.best_exponents);
    }
    if !summary.best_displacements.is_empty() {
        eprintln!("  Best displacements: {:.3?}", summary.best_displacements);
    }
    eprint!("  Diversity: weights {:.2}", summary.weight_diversity);
    if let Some(diversity) = summary.exponent_diversity {
        eprint!(" exponents {diversity:.3}");
    }
    if let Some(diversity) = summary.displacement_diversity {
        eprint!(" displacements {diversity:.3}");
    }
    eprintln!();
    eprintln!("  Took {:.2?}", summary.elapsed);
}
