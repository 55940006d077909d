use clap::{Parser, Subcommand};

use self::{play_game::PlayGameArg, train::TrainArg};

mod play_game;
mod train;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about = "Evolves Tetris board-rating genomes", long_about = None)]
pub struct CommandArgs {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Evolve a player population with the genetic algorithm
    Train(#[clap(flatten)] TrainArg),
    /// Play one game described by a GameRequest JSON file
    PlayGame(#[clap(flatten)] PlayGameArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Train(arg) => train::run(&arg)?,
        Mode::PlayGame(arg) => play_game::run(&arg)?,
    }
    Ok(())
}
