use std::path::PathBuf;

use anyhow::Context as _;
use tetrevo_evaluator::{GameRequest, evaluate};

use crate::util;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct PlayGameArg {
    /// Path to a GameRequest JSON file
    #[arg(long)]
    request: PathBuf,
    /// Output file path for the GameResponse JSON
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &PlayGameArg) -> anyhow::Result<()> {
    let request: GameRequest = util::read_json_file("game request", &arg.request)?;
    let response = evaluate(&request).context("game request rejected")?;
    util::save_json(&response, arg.output.as_deref())?;
    Ok(())
}
