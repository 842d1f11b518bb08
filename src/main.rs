use clap::{Parser, Subcommand};

use crate::tasks::experiments::{self, Experiment};
use crate::tasks::plot::{self, PlotArgs};

pub mod legend;
pub mod table;
pub mod tasks;

#[derive(Parser)]
#[command(name = "perfxp", about = "Run benchmark sweeps and plot their measurements")]
struct Cli {
    // The name of the task to execute
    #[clap(subcommand)]
    task: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render a plot from the recorded measurement file
    Plot(PlotArgs),

    /// Run one of the pre-declared benchmark sweeps
    Sweep {
        #[arg(value_enum)]
        experiment: Experiment,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match &cli.task {
        Command::Plot(args) => plot::run(args),
        Command::Sweep { experiment } => experiments::run(experiment),
    }
}
