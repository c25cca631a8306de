use crate::commands::{epoch::EpochArgs, stats::StatsArgs};

pub mod epoch;
pub mod stats;

/// Subcommands for ctcfeed.
#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Load a corpus split and print its statistics.
    Stats(StatsArgs),

    /// Walk one or more epochs of mini-batches.
    Epoch(EpochArgs),
}

impl Commands {
    /// Run the subcommand.
    pub fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        match self {
            Commands::Stats(cmd) => cmd.run(),
            Commands::Epoch(cmd) => cmd.run(),
        }
    }
}
