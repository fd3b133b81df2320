use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::error;

use materna_model::TrainParams;
use materna_trainer::{load_dataset, train, TrainConfig};

#[derive(Debug, Parser)]
#[command(
    name = "materna-train",
    version,
    about = "Train the maternal health-risk classifier",
    long_about = "Reads a labeled CSV of patient vitals, fits a label encoder and a\n\
        gradient-boosted classifier, and writes the paired artifacts consumed\n\
        by materna-server.\n\n\
        EXAMPLES:\n\
        \n  materna-train --data Maternal_Health_Risk_Data_Set.csv\n\
        \n  materna-train --data vitals.csv --out artifacts/ --rounds 120"
)]
struct Cli {
    /// Labeled CSV dataset with a header row
    #[arg(long, value_name = "FILE")]
    data: PathBuf,

    /// Directory the artifact pair is written to
    #[arg(long, value_name = "DIR", default_value = ".")]
    out: PathBuf,

    /// Boosting rounds
    #[arg(long)]
    rounds: Option<usize>,

    /// Shrinkage applied to every tree's contribution
    #[arg(long)]
    learning_rate: Option<f64>,

    /// Maximum tree depth
    #[arg(long)]
    max_depth: Option<usize>,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let mut params = TrainParams::default();
    if let Some(rounds) = cli.rounds {
        params.rounds = rounds;
    }
    if let Some(lr) = cli.learning_rate {
        params.learning_rate = lr;
    }
    if let Some(depth) = cli.max_depth {
        params.max_depth = depth;
    }

    let config = TrainConfig {
        out_dir: cli.out,
        params,
    };

    let dataset = match load_dataset(&cli.data) {
        Ok(ds) => ds,
        Err(e) => {
            error!("failed to load {}: {e}", cli.data.display());
            return ExitCode::FAILURE;
        }
    };

    match train(&dataset, &config) {
        Ok(outcome) => {
            println!(
                "trained {} rows over {} classes (run {})",
                outcome.trained_rows,
                outcome.classes.len(),
                outcome.run_id
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("training failed: {e}");
            ExitCode::FAILURE
        }
    }
}
