use anyhow::Result;
use clap::Parser;

use deedscan::cli::{Cli, Commands};
use deedscan_core::Settings;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env();

    dispatch(cli.command, &settings)
}

fn dispatch(command: Commands, settings: &Settings) -> Result<()> {
    match command {
        Commands::Synthesize {
            addresses,
            templates,
            output,
        } => deedscan::cli::synthesize::run(&addresses, templates.as_deref(), output.as_deref()),
        Commands::Train(args) => deedscan::cli::train::run(settings, &args),
        Commands::Extract {
            corpus,
            output,
            recognizer,
        } => deedscan::cli::extract::run(settings, &corpus, &output, &recognizer),
        Commands::Evaluate {
            corpus,
            ground_truth,
            output_dir,
            recognizer,
        } => deedscan::cli::evaluate::run(
            settings,
            &corpus,
            ground_truth.as_deref(),
            &output_dir,
            &recognizer,
        ),
    }
}
