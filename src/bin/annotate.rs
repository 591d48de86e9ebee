//! CLI entry point: parse arguments, load configuration, run the pipeline.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use variant_effect_annotator::cli::Cli;
use variant_effect_annotator::config::Config;
use variant_effect_annotator::pipeline::Pipeline;

fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run() {
        Ok(summary) => {
            tracing::info!(
                batches = summary.batches_processed,
                types = summary.counts.len(),
                "run complete"
            );
            std::process::ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "run failed");
            std::process::ExitCode::FAILURE
        }
    }
}

fn run() -> Result<variant_effect_annotator::RunSummary, variant_effect_annotator::AnnotatorError> {
    let cli = Cli::parse();

    let (mut config, filter_chain) = Config::load(&cli.config)?;
    cli.apply_overrides(&mut config);

    let pipeline = Pipeline::builder(config, cli.vcf_path)
        .filter_chain(filter_chain)
        .build()?;

    pipeline.run()
}
