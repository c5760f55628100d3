use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;

use kairos_blocks::config::PipelineConfig;
use kairos_blocks::telemetry;

mod cmd;

#[derive(Parser)]
#[command(name = "kairos", about = "Block-aware preprocessing and evaluation CLI")]
struct Cli {
    /// Emit a single JSON envelope to stdout; logs go to stderr
    #[arg(global = true, long, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Vocab(cmd::vocab::VocabCmd),
    Preprocess(cmd::preprocess::PreprocessCmd),
    Evaluate(cmd::evaluate::EvaluateCmd),
}

fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    telemetry::config::set_json_mode(cli.json);

    // stderr logging; respects RUST_LOG and KAIROS_LOG_FORMAT
    telemetry::config::init_tracing();
    let cfg = PipelineConfig::from_env();

    match cli.command {
        Commands::Vocab(args) => cmd::vocab::run(args)?,
        Commands::Preprocess(args) => cmd::preprocess::run(&cfg, args)?,
        Commands::Evaluate(args) => cmd::evaluate::run(&cfg, args)?,
    }

    Ok(())
}
