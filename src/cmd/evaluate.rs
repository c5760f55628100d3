use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use serde::Deserialize;

use kairos_blocks::config::PipelineConfig;
use kairos_blocks::metrics::{compute_block_aware_metrics, evaluate_token_batch, BuiltinBackend, Metrics};
use kairos_blocks::telemetry::{self, ops::evaluate::Phase as EvaluatePhase};
use kairos_blocks::tokenizer::{HfTokenizer, TARGET_BLOCK_SEP_TOKEN};
use kairos_blocks::util::jsonl::read_jsonl;

#[derive(Args)]
pub struct EvaluateCmd {
    /// One `{"prediction", "reference"}` pair per line
    #[arg(long)] input: PathBuf,
    #[arg(long, default_value = TARGET_BLOCK_SEP_TOKEN)] separator: String,
    /// Pairs hold generated and label token ids instead of text
    #[arg(long, default_value_t = false)] token_ids: bool,
    /// Hub model id or local tokenizer.json, for --token-ids
    #[arg(long)] tokenizer: Option<String>,
    /// Where raw ids are dumped if decoding fails
    #[arg(long)] dump_dir: Option<PathBuf>,
}

#[derive(Deserialize)]
struct TextPair { prediction: String, reference: String }

#[derive(Deserialize)]
struct TokenPair { prediction: Vec<i64>, reference: Vec<i64> }

pub fn run(cfg: &PipelineConfig, args: EvaluateCmd) -> Result<()> {
    let started = Instant::now();
    let log = telemetry::evaluate();
    let _g = log.root_span_kv([
        ("input", args.input.display().to_string()),
        ("separator", args.separator.clone()),
        ("token_ids", args.token_ids.to_string()),
    ]).entered();

    let (metrics, records): (Metrics, usize) = if args.token_ids {
        let _r = log.span(&EvaluatePhase::ReadPairs).entered();
        let pairs: Vec<TokenPair> = read_jsonl(&args.input).context("read token pairs")?;
        drop(_r);
        let tokenizer_src = args.tokenizer.clone().unwrap_or_else(|| cfg.tokenizer.clone());
        let tok = HfTokenizer::load(&tokenizer_src)
            .with_context(|| format!("init tokenizer {tokenizer_src}"))?;
        let (preds, refs): (Vec<Vec<i64>>, Vec<Vec<i64>>) =
            pairs.into_iter().map(|p| (p.prediction, p.reference)).unzip();
        let dump_dir = args.dump_dir.clone().unwrap_or_else(|| cfg.dump_dir.clone());

        let _sc = log.span(&EvaluatePhase::Score).entered();
        (evaluate_token_batch(&tok, &preds, &refs, &BuiltinBackend, &dump_dir)?, preds.len())
    } else {
        let _r = log.span(&EvaluatePhase::ReadPairs).entered();
        let pairs: Vec<TextPair> = read_jsonl(&args.input).context("read text pairs")?;
        drop(_r);
        let (preds, refs): (Vec<String>, Vec<String>) =
            pairs.into_iter().map(|p| (p.prediction.trim().to_string(), p.reference.trim().to_string())).unzip();

        let _sc = log.span(&EvaluatePhase::Score).entered();
        (compute_block_aware_metrics(&preds, &refs, &args.separator, &BuiltinBackend)?, preds.len())
    };

    log.info(format!("📊 {} metric(s)", metrics.len()));
    for (name, value) in &metrics {
        log.metric(name, *value);
    }
    log.result_timed(&metrics, started, records, 0)?;
    Ok(())
}
