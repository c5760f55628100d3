use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::Serialize;

use kairos_blocks::config::PipelineConfig;
use kairos_blocks::morph::TagVocabulary;
use kairos_blocks::pipeline::{Preprocessor, SourceType, VerseRecord};
use kairos_blocks::telemetry::{self, ops::preprocess::Phase as PreprocessPhase};
use kairos_blocks::tokenizer::HfTokenizer;
use kairos_blocks::util::jsonl::{read_jsonl, write_jsonl};

#[derive(Args)]
pub struct PreprocessCmd {
    #[arg(long)] input: PathBuf,
    /// Tag vocabulary written by `kairos vocab`
    #[arg(long)] vocab: Option<PathBuf>,
    #[arg(long)] out: PathBuf,
    #[arg(long)] source_type: Option<SourceType>,
    #[arg(long)] max_length: Option<usize>,
    /// Hub model id or local tokenizer.json
    #[arg(long)] tokenizer: Option<String>,
    #[arg(long, default_value_t = false)] apply: bool,
}

pub fn run(cfg: &PipelineConfig, args: PreprocessCmd) -> Result<()> {
    let started = Instant::now();
    let source_type = args.source_type.unwrap_or(cfg.source_type);
    let max_length = args.max_length.unwrap_or(cfg.max_length);
    let tokenizer_src = args.tokenizer.clone().unwrap_or_else(|| cfg.tokenizer.clone());

    let log = telemetry::preprocess();
    let _g = log.root_span_kv([
        ("input", args.input.display().to_string()),
        ("out", args.out.display().to_string()),
        ("source_type", source_type.to_string()),
        ("max_length", max_length.to_string()),
        ("tokenizer", tokenizer_src.clone()),
        ("apply", args.apply.to_string()),
    ]).entered();

    if source_type == SourceType::TextWithPosEmbeddings && args.vocab.is_none() {
        bail!("--vocab is required for {source_type}");
    }

    let _s = log.span(&PreprocessPhase::ReadRecords).entered();
    let records: Vec<VerseRecord> = read_jsonl(&args.input).context("read verse records")?;
    drop(_s);

    if !args.apply {
        let _sp = log.span(&PreprocessPhase::Plan).entered();
        log.info(format!(
            "📝 Preprocess plan: records={} source_type={} max_length={} tokenizer={}",
            records.len(), source_type, max_length, tokenizer_src
        ));
        log.info("   Use --apply to execute.");
        #[derive(Serialize)]
        struct PreprocessPlan { records: usize, source_type: SourceType, max_length: usize, tokenizer: String, out: String }
        log.plan(&PreprocessPlan {
            records: records.len(),
            source_type,
            max_length,
            tokenizer: tokenizer_src,
            out: args.out.display().to_string(),
        })?;
        return Ok(());
    }

    // a vocabulary is only consulted for tag embeddings
    let vocab = match (&args.vocab, source_type) {
        (Some(path), SourceType::TextWithPosEmbeddings) => {
            let _lv = log.span(&PreprocessPhase::LoadVocab).entered();
            let vocab = TagVocabulary::load(path)
                .with_context(|| format!("load vocabulary {}", path.display()))?;
            log.info_kv("loaded tag vocabulary", [("size", vocab.len().to_string())]);
            Some(vocab)
        }
        _ => None,
    };

    let _lt = log.span(&PreprocessPhase::LoadTokenizer).entered();
    let tok = HfTokenizer::load(&tokenizer_src)
        .with_context(|| format!("init tokenizer {tokenizer_src}"))?;
    drop(_lt);

    let _t = log.span(&PreprocessPhase::Tokenize).entered();
    let pre = Preprocessor::new(&tok, vocab.as_ref(), source_type, max_length)?;
    let outcome = pre.preprocess_batch(&records)?;
    drop(_t);

    let _w = log.span(&PreprocessPhase::Write).entered();
    write_jsonl(&args.out, &outcome.inputs)?;
    drop(_w);

    log.batch_summary(outcome.inputs.len(), outcome.skipped.len());
    if !outcome.skipped.is_empty() {
        log.warn(format!("skipped record(s): {:?}", outcome.skipped));
    }

    #[derive(Serialize)]
    struct PreprocessResult { kept: usize, skipped: Vec<usize>, out: String }
    let skipped = outcome.skipped.len();
    let res = PreprocessResult {
        kept: outcome.inputs.len(),
        skipped: outcome.skipped,
        out: args.out.display().to_string(),
    };
    log.result_timed(&res, started, records.len(), skipped)?;
    Ok(())
}
