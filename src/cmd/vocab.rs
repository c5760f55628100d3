use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use kairos_blocks::morph::TagVocabulary;
use kairos_blocks::pipeline::VerseRecord;
use kairos_blocks::telemetry::{self, ops::vocab::Phase as VocabPhase};
use kairos_blocks::util::jsonl::read_jsonl;

#[derive(Args)]
pub struct VocabCmd {
    /// Training split, one verse record per line
    #[arg(long)] train: PathBuf,
    /// Held-out split; its tags are part of the vocabulary too
    #[arg(long)] test: PathBuf,
    #[arg(long)] out: PathBuf,
    #[arg(long, default_value_t = false)] apply: bool,
    #[arg(long, default_value_t = 10)] plan_limit: usize,
}

pub fn run(args: VocabCmd) -> Result<()> {
    let started = Instant::now();
    let log = telemetry::vocab();
    let _g = log.root_span_kv([
        ("train", args.train.display().to_string()),
        ("test", args.test.display().to_string()),
        ("out", args.out.display().to_string()),
        ("apply", args.apply.to_string()),
    ]).entered();

    let _s = log.span(&VocabPhase::ReadRecords).entered();
    let train: Vec<VerseRecord> = read_jsonl(&args.train).context("read training records")?;
    let test: Vec<VerseRecord> = read_jsonl(&args.test).context("read test records")?;
    drop(_s);

    let _b = log.span(&VocabPhase::Build).entered();
    let vocab = TagVocabulary::build(train.iter().chain(&test).flat_map(|r| r.tags.iter()));
    drop(_b);

    if !args.apply {
        let _sp = log.span(&VocabPhase::Plan).entered();
        log.info(format!(
            "📝 Vocab plan: train={} test={} size={} out={}",
            train.len(), test.len(), vocab.len(), args.out.display()
        ));
        let sample: Vec<String> = (0..vocab.len() as u32)
            .filter_map(|id| vocab.tag(id).map(str::to_string))
            .take(args.plan_limit)
            .collect();
        for tag in &sample { log.info(format!("  {}", tag)); }
        log.info("   Use --apply to execute.");
        #[derive(Serialize)]
        struct VocabPlan { train_records: usize, test_records: usize, size: usize, out: String, sample: Vec<String> }
        log.plan(&VocabPlan {
            train_records: train.len(),
            test_records: test.len(),
            size: vocab.len(),
            out: args.out.display().to_string(),
            sample,
        })?;
        return Ok(());
    }

    let _sv = log.span(&VocabPhase::Save).entered();
    vocab.save(&args.out).with_context(|| format!("save vocabulary to {}", args.out.display()))?;
    drop(_sv);
    log.info(format!("✅ saved {} tag(s) to {}", vocab.len(), args.out.display()));

    #[derive(Serialize)]
    struct VocabResult { size: usize, out: String }
    let res = VocabResult { size: vocab.len(), out: args.out.display().to_string() };
    log.result_timed(&res, started, train.len() + test.len(), 0)?;
    Ok(())
}
