//! Evaluation over generated token ids.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, error};

use crate::blocks::{count_blocks, reconcile, Strategy};
use crate::error::AlignError;
use crate::pipeline::LABEL_PAD;
use crate::text::{remove_special_tokens, simplify_sentinels, tokens_to_ignore};
use crate::tokenizer::{sentinel_token_id, SubwordTokenizer, TokenId, TARGET_BLOCK_SEP_TOKEN};

use super::{compute_block_aware_metrics, mean, Metrics, TextMetricBackend};

const SAMPLE_LOG_LIMIT: usize = 10;

/// Decode rows of ids, mapping the label pad to the tokenizer pad and
/// stripping non-sentinel special tokens from the text.
pub fn decode_batch<T: SubwordTokenizer + ?Sized>(tokenizer: &T, rows: &[Vec<i64>]) -> Result<Vec<String>, AlignError> {
    let ignore = tokens_to_ignore(&tokenizer.special_token_strings());
    let pad = tokenizer.pad_id();
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let ids = row
                .iter()
                .map(|&id| match id {
                    LABEL_PAD => Ok(pad),
                    _ => TokenId::try_from(id)
                        .map_err(|_| AlignError::DecodeFailure(format!("row {i}: id {id} out of range"))),
                })
                .collect::<Result<Vec<TokenId>, AlignError>>()?;
            let text = tokenizer
                .decode(&ids)
                .map_err(|e| AlignError::DecodeFailure(format!("row {i}: {e}")))?;
            Ok(remove_special_tokens(&text, &ignore))
        })
        .collect()
}

/// Length and block statistics of the raw generations.
pub fn raw_metrics(preds: &[Vec<i64>], refs: &[Vec<i64>], pad: TokenId, eos: TokenId, block_sep: TokenId) -> Metrics {
    let (pad, eos, block_sep) = (pad as i64, eos as i64, block_sep as i64);
    // tokens before the first eos, the whole row when there is none
    let until_eos = |row: &Vec<i64>| row.iter().position(|&t| t == eos).unwrap_or(row.len()) as f64;
    let diffs: Vec<f64> = preds.iter().zip(refs).map(|(p, r)| until_eos(p) - until_eos(r)).collect();

    let mut out = Metrics::new();
    out.insert(
        "mean_raw_generation_length".into(),
        mean(preds.iter().map(|p| p.iter().filter(|&&t| t != pad).count() as f64)),
    );
    out.insert(
        "mean_predicted_block_count".into(),
        mean(preds.iter().map(|p| count_blocks(p, &block_sep) as f64)),
    );
    out.insert("mean_token_diff".into(), mean(diffs.iter().copied()));
    out.insert("mean_token_diff_abs".into(), mean(diffs.iter().map(|d| d.abs())));
    out
}

/// Score generated ids against label ids.
///
/// Text metrics are reported twice: `unlimited_*` over the full generations
/// and `trimmed_*` after cutting each generation to its reference's block
/// count. When decoding fails both raw inputs are written to `dump_dir` as
/// `broken_preds.json` and `broken_labels.json` before the error is returned.
pub fn evaluate_token_batch<T: SubwordTokenizer + ?Sized>(
    tokenizer: &T,
    preds: &[Vec<i64>],
    refs: &[Vec<i64>],
    backend: &dyn TextMetricBackend,
    dump_dir: &Path,
) -> Result<Metrics> {
    let block_sep = sentinel_token_id(tokenizer, TARGET_BLOCK_SEP_TOKEN)?;
    let (decoded_preds, decoded_refs) = decode_or_dump(tokenizer, preds, refs, dump_dir)?;

    let sep = block_sep as i64;
    let trimmed_preds: Vec<Vec<i64>> = preds
        .iter()
        .zip(refs)
        .map(|(p, r)| reconcile(p, r, &sep, Strategy::MatchReference).primary)
        .collect();
    let (trimmed_decoded_preds, trimmed_decoded_refs) = decode_or_dump(tokenizer, &trimmed_preds, refs, dump_dir)?;

    for (i, (p, r)) in decoded_preds.iter().zip(&decoded_refs).take(SAMPLE_LOG_LIMIT).enumerate() {
        debug!(sample = i, prediction = %simplify_sentinels(p), reference = %simplify_sentinels(r), "eval sample");
    }

    let mut metrics = raw_metrics(preds, refs, tokenizer.pad_id(), tokenizer.eos_id(), block_sep);
    let unlimited = compute_block_aware_metrics(&decoded_preds, &decoded_refs, TARGET_BLOCK_SEP_TOKEN, backend)?;
    let trimmed =
        compute_block_aware_metrics(&trimmed_decoded_preds, &trimmed_decoded_refs, TARGET_BLOCK_SEP_TOKEN, backend)?;
    metrics.extend(unlimited.into_iter().map(|(k, v)| (format!("unlimited_{k}"), v)));
    metrics.extend(trimmed.into_iter().map(|(k, v)| (format!("trimmed_{k}"), v)));
    Ok(metrics)
}

fn decode_or_dump<T: SubwordTokenizer + ?Sized>(
    tokenizer: &T,
    preds: &[Vec<i64>],
    refs: &[Vec<i64>],
    dump_dir: &Path,
) -> Result<(Vec<String>, Vec<String>)> {
    let decoded = decode_batch(tokenizer, preds).and_then(|p| Ok((p, decode_batch(tokenizer, refs)?)));
    match decoded {
        Ok(pair) => Ok(pair),
        Err(err) => {
            error!(error = %err, dir = %dump_dir.display(), "decode failed, dumping raw inputs");
            dump_raw(preds, refs, dump_dir).with_context(|| format!("dump raw inputs after: {err}"))?;
            Err(err.into())
        }
    }
}

fn dump_raw(preds: &[Vec<i64>], refs: &[Vec<i64>], dump_dir: &Path) -> Result<()> {
    fs::create_dir_all(dump_dir).with_context(|| format!("create {}", dump_dir.display()))?;
    for (name, rows) in [("broken_preds.json", preds), ("broken_labels.json", refs)] {
        let path = dump_dir.join(name);
        let body = serde_json::to_vec(rows)?;
        fs::write(&path, body).with_context(|| format!("write {}", path.display()))?;
    }
    Ok(())
}
