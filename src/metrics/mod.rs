//! Block-aware text metrics.
//!
//! Every prediction/reference pair is scored in three views: the raw text
//! (`naive_`), the text with block separators dropped (`nosep_`) and the text
//! with each block collapsed to one token (`block_`). The Levenshtein family
//! is computed on top of that, partly over block lists.

pub mod evaluate;
pub mod levenshtein;

use std::collections::BTreeMap;

use anyhow::Result;

use crate::error::AlignError;
use crate::text::{split_text, strip_separators, unify_blocks};

pub use evaluate::{decode_batch, evaluate_token_batch, raw_metrics};
pub use levenshtein::{ratio, str_ratio};

pub type Metrics = BTreeMap<String, f64>;

/// Scores one view of a batch; keys come back without a view prefix.
///
/// BLEU and ROUGE implementations plug in here.
pub trait TextMetricBackend: Send + Sync {
    fn compute(&self, predictions: &[String], references: &[String]) -> Result<Metrics>;
}

/// Exact match only.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinBackend;

impl TextMetricBackend for BuiltinBackend {
    fn compute(&self, predictions: &[String], references: &[String]) -> Result<Metrics> {
        let mut out = Metrics::new();
        out.insert("exact_match".to_string(), exact_match(predictions, references));
        Ok(out)
    }
}

/// Runs several backends and unions their keys, later backends winning.
pub struct CombinedBackend(pub Vec<Box<dyn TextMetricBackend>>);

impl TextMetricBackend for CombinedBackend {
    fn compute(&self, predictions: &[String], references: &[String]) -> Result<Metrics> {
        let mut out = Metrics::new();
        for backend in &self.0 {
            out.extend(backend.compute(predictions, references)?);
        }
        Ok(out)
    }
}

/// Share of predictions equal to their reference.
pub fn exact_match(predictions: &[String], references: &[String]) -> f64 {
    mean(predictions.iter().zip(references).map(|(p, r)| if p == r { 1.0 } else { 0.0 }))
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 { 0.0 } else { sum / n as f64 }
}

/// Full metric mapping for decoded predictions against their references.
pub fn compute_block_aware_metrics(
    predictions: &[String],
    references: &[String],
    separator: &str,
    backend: &dyn TextMetricBackend,
) -> Result<Metrics> {
    if predictions.len() != references.len() {
        return Err(AlignError::InvalidArgument(format!(
            "{} predictions for {} references",
            predictions.len(),
            references.len()
        ))
        .into());
    }
    if predictions.is_empty() {
        return Err(AlignError::InvalidArgument("no predictions to score".into()).into());
    }

    let view = |f: fn(&str, &str) -> String, texts: &[String]| -> Vec<String> {
        texts.iter().map(|t| f(t, separator)).collect()
    };
    let nosep_preds = view(strip_separators, predictions);
    let nosep_refs = view(strip_separators, references);
    let block_preds = view(unify_blocks, predictions);
    let block_refs = view(unify_blocks, references);

    let mut out = Metrics::new();
    let views: [(&str, &[String], &[String]); 3] = [
        ("naive", predictions, references),
        ("nosep", &nosep_preds, &nosep_refs),
        ("block", &block_preds, &block_refs),
    ];
    for (prefix, preds, refs) in views {
        for (name, value) in backend.compute(preds, refs)? {
            out.insert(format!("{prefix}_{name}"), value);
        }
    }

    let pairs = || predictions.iter().zip(references);
    out.insert("naive_levenshtein".into(), mean(pairs().map(|(p, r)| str_ratio(p, r))));
    out.insert(
        "no_sep_levenshtein".into(),
        mean(nosep_preds.iter().zip(&nosep_refs).map(|(p, r)| str_ratio(p, r))),
    );
    for (key, skip_empty) in [("block_levenshtein_skip_empty", true), ("block_levenshtein_keep_empty", false)] {
        let score = mean(pairs().map(|(p, r)| {
            ratio(&split_text(p, separator, skip_empty), &split_text(r, separator, skip_empty))
        }));
        out.insert(key.into(), score);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFERENCE: &str = "- <s> to give <s> knowledge <s> of salvation <s> to <s> people <s> of Him <s> in <s> forgiveness <s> of [the] sins <s> of them";
    const PREDICTION: &str = "- <s> to give <s> wisdom <s> of salvation <s> to <s> people <s> of Him <s> in <s> forgiveness <s> of sins <s> of them";

    fn one(s: &str) -> Vec<String> {
        vec![s.to_string()]
    }

    #[test]
    fn perfect_prediction_scores_one_everywhere() {
        let metrics = compute_block_aware_metrics(&one(REFERENCE), &one(REFERENCE), "<s>", &BuiltinBackend).unwrap();
        let keys: Vec<&str> = metrics.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "block_exact_match",
                "block_levenshtein_keep_empty",
                "block_levenshtein_skip_empty",
                "naive_exact_match",
                "naive_levenshtein",
                "no_sep_levenshtein",
                "nosep_exact_match",
            ]
        );
        assert!(metrics.values().all(|v| *v == 1.0));
    }

    #[test]
    fn imperfect_prediction_block_scores() {
        let metrics = compute_block_aware_metrics(&one(PREDICTION), &one(REFERENCE), "<s>", &BuiltinBackend).unwrap();
        assert_eq!(metrics["naive_exact_match"], 0.0);
        // 11 blocks each, 9 shared
        let expected = 18.0 / 22.0;
        assert!((metrics["block_levenshtein_skip_empty"] - expected).abs() < 1e-9);
        assert!((metrics["block_levenshtein_keep_empty"] - expected).abs() < 1e-9);
        assert!((metrics["naive_levenshtein"] - 0.9300411522633745).abs() < 1e-12);
    }

    #[test]
    fn empty_blocks_count_only_when_kept() {
        let refs = one("this is <s> an example <s>");
        let metrics = compute_block_aware_metrics(&one("this is <s> example <s>"), &refs, "<s>", &BuiltinBackend).unwrap();
        assert_eq!(metrics["block_levenshtein_skip_empty"], 0.5);

        let metrics = compute_block_aware_metrics(&one("this is <s> an <s> example <s>"), &refs, "<s>", &BuiltinBackend).unwrap();
        assert!((metrics["block_levenshtein_keep_empty"] - 4.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn backend_keys_get_view_prefixes() {
        struct Length;
        impl TextMetricBackend for Length {
            fn compute(&self, predictions: &[String], _references: &[String]) -> Result<Metrics> {
                Ok(Metrics::from([("chars".to_string(), predictions[0].len() as f64)]))
            }
        }
        let backend = CombinedBackend(vec![Box::new(BuiltinBackend), Box::new(Length)]);
        let metrics = compute_block_aware_metrics(&one("a b <s> c"), &one("a b <s> c"), "<s>", &backend).unwrap();
        assert_eq!(metrics["naive_chars"], 9.0);
        assert_eq!(metrics["nosep_chars"], 5.0);
        assert_eq!(metrics["block_chars"], 4.0);
        assert_eq!(metrics["block_exact_match"], 1.0);
    }

    #[test]
    fn mismatched_or_empty_batches_are_rejected() {
        assert!(compute_block_aware_metrics(&one("a"), &[], "<s>", &BuiltinBackend).is_err());
        assert!(compute_block_aware_metrics(&[], &[], "<s>", &BuiltinBackend).is_err());
    }

    #[test]
    fn exact_match_is_a_mean() {
        let preds = vec!["a".to_string(), "b".to_string()];
        let refs = vec!["a".to_string(), "c".to_string()];
        assert_eq!(exact_match(&preds, &refs), 0.5);
    }
}
