use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::blocks::{count_blocks, ensure_terminal_marker, partition, reconcile_model_input};
use crate::error::AlignError;
use crate::morph::{broadcast_tags, SpecialTokenSet, TagId, TagVocabulary};
use crate::text::{join_with_separator, text_with_morphs};
use crate::tokenizer::{
    encode_truncated, source_special_tokens, SubwordTokenizer, TokenId, SOURCE_BLOCK_SEP_TOKEN,
    SOURCE_META_SEP_TOKEN, TARGET_BLOCK_SEP_TOKEN,
};

/// Which source representation the model is fed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceType {
    /// Plain words, trimmed to the blocks the annotated stream covers.
    TextOnly,
    /// Words interleaved with their tags as text.
    TextWithPos,
    /// Plain words plus a parallel stream of tag ids.
    TextWithPosEmbeddings,
}

impl FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text-only" => Ok(SourceType::TextOnly),
            "text-with-pos" => Ok(SourceType::TextWithPos),
            "text-with-pos-embeddings" => Ok(SourceType::TextWithPosEmbeddings),
            other => Err(format!(
                "unknown source type {other:?} (expected text-only, text-with-pos or text-with-pos-embeddings)"
            )),
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceType::TextOnly => "text-only",
            SourceType::TextWithPos => "text-with-pos",
            SourceType::TextWithPosEmbeddings => "text-with-pos-embeddings",
        };
        f.write_str(name)
    }
}

/// One verse: parallel words and tags, plus the target blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerseRecord {
    pub words: Vec<String>,
    pub tags: Vec<String>,
    pub target: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInput {
    pub input_ids: Vec<TokenId>,
    pub attention_mask: Vec<u8>,
    pub labels: Vec<TokenId>,
    /// Same length as `input_ids`; only for [`SourceType::TextWithPosEmbeddings`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub morph_tags: Option<Vec<TagId>>,
}

impl ModelInput {
    fn new(input_ids: Vec<TokenId>, labels: Vec<TokenId>, morph_tags: Option<Vec<TagId>>) -> Self {
        let attention_mask = vec![1; input_ids.len()];
        Self { input_ids, attention_mask, labels, morph_tags }
    }
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub inputs: Vec<ModelInput>,
    /// Indices of records skipped because reconciliation left nothing.
    pub skipped: Vec<usize>,
}

/// Builds model inputs against one tokenizer and, for tag embeddings, one
/// read-only tag vocabulary.
pub struct Preprocessor<'a, T: SubwordTokenizer + ?Sized> {
    tokenizer: &'a T,
    vocab: Option<&'a TagVocabulary>,
    source_type: SourceType,
    max_length: usize,
    specials: SpecialTokenSet,
}

impl<'a, T: SubwordTokenizer + ?Sized> Preprocessor<'a, T> {
    pub fn new(
        tokenizer: &'a T,
        vocab: Option<&'a TagVocabulary>,
        source_type: SourceType,
        max_length: usize,
    ) -> Result<Self> {
        if max_length == 0 {
            return Err(AlignError::InvalidArgument("max_length must be positive".into()).into());
        }
        if source_type == SourceType::TextWithPosEmbeddings && vocab.is_none() {
            return Err(AlignError::InvalidArgument(format!("{source_type} needs a tag vocabulary")).into());
        }
        let specials = source_special_tokens(tokenizer)?;
        Ok(Self { tokenizer, vocab, source_type, max_length, specials })
    }

    pub fn source_type(&self) -> SourceType {
        self.source_type
    }

    pub fn preprocess(&self, record: &VerseRecord) -> Result<ModelInput> {
        let text_only = join_with_separator(&record.words, SOURCE_BLOCK_SEP_TOKEN);
        let with_morphs = text_with_morphs(&record.words, &record.tags, SOURCE_BLOCK_SEP_TOKEN, SOURCE_META_SEP_TOKEN)?;
        let target = join_with_separator(&record.target, TARGET_BLOCK_SEP_TOKEN);

        let text_ids = encode_truncated(self.tokenizer, &text_only, self.max_length)?;
        let morph_ids = encode_truncated(self.tokenizer, &with_morphs, self.max_length)?;
        let labels = encode_truncated(self.tokenizer, &target, self.max_length)?;

        // the annotated stream is longer per word, so it bounds how many words fit
        let sep = self.specials.block_separator;
        let reconciled = reconcile_model_input(&text_ids, &morph_ids, &sep)?;
        let input_ids = ensure_terminal_marker(&reconciled.primary, self.max_length, &self.specials.eos)?;

        let input = match self.source_type {
            SourceType::TextOnly => ModelInput::new(input_ids, labels, None),
            SourceType::TextWithPos => ModelInput::new(morph_ids, labels, None),
            SourceType::TextWithPosEmbeddings => {
                let morph_tags = self.align_tags(record, &input_ids)?;
                ModelInput::new(input_ids, labels, Some(morph_tags))
            }
        };
        Ok(input)
    }

    fn align_tags(&self, record: &VerseRecord, input_ids: &[TokenId]) -> Result<Vec<TagId>> {
        let vocab = self
            .vocab
            .ok_or_else(|| AlignError::InvalidArgument("missing tag vocabulary".into()))?;
        let meta = vocab.meta_tags();
        let sep = self.specials.block_separator;
        let blocks = count_blocks(input_ids, &sep);

        let mut word_tags = vocab.encode_all(&record.tags);
        word_tags.truncate(blocks);
        // appending eos after a trailing separator opens one block with no word
        let trailing_eos = partition(input_ids, &sep).last().is_some_and(|b| *b == [self.specials.eos]);
        if word_tags.len() + 1 == blocks && trailing_eos {
            word_tags.push(meta.eos);
        }
        Ok(broadcast_tags(&word_tags, input_ids, &self.specials, &meta)?)
    }

    /// Preprocess records across worker threads, keeping input order.
    pub fn preprocess_batch(&self, records: &[VerseRecord]) -> Result<BatchOutcome> {
        run_batch(records, |record| self.preprocess(record))
    }
}

/// Map `f` over `records` in parallel.
///
/// Records failing with a skippable [`AlignError`] are skipped and logged;
/// any other failure aborts the whole batch.
fn run_batch<F>(records: &[VerseRecord], f: F) -> Result<BatchOutcome>
where
    F: Fn(&VerseRecord) -> Result<ModelInput> + Sync,
{
    let results: Vec<Result<Option<ModelInput>>> = records
        .par_iter()
        .enumerate()
        .map(|(idx, record)| match f(record) {
            Ok(input) => Ok(Some(input)),
            Err(err) if err.downcast_ref::<AlignError>().is_some_and(AlignError::is_skippable) => {
                warn!(record = idx, error = %err, "skipping record");
                Ok(None)
            }
            Err(err) => Err(err.context(format!("preprocess record {idx}"))),
        })
        .collect();

    let mut outcome = BatchOutcome::default();
    for (idx, result) in results.into_iter().enumerate() {
        match result? {
            Some(input) => outcome.inputs.push(input),
            None => outcome.skipped.push(idx),
        }
    }
    debug!(kept = outcome.inputs.len(), skipped = outcome.skipped.len(), "preprocessed batch");
    Ok(outcome)
}

/// One-shot form of [`Preprocessor::preprocess`].
pub fn preprocess_example<T: SubwordTokenizer + ?Sized>(
    record: &VerseRecord,
    tokenizer: &T,
    vocab: Option<&TagVocabulary>,
    source_type: SourceType,
    max_length: usize,
) -> Result<ModelInput> {
    Preprocessor::new(tokenizer, vocab, source_type, max_length)?.preprocess(record)
}
