use std::path::PathBuf;

use crate::pipeline::SourceType;

/// Settings shared by the preprocessing and evaluation commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Upper bound on every tokenized sequence, eos included.
    pub max_length: usize,
    pub source_type: SourceType,
    /// Where raw inputs are dumped when decoding fails.
    pub dump_dir: PathBuf,
    /// Hub model id or path to a local `tokenizer.json`.
    pub tokenizer: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_length: 512,
            source_type: SourceType::TextWithPosEmbeddings,
            dump_dir: PathBuf::from("."),
            tokenizer: "google/mt5-base".to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Unparseable values keep their defaults.
    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();
        if let Some(max_length) = get("KAIROS_MAX_LENGTH") {
            if let Ok(parsed) = max_length.parse::<usize>() {
                cfg.max_length = parsed;
            }
        }
        if let Some(source_type) = get("KAIROS_SOURCE_TYPE") {
            if let Ok(parsed) = source_type.parse::<SourceType>() {
                cfg.source_type = parsed;
            }
        }
        if let Some(dir) = get("KAIROS_DUMP_DIR") {
            cfg.dump_dir = PathBuf::from(dir);
        }
        if let Some(tokenizer) = get("KAIROS_TOKENIZER") {
            cfg.tokenizer = tokenizer;
        }
        cfg
    }
}
