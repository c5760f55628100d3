use std::path::Path;

use anyhow::{anyhow, Result};
use hf_hub::api::sync::Api;
use tokenizers::{AddedToken, Tokenizer};
use tracing::{debug, warn};

use super::{check_sentinels, SubwordTokenizer, TokenId, ALL_SENTINEL_TOKENS};

/// Hugging Face tokenizer with the special tokens of its `tokenizer_config.json`.
#[derive(Debug, Clone)]
pub struct HfTokenizer {
    inner: Tokenizer,
    pad: (String, TokenId),
    eos: (String, TokenId),
    unk: (String, TokenId),
    /// Every special token string the tokenizer declares, sentinels included.
    declared: Vec<String>,
}

impl HfTokenizer {
    /// Load from a local `tokenizer.json` or from a hub model id.
    pub fn load(source: &str) -> Result<Self> {
        if Path::new(source).is_file() {
            let inner = Tokenizer::from_file(source).map_err(|e| anyhow!("{}", e))?;
            return Self::with_config(inner, serde_json::json!({}));
        }

        let inner = Tokenizer::from_pretrained(source, None).map_err(|e| anyhow!("{}", e))?;
        // tokenizer_config.json carries the special token strings
        let cfg = {
            let api = Api::new()?;
            let repo = api.model(source.to_string());
            repo.get("tokenizer_config.json")
                .ok()
                .and_then(|p| std::fs::read_to_string(p).ok())
                .and_then(|s| serde_json::from_str::<serde_json::Value>(&s).ok())
                .unwrap_or(serde_json::json!({}))
        };
        Self::with_config(inner, cfg)
    }

    fn with_config(mut inner: Tokenizer, cfg: serde_json::Value) -> Result<Self> {
        // values are either plain strings or AddedToken objects with "content"
        let token_str = |key: &str, default: &str| -> String {
            cfg.get(key)
                .and_then(|v| v.as_str().or_else(|| v.get("content").and_then(|c| c.as_str())))
                .unwrap_or(default)
                .to_string()
        };
        let pad = token_str("pad_token", "<pad>");
        let eos = token_str("eos_token", "</s>");
        let unk = token_str("unk_token", "<unk>");

        for sentinel in ALL_SENTINEL_TOKENS {
            if inner.token_to_id(sentinel).is_none() {
                warn!(token = sentinel, "sentinel missing from vocabulary, adding it");
                inner.add_special_tokens(&[AddedToken::from(sentinel, true)]);
            }
        }

        let mut declared: Vec<String> = inner
            .get_added_tokens_decoder()
            .into_iter()
            .filter(|(_, t)| t.special)
            .map(|(_, t)| t.content)
            .collect();
        declared.extend(additional_special_tokens(&cfg));
        declared.extend([pad.clone(), eos.clone(), unk.clone()]);
        declared.sort();
        declared.dedup();

        let resolve = |token: String| -> Result<(String, TokenId)> {
            let id = inner
                .token_to_id(&token)
                .ok_or_else(|| anyhow!("special token {token} is not in the vocabulary"))?;
            Ok((token, id))
        };
        let tok = Self { pad: resolve(pad)?, eos: resolve(eos)?, unk: resolve(unk)?, declared, inner };
        let sentinels = check_sentinels(&tok)?;
        debug!(?sentinels, declared = tok.declared.len(), pad = tok.pad.1, eos = tok.eos.1, unk = tok.unk.1, "tokenizer ready");
        Ok(tok)
    }

    /// access the inner tokenizer if needed
    pub fn inner(&self) -> &Tokenizer {
        &self.inner
    }
}

/// `additional_special_tokens` entries, as strings or AddedToken objects.
fn additional_special_tokens(cfg: &serde_json::Value) -> Vec<String> {
    cfg.get("additional_special_tokens")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().or_else(|| v.get("content").and_then(|c| c.as_str())))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

impl SubwordTokenizer for HfTokenizer {
    fn encode(&self, text: &str, add_special_tokens: bool) -> Result<Vec<TokenId>> {
        let enc = self.inner.encode(text, add_special_tokens).map_err(|e| anyhow!("{}", e))?;
        Ok(enc.get_ids().to_vec())
    }

    fn decode(&self, ids: &[TokenId]) -> Result<String> {
        self.inner.decode(ids, false).map_err(|e| anyhow!("{}", e))
    }

    fn pad_id(&self) -> TokenId {
        self.pad.1
    }

    fn eos_id(&self) -> TokenId {
        self.eos.1
    }

    fn unk_id(&self) -> TokenId {
        self.unk.1
    }

    fn special_token_strings(&self) -> Vec<String> {
        self.declared.clone()
    }
}
