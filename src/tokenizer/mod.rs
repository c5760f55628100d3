//! Sub-word tokenizer capability and sentinel handling.

pub mod hf;

use anyhow::{bail, Result};

use crate::morph::SpecialTokenSet;

pub use hf::HfTokenizer;

pub type TokenId = u32;

/// Separates words in the source text.
pub const SOURCE_BLOCK_SEP_TOKEN: &str = "<extra_id_0>";
/// Separates a word from its morphological tag.
pub const SOURCE_META_SEP_TOKEN: &str = "<extra_id_1>";
/// Separates blocks in the target text.
pub const TARGET_BLOCK_SEP_TOKEN: &str = "<extra_id_2>";

pub const ALL_SENTINEL_TOKENS: [&str; 3] =
    [SOURCE_BLOCK_SEP_TOKEN, SOURCE_META_SEP_TOKEN, TARGET_BLOCK_SEP_TOKEN];

/// What the alignment pipeline needs from a sub-word tokenizer.
pub trait SubwordTokenizer: Send + Sync {
    /// Encode `text`; with `add_special_tokens` the tokenizer appends its
    /// end-of-sequence token.
    fn encode(&self, text: &str, add_special_tokens: bool) -> Result<Vec<TokenId>>;

    /// Decode ids back to text, keeping special tokens.
    fn decode(&self, ids: &[TokenId]) -> Result<String>;

    fn pad_id(&self) -> TokenId;
    fn eos_id(&self) -> TokenId;
    fn unk_id(&self) -> TokenId;

    /// Textual form of every special token the tokenizer declares.
    fn special_token_strings(&self) -> Vec<String>;
}

/// Id of a sentinel token, which must encode to exactly one id.
pub fn sentinel_token_id<T: SubwordTokenizer + ?Sized>(tokenizer: &T, token: &str) -> Result<TokenId> {
    match tokenizer.encode(token, false)?.as_slice() {
        [id] => Ok(*id),
        other => bail!(
            "sentinel token {token} should encode to exactly one id, got {}: {other:?}",
            other.len()
        ),
    }
}

/// Fail unless all sentinels resolve to distinct single ids.
pub fn check_sentinels<T: SubwordTokenizer + ?Sized>(tokenizer: &T) -> Result<[TokenId; 3]> {
    let mut ids = [0; 3];
    for (slot, token) in ids.iter_mut().zip(ALL_SENTINEL_TOKENS) {
        *slot = sentinel_token_id(tokenizer, token)?;
    }
    if ids[0] == ids[1] || ids[1] == ids[2] || ids[0] == ids[2] {
        bail!("sentinel tokens share ids: {ids:?}");
    }
    Ok(ids)
}

/// Special token ids of the source side, the block separator being
/// [`SOURCE_BLOCK_SEP_TOKEN`].
pub fn source_special_tokens<T: SubwordTokenizer + ?Sized>(tokenizer: &T) -> Result<SpecialTokenSet> {
    Ok(SpecialTokenSet {
        pad: tokenizer.pad_id(),
        eos: tokenizer.eos_id(),
        unk: tokenizer.unk_id(),
        block_separator: sentinel_token_id(tokenizer, SOURCE_BLOCK_SEP_TOKEN)?,
    })
}

/// Encode for the model: at most `max_length` ids, the last one always eos.
pub fn encode_truncated<T: SubwordTokenizer + ?Sized>(
    tokenizer: &T,
    text: &str,
    max_length: usize,
) -> Result<Vec<TokenId>> {
    let mut ids = tokenizer.encode(text, false)?;
    ids.truncate(max_length.saturating_sub(1));
    ids.push(tokenizer.eos_id());
    Ok(ids)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;

    use anyhow::{anyhow, Result};

    use super::{SubwordTokenizer, TokenId, ALL_SENTINEL_TOKENS};

    /// Whitespace tokenizer over a growing vocabulary; sentinels and
    /// specials are split out even when glued to a word.
    pub struct WordTokenizer {
        vocab: HashMap<String, TokenId>,
        inverse: Vec<String>,
    }

    pub const PAD: TokenId = 0;
    pub const EOS: TokenId = 1;
    pub const UNK: TokenId = 2;

    impl WordTokenizer {
        pub fn new(words: &[&str]) -> Self {
            let mut tok = Self { vocab: HashMap::new(), inverse: Vec::new() };
            for w in ["<pad>", "</s>", "<unk>"].into_iter().chain(ALL_SENTINEL_TOKENS).chain(words.iter().copied()) {
                tok.insert(w);
            }
            tok
        }

        fn insert(&mut self, word: &str) {
            if !self.vocab.contains_key(word) {
                self.vocab.insert(word.to_string(), self.inverse.len() as TokenId);
                self.inverse.push(word.to_string());
            }
        }

        pub fn id(&self, word: &str) -> TokenId {
            self.vocab.get(word).copied().unwrap_or(UNK)
        }

        fn pieces(text: &str) -> Vec<String> {
            let mut spaced = text.to_string();
            for sentinel in ALL_SENTINEL_TOKENS {
                spaced = spaced.replace(sentinel, &format!(" {sentinel} "));
            }
            spaced.split_whitespace().map(str::to_string).collect()
        }
    }

    impl SubwordTokenizer for WordTokenizer {
        fn encode(&self, text: &str, add_special_tokens: bool) -> Result<Vec<TokenId>> {
            let mut ids: Vec<TokenId> = Self::pieces(text).iter().map(|p| self.id(p)).collect();
            if add_special_tokens {
                ids.push(EOS);
            }
            Ok(ids)
        }

        fn decode(&self, ids: &[TokenId]) -> Result<String> {
            let words = ids
                .iter()
                .map(|&id| {
                    self.inverse
                        .get(id as usize)
                        .map(String::as_str)
                        .ok_or_else(|| anyhow!("id {id} out of range"))
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(words.join(" "))
        }

        fn pad_id(&self) -> TokenId {
            PAD
        }

        fn eos_id(&self) -> TokenId {
            EOS
        }

        fn unk_id(&self) -> TokenId {
            UNK
        }

        fn special_token_strings(&self) -> Vec<String> {
            vec!["<pad>".into(), "</s>".into(), "<unk>".into()]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{WordTokenizer, EOS};
    use super::*;

    #[test]
    fn sentinels_resolve_to_single_ids() {
        let tok = WordTokenizer::new(&[]);
        let ids = check_sentinels(&tok).unwrap();
        assert_eq!(ids, [3, 4, 5]);
        assert_eq!(sentinel_token_id(&tok, SOURCE_BLOCK_SEP_TOKEN).unwrap(), 3);
    }

    #[test]
    fn multi_id_sentinel_is_rejected() {
        let tok = WordTokenizer::new(&[]);
        assert!(sentinel_token_id(&tok, "two words").is_err());
        assert!(sentinel_token_id(&tok, "").is_err());
    }

    #[test]
    fn source_specials_use_block_separator_sentinel() {
        let tok = WordTokenizer::new(&[]);
        let specials = source_special_tokens(&tok).unwrap();
        assert_eq!(specials, SpecialTokenSet { pad: 0, eos: 1, unk: 2, block_separator: 3 });
    }

    #[test]
    fn truncated_encoding_ends_with_eos() {
        let tok = WordTokenizer::new(&["a", "b", "c", "d"]);
        let ids = encode_truncated(&tok, "a b c d", 3).unwrap();
        assert_eq!(ids, vec![tok.id("a"), tok.id("b"), EOS]);
        let ids = encode_truncated(&tok, "a b", 8).unwrap();
        assert_eq!(ids, vec![tok.id("a"), tok.id("b"), EOS]);
    }
}
