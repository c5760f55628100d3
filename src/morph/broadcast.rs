use serde::{Deserialize, Serialize};

use crate::blocks::partition;
use crate::error::AlignError;
use crate::tokenizer::TokenId;

pub type TagId = u32;

/// Structural role of a special token.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SpecialRole {
    Pad,
    Eos,
    Unk,
    BlockSeparator,
}

/// Token ids the tokenizer assigns to each structural role.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialTokenSet {
    pub pad: TokenId,
    pub eos: TokenId,
    pub unk: TokenId,
    pub block_separator: TokenId,
}

impl SpecialTokenSet {
    /// Role played by `token`, if any.
    ///
    /// When a vocabulary maps two roles to one id the later role in
    /// separator, eos, pad, unk order wins.
    pub fn role_of(&self, token: TokenId) -> Option<SpecialRole> {
        if token == self.unk {
            Some(SpecialRole::Unk)
        } else if token == self.pad {
            Some(SpecialRole::Pad)
        } else if token == self.eos {
            Some(SpecialRole::Eos)
        } else if token == self.block_separator {
            Some(SpecialRole::BlockSeparator)
        } else {
            None
        }
    }
}

/// Reserved tag ids standing in for special tokens in a tag stream.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaTagIds {
    pub pad: TagId,
    pub eos: TagId,
    pub unk: TagId,
    pub block_separator: TagId,
}

impl MetaTagIds {
    pub fn for_role(&self, role: SpecialRole) -> TagId {
        match role {
            SpecialRole::Pad => self.pad,
            SpecialRole::Eos => self.eos,
            SpecialRole::Unk => self.unk,
            SpecialRole::BlockSeparator => self.block_separator,
        }
    }
}

/// Spread one tag per word over the sub-tokens of that word's block.
///
/// `sub_tokens` must already be reconciled to exactly one block per entry of
/// `word_tags`. Positions holding a special token get the matching meta-tag
/// instead of the word tag.
pub fn broadcast_tags(
    word_tags: &[TagId],
    sub_tokens: &[TokenId],
    specials: &SpecialTokenSet,
    meta: &MetaTagIds,
) -> Result<Vec<TagId>, AlignError> {
    let blocks = partition(sub_tokens, &specials.block_separator);
    if blocks.len() != word_tags.len() {
        return Err(AlignError::BlockCountMismatch {
            expected: blocks.len(),
            found: word_tags.len(),
        });
    }

    let mut out = Vec::with_capacity(sub_tokens.len());
    for (block, &tag) in blocks.iter().zip(word_tags) {
        for &tok in block.iter() {
            let aligned = match specials.role_of(tok) {
                Some(role) => meta.for_role(role),
                None => tag,
            };
            out.push(aligned);
        }
    }
    Ok(out)
}
