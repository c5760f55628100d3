//! Word-level morphological tags and their projection onto sub-tokens.

pub mod broadcast;
pub mod vocab;

pub use broadcast::{broadcast_tags, MetaTagIds, SpecialRole, SpecialTokenSet, TagId};
pub use vocab::{TagVocabulary, VocabError};
