//! Morphological tag vocabulary.
//!
//! Built once per run from every tag seen in the training and evaluation
//! splits, then shared read-only. Meta-tags always take ids `0..4`.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::tokenizer::SOURCE_BLOCK_SEP_TOKEN;

use super::broadcast::{MetaTagIds, TagId};

pub const PAD_TAG: &str = "<pad>";
pub const EOS_TAG: &str = "<eos>";
pub const UNK_TAG: &str = "<unk>";
pub const BLOCK_SEP_TAG: &str = SOURCE_BLOCK_SEP_TOKEN;

/// Meta-tag keys in id order.
pub const META_TAGS: [&str; 4] = [PAD_TAG, EOS_TAG, UNK_TAG, BLOCK_SEP_TAG];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagVocabulary {
    id_to_tag: Vec<String>,
    tag_to_id: HashMap<String, TagId>,
    meta: MetaTagIds,
}

/// On-disk layout: meta keys and the flat key -> id mapping.
#[derive(Debug, Serialize, Deserialize)]
struct VocabFile {
    special_tokens: BTreeMap<String, TagId>,
    encodings: BTreeMap<String, TagId>,
}

impl TagVocabulary {
    /// Assign ids in first-seen order, meta-tags first.
    pub fn build<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut id_to_tag: Vec<String> = Vec::new();
        let mut tag_to_id: HashMap<String, TagId> = HashMap::new();
        let meta_iter = META_TAGS.iter().map(|t| t.to_string());
        let seen_iter = tags.into_iter().map(|t| t.as_ref().to_string());
        for tag in meta_iter.chain(seen_iter) {
            if tag_to_id.contains_key(&tag) {
                continue;
            }
            tag_to_id.insert(tag.clone(), id_to_tag.len() as TagId);
            id_to_tag.push(tag);
        }
        debug!(size = id_to_tag.len(), "built tag vocabulary");
        Self {
            id_to_tag,
            tag_to_id,
            meta: MetaTagIds { pad: 0, eos: 1, unk: 2, block_separator: 3 },
        }
    }

    /// Id of `tag`, or the `unk` meta-tag for anything never observed.
    pub fn encode(&self, tag: &str) -> TagId {
        self.tag_to_id.get(tag).copied().unwrap_or(self.meta.unk)
    }

    pub fn encode_all<S: AsRef<str>>(&self, tags: &[S]) -> Vec<TagId> {
        tags.iter().map(|t| self.encode(t.as_ref())).collect()
    }

    pub fn tag(&self, id: TagId) -> Option<&str> {
        self.id_to_tag.get(id as usize).map(String::as_str)
    }

    pub fn meta_tags(&self) -> MetaTagIds {
        self.meta
    }

    pub fn len(&self) -> usize {
        self.id_to_tag.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_tag.is_empty()
    }

    /// Flat key -> id mapping, meta-tags included.
    pub fn to_mapping(&self) -> BTreeMap<String, TagId> {
        self.tag_to_id.iter().map(|(k, v)| (k.clone(), *v)).collect()
    }

    /// Rebuild from a flat key -> id mapping.
    pub fn from_mapping(mapping: BTreeMap<String, TagId>) -> Result<Self, VocabError> {
        let meta_id = |key: &'static str| mapping.get(key).copied().ok_or(VocabError::MissingMetaTag(key));
        let meta = MetaTagIds {
            pad: meta_id(PAD_TAG)?,
            eos: meta_id(EOS_TAG)?,
            unk: meta_id(UNK_TAG)?,
            block_separator: meta_id(BLOCK_SEP_TAG)?,
        };

        let mut slots: Vec<Option<String>> = vec![None; mapping.len()];
        for (tag, &id) in &mapping {
            match slots.get_mut(id as usize) {
                Some(slot) if slot.is_none() => *slot = Some(tag.clone()),
                _ => return Err(VocabError::NonContiguous { tag: tag.clone(), id }),
            }
        }
        // every slot is filled: n distinct ids below n
        let id_to_tag: Vec<String> = slots.into_iter().flatten().collect();
        let tag_to_id: HashMap<String, TagId> = mapping.into_iter().collect();
        Ok(Self { id_to_tag, tag_to_id, meta })
    }

    pub fn save(&self, path: &Path) -> Result<(), VocabError> {
        let special_tokens = META_TAGS
            .iter()
            .map(|key| (key.to_string(), self.encode(key)))
            .collect();
        let file = VocabFile { special_tokens, encodings: self.to_mapping() };
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &file)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, VocabError> {
        let reader = BufReader::new(File::open(path)?);
        let file: VocabFile = serde_json::from_reader(reader)?;
        let vocab = Self::from_mapping(file.encodings)?;
        for (key, id) in file.special_tokens {
            if vocab.tag_to_id.get(&key) != Some(&id) {
                return Err(VocabError::NonContiguous { tag: key, id });
            }
        }
        Ok(vocab)
    }
}

#[derive(Debug)]
pub enum VocabError {
    Io(std::io::Error),
    Json(serde_json::Error),
    MissingMetaTag(&'static str),
    NonContiguous { tag: String, id: TagId },
}

impl fmt::Display for VocabError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VocabError::Io(err) => write!(f, "vocabulary io: {err}"),
            VocabError::Json(err) => write!(f, "vocabulary json: {err}"),
            VocabError::MissingMetaTag(key) => write!(f, "vocabulary is missing meta-tag {key}"),
            VocabError::NonContiguous { tag, id } => {
                write!(f, "vocabulary id {id} for {tag:?} is duplicated or out of range")
            }
        }
    }
}

impl std::error::Error for VocabError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VocabError::Io(err) => Some(err),
            VocabError::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for VocabError {
    fn from(err: std::io::Error) -> Self {
        VocabError::Io(err)
    }
}

impl From<serde_json::Error> for VocabError {
    fn from(err: serde_json::Error) -> Self {
        VocabError::Json(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> TagVocabulary {
        let train = [vec!["CONJ", "VERB"], vec!["NOUN", "VERB"]];
        let test = [vec!["ADJ", "CONJ"]];
        TagVocabulary::build(train.iter().chain(test.iter()).flatten())
    }

    #[test]
    fn meta_tags_come_first() {
        let vocab = sample();
        assert_eq!(vocab.tag(0), Some(PAD_TAG));
        assert_eq!(vocab.tag(3), Some(BLOCK_SEP_TAG));
        assert_eq!(vocab.meta_tags(), MetaTagIds { pad: 0, eos: 1, unk: 2, block_separator: 3 });
    }

    #[test]
    fn ids_follow_first_seen_order() {
        let vocab = sample();
        assert_eq!(vocab.encode_all(&["CONJ", "VERB", "NOUN", "ADJ"]), vec![4, 5, 6, 7]);
        assert_eq!(vocab.len(), 8);
    }

    #[test]
    fn unknown_tag_encodes_to_unk() {
        let vocab = sample();
        assert_eq!(vocab.encode("PREP"), vocab.meta_tags().unk);
    }

    #[test]
    fn mapping_round_trips() {
        let vocab = sample();
        let rebuilt = TagVocabulary::from_mapping(vocab.to_mapping()).unwrap();
        assert_eq!(rebuilt, vocab);
    }

    #[test]
    fn mapping_without_meta_tag_is_rejected() {
        let mut mapping = sample().to_mapping();
        mapping.remove(EOS_TAG);
        assert!(matches!(TagVocabulary::from_mapping(mapping), Err(VocabError::MissingMetaTag(EOS_TAG))));
    }

    #[test]
    fn mapping_with_gap_is_rejected() {
        let mut mapping = sample().to_mapping();
        mapping.insert("PART".into(), 42);
        assert!(matches!(TagVocabulary::from_mapping(mapping), Err(VocabError::NonContiguous { .. })));
    }

    #[test]
    fn save_and_load_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("morph_vocabulary.json");
        let vocab = sample();
        vocab.save(&path).unwrap();
        let loaded = TagVocabulary::load(&path).unwrap();
        assert_eq!(loaded, vocab);
        assert_eq!(loaded.encode("NOUN"), 6);
    }
}
