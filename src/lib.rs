//! Block-structured alignment of sub-word sequences with word-level
//! morphological tags, and block-aware evaluation of generated text.

pub mod blocks;
pub mod config;
pub mod error;
pub mod metrics;
pub mod morph;
pub mod output;
pub mod pipeline;
pub mod telemetry;
pub mod text;
pub mod tokenizer;
pub mod util;

pub use error::AlignError;
