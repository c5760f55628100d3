//! Turning verse records into model inputs.

pub mod collate;
pub mod preprocess;

pub use collate::{collate, Batch, LABEL_PAD};
pub use preprocess::{preprocess_example, BatchOutcome, ModelInput, Preprocessor, SourceType, VerseRecord};
