use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Preprocess;

#[derive(Copy, Clone, Debug)]
pub enum Phase { ReadRecords, LoadVocab, LoadTokenizer, Plan, Tokenize, Write }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::ReadRecords => "read_records",
        Phase::LoadVocab => "load_vocab",
        Phase::LoadTokenizer => "load_tokenizer",
        Phase::Plan => "plan",
        Phase::Tokenize => "tokenize",
        Phase::Write => "write",
    }}
    fn span(&self) -> Span { match self {
        Phase::ReadRecords => info_span!("read_records"),
        Phase::LoadVocab => info_span!("load_vocab"),
        Phase::LoadTokenizer => info_span!("load_tokenizer"),
        Phase::Plan => info_span!("plan"),
        Phase::Tokenize => info_span!("tokenize"),
        Phase::Write => info_span!("write"),
    }}
}

impl OpMarker for Preprocess {
    const NAME: &'static str = "preprocess";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("preprocess") }
}
