use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Evaluate;

#[derive(Copy, Clone, Debug)]
pub enum Phase { ReadPairs, Score }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::ReadPairs => "read_pairs",
        Phase::Score => "score",
    }}
    fn span(&self) -> Span { match self {
        Phase::ReadPairs => info_span!("read_pairs"),
        Phase::Score => info_span!("score"),
    }}
}

impl OpMarker for Evaluate {
    const NAME: &'static str = "evaluate";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("evaluate") }
}
