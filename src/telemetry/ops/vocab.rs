use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Vocab;

#[derive(Copy, Clone, Debug)]
pub enum Phase { ReadRecords, Build, Plan, Save }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::ReadRecords => "read_records",
        Phase::Build => "build",
        Phase::Plan => "plan",
        Phase::Save => "save",
    }}
    fn span(&self) -> Span { match self {
        Phase::ReadRecords => info_span!("read_records"),
        Phase::Build => info_span!("build"),
        Phase::Plan => info_span!("plan"),
        Phase::Save => info_span!("save"),
    }}
}

impl OpMarker for Vocab {
    const NAME: &'static str = "vocab";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("vocab") }
}
