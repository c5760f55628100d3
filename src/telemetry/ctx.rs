use std::marker::PhantomData;
use std::time::Instant;

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, error, info, warn, Span};

use super::emit;
use super::ops::{evaluate::Evaluate, preprocess::Preprocess};
use crate::output::types::Meta;

pub trait PhaseSpan {
    fn name(&self) -> &'static str;
    fn span(&self) -> Span;
}

pub trait OpMarker {
    const NAME: &'static str;
    type Phase: PhaseSpan;
    fn root_span() -> Span;
}

/// Logging handle typed by the command it serves.
pub struct LogCtx<O: OpMarker> {
    json: bool,
    _marker: PhantomData<O>,
}

impl<O: OpMarker> LogCtx<O> {
    pub(crate) fn new(json: bool) -> Self {
        Self { json, _marker: PhantomData }
    }

    fn op_name(&self) -> &'static str { O::NAME }

    pub fn root_span(&self) -> Span { O::root_span() }

    pub fn root_span_kv<'a, T>(&self, fields: T) -> Span
    where
        T: IntoIterator<Item = (&'a str, String)>,
    {
        let span = self.root_span();
        let details = kv_to_string(fields);
        if details.is_empty() {
            info!(op = %self.op_name(), "start");
        } else {
            info!(op = %self.op_name(), details = %details, "start");
        }
        span
    }

    pub fn span(&self, ph: &O::Phase) -> Span { ph.span() }

    pub fn info(&self, msg: impl AsRef<str>) { if self.json { info!(op = %self.op_name(), "{}", msg.as_ref()); } else { info!("{}", msg.as_ref()); } }
    pub fn debug(&self, msg: impl AsRef<str>) { if self.json { debug!(op = %self.op_name(), "{}", msg.as_ref()); } else { debug!("{}", msg.as_ref()); } }
    pub fn warn(&self, msg: impl AsRef<str>) { if self.json { warn!(op = %self.op_name(), "{}", msg.as_ref()); } else { warn!("{}", msg.as_ref()); } }
    pub fn error(&self, msg: impl AsRef<str>) { if self.json { error!(op = %self.op_name(), "{}", msg.as_ref()); } else { error!("{}", msg.as_ref()); } }

    pub fn info_kv<'a, D>(&self, msg: &str, kv: D)
    where
        D: IntoIterator<Item = (&'a str, String)>,
    {
        if self.json { let details = kv_to_string(kv); info!(op = %self.op_name(), details = %details, "{}", msg); }
        else { info!("{}", msg); }
    }

    pub fn plan<T: Serialize>(&self, plan: &T) -> Result<()> { emit::print_plan(self.op_name(), plan, None) }

    /// Result envelope with the elapsed time since `started` and the record counts.
    pub fn result_timed<T: Serialize>(&self, result: &T, started: Instant, records: usize, skipped: usize) -> Result<()> {
        let meta = Meta::since(started).with_records(records, skipped);
        emit::print_result(self.op_name(), result, Some(meta))
    }
}

impl LogCtx<Preprocess> {
    pub fn batch_summary(&self, kept: usize, skipped: usize) {
        if self.json { info!(op = %self.op_name(), kept, skipped, "preprocess_totals"); }
        else { info!("📊 Preprocess totals: kept={} skipped={}", kept, skipped); }
    }
}

impl LogCtx<Evaluate> {
    pub fn metric(&self, name: &str, value: f64) {
        if self.json { info!(op = %self.op_name(), metric = name, value, "metric"); }
        else { info!("  {:<40} {:.4}", name, value); }
    }
}

fn kv_to_string<'a, T>(kv: T) -> String
where
    T: IntoIterator<Item = (&'a str, String)>,
{
    let mut parts: Vec<String> = Vec::new();
    for (k, v) in kv { parts.push(format!("{}={}", k, v)); }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kv_pairs_render_in_order() {
        let s = kv_to_string([("input", "verses.jsonl".to_string()), ("apply", "false".to_string())]);
        assert_eq!(s, "input=verses.jsonl apply=false");
        assert_eq!(kv_to_string(Vec::<(&str, String)>::new()), "");
    }
}
