use anyhow::Result;
use serde::Serialize;

use crate::output::config::{OutputConfig, OutputFormat};
use crate::output::types::{Envelope, Meta};
use crate::output::Emitter;

use super::config;

/// `--json` forces the JSON presenter; otherwise the environment decides.
fn resolve(base: OutputConfig, json: bool) -> OutputConfig {
    if json { OutputConfig { format: OutputFormat::Json, ..base } } else { base }
}

fn emitter() -> Emitter {
    Emitter::new(resolve(OutputConfig::from_env(), config::json_mode()))
}

pub fn print_plan<T: Serialize>(op: &'static str, plan: &T, meta: Option<Meta>) -> Result<()> {
    let env = Envelope::plan(op, plan, meta)?;
    emitter().emit(&env)?;
    Ok(())
}

pub fn print_result<T: Serialize>(op: &'static str, result: &T, meta: Option<Meta>) -> Result<()> {
    let env = Envelope::result(op, result, meta)?;
    emitter().emit(&env)?;
    Ok(())
}
