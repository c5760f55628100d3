use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

pub const SCHEMA_VERSION: &str = "kairos.v1";

/// Run statistics attached to a result envelope.
#[derive(Debug, Clone, Serialize, Default, PartialEq, Eq)]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u128>,
    /// Input records the command read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<usize>,
}

impl Meta {
    pub fn since(started: Instant) -> Self {
        Meta { duration_ms: Some(started.elapsed().as_millis()), ..Meta::default() }
    }

    pub fn with_records(self, records: usize, skipped: usize) -> Self {
        Meta { records: Some(records), skipped: Some(skipped), ..self }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    pub schema_version: &'static str,
    pub time: DateTime<Utc>,
    pub request_id: Uuid,
    pub op: &'static str,
    /// False for a plan, true once the command has run.
    pub apply: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl Envelope {
    pub fn plan<T: Serialize>(op: &'static str, plan: &T, meta: Option<Meta>) -> Result<Self, serde_json::Error> {
        Ok(Self::stamped(op, false, Some(serde_json::to_value(plan)?), None, meta))
    }

    pub fn result<T: Serialize>(op: &'static str, result: &T, meta: Option<Meta>) -> Result<Self, serde_json::Error> {
        Ok(Self::stamped(op, true, None, Some(serde_json::to_value(result)?), meta))
    }

    /// Payload of whichever side is set.
    pub fn payload(&self) -> Option<&Value> {
        if self.apply { self.result.as_ref() } else { self.plan.as_ref() }
    }

    fn stamped(op: &'static str, apply: bool, plan: Option<Value>, result: Option<Value>, meta: Option<Meta>) -> Self {
        Envelope {
            schema_version: SCHEMA_VERSION,
            time: Utc::now(),
            request_id: Uuid::new_v4(),
            op,
            apply,
            plan,
            result,
            meta,
        }
    }
}
