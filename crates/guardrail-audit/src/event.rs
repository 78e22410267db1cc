//! Audit event and log types.
//!
//! `AuditRecord` is what the orchestrator hands to an audit writer: a sealed
//! plan or one executed step. `AuditEvent` wraps a record with its sequence
//! number and the SHA-256 hashes that link it into the chain. `AuditLog` is
//! a point-in-time export of the whole chain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use guardrail_contracts::{
    execution::ExecutionRecord,
    plan::{Plan, PlanId},
};

/// One thing worth remembering about a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "record", rename_all = "camelCase")]
pub enum AuditRecord {
    /// The plan as sealed by `Guardrail::plan`, policy decision included.
    Plan(Box<Plan>),
    /// One submitted step and its receipt.
    Execution(ExecutionRecord),
}

impl AuditRecord {
    pub fn plan_id(&self) -> PlanId {
        match self {
            AuditRecord::Plan(plan) => plan.id,
            AuditRecord::Execution(record) => record.plan_id,
        }
    }

    pub fn is_plan(&self) -> bool {
        matches!(self, AuditRecord::Plan(_))
    }
}

/// A single entry in the SHA-256 hash chain.
///
/// Each event commits to the previous event via `prev_hash`. Modifying any
/// field, including those of the embedded `record`, invalidates `this_hash`
/// and every later `prev_hash`; `verify_chain` detects both.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    /// Position in the chain, starting at 0.
    pub sequence: u64,

    /// The plan this event belongs to.
    pub plan_id: PlanId,

    pub record: AuditRecord,

    /// Hex SHA-256 of the previous event, or `GENESIS_HASH` for the first.
    pub prev_hash: String,

    /// Hex SHA-256 over (plan_id, sequence, prev_hash, canonical JSON of record).
    pub this_hash: String,
}

impl AuditEvent {
    /// The `prev_hash` of the first event in every chain.
    pub const GENESIS_HASH: &'static str =
        "0000000000000000000000000000000000000000000000000000000000000000";
}

/// An exported copy of the chain.
///
/// `terminal_hash` is the `this_hash` of the last event and commits to the
/// entire log. It is empty when nothing has been written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    pub events: Vec<AuditEvent>,
    pub exported_at: DateTime<Utc>,
    pub terminal_hash: String,
}

impl AuditLog {
    /// Events recorded for `plan_id`, in chain order.
    pub fn events_for(&self, plan_id: &PlanId) -> impl Iterator<Item = &AuditEvent> {
        let plan_id = *plan_id;
        self.events.iter().filter(move |e| e.plan_id == plan_id)
    }
}
