//! Execution receipts, audit records and approval requests.
//!
//! `ExecutionReceipt` is what the executor returns per step.
//! `ExecutionRecord` is what gets written to the audit log, one per step,
//! written before the next step is submitted.

use alloy_primitives::B256;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::plan::{Plan, PlanId, PlanStep};

/// Proof that one step was submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReceipt {
    pub tx_hash: B256,
}

/// Result of a fully executed plan. Receipts are in step order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReport {
    pub plan_id: PlanId,
    pub receipts: Vec<ExecutionReceipt>,
}

/// An immutable record of one submitted step, handed to the audit writer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    pub plan_id: PlanId,
    /// Zero-based position of the step in `Plan::steps`.
    pub step_index: usize,
    pub step: PlanStep,
    pub receipt: ExecutionReceipt,
    /// Wall-clock time the record was created (UTC).
    pub recorded_at: DateTime<Utc>,
}

/// What an approver is shown before execution starts.
#[derive(Debug, Clone, Copy)]
pub struct ApprovalRequest<'a> {
    pub plan: &'a Plan,
    /// The plan's top-level explanation summary.
    pub summary: &'a str,
}
