//! Error types for the Guardrail pipeline.
//!
//! All fallible operations return `GuardrailResult<T>`. Simulation and risk
//! analysis never fail; they degrade to `ok: false` results and empty flag
//! lists instead.

use thiserror::Error;

use crate::{
    execution::ExecutionReceipt,
    plan::{ChainId, PlanId},
};

/// The unified error type for the Guardrail crates.
#[derive(Debug, Error)]
pub enum GuardrailError {
    /// The planner was asked to plan for a chain it is not configured for.
    #[error("planner configured for chain {expected}, got {actual}")]
    ChainMismatch { expected: ChainId, actual: ChainId },

    /// The action name is not in the planner's catalog.
    #[error("unknown action: {action}")]
    UnknownAction { action: String },

    /// The parameters do not match the action's typed parameter structure.
    #[error("invalid params for action '{action}': {reason}")]
    InvalidParams { action: String, reason: String },

    /// The policy configuration is malformed. Raised at construction only.
    #[error("invalid policy config: {reason}")]
    InvalidPolicyConfig { reason: String },

    /// The plan carries at least one `high` violation.
    #[error("policy blocked execution of plan {plan_id}:\n{summary}")]
    PolicyBlocked { plan_id: PlanId, summary: String },

    /// The plan was not sealed by this orchestrator, or was edited after sealing.
    #[error("plan {plan_id} does not match any plan this orchestrator sealed")]
    UnsealedPlan { plan_id: PlanId },

    /// The configured approver declined the plan.
    #[error("execution of plan {plan_id} rejected by approver")]
    ApprovalRejected { plan_id: PlanId },

    /// An executor could not submit a transaction (no signer, RPC rejection).
    #[error("transaction submission failed: {reason}")]
    Submission { reason: String },

    /// A step failed during `execute`. `receipts` holds every step that was
    /// submitted (and audited) before the failure, in order.
    #[error(
        "execution of plan {plan_id} failed at step {step_index} after {} receipt(s): {reason}",
        .receipts.len()
    )]
    ExecutionFailure {
        plan_id: PlanId,
        step_index: usize,
        reason: String,
        receipts: Vec<ExecutionReceipt>,
    },

    /// The audit writer could not persist a plan or execution record.
    #[error("audit write failed: {reason}")]
    AuditWriteFailed { reason: String },
}

/// Convenience alias used throughout the Guardrail crates.
pub type GuardrailResult<T> = Result<T, GuardrailError>;
