//! Collaborator trait definitions for the Guardrail pipeline.
//!
//! These traits define every seam the orchestrator composes:
//!
//! - `Planner`     : turns an intent into a draft plan (knows the action catalog)
//! - `RiskAnalyzer`: pure per-step hazard detection
//! - `Simulator`   : dry-runs a step; never fails
//! - `PolicyEngine`: pure per-plan allow/deny, evaluated exactly once
//! - `Approver`    : optional human (or automated) sign-off
//! - `Executor`    : submits a step as a real transaction
//! - `AuditWriter` : durable record of plans and execution outcomes
//!
//! Implementations of `Executor` are never called unless the plan's policy
//! decision allows it.

use async_trait::async_trait;

use guardrail_contracts::{
    error::GuardrailResult,
    execution::{ApprovalRequest, ExecutionReceipt, ExecutionRecord},
    intent::Intent,
    plan::{ChainId, Plan, PlanDraft, PlanId, PlanStep, SimulationResult},
    policy::PolicyDecision,
    risk::RiskFlag,
};

/// Translates an intent into an unscored draft plan.
#[async_trait]
pub trait Planner: Send + Sync {
    /// Build a draft plan for `intent` on `chain_id`.
    ///
    /// Fails with `ChainMismatch` when `chain_id` is not the planner's chain,
    /// `UnknownAction` for names outside the catalog and `InvalidParams` when
    /// the params do not fit the action.
    async fn plan(&self, chain_id: ChainId, intent: &Intent) -> GuardrailResult<PlanDraft>;
}

/// Inspects a single step and reports hazards.
///
/// Implementations must be pure: no I/O, no failure. Anything that cannot be
/// analyzed yields an empty list.
pub trait RiskAnalyzer: Send + Sync {
    fn analyze_step(&self, step: &PlanStep, chain_id: ChainId) -> Vec<RiskFlag>;
}

/// Dry-runs a step against current chain state.
#[async_trait]
pub trait Simulator: Send + Sync {
    /// Never fails: reverts and transport errors come back as `ok: false`.
    async fn simulate_tx(&self, step: &PlanStep, chain_id: ChainId) -> SimulationResult;
}

/// The policy gate. Evaluated once per plan, after all enrichment.
///
/// Implementations are trusted and must be deterministic.
pub trait PolicyEngine: Send + Sync {
    fn evaluate_plan(&self, plan: &PlanDraft) -> PolicyDecision;
}

/// Optional sign-off requested after the policy gate and before any submission.
#[async_trait]
pub trait Approver: Send + Sync {
    /// Return true to approve execution.
    async fn approve(&self, request: ApprovalRequest<'_>) -> bool;
}

/// Submits one step as a real transaction.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Returns the transaction hash, or `GuardrailError::Submission` when no
    /// signer is available or the node rejects the transaction.
    async fn execute_tx(&self, step: &PlanStep, chain_id: ChainId) -> GuardrailResult<ExecutionReceipt>;
}

/// The durable audit trail.
///
/// Implementations must treat both calls as append-only: a plan record is
/// written once, and execution records are never overwritten.
#[async_trait]
pub trait AuditWriter: Send + Sync {
    /// Persist the completed plan (called once, right after policy evaluation).
    async fn write_plan(&self, plan: &Plan) -> GuardrailResult<()>;

    /// Persist the outcome of one executed step.
    async fn write_execution(&self, plan_id: &PlanId, record: &ExecutionRecord) -> GuardrailResult<()>;
}
