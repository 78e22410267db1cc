//! The Guardrail orchestrator: the policy-bound plan/execute pipeline.
//!
//! `Guardrail` enforces the pipeline ordering:
//!
//!   plan:    Planner → [RiskAnalyzer → Simulator] per step → PolicyEngine → Audit
//!   execute: Policy gate → Seal check → Approver → [Executor → Audit] per step, in order
//!
//! The security invariant is absolute: `Executor::execute_tx()` is NEVER
//! called for a plan whose policy decision is not `allowed`, and the policy
//! engine runs exactly once per plan, after every step has been enriched.
//!
//! Every sealed plan's SHA-256 digest is remembered, and `execute` only runs
//! a plan whose content still hashes to a digest recorded under its id.

use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};

use chrono::Utc;
use futures_util::future::join_all;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use guardrail_contracts::{
    error::{GuardrailError, GuardrailResult},
    execution::{ApprovalRequest, ExecutionRecord, ExecutionReport},
    intent::Intent,
    plan::{ChainId, Plan, PlanId, PlanStep},
};

use crate::traits::{
    Approver, AuditWriter, Executor, Planner, PolicyEngine, RiskAnalyzer, Simulator,
};

/// The orchestrator that wires planner, analysis, policy, execution and audit.
///
/// One `Guardrail` serves one chain. The planner, simulator, executor and
/// policy engine are mandatory; the risk analyzer, audit writer and approver
/// are optional and skipped when absent.
pub struct Guardrail {
    chain_id: ChainId,
    planner: Box<dyn Planner>,
    simulator: Box<dyn Simulator>,
    executor: Box<dyn Executor>,
    policy: Box<dyn PolicyEngine>,
    risk_analyzer: Option<Box<dyn RiskAnalyzer>>,
    audit: Option<Box<dyn AuditWriter>>,
    approver: Option<Box<dyn Approver>>,
    sealed: Mutex<HashMap<PlanId, [u8; 32]>>,
}

/// SHA-256 over the plan's JSON form, policy decision included.
fn plan_digest(plan: &Plan) -> Option<[u8; 32]> {
    let bytes = serde_json::to_vec(plan).ok()?;
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&Sha256::digest(&bytes));
    Some(digest)
}

impl Guardrail {
    /// Create an orchestrator with the mandatory collaborators.
    pub fn new(
        chain_id: ChainId,
        planner: Box<dyn Planner>,
        simulator: Box<dyn Simulator>,
        executor: Box<dyn Executor>,
        policy: Box<dyn PolicyEngine>,
    ) -> Self {
        Self {
            chain_id,
            planner,
            simulator,
            executor,
            policy,
            risk_analyzer: None,
            audit: None,
            approver: None,
            sealed: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_risk_analyzer(mut self, analyzer: Box<dyn RiskAnalyzer>) -> Self {
        self.risk_analyzer = Some(analyzer);
        self
    }

    pub fn with_audit(mut self, audit: Box<dyn AuditWriter>) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn with_approver(mut self, approver: Box<dyn Approver>) -> Self {
        self.approver = Some(approver);
        self
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    /// Plan `action` with loosely-typed `params`. See [`Guardrail::plan_intent`].
    pub async fn plan(&self, action: impl Into<String>, params: Value) -> GuardrailResult<Plan> {
        self.plan_intent(Intent::new(action, params)).await
    }

    /// Turn an intent into a fully analyzed, policy-evaluated plan.
    ///
    /// # Pipeline
    ///
    /// 1. `planner.plan()` builds the draft (errors propagate unchanged)
    /// 2. Every step, concurrently across steps:
    ///    a. risk analyzer flags are merged into the planner's seeded flags
    ///    b. the simulator dry-runs the enriched step
    /// 3. Join barrier: `policy.evaluate_plan()` runs once over all steps
    /// 4. The draft is sealed with the decision
    /// 5. The audit writer (if any) records the plan
    ///
    /// A denied plan is still returned and audited; only `execute` refuses it.
    pub async fn plan_intent(&self, intent: Intent) -> GuardrailResult<Plan> {
        debug!(
            action = %intent.action,
            chain_id = self.chain_id,
            "planning intent"
        );

        let mut draft = self.planner.plan(self.chain_id, &intent).await?;
        let plan_id = draft.id;

        let steps = std::mem::take(&mut draft.steps);
        draft.steps = join_all(
            steps
                .into_iter()
                .enumerate()
                .map(|(index, step)| self.enrich_step(plan_id, index, step)),
        )
        .await;

        let decision = self.policy.evaluate_plan(&draft);
        if decision.allowed {
            info!(
                plan_id = %plan_id,
                steps = draft.steps.len(),
                violations = decision.violations.len(),
                "plan sealed as allowed"
            );
        } else {
            warn!(
                plan_id = %plan_id,
                blocking = decision.blocking().count(),
                violations = decision.violations.len(),
                "plan sealed as denied"
            );
        }

        let plan = draft.seal(decision);
        match plan_digest(&plan) {
            Some(digest) => {
                self.sealed
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(plan.id, digest);
            }
            None => warn!(plan_id = %plan.id, "plan could not be digested and will not execute"),
        }

        if let Some(audit) = &self.audit {
            audit.write_plan(&plan).await?;
        }

        Ok(plan)
    }

    /// Risk analysis then simulation for one step. Never fails.
    async fn enrich_step(&self, plan_id: PlanId, index: usize, mut step: PlanStep) -> PlanStep {
        if let Some(analyzer) = &self.risk_analyzer {
            let flags = analyzer.analyze_step(&step, self.chain_id);
            step.merge_risk_flags(flags);
        }

        let simulation = self.simulator.simulate_tx(&step, self.chain_id).await;
        if simulation.ok {
            debug!(
                plan_id = %plan_id,
                step = index,
                gas_estimate = ?simulation.gas_estimate,
                "step simulated"
            );
        } else {
            warn!(
                plan_id = %plan_id,
                step = index,
                error = simulation.error.as_deref().unwrap_or("unknown"),
                "step simulation failed"
            );
        }
        step.simulation = Some(simulation);
        step
    }

    /// Execute an allowed plan, one step at a time.
    ///
    /// # Errors
    ///
    /// - `PolicyBlocked` if the plan's decision is not allowed (no side effects)
    /// - `ChainMismatch` if the plan was built for another chain
    /// - `UnsealedPlan` if this orchestrator did not seal the plan, or the
    ///   plan changed after sealing
    /// - `ApprovalRejected` if the configured approver declines
    /// - `ExecutionFailure` if a submission or its audit write fails; the
    ///   error carries every receipt obtained before the failure
    pub async fn execute(&self, plan: &Plan) -> GuardrailResult<ExecutionReport> {
        let policy = plan.policy();
        if !policy.allowed {
            warn!(
                plan_id = %plan.id,
                blocking = policy.blocking().count(),
                "policy blocked execution"
            );
            return Err(GuardrailError::PolicyBlocked {
                plan_id: plan.id,
                summary: policy.summary(),
            });
        }

        if plan.chain_id != self.chain_id {
            return Err(GuardrailError::ChainMismatch {
                expected: self.chain_id,
                actual: plan.chain_id,
            });
        }

        if !self.is_sealed(plan) {
            warn!(plan_id = %plan.id, "plan does not match its sealed digest");
            return Err(GuardrailError::UnsealedPlan { plan_id: plan.id });
        }

        if let Some(approver) = &self.approver {
            let request = ApprovalRequest {
                plan,
                summary: &plan.explain.summary,
            };
            if !approver.approve(request).await {
                warn!(plan_id = %plan.id, "approver rejected execution");
                return Err(GuardrailError::ApprovalRejected { plan_id: plan.id });
            }
            debug!(plan_id = %plan.id, "approver accepted execution");
        }

        // Strictly sequential: a sending account's nonces must be consumed
        // in order, and audit order must match submission order.
        let mut receipts = Vec::with_capacity(plan.steps.len());
        for (index, step) in plan.steps.iter().enumerate() {
            let receipt = match self.executor.execute_tx(step, self.chain_id).await {
                Ok(receipt) => receipt,
                Err(e) => {
                    warn!(
                        plan_id = %plan.id,
                        step = index,
                        error = %e,
                        "step submission failed"
                    );
                    return Err(GuardrailError::ExecutionFailure {
                        plan_id: plan.id,
                        step_index: index,
                        reason: e.to_string(),
                        receipts,
                    });
                }
            };

            info!(
                plan_id = %plan.id,
                step = index,
                tx_hash = %receipt.tx_hash,
                "step submitted"
            );
            receipts.push(receipt);

            if let Some(audit) = &self.audit {
                let record = ExecutionRecord {
                    plan_id: plan.id,
                    step_index: index,
                    step: step.clone(),
                    receipt,
                    recorded_at: Utc::now(),
                };
                if let Err(e) = audit.write_execution(&plan.id, &record).await {
                    warn!(
                        plan_id = %plan.id,
                        step = index,
                        error = %e,
                        "execution record could not be audited"
                    );
                    return Err(GuardrailError::ExecutionFailure {
                        plan_id: plan.id,
                        step_index: index,
                        reason: e.to_string(),
                        receipts,
                    });
                }
            }
        }

        Ok(ExecutionReport {
            plan_id: plan.id,
            receipts,
        })
    }

    fn is_sealed(&self, plan: &Plan) -> bool {
        let sealed = self.sealed.lock().unwrap_or_else(PoisonError::into_inner);
        match (sealed.get(&plan.id), plan_digest(plan)) {
            (Some(recorded), Some(actual)) => *recorded == actual,
            _ => false,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
