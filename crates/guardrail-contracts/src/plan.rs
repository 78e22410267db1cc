//! Plan and step types.
//!
//! A plan moves through two shapes:
//!
//!   PlanDraft (planner output, enriched by risk analysis + simulation)
//!     → Plan (draft sealed with its one and only `PolicyDecision`)
//!
//! `Plan` exposes its decision read-only, so once a plan exists its policy
//! verdict cannot be recomputed or edited by callers.

use std::fmt;

use alloy_primitives::{Address, Bytes, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{intent::Intent, policy::PolicyDecision, risk::RiskFlag};

/// EVM chain identifier (e.g. 1 for mainnet, 8453 for Base).
pub type ChainId = u64;

/// Unique identifier for a plan. Generated once per `plan()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanId(pub uuid::Uuid);

impl PlanId {
    /// Create a new, unique plan ID.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for PlanId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Human-readable rationale for a plan or a step. Never read by policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explanation {
    pub title: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bullets: Vec<String>,
}

impl Explanation {
    pub fn new(title: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            summary: summary.into(),
            bullets: Vec::new(),
        }
    }

    pub fn with_bullets<I, S>(mut self, bullets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bullets = bullets.into_iter().map(Into::into).collect();
        self
    }
}

/// The transaction a step would submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxRequest {
    /// Destination contract or account.
    pub to: Address,
    /// Calldata. Absent for plain native transfers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Bytes>,
    /// Native value in wei.
    #[serde(
        default,
        with = "crate::quantity::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<U256>,
}

impl TxRequest {
    pub fn new(to: Address) -> Self {
        Self { to, data: None, value: None }
    }

    pub fn with_data(mut self, data: Bytes) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = Some(value);
        self
    }

    /// The native value, treating an absent value as zero.
    pub fn value_or_zero(&self) -> U256 {
        self.value.unwrap_or(U256::ZERO)
    }
}

/// Outcome of dry-running one step against current chain state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_estimate: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_data: Option<Bytes>,
    /// Revert reason or transport error. Present only when `ok` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SimulationResult {
    pub fn succeeded(gas_estimate: u64, return_data: Option<Bytes>) -> Self {
        Self {
            ok: true,
            gas_estimate: Some(gas_estimate),
            return_data,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            gas_estimate: None,
            return_data: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Tx,
}

/// One atomic transaction within a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanStep {
    pub kind: StepKind,
    pub tx: TxRequest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explain: Option<Explanation>,
    /// Accumulated flags. Append-only: see `merge_risk_flags`.
    #[serde(default)]
    pub risk_flags: Vec<RiskFlag>,
    /// Absent until the simulator has run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulation: Option<SimulationResult>,
}

impl PlanStep {
    pub fn tx(tx: TxRequest) -> Self {
        Self {
            kind: StepKind::Tx,
            tx,
            explain: None,
            risk_flags: Vec::new(),
            simulation: None,
        }
    }

    pub fn with_explanation(mut self, explain: Explanation) -> Self {
        self.explain = Some(explain);
        self
    }

    pub fn with_risk_flags(mut self, flags: Vec<RiskFlag>) -> Self {
        self.merge_risk_flags(flags);
        self
    }

    /// Append every flag not already present on the step.
    ///
    /// Existing flags keep their position; nothing is ever removed.
    pub fn merge_risk_flags(&mut self, flags: impl IntoIterator<Item = RiskFlag>) {
        for flag in flags {
            if !self.risk_flags.contains(&flag) {
                self.risk_flags.push(flag);
            }
        }
    }

    pub fn has_flag(&self, code: &str) -> bool {
        self.risk_flags.iter().any(|f| f.code == code)
    }
}

/// A plan before the policy engine has run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDraft {
    pub id: PlanId,
    pub created_at: DateTime<Utc>,
    pub chain_id: ChainId,
    pub intent: Intent,
    pub explain: Explanation,
    pub steps: Vec<PlanStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl PlanDraft {
    /// Sum of all step values, saturating at `U256::MAX`.
    pub fn total_value(&self) -> U256 {
        self.steps
            .iter()
            .fold(U256::ZERO, |acc, s| acc.saturating_add(s.tx.value_or_zero()))
    }

    /// Attach the policy decision, producing the final `Plan`.
    pub fn seal(self, policy: PolicyDecision) -> Plan {
        Plan {
            id: self.id,
            created_at: self.created_at,
            chain_id: self.chain_id,
            intent: self.intent,
            explain: self.explain,
            steps: self.steps,
            policy,
            meta: self.meta,
        }
    }
}

/// A fully analyzed, policy-evaluated plan, ready for `execute`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: PlanId,
    pub created_at: DateTime<Utc>,
    pub chain_id: ChainId,
    pub intent: Intent,
    pub explain: Explanation,
    pub steps: Vec<PlanStep>,
    policy: PolicyDecision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl Plan {
    /// The decision computed when the plan was sealed.
    pub fn policy(&self) -> &PolicyDecision {
        &self.policy
    }

    pub fn is_allowed(&self) -> bool {
        self.policy.allowed
    }
}
