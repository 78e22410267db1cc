//! Config-driven policy engine implementation.
//!
//! `GuardrailPolicyEngine` validates a `PolicyConfig` once, at construction,
//! and implements the `PolicyEngine` trait from guardrail-core.
//!
//! Evaluation algorithm (every rule runs; nothing short-circuits):
//!
//! 1. Per-step value ceiling          → high   `policy.maxValueWeiPerTx`
//! 2. Destination deny list, allowlist → high   `policy.denyTo` / `policy.allowTo`
//! 3. Infinite-approval ban           → high   `policy.noInfiniteApprovals`
//! 4. Aggregate value threshold       → medium `policy.requireApproval`
//!
//! The plan is allowed iff no violation is `high`.

use std::{collections::HashSet, path::Path, str::FromStr};

use serde_json::{json, Value};
use tracing::debug;

use guardrail_contracts::{
    error::{GuardrailError, GuardrailResult},
    plan::PlanDraft,
    policy::PolicyDecision,
    risk::{codes, RiskFlag},
    Address, U256,
};
use guardrail_core::traits::PolicyEngine;

use crate::rule::PolicyConfig;

/// A `PolicyEngine` built from a validated `PolicyConfig`.
///
/// Construct via `new`, `from_toml_str`, `from_file` or `from_json_value`,
/// then pass to `Guardrail::new`.
///
/// ```rust,ignore
/// use guardrail_policy::GuardrailPolicyEngine;
///
/// let engine = GuardrailPolicyEngine::from_file(Path::new("policies/strict.toml"))?;
/// ```
#[derive(Debug, Clone)]
pub struct GuardrailPolicyEngine {
    max_value_wei_per_tx: Option<U256>,
    no_infinite_approvals: bool,
    allow_to: Option<HashSet<Address>>,
    deny_to: HashSet<Address>,
    require_approval_above_value_wei: Option<U256>,
}

impl GuardrailPolicyEngine {
    /// Validate `config` and build the engine.
    ///
    /// Returns `GuardrailError::InvalidPolicyConfig` if any listed address is
    /// not a 20-byte hex address.
    pub fn new(config: PolicyConfig) -> GuardrailResult<Self> {
        let allow_to = config
            .allow_to
            .as_deref()
            .map(|list| parse_address_list("allowTo", list))
            .transpose()?;
        let deny_to = match config.deny_to.as_deref() {
            Some(list) => parse_address_list("denyTo", list)?,
            None => HashSet::new(),
        };

        Ok(Self {
            max_value_wei_per_tx: config.max_value_wei_per_tx,
            no_infinite_approvals: config.no_infinite_approvals,
            allow_to,
            deny_to,
            require_approval_above_value_wei: config.require_approval_above_value_wei,
        })
    }

    /// Parse `s` as TOML and build the engine.
    pub fn from_toml_str(s: &str) -> GuardrailResult<Self> {
        let config: PolicyConfig = toml::from_str(s).map_err(|e| GuardrailError::InvalidPolicyConfig {
            reason: format!("failed to parse policy TOML: {}", e),
        })?;
        Self::new(config)
    }

    /// Read the file at `path` and parse it as TOML policy configuration.
    pub fn from_file(path: &Path) -> GuardrailResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| GuardrailError::InvalidPolicyConfig {
            reason: format!("failed to read policy file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Build the engine from a JSON object with the same camelCase keys.
    pub fn from_json_value(value: Value) -> GuardrailResult<Self> {
        let config: PolicyConfig =
            serde_json::from_value(value).map_err(|e| GuardrailError::InvalidPolicyConfig {
                reason: format!("failed to parse policy JSON: {}", e),
            })?;
        Self::new(config)
    }
}

fn parse_address_list(field: &str, list: &[String]) -> GuardrailResult<HashSet<Address>> {
    list.iter()
        .map(|raw| {
            Address::from_str(raw.trim()).map_err(|e| GuardrailError::InvalidPolicyConfig {
                reason: format!("{field} entry '{raw}' is not a valid address: {e}"),
            })
        })
        .collect()
}

impl PolicyEngine for GuardrailPolicyEngine {
    fn evaluate_plan(&self, plan: &PlanDraft) -> PolicyDecision {
        debug!(
            plan_id = %plan.id,
            steps = plan.steps.len(),
            "evaluating plan policy"
        );

        let mut violations = Vec::new();

        if let Some(limit) = self.max_value_wei_per_tx {
            for (index, step) in plan.steps.iter().enumerate() {
                let value = step.tx.value_or_zero();
                if value > limit {
                    violations.push(
                        RiskFlag::high(
                            codes::POLICY_MAX_VALUE_PER_TX,
                            format!("Tx value {value} exceeds limit {limit}"),
                        )
                        .with_data(json!({
                            "step": index,
                            "value": value.to_string(),
                            "limit": limit.to_string(),
                        })),
                    );
                }
            }
        }

        // Address equality is byte equality, so hex case never matters here.
        for (index, step) in plan.steps.iter().enumerate() {
            let to = step.tx.to;
            if self.deny_to.contains(&to) {
                violations.push(
                    RiskFlag::high(
                        codes::POLICY_DENY_TO,
                        format!("Destination contract/address is denied: {to}"),
                    )
                    .with_data(json!({ "step": index, "to": to })),
                );
            }
            if let Some(allow_to) = &self.allow_to {
                if !allow_to.contains(&to) {
                    violations.push(
                        RiskFlag::high(
                            codes::POLICY_ALLOW_TO,
                            format!("Destination not in allowlist: {to}"),
                        )
                        .with_data(json!({ "step": index, "to": to })),
                    );
                }
            }
        }

        if self.no_infinite_approvals {
            for (index, step) in plan.steps.iter().enumerate() {
                if step.has_flag(codes::APPROVAL_INFINITE) {
                    violations.push(
                        RiskFlag::high(
                            codes::POLICY_NO_INFINITE_APPROVALS,
                            "Infinite approval is not allowed by policy.",
                        )
                        .with_data(json!({ "step": index })),
                    );
                }
            }
        }

        if let Some(threshold) = self.require_approval_above_value_wei {
            let total = plan.total_value();
            if total >= threshold {
                violations.push(
                    RiskFlag::medium(
                        codes::POLICY_REQUIRE_APPROVAL,
                        format!("Plan total value {total} exceeds approval threshold {threshold}"),
                    )
                    .with_data(json!({
                        "total": total.to_string(),
                        "threshold": threshold.to_string(),
                    })),
                );
            }
        }

        for violation in &violations {
            debug!(
                plan_id = %plan.id,
                code = %violation.code,
                severity = %violation.severity,
                "policy violation"
            );
        }

        PolicyDecision::from_violations(violations)
    }
}
