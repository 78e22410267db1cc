//! Policy decision type.
//!
//! The policy engine consumes a `PlanDraft` and produces a `PolicyDecision`.
//! Violations reuse the `RiskFlag` shape; a single `high` violation denies
//! the whole plan, everything else is surfaced as advice.

use serde::{Deserialize, Serialize};

use crate::risk::RiskFlag;

/// The allow/deny verdict for a plan plus every violation found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDecision {
    /// False whenever any violation has severity `high`.
    pub allowed: bool,
    /// All violations in evaluation order, blocking and advisory alike.
    pub violations: Vec<RiskFlag>,
}

impl PolicyDecision {
    /// Build a decision, deriving `allowed` from the violation severities.
    pub fn from_violations(violations: Vec<RiskFlag>) -> Self {
        let allowed = !violations.iter().any(RiskFlag::is_blocking);
        Self { allowed, violations }
    }

    /// Violations that deny execution.
    pub fn blocking(&self) -> impl Iterator<Item = &RiskFlag> {
        self.violations.iter().filter(|v| v.is_blocking())
    }

    /// One line per violation: `HIGH policy.denyTo: ...`.
    pub fn summary(&self) -> String {
        self.violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
