//! Risk flags and severities.
//!
//! A `RiskFlag` is a structured warning attached to a plan step. The risk
//! analyzer and the planner produce them; the policy engine reuses the same
//! shape for its violations. Only `Severity::High` ever blocks execution.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stable flag and violation codes.
pub mod codes {
    pub const APPROVAL_INFINITE: &str = "approval.infinite";
    pub const APPROVAL_LARGE: &str = "approval.large";
    pub const APPROVAL_PERMIT2: &str = "approval.permit2";

    pub const POLICY_MAX_VALUE_PER_TX: &str = "policy.maxValueWeiPerTx";
    pub const POLICY_DENY_TO: &str = "policy.denyTo";
    pub const POLICY_ALLOW_TO: &str = "policy.allowTo";
    pub const POLICY_NO_INFINITE_APPROVALS: &str = "policy.noInfiniteApprovals";
    pub const POLICY_REQUIRE_APPROVAL: &str = "policy.requireApproval";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// True for severities that deny execution. Everything else is advisory.
    pub fn is_blocking(self) -> bool {
        matches!(self, Severity::High)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detected hazard on a step, or a policy violation on a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFlag {
    /// Namespaced code, e.g. `approval.infinite` or `policy.denyTo`.
    pub code: String,
    pub severity: Severity,
    /// Human-readable description for operators and audit readers.
    pub message: String,
    /// Optional structured context (addresses, amounts).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RiskFlag {
    pub fn new(code: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            severity,
            message: message.into(),
            data: None,
        }
    }

    pub fn high(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(code, Severity::High, message)
    }

    pub fn medium(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(code, Severity::Medium, message)
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn is_blocking(&self) -> bool {
        self.severity.is_blocking()
    }
}

impl fmt::Display for RiskFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {}",
            self.severity.as_str().to_ascii_uppercase(),
            self.code,
            self.message
        )
    }
}
