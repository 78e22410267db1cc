//! Policy configuration schema.
//!
//! A `PolicyConfig` is deserialized from TOML (or JSON) with camelCase keys.
//! The set of recognized options is closed: unknown keys are rejected so a
//! typo can never silently disable a rule.
//!
//! Example in TOML:
//! ```toml
//! maxValueWeiPerTx = "1000000000000000000"
//! noInfiniteApprovals = true
//! denyTo = ["0x000000000000000000000000000000000000dEaD"]
//! requireApprovalAboveValueWei = "500000000000000000"
//! ```

use guardrail_contracts::{quantity, U256};
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// The top-level structure deserialized from a policy file.
///
/// Addresses are kept as strings here and parsed when the engine is built,
/// so every malformed entry surfaces as `InvalidPolicyConfig`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PolicyConfig {
    /// Hard ceiling on the native value of any single step.
    #[serde(
        default,
        with = "quantity::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_value_wei_per_tx: Option<U256>,

    /// Deny any step flagged `approval.infinite`. On unless disabled.
    #[serde(default = "default_true")]
    pub no_infinite_approvals: bool,

    /// When present, every destination must appear here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_to: Option<Vec<String>>,

    /// Destinations that are always denied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deny_to: Option<Vec<String>>,

    /// Aggregate plan value at which an advisory approval violation is raised.
    #[serde(
        default,
        with = "quantity::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub require_approval_above_value_wei: Option<U256>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            max_value_wei_per_tx: None,
            no_infinite_approvals: true,
            allow_to: None,
            deny_to: None,
            require_approval_above_value_wei: None,
        }
    }
}
