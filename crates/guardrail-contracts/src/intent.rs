//! The caller's unresolved request.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An action name plus its loosely-typed parameters, exactly as submitted.
///
/// The planner resolves `action` against its closed catalog and parses
/// `params` into the action's typed parameter structure. The intent itself
/// is stored verbatim on the plan for audit purposes and never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    /// Catalog name, e.g. `"erc20.approve"`.
    pub action: String,
    /// JSON object with the action's parameters.
    pub params: Value,
}

impl Intent {
    pub fn new(action: impl Into<String>, params: Value) -> Self {
        Self {
            action: action.into(),
            params,
        }
    }
}
