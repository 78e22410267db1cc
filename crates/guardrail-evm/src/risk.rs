//! ERC-20 approval risk heuristics.
//!
//! Only calldata that decodes as `approve(address,uint256)` is inspected.
//! Decoding masks the spender word to 160 bits the way token contracts do,
//! so dirty upper bytes cannot hide an approval. Calldata that still fails to
//! decode produces no flags.

use alloy_primitives::{address, Address, U256};
use serde_json::json;
use tracing::debug;

use guardrail_contracts::{
    plan::{ChainId, PlanStep},
    risk::{codes, RiskFlag},
};
use guardrail_core::traits::RiskAnalyzer;

use crate::codec::Erc20Call;

/// Uniswap Permit2. Same address on every EVM chain where it is deployed.
pub const PERMIT2_ADDRESS: Address = address!("000000000022D473030F116dDEE9F6B43aC78BA3");

/// Approvals strictly above this amount (10^30) are flagged as large.
pub fn large_approval_threshold() -> U256 {
    U256::from(10u64).pow(U256::from(30u64))
}

/// Flag infinite, very large and Permit2 approvals in `data` sent to `to`.
///
/// `approval.large` is only raised when the amount is not already infinite,
/// so an infinite approval yields exactly one amount flag.
pub fn detect_approval_risks(to: Address, data: Option<&[u8]>) -> Vec<RiskFlag> {
    let Some(data) = data else {
        return Vec::new();
    };
    let (spender, amount) = match Erc20Call::decode(data) {
        Ok(Erc20Call::Approve { spender, amount }) => (spender, amount),
        Ok(_) => return Vec::new(),
        Err(e) => {
            debug!(to = %to, error = %e, "calldata not decodable as ERC-20, skipping approval checks");
            return Vec::new();
        }
    };

    let mut flags = Vec::new();

    if amount == U256::MAX {
        flags.push(
            RiskFlag::high(
                codes::APPROVAL_INFINITE,
                "This transaction sets an infinite ERC-20 allowance (UINT256_MAX).",
            )
            .with_data(json!({
                "contract": to,
                "spender": spender,
                "amount": amount.to_string(),
            })),
        );
    } else if amount > large_approval_threshold() {
        flags.push(
            RiskFlag::medium(
                codes::APPROVAL_LARGE,
                "This transaction sets a very large ERC-20 allowance.",
            )
            .with_data(json!({
                "contract": to,
                "spender": spender,
                "amount": amount.to_string(),
            })),
        );
    }

    if spender == PERMIT2_ADDRESS {
        flags.push(
            RiskFlag::medium(
                codes::APPROVAL_PERMIT2,
                "This approval targets Permit2. This is common (Uniswap), but review carefully.",
            )
            .with_data(json!({ "contract": to, "spender": spender })),
        );
    }

    flags
}

/// `RiskAnalyzer` backed by the EVM heuristics in this module.
#[derive(Debug, Clone)]
pub struct EvmRiskAnalyzer {
    approvals: bool,
}

impl EvmRiskAnalyzer {
    /// All heuristics enabled.
    pub fn new() -> Self {
        Self { approvals: true }
    }

    /// Skip approval decoding entirely.
    pub fn without_approvals() -> Self {
        Self { approvals: false }
    }
}

impl Default for EvmRiskAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskAnalyzer for EvmRiskAnalyzer {
    fn analyze_step(&self, step: &PlanStep, _chain_id: ChainId) -> Vec<RiskFlag> {
        if !self.approvals {
            return Vec::new();
        }
        detect_approval_risks(step.tx.to, step.tx.data.as_ref().map(|data| &data[..]))
    }
}
