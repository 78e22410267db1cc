//! The closed action catalog.
//!
//! Every supported action has a typed parameter struct. Intents arrive with
//! loosely-typed JSON params; [`Action::parse`] resolves the name and checks
//! the params against the matching struct, rejecting unknown fields.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use guardrail_contracts::{
    error::{GuardrailError, GuardrailResult},
    intent::Intent,
    quantity, Address, Bytes, U256,
};

pub const TRANSFER_NATIVE: &str = "transfer.native";
pub const ERC20_APPROVE: &str = "erc20.approve";
pub const ERC20_TRANSFER: &str = "erc20.transfer";
pub const SWAP_RAW: &str = "swap.raw";
pub const SWAP_UNIVERSAL_ROUTER_RAW: &str = "swap.uniswap.universalRouterRaw";

/// Every action name the planner accepts.
pub const CATALOG: [&str; 5] = [
    TRANSFER_NATIVE,
    ERC20_APPROVE,
    ERC20_TRANSFER,
    SWAP_RAW,
    SWAP_UNIVERSAL_ROUTER_RAW,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NativeTransferParams {
    pub to: Address,
    #[serde(with = "quantity")]
    pub value_wei: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Erc20ApproveParams {
    pub token: Address,
    pub spender: Address,
    #[serde(with = "quantity")]
    pub amount: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Erc20TransferParams {
    pub token: Address,
    pub to: Address,
    #[serde(with = "quantity")]
    pub amount: U256,
}

/// Prepared router calldata. Routing itself happens elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SwapParams {
    pub router: Address,
    pub data: Bytes,
    #[serde(default, with = "quantity::option", skip_serializing_if = "Option::is_none")]
    pub value_wei: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// A resolved, well-typed action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    NativeTransfer(NativeTransferParams),
    Erc20Approve(Erc20ApproveParams),
    Erc20Transfer(Erc20TransferParams),
    SwapRaw(SwapParams),
    UniversalRouterSwap(SwapParams),
}

impl Action {
    /// Resolve `action` against the catalog and parse `params` for it.
    pub fn parse(action: &str, params: &Value) -> GuardrailResult<Self> {
        match action {
            TRANSFER_NATIVE => parse_params(action, params).map(Action::NativeTransfer),
            ERC20_APPROVE => parse_params(action, params).map(Action::Erc20Approve),
            ERC20_TRANSFER => parse_params(action, params).map(Action::Erc20Transfer),
            SWAP_RAW => parse_params(action, params).map(Action::SwapRaw),
            SWAP_UNIVERSAL_ROUTER_RAW => parse_params(action, params).map(Action::UniversalRouterSwap),
            other => Err(GuardrailError::UnknownAction {
                action: other.to_string(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::NativeTransfer(_) => TRANSFER_NATIVE,
            Action::Erc20Approve(_) => ERC20_APPROVE,
            Action::Erc20Transfer(_) => ERC20_TRANSFER,
            Action::SwapRaw(_) => SWAP_RAW,
            Action::UniversalRouterSwap(_) => SWAP_UNIVERSAL_ROUTER_RAW,
        }
    }

    /// The action's params in their canonical JSON form.
    pub fn params(&self) -> Value {
        match self {
            Action::NativeTransfer(p) => json!({
                "to": p.to,
                "valueWei": p.value_wei.to_string(),
            }),
            Action::Erc20Approve(p) => json!({
                "token": p.token,
                "spender": p.spender,
                "amount": p.amount.to_string(),
            }),
            Action::Erc20Transfer(p) => json!({
                "token": p.token,
                "to": p.to,
                "amount": p.amount.to_string(),
            }),
            Action::SwapRaw(p) | Action::UniversalRouterSwap(p) => {
                let mut params = json!({ "router": p.router, "data": p.data });
                if let Some(value) = p.value_wei {
                    params["valueWei"] = json!(value.to_string());
                }
                if let Some(summary) = &p.summary {
                    params["summary"] = json!(summary);
                }
                params
            }
        }
    }

    pub fn transfer_native(to: Address, value_wei: U256) -> Self {
        Action::NativeTransfer(NativeTransferParams { to, value_wei })
    }

    pub fn erc20_approve(token: Address, spender: Address, amount: U256) -> Self {
        Action::Erc20Approve(Erc20ApproveParams { token, spender, amount })
    }

    /// Same as `erc20_approve`. Use it to approve exactly what a follow-up
    /// call will spend rather than `U256::MAX`.
    pub fn approve_exact(token: Address, spender: Address, amount: U256) -> Self {
        Self::erc20_approve(token, spender, amount)
    }

    pub fn erc20_transfer(token: Address, to: Address, amount: U256) -> Self {
        Action::Erc20Transfer(Erc20TransferParams { token, to, amount })
    }

    pub fn swap_raw(params: SwapParams) -> Self {
        Action::SwapRaw(params)
    }

    pub fn universal_router_swap(params: SwapParams) -> Self {
        Action::UniversalRouterSwap(params)
    }
}

impl From<Action> for Intent {
    fn from(action: Action) -> Self {
        Intent::new(action.name(), action.params())
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(action: &str, params: &Value) -> GuardrailResult<T> {
    serde_json::from_value(params.clone()).map_err(|e| GuardrailError::InvalidParams {
        action: action.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913";

    #[test]
    fn parses_each_catalog_entry() {
        let cases = [
            (TRANSFER_NATIVE, json!({ "to": TOKEN, "valueWei": "1" })),
            (ERC20_APPROVE, json!({ "token": TOKEN, "spender": TOKEN, "amount": 5 })),
            (ERC20_TRANSFER, json!({ "token": TOKEN, "to": TOKEN, "amount": "0x10" })),
            (SWAP_RAW, json!({ "router": TOKEN, "data": "0x1234" })),
            (
                SWAP_UNIVERSAL_ROUTER_RAW,
                json!({ "router": TOKEN, "data": "0x", "valueWei": "7", "summary": "swap" }),
            ),
        ];
        for (name, params) in cases {
            let action = Action::parse(name, &params).unwrap();
            assert_eq!(action.name(), name);
        }
    }

    #[test]
    fn lowercase_addresses_accepted() {
        let action = Action::parse(
            TRANSFER_NATIVE,
            &json!({ "to": TOKEN.to_lowercase(), "valueWei": "1" }),
        )
        .unwrap();
        let expected: Address = TOKEN.parse().unwrap();
        assert_eq!(action, Action::transfer_native(expected, U256::from(1u64)));
    }

    #[test]
    fn unknown_action_rejected() {
        match Action::parse("bridge.native", &json!({})) {
            Err(GuardrailError::UnknownAction { action }) => assert_eq!(action, "bridge.native"),
            other => panic!("expected UnknownAction, got {:?}", other),
        }
    }

    #[test]
    fn bad_params_rejected() {
        let unknown_field = Action::parse(TRANSFER_NATIVE, &json!({ "to": TOKEN, "valueWei": "1", "memo": "x" }));
        assert!(matches!(unknown_field, Err(GuardrailError::InvalidParams { .. })));

        let missing = Action::parse(ERC20_APPROVE, &json!({ "token": TOKEN, "amount": "1" }));
        match missing {
            Err(GuardrailError::InvalidParams { action, reason }) => {
                assert_eq!(action, ERC20_APPROVE);
                assert!(reason.contains("spender"), "reason: {reason}");
            }
            other => panic!("expected InvalidParams, got {:?}", other),
        }

        let negative = Action::parse(TRANSFER_NATIVE, &json!({ "to": TOKEN, "valueWei": -1 }));
        assert!(matches!(negative, Err(GuardrailError::InvalidParams { .. })));
    }

    #[test]
    fn intent_params_reparse_to_same_action() {
        let action = Action::approve_exact(
            TOKEN.parse().unwrap(),
            Address::with_last_byte(9),
            U256::MAX,
        );
        let intent = Intent::from(action.clone());
        assert_eq!(intent.action, ERC20_APPROVE);
        assert_eq!(intent.params["amount"], json!(U256::MAX.to_string()));
        assert_eq!(Action::parse(&intent.action, &intent.params).unwrap(), action);
    }
}
