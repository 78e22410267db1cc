//! `ActionPlanner`: turns a catalog action into a single-step draft plan.

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use guardrail_contracts::{
    error::{GuardrailError, GuardrailResult},
    intent::Intent,
    plan::{ChainId, Explanation, PlanDraft, PlanId, PlanStep, TxRequest},
};
use guardrail_core::traits::Planner;
use guardrail_evm::{codec::Erc20Call, risk::detect_approval_risks};

use crate::action::{Action, SwapParams};

/// Planner for one chain, backed by the closed [`Action`] catalog.
#[derive(Debug, Clone, Copy)]
pub struct ActionPlanner {
    chain_id: ChainId,
}

impl ActionPlanner {
    pub fn new(chain_id: ChainId) -> Self {
        Self { chain_id }
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }
}

/// Build the single step and top-level explanation for `action`.
///
/// The step carries the same explanation as the plan. Only `erc20.approve`
/// seeds risk flags.
fn build_step(action: &Action) -> (PlanStep, Explanation) {
    match action {
        Action::NativeTransfer(p) => {
            let explain = Explanation::new("Native transfer", format!("Send native value to {}", p.to))
                .with_bullets([format!("To: {}", p.to), format!("Value (wei): {}", p.value_wei)]);
            let step = PlanStep::tx(TxRequest::new(p.to).with_value(p.value_wei));
            (step.with_explanation(explain.clone()), explain)
        }
        Action::Erc20Approve(p) => {
            let data = Erc20Call::Approve {
                spender: p.spender,
                amount: p.amount,
            }
            .encode();
            let flags = detect_approval_risks(p.token, Some(&data[..]));
            let explain = Explanation::new("ERC-20 approve", "Approve spender to spend your token")
                .with_bullets([
                    format!("Token: {}", p.token),
                    format!("Spender: {}", p.spender),
                    format!("Amount: {}", p.amount),
                ]);
            let step = PlanStep::tx(TxRequest::new(p.token).with_data(data))
                .with_explanation(explain.clone())
                .with_risk_flags(flags);
            (step, explain)
        }
        Action::Erc20Transfer(p) => {
            let data = Erc20Call::Transfer {
                to: p.to,
                amount: p.amount,
            }
            .encode();
            let explain = Explanation::new("ERC-20 transfer", format!("Transfer token to {}", p.to))
                .with_bullets([
                    format!("Token: {}", p.token),
                    format!("To: {}", p.to),
                    format!("Amount: {}", p.amount),
                ]);
            let step = PlanStep::tx(TxRequest::new(p.token).with_data(data));
            (step.with_explanation(explain.clone()), explain)
        }
        Action::SwapRaw(p) => swap_step("Swap (raw calldata)", p),
        Action::UniversalRouterSwap(p) => swap_step("Uniswap Swap (Universal Router)", p),
    }
}

fn swap_step(title: &str, p: &SwapParams) -> (PlanStep, Explanation) {
    let summary = p.summary.clone().unwrap_or_else(|| "Swap via router".to_string());
    let explain = Explanation::new(title, summary).with_bullets([format!("Router: {}", p.router)]);

    let mut tx = TxRequest::new(p.router).with_data(p.data.clone());
    if let Some(value) = p.value_wei {
        tx = tx.with_value(value);
    }
    (PlanStep::tx(tx).with_explanation(explain.clone()), explain)
}

#[async_trait]
impl Planner for ActionPlanner {
    async fn plan(&self, chain_id: ChainId, intent: &Intent) -> GuardrailResult<PlanDraft> {
        if chain_id != self.chain_id {
            return Err(GuardrailError::ChainMismatch {
                expected: self.chain_id,
                actual: chain_id,
            });
        }

        let action = Action::parse(&intent.action, &intent.params)?;
        let (step, explain) = build_step(&action);
        let id = PlanId::new();

        debug!(
            plan_id = %id,
            action = action.name(),
            seeded_flags = step.risk_flags.len(),
            "draft plan built"
        );

        Ok(PlanDraft {
            id,
            created_at: Utc::now(),
            chain_id,
            intent: intent.clone(),
            explain,
            steps: vec![step],
            meta: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use futures_util::future::join_all;
    use serde_json::json;

    use guardrail_contracts::{risk::codes, Address, Bytes, U256};
    use guardrail_evm::PERMIT2_ADDRESS;

    use super::*;

    const BASE: ChainId = 8453;

    fn token() -> Address {
        "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913".parse().unwrap()
    }

    async fn draft(action: Action) -> PlanDraft {
        ActionPlanner::new(BASE).plan(BASE, &action.into()).await.unwrap()
    }

    #[tokio::test]
    async fn chain_mismatch_rejected() {
        let intent: Intent = Action::transfer_native(token(), U256::from(1u64)).into();
        match ActionPlanner::new(BASE).plan(1, &intent).await {
            Err(GuardrailError::ChainMismatch { expected, actual }) => {
                assert_eq!(expected, BASE);
                assert_eq!(actual, 1);
            }
            other => panic!("expected ChainMismatch, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn unknown_action_rejected() {
        let intent = Intent::new("nft.mint", json!({}));
        assert!(matches!(
            ActionPlanner::new(BASE).plan(BASE, &intent).await,
            Err(GuardrailError::UnknownAction { .. })
        ));
    }

    #[tokio::test]
    async fn native_transfer_has_value_and_no_data() {
        let to = Address::with_last_byte(0x42);
        let plan = draft(Action::transfer_native(to, U256::from(1_000u64))).await;

        assert_eq!(plan.chain_id, BASE);
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.steps[0].tx, TxRequest::new(to).with_value(U256::from(1_000u64)));
        assert!(plan.steps[0].risk_flags.is_empty());
        assert!(plan.steps[0].simulation.is_none());
        assert_eq!(plan.explain.title, "Native transfer");
        assert_eq!(plan.explain.bullets[1], "Value (wei): 1000");
    }

    #[tokio::test]
    async fn approve_encodes_calldata_and_seeds_flags() {
        let plan = draft(Action::erc20_approve(token(), PERMIT2_ADDRESS, U256::MAX)).await;
        let step = &plan.steps[0];

        assert_eq!(step.tx.to, token());
        assert!(step.tx.value.is_none());
        let decoded = Erc20Call::decode(step.tx.data.as_ref().unwrap()).unwrap();
        assert_eq!(
            decoded,
            Erc20Call::Approve {
                spender: PERMIT2_ADDRESS,
                amount: U256::MAX
            }
        );
        let flag_codes: Vec<_> = step.risk_flags.iter().map(|f| f.code.as_str()).collect();
        assert_eq!(flag_codes, vec![codes::APPROVAL_INFINITE, codes::APPROVAL_PERMIT2]);
    }

    #[tokio::test]
    async fn erc20_transfer_targets_token() {
        let recipient = Address::with_last_byte(7);
        let plan = draft(Action::erc20_transfer(token(), recipient, U256::from(5u64))).await;
        let step = &plan.steps[0];

        assert_eq!(step.tx.to, token());
        assert_eq!(
            Erc20Call::decode(step.tx.data.as_ref().unwrap()).unwrap(),
            Erc20Call::Transfer {
                to: recipient,
                amount: U256::from(5u64)
            }
        );
        assert!(step.risk_flags.is_empty());
    }

    #[tokio::test]
    async fn swap_titles_and_summary_fallback() {
        let params = SwapParams {
            router: Address::with_last_byte(0x99),
            data: Bytes::from(vec![0x35, 0x93, 0x56, 0x4c]),
            value_wei: Some(U256::from(3u64)),
            summary: None,
        };

        let raw = draft(Action::swap_raw(params.clone())).await;
        assert_eq!(raw.explain.title, "Swap (raw calldata)");
        assert_eq!(raw.explain.summary, "Swap via router");
        assert_eq!(raw.steps[0].tx.value, Some(U256::from(3u64)));

        let universal = draft(Action::universal_router_swap(SwapParams {
            summary: Some("USDC -> WETH".into()),
            ..params
        }))
        .await;
        assert_eq!(universal.explain.title, "Uniswap Swap (Universal Router)");
        assert_eq!(universal.explain.summary, "USDC -> WETH");
        assert_eq!(universal.steps[0].tx.to, Address::with_last_byte(0x99));
    }

    #[tokio::test]
    async fn every_call_gets_a_fresh_id_and_keeps_the_intent() {
        let intent = Intent::new("transfer.native", json!({ "to": token(), "valueWei": "0x01" }));
        let planner = ActionPlanner::new(BASE);
        let a = planner.plan(BASE, &intent).await.unwrap();
        let b = planner.plan(BASE, &intent).await.unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(a.intent, intent);
        assert_eq!(a.explain, b.explain);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_calls_get_distinct_ids() {
        let planner = ActionPlanner::new(BASE);
        let intent: Intent = Action::transfer_native(token(), U256::from(1u64)).into();

        let handles = (0..50).map(|_| {
            let intent = intent.clone();
            tokio::spawn(async move { planner.plan(BASE, &intent).await.map(|draft| draft.id) })
        });
        let ids: HashSet<PlanId> = join_all(handles)
            .await
            .into_iter()
            .map(|joined| joined.unwrap().unwrap())
            .collect();

        assert_eq!(ids.len(), 50);
    }
}
