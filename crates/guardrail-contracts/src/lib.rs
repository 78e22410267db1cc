//! # guardrail-contracts
//!
//! Shared types for the Guardrail plan / risk / policy / execute pipeline.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate: only data definitions, serde helpers and error types.

pub mod error;
pub mod execution;
pub mod intent;
pub mod plan;
pub mod policy;
pub mod quantity;
pub mod risk;

pub use alloy_primitives::{Address, Bytes, B256, U256};

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use super::*;
    use error::GuardrailError;
    use intent::Intent;
    use plan::{Explanation, PlanDraft, PlanId, PlanStep, TxRequest};
    use policy::PolicyDecision;
    use risk::{codes, RiskFlag, Severity};

    fn addr(last: u8) -> Address {
        let mut bytes = [0u8; 20];
        bytes[19] = last;
        Address::from(bytes)
    }

    fn draft(steps: Vec<PlanStep>) -> PlanDraft {
        PlanDraft {
            id: PlanId::new(),
            created_at: Utc::now(),
            chain_id: 8453,
            intent: Intent::new("x", json!({})),
            explain: Explanation::new("t", "s"),
            steps,
            meta: None,
        }
    }

    // ── Severity ─────────────────────────────────────────────────────────────

    #[test]
    fn only_high_severity_blocks() {
        assert!(Severity::High.is_blocking());
        assert!(!Severity::Medium.is_blocking());
        assert!(!Severity::Low.is_blocking());
    }

    #[test]
    fn severity_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Severity::Medium).unwrap(), json!("medium"));
        let parsed: Severity = serde_json::from_value(json!("high")).unwrap();
        assert_eq!(parsed, Severity::High);
    }

    // ── PolicyDecision ───────────────────────────────────────────────────────

    #[test]
    fn decision_with_only_advisory_violations_is_allowed() {
        let decision = PolicyDecision::from_violations(vec![RiskFlag::medium(
            codes::POLICY_REQUIRE_APPROVAL,
            "above threshold",
        )]);
        assert!(decision.allowed);
        assert_eq!(decision.blocking().count(), 0);
    }

    #[test]
    fn decision_with_high_violation_is_denied() {
        let decision = PolicyDecision::from_violations(vec![
            RiskFlag::medium(codes::POLICY_REQUIRE_APPROVAL, "above threshold"),
            RiskFlag::high(codes::POLICY_DENY_TO, "denied destination"),
        ]);
        assert!(!decision.allowed);
        assert_eq!(decision.blocking().count(), 1);

        let summary = decision.summary();
        assert_eq!(
            summary,
            "MEDIUM policy.requireApproval: above threshold\nHIGH policy.denyTo: denied destination"
        );
    }

    // ── PlanStep flags ───────────────────────────────────────────────────────

    #[test]
    fn merge_risk_flags_appends_without_duplicates() {
        let infinite = RiskFlag::high(codes::APPROVAL_INFINITE, "infinite");
        let permit2 = RiskFlag::medium(codes::APPROVAL_PERMIT2, "permit2");

        let mut step = PlanStep::tx(TxRequest::new(addr(1))).with_risk_flags(vec![infinite.clone()]);
        step.merge_risk_flags(vec![infinite.clone(), permit2.clone()]);

        assert_eq!(step.risk_flags, vec![infinite, permit2]);
        assert!(step.has_flag(codes::APPROVAL_PERMIT2));
        assert!(!step.has_flag(codes::APPROVAL_LARGE));
    }

    // ── Plan sealing and wire format ─────────────────────────────────────────

    #[test]
    fn total_value_treats_missing_value_as_zero() {
        let plan = draft(vec![
            PlanStep::tx(TxRequest::new(addr(1)).with_value(U256::from(5u64))),
            PlanStep::tx(TxRequest::new(addr(2))),
            PlanStep::tx(TxRequest::new(addr(3)).with_value(U256::from(7u64))),
        ]);
        assert_eq!(plan.total_value(), U256::from(12u64));
    }

    #[test]
    fn sealed_plan_serializes_camel_case_with_decimal_values() {
        let d = draft(vec![PlanStep::tx(
            TxRequest::new(addr(1)).with_value(U256::from(1_000u64)),
        )]);
        let id = d.id;
        let plan = d.seal(PolicyDecision::from_violations(vec![]));

        let value = serde_json::to_value(&plan).unwrap();
        assert_eq!(value["id"], json!(id.to_string()));
        assert_eq!(value["chainId"], json!(8453));
        assert!(value.get("createdAt").is_some());
        assert_eq!(value["steps"][0]["kind"], json!("tx"));
        assert_eq!(value["steps"][0]["tx"]["value"], json!("1000"));
        assert_eq!(value["steps"][0]["riskFlags"], json!([]));
        assert_eq!(value["policy"]["allowed"], json!(true));
    }

    #[test]
    fn tx_request_accepts_hex_and_integer_values() {
        let tx: TxRequest = serde_json::from_value(json!({
            "to": "0x00000000000000000000000000000000000000AB",
            "value": "0x10"
        }))
        .unwrap();
        assert_eq!(tx.value, Some(U256::from(16u64)));
        assert_eq!(tx.to, addr(0xab));

        let tx: TxRequest = serde_json::from_value(json!({
            "to": "0x00000000000000000000000000000000000000ab",
            "value": 42
        }))
        .unwrap();
        assert_eq!(tx.value, Some(U256::from(42u64)));

        let tx: TxRequest = serde_json::from_value(json!({
            "to": "0x00000000000000000000000000000000000000ab"
        }))
        .unwrap();
        assert_eq!(tx.value, None);
    }

    #[test]
    fn parse_quantity_rejects_garbage() {
        assert!(quantity::parse_quantity("").is_err());
        assert!(quantity::parse_quantity("12ab").is_err());
        assert!(quantity::parse_quantity("0xzz").is_err());
        assert_eq!(quantity::parse_quantity("0x").unwrap(), U256::ZERO);
        assert_eq!(quantity::parse_quantity(" 255 ").unwrap(), U256::from(255u64));
        assert_eq!(quantity::parse_quantity("0xff").unwrap(), U256::from(255u64));
    }

    // ── PlanId ───────────────────────────────────────────────────────────────

    #[test]
    fn plan_id_new_produces_unique_values() {
        let unique: std::collections::HashSet<PlanId> = (0..100).map(|_| PlanId::new()).collect();
        assert_eq!(unique.len(), 100);
    }

    // ── GuardrailError display messages ──────────────────────────────────────

    #[test]
    fn error_chain_mismatch_display() {
        let err = GuardrailError::ChainMismatch { expected: 1, actual: 8453 };
        let msg = err.to_string();
        assert!(msg.contains("chain 1"));
        assert!(msg.contains("8453"));
    }

    #[test]
    fn error_policy_blocked_display() {
        let err = GuardrailError::PolicyBlocked {
            plan_id: PlanId::new(),
            summary: "HIGH policy.denyTo: nope".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("policy blocked execution"));
        assert!(msg.contains("policy.denyTo"));
    }

    #[test]
    fn error_execution_failure_display_counts_receipts() {
        let err = GuardrailError::ExecutionFailure {
            plan_id: PlanId::new(),
            step_index: 2,
            reason: "nonce too low".to_string(),
            receipts: vec![
                execution::ExecutionReceipt { tx_hash: B256::ZERO },
                execution::ExecutionReceipt { tx_hash: B256::ZERO },
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("step 2"));
        assert!(msg.contains("2 receipt(s)"));
        assert!(msg.contains("nonce too low"));
    }
}
