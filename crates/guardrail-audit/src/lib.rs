//! # guardrail-audit
//!
//! Append-only audit writers for Guardrail.
//!
//! ## Overview
//!
//! - [`InMemoryAuditWriter`] wraps every plan and execution record in an
//!   [`AuditEvent`] linked to its predecessor by SHA-256 hash. Tampering
//!   with any event breaks the chain and is detected by [`verify_chain`].
//! - [`FileAuditWriter`] writes one JSON file per record under a directory
//!   per plan, never overwriting an existing file.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use guardrail_audit::InMemoryAuditWriter;
//!
//! let audit = InMemoryAuditWriter::new();
//! let guardrail = Guardrail::new(chain_id, planner, simulator, executor, policy)
//!     .with_audit(Box::new(audit.clone()));
//!
//! let plan = guardrail.plan("transfer.native", params).await?;
//! assert!(audit.verify_integrity());
//! ```

pub mod chain;
pub mod event;
pub mod file;
pub mod memory;

pub use chain::{hash_event, verify_chain};
pub use event::{AuditEvent, AuditLog, AuditRecord};
pub use file::FileAuditWriter;
pub use memory::InMemoryAuditWriter;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use guardrail_contracts::{
        error::GuardrailError,
        execution::{ExecutionReceipt, ExecutionRecord},
        intent::Intent,
        plan::{Explanation, Plan, PlanDraft, PlanId, PlanStep, TxRequest},
        policy::PolicyDecision,
        Address, B256, U256,
    };
    use guardrail_core::traits::AuditWriter;

    use super::{AuditEvent, AuditRecord, FileAuditWriter, InMemoryAuditWriter};

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn make_plan(value: u64) -> Plan {
        PlanDraft {
            id: PlanId::new(),
            created_at: Utc::now(),
            chain_id: 8453,
            intent: Intent::new("transfer.native", json!({ "valueWei": value.to_string() })),
            explain: Explanation::new("Native transfer", "test"),
            steps: vec![PlanStep::tx(
                TxRequest::new(Address::with_last_byte(1)).with_value(U256::from(value)),
            )],
            meta: None,
        }
        .seal(PolicyDecision::from_violations(vec![]))
    }

    fn make_execution(plan: &Plan, step_index: usize, hash_byte: u8) -> ExecutionRecord {
        ExecutionRecord {
            plan_id: plan.id,
            step_index,
            step: plan.steps[0].clone(),
            receipt: ExecutionReceipt {
                tx_hash: B256::with_last_byte(hash_byte),
            },
            recorded_at: Utc::now(),
        }
    }

    fn temp_root() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("guardrail-audit-test-{}", PlanId::new()))
    }

    // ── In-memory chain ───────────────────────────────────────────────────────

    /// Plans and executions share one valid chain.
    #[tokio::test]
    async fn test_hash_chain_integrity() {
        let writer = InMemoryAuditWriter::new();
        let plan = make_plan(1);
        writer.write_plan(&plan).await.unwrap();
        writer.write_execution(&plan.id, &make_execution(&plan, 0, 1)).await.unwrap();
        writer.write_plan(&make_plan(2)).await.unwrap();

        assert_eq!(writer.len(), 3);
        assert!(writer.verify_integrity());
    }

    /// Mutating a stored record breaks the chain.
    #[tokio::test]
    async fn test_tamper_detection() {
        let writer = InMemoryAuditWriter::new();
        let plan = make_plan(1);
        writer.write_plan(&plan).await.unwrap();
        writer.write_execution(&plan.id, &make_execution(&plan, 0, 1)).await.unwrap();

        {
            let mut state = writer.state.lock().unwrap();
            if let AuditRecord::Execution(record) = &mut state.events[1].record {
                record.receipt.tx_hash = B256::with_last_byte(0xff);
            }
        }

        assert!(!writer.verify_integrity());
    }

    /// The first event links to the genesis sentinel; sequences have no gaps.
    #[tokio::test]
    async fn test_genesis_and_sequence() {
        let writer = InMemoryAuditWriter::new();
        for value in 0..3 {
            writer.write_plan(&make_plan(value)).await.unwrap();
        }

        let log = writer.export_log();
        assert_eq!(log.events[0].prev_hash, AuditEvent::GENESIS_HASH);
        for (idx, event) in log.events.iter().enumerate() {
            assert_eq!(event.sequence, idx as u64);
        }
        assert_eq!(log.terminal_hash, log.events[2].this_hash);
        assert!(super::verify_chain(&log.events));
    }

    /// Reordering exported events is detected.
    #[tokio::test]
    async fn test_reordered_events_rejected() {
        let writer = InMemoryAuditWriter::new();
        writer.write_plan(&make_plan(1)).await.unwrap();
        writer.write_plan(&make_plan(2)).await.unwrap();

        let mut events = writer.export_log().events;
        events.swap(0, 1);
        assert!(!super::verify_chain(&events));
    }

    #[tokio::test]
    async fn test_events_keyed_by_plan() {
        let writer = InMemoryAuditWriter::new();
        let a = make_plan(1);
        let b = make_plan(2);
        writer.write_plan(&a).await.unwrap();
        writer.write_plan(&b).await.unwrap();
        writer.write_execution(&a.id, &make_execution(&a, 0, 7)).await.unwrap();

        let for_a = writer.events_for(&a.id);
        assert_eq!(for_a.len(), 2);
        assert!(for_a[0].record.is_plan());
        assert_eq!(writer.events_for(&b.id).len(), 1);
        assert_eq!(writer.export_log().events_for(&a.id).count(), 2);

        let executions = writer.executions_for(&a.id);
        assert_eq!(executions.len(), 1);
        assert_eq!(executions[0].receipt.tx_hash, B256::with_last_byte(7));
    }

    /// A plan is recorded once; a second write is refused.
    #[tokio::test]
    async fn test_plan_written_once() {
        let writer = InMemoryAuditWriter::new();
        let plan = make_plan(1);
        writer.write_plan(&plan).await.unwrap();

        assert!(matches!(
            writer.write_plan(&plan).await,
            Err(GuardrailError::AuditWriteFailed { .. })
        ));
        assert_eq!(writer.len(), 1);
    }

    #[tokio::test]
    async fn test_execution_under_wrong_plan_rejected() {
        let writer = InMemoryAuditWriter::new();
        let plan = make_plan(1);
        let other = PlanId::new();

        assert!(matches!(
            writer.write_execution(&other, &make_execution(&plan, 0, 1)).await,
            Err(GuardrailError::AuditWriteFailed { .. })
        ));
        assert!(writer.is_empty());
    }

    #[test]
    fn test_verify_empty() {
        assert!(InMemoryAuditWriter::new().verify_integrity());
        assert!(super::verify_chain(&[]));
    }

    // ── Files ─────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_file_plan_written_once() {
        let root = temp_root();
        let writer = FileAuditWriter::new(&root);
        let plan = make_plan(5);

        writer.write_plan(&plan).await.unwrap();
        let path = writer.plan_dir(&plan.id).join("plan.json");
        let stored: Plan = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(stored, plan);

        assert!(matches!(
            writer.write_plan(&plan).await,
            Err(GuardrailError::AuditWriteFailed { .. })
        ));

        std::fs::remove_dir_all(&root).unwrap();
    }

    /// Two records with the same timestamp and step index get distinct files.
    #[tokio::test]
    async fn test_file_execution_collision_suffix() {
        let root = temp_root();
        let writer = FileAuditWriter::new(&root);
        let plan = make_plan(5);
        let record = make_execution(&plan, 0, 1);

        writer.write_execution(&plan.id, &record).await.unwrap();
        writer.write_execution(&plan.id, &record).await.unwrap();

        let stem = format!("execution-{}-0", record.recorded_at.timestamp_millis());
        let dir = writer.plan_dir(&plan.id);
        assert!(dir.join(format!("{stem}.json")).exists());
        assert!(dir.join(format!("{stem}-1.json")).exists());

        let stored: ExecutionRecord =
            serde_json::from_slice(&std::fs::read(dir.join(format!("{stem}-1.json"))).unwrap()).unwrap();
        assert_eq!(stored, record);

        std::fs::remove_dir_all(&root).unwrap();
    }
}
