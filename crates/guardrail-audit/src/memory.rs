//! In-memory implementation of `AuditWriter`.
//!
//! `InMemoryAuditWriter` keeps every plan and execution record of one
//! orchestrator in a single SHA-256 hash chain. Clones share the chain, so
//! a caller can keep a handle after boxing the writer into `Guardrail`.
//!
//! The mutex is only held for the synchronous append, never across an
//! `.await`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use guardrail_contracts::{
    error::{GuardrailError, GuardrailResult},
    execution::ExecutionRecord,
    plan::{Plan, PlanId},
};
use guardrail_core::traits::AuditWriter;

use crate::{
    chain::{hash_event, verify_chain},
    event::{AuditEvent, AuditLog, AuditRecord},
};

pub(crate) struct InMemoryState {
    /// All events, in append order.
    pub(crate) events: Vec<AuditEvent>,

    /// `this_hash` of the last event, or `GENESIS_HASH` before the first.
    pub(crate) last_hash: String,
}

/// An in-memory, append-only audit writer backed by a SHA-256 hash chain.
#[derive(Clone)]
pub struct InMemoryAuditWriter {
    pub(crate) state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryAuditWriter {
    pub fn new() -> Self {
        let state = InMemoryState {
            events: Vec::new(),
            last_hash: AuditEvent::GENESIS_HASH.to_string(),
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Read access for export and verification. A poisoned lock still
    /// holds a consistent chain because appends never panic midway.
    fn read(&self) -> MutexGuard<'_, InMemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Export every event written so far.
    pub fn export_log(&self) -> AuditLog {
        let state = self.read();
        let terminal_hash = state
            .events
            .last()
            .map(|e| e.this_hash.clone())
            .unwrap_or_default();

        AuditLog {
            events: state.events.clone(),
            exported_at: Utc::now(),
            terminal_hash,
        }
    }

    /// Events recorded for `plan_id`, in chain order.
    pub fn events_for(&self, plan_id: &PlanId) -> Vec<AuditEvent> {
        self.read()
            .events
            .iter()
            .filter(|e| e.plan_id == *plan_id)
            .cloned()
            .collect()
    }

    /// Execution records written for `plan_id`, in submission order.
    pub fn executions_for(&self, plan_id: &PlanId) -> Vec<ExecutionRecord> {
        self.read()
            .events
            .iter()
            .filter_map(|e| match &e.record {
                AuditRecord::Execution(record) if record.plan_id == *plan_id => Some(record.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Verify that the in-memory chain has not been tampered with.
    pub fn verify_integrity(&self) -> bool {
        verify_chain(&self.read().events)
    }

    fn append(&self, record: AuditRecord) -> GuardrailResult<()> {
        let mut state = self.state.lock().map_err(|e| GuardrailError::AuditWriteFailed {
            reason: format!("audit state lock poisoned: {}", e),
        })?;

        let plan_id = record.plan_id();
        if record.is_plan()
            && state
                .events
                .iter()
                .any(|e| e.plan_id == plan_id && e.record.is_plan())
        {
            return Err(GuardrailError::AuditWriteFailed {
                reason: format!("plan {plan_id} has already been recorded"),
            });
        }

        let sequence = state.events.len() as u64;
        let prev_hash = state.last_hash.clone();
        let this_hash = hash_event(&plan_id, sequence, &record, &prev_hash);

        state.events.push(AuditEvent {
            sequence,
            plan_id,
            record,
            prev_hash,
            this_hash: this_hash.clone(),
        });
        state.last_hash = this_hash;

        debug!(plan_id = %plan_id, sequence, hash = %state.last_hash, "audit event appended");
        Ok(())
    }
}

impl Default for InMemoryAuditWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditWriter for InMemoryAuditWriter {
    /// Fails if a plan with the same id was already recorded.
    async fn write_plan(&self, plan: &Plan) -> GuardrailResult<()> {
        self.append(AuditRecord::Plan(Box::new(plan.clone())))
    }

    async fn write_execution(&self, plan_id: &PlanId, record: &ExecutionRecord) -> GuardrailResult<()> {
        if record.plan_id != *plan_id {
            return Err(GuardrailError::AuditWriteFailed {
                reason: format!(
                    "execution record for plan {} filed under plan {}",
                    record.plan_id, plan_id
                ),
            });
        }
        self.append(AuditRecord::Execution(record.clone()))
    }
}
