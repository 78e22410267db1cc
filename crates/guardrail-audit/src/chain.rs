//! Hash-chain primitives: event hashing and chain verification.
//!
//! Hash input layout (bytes, in order):
//!   1. plan_id as its hyphenated UUID string (UTF-8)
//!   2. sequence as 8-byte little-endian
//!   3. prev_hash as UTF-8 bytes (64 ASCII hex chars)
//!   4. compact JSON of the record

use sha2::{Digest, Sha256};

use guardrail_contracts::plan::PlanId;

use crate::event::{AuditEvent, AuditRecord};

/// Compute the SHA-256 hash for a single audit event.
///
/// Returns a lowercase 64-character hex string.
///
/// # Panics
///
/// Panics if `record` cannot be serialized to JSON. Plans and execution
/// records contain only string-keyed maps, so this cannot happen.
pub fn hash_event(plan_id: &PlanId, sequence: u64, record: &AuditRecord, prev_hash: &str) -> String {
    let record_json =
        serde_json::to_vec(record).expect("AuditRecord must always be serializable to JSON");

    let mut hasher = Sha256::new();
    hasher.update(plan_id.to_string().as_bytes());
    hasher.update(sequence.to_le_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(&record_json);

    hex::encode(hasher.finalize())
}

/// Verify the integrity of a hash chain.
///
/// Valid when every event's `prev_hash` is the `this_hash` of its
/// predecessor (`GENESIS_HASH` for the first), every `this_hash` matches the
/// hash recomputed from the event's own fields, sequences run 0, 1, 2, ...
/// and `plan_id` agrees with the embedded record. An empty chain is valid.
pub fn verify_chain(events: &[AuditEvent]) -> bool {
    let mut expected_prev = AuditEvent::GENESIS_HASH.to_string();

    for (position, event) in events.iter().enumerate() {
        if event.sequence != position as u64 || event.plan_id != event.record.plan_id() {
            return false;
        }
        if event.prev_hash != expected_prev {
            return false;
        }
        let recomputed = hash_event(&event.plan_id, event.sequence, &event.record, &event.prev_hash);
        if event.this_hash != recomputed {
            return false;
        }
        expected_prev = event.this_hash.clone();
    }

    true
}
