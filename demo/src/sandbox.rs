//! In-process sandbox chain.
//!
//! Lets the demo run the full plan/execute pipeline without a node. Every
//! step simulates successfully with its intrinsic gas cost, and submissions
//! return a deterministic hash derived from the chain id, a local nonce and
//! the transaction fields.

use std::sync::atomic::{AtomicU64, Ordering};

use alloy_primitives::keccak256;
use async_trait::async_trait;
use tracing::debug;

use guardrail_contracts::{
    error::GuardrailResult,
    execution::ExecutionReceipt,
    plan::{ChainId, PlanStep, SimulationResult},
};
use guardrail_core::traits::{Executor, Simulator};

const TX_BASE_GAS: u64 = 21_000;
const ZERO_BYTE_GAS: u64 = 4;
const NONZERO_BYTE_GAS: u64 = 16;

/// Intrinsic gas: base cost plus calldata cost.
pub fn intrinsic_gas(step: &PlanStep) -> u64 {
    let data = step.tx.data.as_ref().map(|d| &d[..]).unwrap_or_default();
    data.iter().fold(TX_BASE_GAS, |gas, byte| {
        gas + if *byte == 0 { ZERO_BYTE_GAS } else { NONZERO_BYTE_GAS }
    })
}

pub struct SandboxSimulator;

#[async_trait]
impl Simulator for SandboxSimulator {
    async fn simulate_tx(&self, step: &PlanStep, _chain_id: ChainId) -> SimulationResult {
        SimulationResult::succeeded(intrinsic_gas(step), None)
    }
}

#[derive(Default)]
pub struct SandboxExecutor {
    nonce: AtomicU64,
}

impl SandboxExecutor {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Executor for SandboxExecutor {
    async fn execute_tx(&self, step: &PlanStep, chain_id: ChainId) -> GuardrailResult<ExecutionReceipt> {
        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);

        let mut preimage = Vec::new();
        preimage.extend_from_slice(&chain_id.to_be_bytes());
        preimage.extend_from_slice(&nonce.to_be_bytes());
        preimage.extend_from_slice(step.tx.to.as_slice());
        preimage.extend_from_slice(&step.tx.value_or_zero().to_be_bytes::<32>());
        if let Some(data) = &step.tx.data {
            preimage.extend_from_slice(data);
        }
        let tx_hash = keccak256(&preimage);

        debug!(%tx_hash, nonce, chain_id, "sandbox transaction accepted");
        Ok(ExecutionReceipt { tx_hash })
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{Address, Bytes};
    use guardrail_contracts::plan::TxRequest;

    use super::*;

    #[test]
    fn intrinsic_gas_prices_calldata() {
        let plain = PlanStep::tx(TxRequest::new(Address::ZERO));
        assert_eq!(intrinsic_gas(&plain), 21_000);

        let call = PlanStep::tx(TxRequest::new(Address::ZERO).with_data(Bytes::from(vec![0, 1, 0, 2])));
        assert_eq!(intrinsic_gas(&call), 21_000 + 4 + 16 + 4 + 16);
    }

    #[tokio::test]
    async fn hashes_differ_per_submission() {
        let executor = SandboxExecutor::new();
        let step = PlanStep::tx(TxRequest::new(Address::with_last_byte(1)));

        let a = executor.execute_tx(&step, 8453).await.unwrap();
        let b = executor.execute_tx(&step, 8453).await.unwrap();
        assert_ne!(a.tx_hash, b.tx_hash);
    }
}
