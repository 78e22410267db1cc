//! # guardrail-evm
//!
//! EVM-specific pieces of Guardrail:
//!
//! - [`codec`]: ERC-20 calldata encoding and decoding
//! - [`risk`]: approval heuristics and the [`EvmRiskAnalyzer`]
//! - [`rpc`]: JSON-RPC [`RpcSimulator`] and [`RpcExecutor`]

pub mod codec;
pub mod risk;
pub mod rpc;

pub use codec::{CodecError, Erc20Call};
pub use risk::{detect_approval_risks, EvmRiskAnalyzer, PERMIT2_ADDRESS};
pub use rpc::{JsonRpcClient, RpcError, RpcExecutor, RpcSimulator};
