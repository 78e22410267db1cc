//! # guardrail-core
//!
//! The plan / risk / policy / execute pipeline.
//!
//! This crate provides:
//! - The collaborator traits (`Planner`, `RiskAnalyzer`, `Simulator`,
//!   `PolicyEngine`, `Approver`, `Executor`, `AuditWriter`)
//! - The `Guardrail` orchestrator that wires them together in the correct
//!   trust order
//!
//! ## Usage
//!
//! ```rust,ignore
//! use guardrail_core::Guardrail;
//!
//! let sdk = Guardrail::new(chain_id, planner, simulator, executor, policy)
//!     .with_risk_analyzer(analyzer)
//!     .with_audit(audit);
//! let plan = sdk.plan("erc20.approve", params).await?;
//! let report = sdk.execute(&plan).await?;
//! ```

pub mod sdk;
pub mod traits;

pub use sdk::Guardrail;
