//! # guardrail-policy
//!
//! A config-driven policy engine for Guardrail plans.
//!
//! ## Overview
//!
//! This crate provides [`GuardrailPolicyEngine`], which implements the
//! [`PolicyEngine`](guardrail_core::traits::PolicyEngine) trait. Options are
//! declared in TOML (or JSON), validated eagerly, and applied to every step
//! of a draft plan. All rules run; the plan is denied if any of them raises
//! a `high` violation.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use guardrail_policy::GuardrailPolicyEngine;
//!
//! let engine = GuardrailPolicyEngine::from_file(Path::new("policies/strict.toml"))?;
//! // Pass `engine` to `guardrail_core::Guardrail::new(...)`.
//! ```

pub mod engine;
pub mod rule;

pub use engine::GuardrailPolicyEngine;
pub use rule::PolicyConfig;

// ── Tests ─────────────────────────────────────────────────────────────────────
