//! Wiring: turns CLI settings into a ready `Guardrail` plus the handles the
//! demo needs afterwards (audit inspection).

use std::path::PathBuf;

use alloy_primitives::Address;
use async_trait::async_trait;
use thiserror::Error;
use tokio::task;

use guardrail_actions::ActionPlanner;
use guardrail_audit::{FileAuditWriter, InMemoryAuditWriter};
use guardrail_contracts::{
    error::GuardrailError,
    execution::ApprovalRequest,
    plan::{ChainId, Plan},
};
use guardrail_core::{
    traits::{Approver, AuditWriter, Executor, Simulator},
    Guardrail,
};
use guardrail_evm::{EvmRiskAnalyzer, JsonRpcClient, RpcError, RpcExecutor, RpcSimulator};
use guardrail_policy::GuardrailPolicyEngine;

use crate::sandbox::{SandboxExecutor, SandboxSimulator};

#[derive(Debug, Error)]
pub enum DemoError {
    #[error(transparent)]
    Guardrail(#[from] GuardrailError),

    #[error("rpc client: {0}")]
    Rpc(#[from] RpcError),

    #[error("--params is not valid JSON: {0}")]
    Params(#[from] serde_json::Error),
}

pub type DemoResult<T> = Result<T, DemoError>;

/// Everything the CLI flags control.
#[derive(Debug, Clone)]
pub struct Settings {
    pub chain_id: ChainId,
    pub policy: Option<PathBuf>,
    pub audit_dir: Option<PathBuf>,
    pub rpc_url: Option<String>,
    pub from: Option<Address>,
    pub auto_approve: bool,
}

/// Where audit records go. The in-memory chain is kept so it can be
/// verified at the end of a run.
#[derive(Clone)]
pub enum AuditSink {
    Memory(InMemoryAuditWriter),
    Files(FileAuditWriter),
}

impl AuditSink {
    fn boxed(&self) -> Box<dyn AuditWriter> {
        match self {
            AuditSink::Memory(writer) => Box::new(writer.clone()),
            AuditSink::Files(writer) => Box::new(writer.clone()),
        }
    }

    pub fn report(&self, plan: &Plan) {
        match self {
            AuditSink::Memory(writer) => println!(
                "  Audit chain integrity:  {} ({} event(s) for this plan, {} in chain)",
                if writer.verify_integrity() { "VERIFIED" } else { "FAILED" },
                writer.events_for(&plan.id).len(),
                writer.len()
            ),
            AuditSink::Files(writer) => println!(
                "  Audit records:          {}",
                writer.plan_dir(&plan.id).display()
            ),
        }
    }
}

/// Approves without asking.
pub struct AutoApprover;

#[async_trait]
impl Approver for AutoApprover {
    async fn approve(&self, request: ApprovalRequest<'_>) -> bool {
        println!("  Approver:               auto-approved \"{}\"", request.summary);
        true
    }
}

/// Asks on the terminal. Anything but `y`/`yes` declines.
pub struct PromptApprover;

#[async_trait]
impl Approver for PromptApprover {
    async fn approve(&self, request: ApprovalRequest<'_>) -> bool {
        let prompt = format!(
            "  Execute plan {} ({} step(s)): {}? [y/N] ",
            request.plan.id,
            request.plan.steps.len(),
            request.summary
        );
        let answer = task::spawn_blocking(move || {
            use std::io::Write;

            print!("{prompt}");
            std::io::stdout().flush().ok()?;
            let mut line = String::new();
            std::io::stdin().read_line(&mut line).ok()?;
            Some(line)
        })
        .await
        .ok()
        .flatten()
        .unwrap_or_default();

        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

/// Load the policy from `--policy`, falling back to the scenario's own.
pub fn load_policy(settings: &Settings, fallback_toml: &str) -> DemoResult<GuardrailPolicyEngine> {
    let engine = match &settings.policy {
        Some(path) => GuardrailPolicyEngine::from_file(path)?,
        None => GuardrailPolicyEngine::from_toml_str(fallback_toml)?,
    };
    Ok(engine)
}

pub fn audit_sink(settings: &Settings) -> AuditSink {
    match &settings.audit_dir {
        Some(dir) => AuditSink::Files(FileAuditWriter::new(dir)),
        None => AuditSink::Memory(InMemoryAuditWriter::new()),
    }
}

fn chain_backend(settings: &Settings) -> DemoResult<(Box<dyn Simulator>, Box<dyn Executor>)> {
    let Some(url) = &settings.rpc_url else {
        return Ok((Box::new(SandboxSimulator), Box::new(SandboxExecutor::new())));
    };

    let mut simulator = RpcSimulator::new(JsonRpcClient::new(url.clone())?);
    let mut executor = RpcExecutor::new(JsonRpcClient::new(url.clone())?);
    if let Some(from) = settings.from {
        simulator = simulator.with_from(from);
        executor = executor.with_from(from);
    }
    Ok((Box::new(simulator), Box::new(executor)))
}

/// Build a fully wired orchestrator.
pub fn build_guardrail(
    settings: &Settings,
    policy: GuardrailPolicyEngine,
    audit: &AuditSink,
) -> DemoResult<Guardrail> {
    let (simulator, executor) = chain_backend(settings)?;
    let approver: Box<dyn Approver> = if settings.auto_approve {
        Box::new(AutoApprover)
    } else {
        Box::new(PromptApprover)
    };

    Ok(Guardrail::new(
        settings.chain_id,
        Box::new(ActionPlanner::new(settings.chain_id)),
        simulator,
        executor,
        Box::new(policy),
    )
    .with_risk_analyzer(Box::new(EvmRiskAnalyzer::new()))
    .with_audit(audit.boxed())
    .with_approver(approver))
}
