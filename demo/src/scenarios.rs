//! Demo scenarios. Each one plans a single action, prints the plan and the
//! policy decision, then executes it when allowed.

use alloy_primitives::{address, Address, U256};
use serde_json::Value;

use guardrail_actions::Action;
use guardrail_contracts::{error::GuardrailError, intent::Intent, plan::Plan};
use guardrail_core::Guardrail;
use guardrail_evm::PERMIT2_ADDRESS;

use crate::runtime::{audit_sink, build_guardrail, load_policy, AuditSink, DemoResult, Settings};

const DEFAULT_POLICY: &str = include_str!("../../policies/default.toml");
const STRICT_POLICY: &str = include_str!("../../policies/strict.toml");

/// USDC on Base.
const USDC: Address = address!("833589fCD6eDb6E08f4c7C32D4f71b54bdA02913");
const RECIPIENT: Address = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");
const BURN: Address = address!("000000000000000000000000000000000000dEaD");

const ONE_GWEI: u64 = 1_000_000_000;

struct Session {
    guardrail: Guardrail,
    audit: AuditSink,
}

fn session(settings: &Settings, fallback_policy: &str) -> DemoResult<Session> {
    let policy = load_policy(settings, fallback_policy)?;
    let audit = audit_sink(settings);
    let guardrail = build_guardrail(settings, policy, &audit)?;
    Ok(Session { guardrail, audit })
}

pub async fn run_all(settings: &Settings) -> DemoResult<()> {
    native_transfer(settings).await?;
    erc20_transfer(settings).await?;
    infinite_approval(settings).await?;
    deny_list(settings).await?;
    Ok(())
}

pub async fn native_transfer(settings: &Settings) -> DemoResult<()> {
    println!("=== Native transfer ===");
    println!();
    let s = session(settings, DEFAULT_POLICY)?;
    let intent = Action::transfer_native(RECIPIENT, U256::from(10_000_000u64 * ONE_GWEI)).into();
    plan_and_execute(&s, intent, true).await
}

pub async fn erc20_transfer(settings: &Settings) -> DemoResult<()> {
    println!("=== ERC-20 transfer ===");
    println!();
    let s = session(settings, DEFAULT_POLICY)?;
    let intent = Action::erc20_transfer(USDC, RECIPIENT, U256::from(25_000_000u64)).into();
    plan_and_execute(&s, intent, true).await
}

/// An unlimited Permit2 approval is blocked; the exact-amount version runs.
pub async fn infinite_approval(settings: &Settings) -> DemoResult<()> {
    println!("=== Infinite approval ===");
    println!();
    let s = session(settings, DEFAULT_POLICY)?;

    println!("  Attempt 1: approve UINT256_MAX to Permit2");
    let unlimited = Action::erc20_approve(USDC, PERMIT2_ADDRESS, U256::MAX).into();
    plan_and_execute(&s, unlimited, true).await?;

    println!("  Attempt 2: approve exactly 25 USDC to Permit2");
    let exact = Action::approve_exact(USDC, PERMIT2_ADDRESS, U256::from(25_000_000u64)).into();
    plan_and_execute(&s, exact, true).await
}

pub async fn deny_list(settings: &Settings) -> DemoResult<()> {
    println!("=== Deny list ===");
    println!();
    let s = session(settings, STRICT_POLICY)?;
    let intent = Action::transfer_native(BURN, U256::from(ONE_GWEI)).into();
    plan_and_execute(&s, intent, true).await
}

/// Plan an arbitrary catalog action from the command line.
pub async fn custom(settings: &Settings, action: &str, params: &str, execute: bool) -> DemoResult<()> {
    println!("=== {action} ===");
    println!();
    let params: Value = serde_json::from_str(params)?;
    let s = session(settings, DEFAULT_POLICY)?;
    plan_and_execute(&s, Intent::new(action, params), execute).await
}

async fn plan_and_execute(s: &Session, intent: Intent, execute: bool) -> DemoResult<()> {
    let plan = s.guardrail.plan_intent(intent).await?;
    print_plan(&plan);

    if execute {
        match s.guardrail.execute(&plan).await {
            Ok(report) => {
                for (index, receipt) in report.receipts.iter().enumerate() {
                    println!("  Step {index} submitted:       {}", receipt.tx_hash);
                }
            }
            Err(GuardrailError::PolicyBlocked { .. }) => {
                println!("  Execution:              REFUSED (policy)");
            }
            Err(GuardrailError::ApprovalRejected { .. }) => {
                println!("  Execution:              REFUSED (approver)");
            }
            Err(e) => return Err(e.into()),
        }
    }

    s.audit.report(&plan);
    println!();
    Ok(())
}

fn print_plan(plan: &Plan) {
    println!("  Plan {}", plan.id);
    println!("  {}: {}", plan.explain.title, plan.explain.summary);
    for bullet in &plan.explain.bullets {
        println!("    - {bullet}");
    }

    for (index, step) in plan.steps.iter().enumerate() {
        println!("  Step {index} -> {}", step.tx.to);
        if let Some(sim) = &step.simulation {
            match (sim.ok, sim.gas_estimate, &sim.error) {
                (true, Some(gas), _) => println!("    simulation: ok, gas {gas}"),
                (true, None, _) => println!("    simulation: ok"),
                (false, _, error) => println!(
                    "    simulation: FAILED ({})",
                    error.as_deref().unwrap_or("unknown error")
                ),
            }
        }
        for flag in &step.risk_flags {
            println!("    risk: {flag}");
        }
    }

    let policy = plan.policy();
    println!(
        "  Policy verdict:         {}",
        if policy.allowed { "ALLOW" } else { "DENY" }
    );
    for violation in &policy.violations {
        println!("    {violation}");
    }
}
