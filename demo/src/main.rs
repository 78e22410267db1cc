//! Guardrail demo CLI
//!
//! Plans and executes EVM actions through the full Guardrail pipeline. By
//! default transactions go to an in-process sandbox chain; pass `--rpc-url`
//! to use a JSON-RPC node with an unlocked account instead.
//!
//! Usage:
//!   cargo run -p demo -- --auto-approve run-all
//!   cargo run -p demo -- infinite-approval
//!   cargo run -p demo -- --policy policies/strict.toml deny-list
//!   cargo run -p demo -- plan --action transfer.native \
//!       --params '{"to":"0x70997970C51812dc3A010C7d01b50e0d17dc79C8","valueWei":"1"}' --execute

mod runtime;
mod sandbox;
mod scenarios;

use std::path::PathBuf;

use alloy_primitives::Address;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use guardrail_contracts::plan::ChainId;

use crate::runtime::{DemoResult, Settings};

// ── CLI definition ────────────────────────────────────────────────────────────

/// Guardrail: policy-gated EVM transaction planning.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "Guardrail demo: plan, check and execute EVM actions",
    long_about = "Runs Guardrail scenarios showing risk flags, policy enforcement,\n\
                  approval gating and audit records."
)]
struct Cli {
    /// Chain the planner and executor target (8453 = Base).
    #[arg(long, global = true, default_value_t = 8453)]
    chain_id: ChainId,

    /// Policy TOML file. Each scenario has its own default.
    #[arg(long, global = true)]
    policy: Option<PathBuf>,

    /// Write audit records as JSON files under this directory instead of
    /// keeping them in memory.
    #[arg(long, global = true)]
    audit_dir: Option<PathBuf>,

    /// JSON-RPC endpoint. Without it the sandbox chain is used.
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Sender account for simulation and execution over RPC.
    #[arg(long, global = true)]
    from: Option<Address>,

    /// Approve every allowed plan without prompting.
    #[arg(long, global = true)]
    auto_approve: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run every scenario in sequence.
    RunAll,
    /// Send native value to an address (allowed).
    NativeTransfer,
    /// Unlimited Permit2 approval (blocked), then an exact one (allowed).
    InfiniteApproval,
    /// Native transfer to a denied address under the strict policy (blocked).
    DenyList,
    /// ERC-20 transfer under the default policy (allowed).
    Erc20Transfer,
    /// Plan any catalog action.
    Plan {
        /// Action name, e.g. `erc20.approve`.
        #[arg(long)]
        action: String,
        /// Action params as a JSON object.
        #[arg(long)]
        params: String,
        /// Execute the plan if policy allows it.
        #[arg(long)]
        execute: bool,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Set RUST_LOG=debug for pipeline detail.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();
    let settings = Settings {
        chain_id: cli.chain_id,
        policy: cli.policy,
        audit_dir: cli.audit_dir,
        rpc_url: cli.rpc_url,
        from: cli.from,
        auto_approve: cli.auto_approve,
    };

    print_banner(&settings);

    match run(&settings, cli.command).await {
        Ok(()) => println!("Done."),
        Err(e) => {
            eprintln!("Demo error: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run(settings: &Settings, command: Command) -> DemoResult<()> {
    match command {
        Command::RunAll => scenarios::run_all(settings).await,
        Command::NativeTransfer => scenarios::native_transfer(settings).await,
        Command::InfiniteApproval => scenarios::infinite_approval(settings).await,
        Command::DenyList => scenarios::deny_list(settings).await,
        Command::Erc20Transfer => scenarios::erc20_transfer(settings).await,
        Command::Plan {
            action,
            params,
            execute,
        } => scenarios::custom(settings, &action, &params, execute).await,
    }
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner(settings: &Settings) {
    println!();
    println!("Guardrail: policy-gated EVM execution");
    println!("======================================");
    println!();
    println!("Pipeline per plan:");
    println!("  [1] Planner turns the action into transaction steps");
    println!("  [2] Risk analyzer flags each step, simulator dry-runs it");
    println!("  [3] Policy engine decides once: ALLOW or DENY");
    println!("  [4] Approver signs off, then steps are submitted in order");
    println!("  [5] Plan and every submission are written to the audit trail");
    println!();
    println!(
        "Chain {} via {}",
        settings.chain_id,
        settings.rpc_url.as_deref().unwrap_or("sandbox")
    );
    println!();
}
