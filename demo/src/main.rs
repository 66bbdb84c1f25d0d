//! Concierge support desk: console chat and scenario runner.
//!
//! Usage:
//!   cargo run -p concierge-demo -- chat
//!   cargo run -p concierge-demo -- chat --guardrails my-guardrails.toml
//!   cargo run -p concierge-demo -- scenario all
//!   cargo run -p concierge-demo -- scenario lateral-handoff

mod chat;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use concierge_contracts::error::ConciergeResult;
use concierge_core::config::OrchestratorConfig;
use concierge_support::{
    scenarios::{self, billing_handoff, forbidden_term, lateral_handoff, premium_refund},
    SupportDesk,
};

// ── CLI definition ────────────────────────────────────────────────────────────

/// Concierge: a guardrailed multi-agent customer support desk.
#[derive(Parser)]
#[command(
    name = "concierge",
    about = "Concierge customer support desk",
    long_about = "Chat with the Concierge support desk, or replay the scripted scenarios showing\n\
                  triage routing, tool gating, guardrail refusals and handoff rules."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start an interactive support session on the console.
    Chat {
        /// Agent registry and tool catalog (TOML). Defaults to the built-in policy.
        #[arg(long)]
        agents: Option<PathBuf>,
        /// Guardrail policy (TOML). Defaults to the built-in policy.
        #[arg(long)]
        guardrails: Option<PathBuf>,
        /// Orchestrator settings (TOML).
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Replay one or all of the scripted scenarios.
    Scenario {
        #[arg(value_enum, default_value_t = Which::All)]
        which: Which,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Which {
    All,
    BillingHandoff,
    PremiumRefund,
    ForbiddenTerm,
    LateralHandoff,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Set RUST_LOG=info to follow the orchestrator's decisions.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Chat { agents, guardrails, config } => {
            run_chat(agents.as_deref(), guardrails.as_deref(), config.as_deref())
        }
        Command::Scenario { which } => run_scenario(which),
    };

    if let Err(e) = result {
        eprintln!("concierge: {}", e);
        std::process::exit(1);
    }
}

fn run_chat(
    agents: Option<&std::path::Path>,
    guardrails: Option<&std::path::Path>,
    config: Option<&std::path::Path>,
) -> ConciergeResult<()> {
    let config = match config {
        Some(path) => OrchestratorConfig::from_file(path)?,
        None => OrchestratorConfig::default(),
    };
    let desk = SupportDesk::from_paths(agents, guardrails, config)?;
    chat::run(&desk)
}

// ── Scenario dispatch ─────────────────────────────────────────────────────────

fn run_scenario(which: Which) -> ConciergeResult<()> {
    print_banner();
    match which {
        Which::All => scenarios::run_all()?,
        Which::BillingHandoff => billing_handoff::run_scenario()?,
        Which::PremiumRefund => premium_refund::run_scenario()?,
        Which::ForbiddenTerm => forbidden_term::run_scenario()?,
        Which::LateralHandoff => lateral_handoff::run_scenario()?,
    }
    println!("All selected scenarios completed successfully.");
    Ok(())
}

fn print_banner() {
    println!();
    println!("Concierge Support Desk");
    println!("======================");
    println!();
    println!("Per user turn:");
    println!("  [1] Inbound guardrail: blocked text is refused before any agent sees it");
    println!("  [2] Active agent is prompted with only the tools its gate grants");
    println!("  [3] Tool calls are verified, executed, and fed back to the agent");
    println!("  [4] Handoffs follow the registry: triage routes, specialists return to triage");
    println!("  [5] Outbound guardrail, then every event lands in the SHA-256 audit chain");
    println!();
}
