// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// XYK CLI - Quotes, genesis files and scripted pool sessions
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "xyk")]
#[command(about = "Constant-product pool ledger - quotes and scripted sessions", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Quote a swap against raw reserves (0.3% fee)
    Quote {
        /// Reserve of the token being sold
        #[arg(long)]
        reserve_in: u128,

        /// Reserve of the token being bought
        #[arg(long)]
        reserve_out: u128,

        /// Amount to sell (atomic units)
        #[arg(short, long)]
        amount_in: u128,
    },

    /// Write a sample genesis config and, optionally, a sample call script
    Genesis {
        /// Output path for the genesis TOML
        #[arg(short, long)]
        output: PathBuf,

        /// Output path for a sample call script (JSON)
        #[arg(short, long)]
        script: Option<PathBuf>,

        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Run a call script against a runtime built from a genesis config
    Simulate {
        /// Genesis config (TOML)
        #[arg(short, long, env = "XYK_GENESIS")]
        genesis: PathBuf,

        /// Call script: JSON array of calls. "@name" and "$SYMBOL" strings
        /// are replaced by the derived address / token id.
        #[arg(short, long)]
        script: PathBuf,

        /// Print one JSON record per call instead of colored text
        #[arg(long)]
        json: bool,

        /// Abort at the first rejected call
        #[arg(long)]
        stop_on_error: bool,

        /// Write the final state snapshot here
        #[arg(long)]
        state_out: Option<PathBuf>,
    },

    /// Show the pool and LP positions stored in a state snapshot
    Inspect {
        /// State snapshot written by `simulate --state-out`
        #[arg(short, long)]
        state: PathBuf,

        /// Genesis config, used only to print names instead of hex
        #[arg(short, long, env = "XYK_GENESIS")]
        genesis: Option<PathBuf>,

        /// Only show these holders (account name or hex address)
        #[arg(long)]
        holder: Vec<String>,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        print_error(&e.to_string());
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Quote {
            reserve_in,
            reserve_out,
            amount_in,
        } => commands::quote::handle(reserve_in, reserve_out, amount_in),
        Commands::Genesis {
            output,
            script,
            force,
        } => commands::genesis::handle(&output, script.as_deref(), force),
        Commands::Simulate {
            genesis,
            script,
            json,
            stop_on_error,
            state_out,
        } => commands::simulate::handle(&genesis, &script, json, stop_on_error, state_out.as_deref()),
        Commands::Inspect {
            state,
            genesis,
            holder,
        } => commands::inspect::handle(&state, genesis.as_deref(), &holder),
    }
}

fn print_success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red().bold(), msg);
}

fn print_info(msg: &str) {
    println!("{} {}", "ℹ".blue().bold(), msg);
}

// ─────────────────────────────────────────────────────────────────
// UNIT TESTS
// ─────────────────────────────────────────────────────────────────
