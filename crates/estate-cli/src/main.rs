//! `estate-cli`: replay settlement scenarios against an in-memory topology.

mod logging;
mod replay;
mod script;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueHint};
use estate_types::SettlementConfig;

use crate::{replay::Replayer, script::Script};

#[derive(Parser)]
#[command(name = "estate-cli")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario script and print each step and the final state.
    Replay {
        #[arg(value_hint = ValueHint::FilePath)]
        script: PathBuf,

        /// Settlement configuration; defaults apply when omitted.
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        config: Option<PathBuf>,

        /// Print the final report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the default settlement configuration.
    DefaultConfig,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(if cli.verbose { "debug" } else { "info" }, cli.json_logs);

    match cli.command {
        Commands::Replay {
            script,
            config,
            json,
        } => {
            let config = match config {
                Some(path) => SettlementConfig::from_path(&path)
                    .with_context(|| format!("loading config {}", path.display()))?,
                None => SettlementConfig::default(),
            };
            let script = Script::from_path(&script)
                .with_context(|| format!("loading script {}", script.display()))?;

            let mut replayer = Replayer::new(&config, &script.adjudicator)?;
            let outcomes = replayer.run(&script);
            let rejected = outcomes.iter().filter(|o| o.result.is_err()).count();
            for outcome in &outcomes {
                match &outcome.result {
                    Ok(detail) => println!("{:>3}  ok   {}: {detail}", outcome.index, outcome.label),
                    Err(err) => println!("{:>3}  err  {}: {err}", outcome.index, outcome.label),
                }
            }

            let report = replayer.report();
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
            println!("{} step(s), {rejected} rejected", outcomes.len());
            if !report.supply_conserved {
                anyhow::bail!("payment supply is not conserved");
            }
        }
        Commands::DefaultConfig => {
            println!(
                "{}",
                serde_json::to_string_pretty(&SettlementConfig::default())?
            );
        }
    }

    Ok(())
}

fn print_report(report: &replay::Report) {
    println!();
    println!("balances (available / held)");
    for (name, balance) in &report.balances {
        println!("  {name:<16} {} / {}", balance.available, balance.held);
    }
    println!("assets");
    for (name, asset) in &report.assets {
        let lock = if asset.locked { " [locked]" } else { "" };
        println!("  {name:<16} owner {}{lock}", asset.owner);
    }
    println!("deals");
    for (name, deal) in &report.deals {
        println!(
            "  {name:<16} {} {} held {} journal {}x {}",
            deal.kind,
            deal.state,
            deal.held,
            deal.journal_entries,
            &deal.journal_head[..deal.journal_head.len().min(12)],
        );
    }
    println!("total supply {}", report.total_supply);
}
