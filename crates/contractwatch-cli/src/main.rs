mod display;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use contractwatch_core::{NotificationPreferences, recent_contracts};
use contractwatch_sync::{ContractClient, ContractSource, StatusSyncEngine, SyncConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "contractwatch", version, about = "Follow contract analyses from the terminal")]
struct Cli {
    /// Base URL of the analysis API.
    #[arg(long, env = "CONTRACTWATCH_API_URL", default_value = "http://localhost:8000")]
    api_url: String,

    /// Bearer token for the analysis API.
    #[arg(long, env = "CONTRACTWATCH_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Refresh period while analyses are running, in milliseconds.
    #[arg(long, env = "CONTRACTWATCH_POLL_INTERVAL_MS", default_value_t = 5000)]
    poll_interval_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List contracts, newest first.
    List {
        /// Print raw JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Show one contract.
    Show { id: i64 },
    /// Dashboard counts and the most recent contracts.
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Follow running analyses and print notifications as they finish.
    Watch {
        /// Don't announce completed analyses.
        #[arg(long)]
        no_complete_alerts: bool,
        /// Don't announce failed analyses.
        #[arg(long)]
        no_failure_alerts: bool,
    },
    /// Delete a contract.
    Delete { id: i64 },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!("contractwatch v{}", env!("CARGO_PKG_VERSION"));

    let mut client = ContractClient::new(cli.api_url.clone());
    if let Some(token) = &cli.token {
        client = client.with_token(token.clone());
    }

    let mut config = SyncConfig {
        poll_interval: Duration::from_millis(cli.poll_interval_ms.max(1)),
        ..SyncConfig::default()
    };

    match cli.command {
        Command::List { json } => {
            let contracts = client
                .list_contracts()
                .await
                .context("listing contracts")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&contracts)?);
            } else {
                print!("{}", display::contract_table(&contracts, chrono::Utc::now()));
            }
        }
        Command::Show { id } => {
            let contracts = client
                .list_contracts()
                .await
                .context("listing contracts")?;
            let contract = contracts
                .iter()
                .find(|c| c.id == id)
                .with_context(|| format!("no contract with id {id}"))?;
            print!("{}", display::contract_card(contract, chrono::Utc::now()));
        }
        Command::Stats { json } => {
            let engine = StatusSyncEngine::new(client, config);
            engine.load().await.context("loading contracts")?;
            engine.shutdown();
            let stats = engine.stats();
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                let contracts = engine.contracts();
                println!("Contracts");
                print!("{}", display::stats_summary(&stats));
                println!();
                println!("Recent");
                print!(
                    "{}",
                    display::contract_table(recent_contracts(&contracts), chrono::Utc::now())
                );
                println!();
                println!("Unread notifications: {}", engine.unread_count());
            }
        }
        Command::Watch {
            no_complete_alerts,
            no_failure_alerts,
        } => {
            config.preferences = NotificationPreferences {
                analysis_complete: !no_complete_alerts,
                analysis_failed: !no_failure_alerts,
            };
            let engine = StatusSyncEngine::new(client, config);
            watch(&engine).await?;
        }
        Command::Delete { id } => {
            let client = Arc::new(client);
            let engine = StatusSyncEngine::new(Arc::clone(&client), config);
            engine.load().await.context("loading contracts")?;
            client
                .delete_contract(id)
                .await
                .with_context(|| format!("deleting contract {id}"))?;
            match engine.remove_contract(id) {
                Some(c) => println!("Deleted #{id} {}", c.title),
                None => println!("Deleted #{id}"),
            }
            engine.shutdown();
            print!("{}", display::stats_summary(&engine.stats()));
        }
    }

    Ok(())
}

/// Print unread notifications until every analysis has settled or Ctrl-C.
async fn watch<S: ContractSource + 'static>(engine: &StatusSyncEngine<S>) -> anyhow::Result<()> {
    engine.load().await.context("loading contracts")?;
    let mut changes = engine.subscribe();

    let stats = engine.stats();
    if stats.in_progress > 0 {
        eprintln!("Watching {} running analyses...", stats.in_progress);
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let now = chrono::Utc::now();
        for item in engine.notifications().into_iter().filter(|n| !n.read) {
            println!("{}", display::notification_line(&item, now));
            engine.mark_read(&item.id);
        }

        if !engine.is_polling() {
            break;
        }

        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = &mut ctrl_c => {
                tracing::info!("interrupted");
                break;
            }
        }
    }

    engine.shutdown();
    let stats = engine.stats();
    eprintln!(
        "{} completed, {} still running, {} high risk",
        stats.completed, stats.in_progress, stats.high_risk
    );
    Ok(())
}
