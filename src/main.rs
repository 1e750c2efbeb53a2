mod cli;
mod ui;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use kingdom::backend::{ActionParams, BackendClient, InitialStats};
use kingdom::config::KingdomConfig;
use kingdom::settlement::Settlement;
use kingdom::store::{JsonFileStore, RosterFile};
use ui::RemoteCall;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; --verbose only changes the fallback level.
    let fallback = if cli.verbose { "kingdom=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)))
        .with_writer(std::io::stderr)
        .init();

    let mut config = KingdomConfig::load()?;
    if let Some(url) = &cli.backend_url {
        config.backend_url = url.trim_end_matches('/').to_string();
    }

    let mut file = RosterFile::read(&cli.roster)
        .await
        .with_context(|| format!("failed to read roster {}", cli.roster.display()))?;
    if let Some(civilization) = cli.civilization.clone() {
        file.civilization_id = civilization;
    } else if file.civilization_id.is_empty() {
        file.civilization_id = config
            .default_civilization
            .clone()
            .context("roster has no civilization_id and none was configured")?;
    }

    let backend = Arc::new(BackendClient::from_config(&config)?);
    let store = JsonFileStore::new(cli.roster.clone());
    let (catalog, roster) = file.into_parts();
    let settlement = Settlement::new(backend, store, catalog, roster);
    let catalog = settlement.catalog();

    let changed = match cli.command {
        Command::Jobs { citizen_id } => {
            let jobs = settlement.compatible_jobs(&citizen_id).await?;
            ui::print_jobs(&jobs);
            false
        }
        Command::Assign { citizen_id, job_id } => {
            let applied = settlement.assign_job(&citizen_id, &job_id).await?;
            ui::print_applied(&applied, catalog);
            true
        }
        Command::Unassign { citizen_id } => {
            let applied = settlement.remove_job(&citizen_id).await?;
            ui::print_applied(&applied, catalog);
            true
        }
        Command::Dismiss { citizen_id } => {
            let citizen = settlement.dismiss(&citizen_id).await?;
            println!("  {} dismissed", citizen.full_name());
            true
        }
        Command::Action {
            citizen_id,
            action,
            params,
        } => {
            let params: ActionParams = params.into_iter().collect();
            let call = RemoteCall::start(&format!("{action}: {citizen_id}"));
            let result = settlement.perform_action(&citizen_id, &action, params).await;
            call.finish(&result, &format!("{action} performed"));
            ui::print_applied(&result?, catalog);
            true
        }
        Command::Grow { citizen_id } => {
            let call = RemoteCall::start(&format!("simulating growth: {citizen_id}"));
            let result = settlement.simulate_growth(&citizen_id).await;
            call.finish(&result, "growth simulated");
            ui::print_applied(&result?, catalog);
            true
        }
        Command::Advance => {
            let call = RemoteCall::start(&format!("advancing {}", settlement.civilization_id()));
            let result = settlement.advance().await;
            call.finish(&result, "cycle merged");
            ui::print_merge_report(&result?);
            true
        }
        Command::State => {
            let call = RemoteCall::start(&format!("fetching {}", settlement.civilization_id()));
            let result = settlement.game_state().await;
            call.finish(&result, "state fetched");
            println!("{}", serde_json::to_string_pretty(&result?)?);
            false
        }
        Command::Create {
            name,
            strength,
            intelligence,
            charisma,
        } => {
            let stats = InitialStats {
                strength,
                intelligence,
                charisma,
            };
            let call = RemoteCall::start(&format!("creating {name}"));
            let result = settlement.create_citizen(&name, Some(stats)).await;
            call.finish(&result, "citizen created");
            ui::print_sheet(&result?, catalog);
            true
        }
        Command::Show { citizen_id } => {
            match citizen_id {
                Some(id) => ui::print_sheet(&settlement.citizen(&id).await?, catalog),
                None => {
                    for citizen in settlement.citizens().await {
                        ui::print_sheet(&citizen, catalog);
                    }
                }
            }
            false
        }
    };

    if changed {
        settlement
            .snapshot()
            .await
            .write(&cli.roster)
            .await
            .with_context(|| format!("failed to save roster {}", cli.roster.display()))?;
    }

    Ok(())
}
