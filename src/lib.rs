//! Reports, per Sayori-assigned user, the latest comment they left on each of
//! their Jira tickets, optionally persisting the result to DynamoDB.

pub mod comment_store;
pub mod config;
pub mod reconcile;
pub mod records;
pub mod report;
pub mod sources;
pub mod store;

use std::error::Error as StdError;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use log::{info, warn};
use thiserror::Error;
use ticket_api::{find_ticket, FetchError, JiraClient, SayoriClient};

use comment_store::MemorySink;
use config::{AppConfig, ConfigError, Settings, SettingsManager};
use reconcile::{ReconcileError, Reconciler};
use report::{render_report, render_ticket_comments};
use store::{persist_result, DynamoSink, ProvisionOutcome, StoreError};

#[derive(Debug, Parser)]
#[command(name = "jira-roaster")]
#[command(about = "Latest Jira comment per Sayori-assigned user and ticket")]
#[command(version)]
pub struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Reconcile all assignments and print the latest comment per user and ticket
    Report {
        /// Also store each comment
        #[arg(long, value_enum)]
        persist: Option<PersistTarget>,
    },

    /// List every comment one user left on a single Jira ticket
    Ticket {
        /// Jira ticket id, e.g. OPS-123
        ticket_id: String,
        /// Author display name (looked up in Sayori when omitted)
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Create the DynamoDB table on the local endpoint if it is missing
    ProvisionTable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PersistTarget {
    Dynamo,
    Memory,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("ticket {0} is not assigned to anyone in Sayori")]
    UnassignedTicket(String),
    #[error("{failed} of {total} comments could not be stored")]
    PartialPersist { failed: usize, total: usize },
}

/// Installs `env_logger`, defaulting to `info` when `RUST_LOG` is unset.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .try_init();
}

/// Formats `err` followed by each of its causes, separated by `: `.
pub fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut cause = err.source();
    while let Some(inner) = cause {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        cause = inner.source();
    }
    message
}

/// Runs the parsed command line to completion.
pub async fn run(cli: Cli) -> Result<(), AppError> {
    let manager = match &cli.settings {
        Some(path) => Ok(SettingsManager::at(path)),
        None => SettingsManager::platform_default(),
    };
    let settings = load_settings(manager);
    let config = AppConfig::from_env(settings)?;
    info!(
        "Starting jira-roaster (Sayori: {}, Jira: {})",
        config.sayori_base_url, config.jira_base_url
    );

    match cli.command.unwrap_or(Command::Report { persist: None }) {
        Command::Report { persist } => run_report(&config, persist).await,
        Command::Ticket { ticket_id, user } => run_ticket(&config, &ticket_id, user).await,
        Command::ProvisionTable => run_provision(&config).await,
    }
}

/// The settings file is optional, so a missing config directory only costs the defaults.
fn load_settings(manager: Result<SettingsManager, ConfigError>) -> Settings {
    match manager {
        Ok(manager) => {
            info!("Using settings from {}", manager.path().display());
            manager.load()
        }
        Err(err) => {
            warn!("{}, using default settings", err);
            Settings::default()
        }
    }
}

fn build_reconciler(config: &AppConfig) -> Result<Reconciler<SayoriClient, JiraClient>, AppError> {
    let sayori = SayoriClient::new(
        config.sayori_client_config(),
        config.settings.sayori_project.clone(),
    )?;
    let jira = JiraClient::new(config.jira_client_config())?;
    Ok(Reconciler::new(sayori, jira)
        .with_max_concurrent_fetches(config.settings.max_concurrent_fetches))
}

async fn run_report(config: &AppConfig, persist: Option<PersistTarget>) -> Result<(), AppError> {
    let reconciler = build_reconciler(config)?;
    let (result, index) = reconciler.reconcile().await?;
    print!("{}", render_report(&result));

    let summary = match persist {
        None => return Ok(()),
        Some(PersistTarget::Dynamo) => {
            let sink = DynamoSink::connect(config).await;
            info!("Storing comments in table {}", sink.table_name());
            persist_result(&result, &index, &sink).await
        }
        Some(PersistTarget::Memory) => {
            let sink = MemorySink::default();
            let summary = persist_result(&result, &index, &sink).await;
            for item in sink.snapshot() {
                info!("Would store {} / {}", item.user_id, item.ticket_key);
            }
            summary
        }
    };

    if summary.failed > 0 {
        return Err(AppError::PartialPersist {
            failed: summary.failed,
            total: summary.stored + summary.failed,
        });
    }
    Ok(())
}

async fn run_ticket(
    config: &AppConfig,
    ticket_id: &str,
    user: Option<String>,
) -> Result<(), AppError> {
    let reconciler = build_reconciler(config)?;
    let user = match user {
        Some(user) => user,
        None => {
            let tickets = reconciler.assignments().list_tickets().await?;
            let ticket = find_ticket(&tickets, ticket_id)
                .ok_or_else(|| AppError::UnassignedTicket(ticket_id.to_string()))?;
            info!(
                "Ticket {} is assigned to {}",
                ticket_id, ticket.bot_user.display_name
            );
            ticket.bot_user.display_name.clone()
        }
    };

    let bodies = reconciler.reconcile_single_ticket(ticket_id, &user).await?;
    print!("{}", render_ticket_comments(ticket_id, &user, &bodies));
    Ok(())
}

async fn run_provision(config: &AppConfig) -> Result<(), AppError> {
    let sink = DynamoSink::connect(config).await;
    match sink.provision_table().await? {
        ProvisionOutcome::Created => println!("Created table {}", sink.table_name()),
        ProvisionOutcome::AlreadyExists => println!("Table {} already exists", sink.table_name()),
    }
    Ok(())
}
