//! Command line client for the relay: send one action or a batch of phone
//! validations.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use leadflow_relay::models::{WebhookAction, WebhookPayload};
use leadflow_relay::services::{load_leads, WebhookDispatcher};

#[derive(Parser)]
#[command(name = "leadflow-dispatch")]
#[command(about = "Send LeadFlow actions through the webhook relay")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    #[arg(
        long,
        global = true,
        env = "RELAY_URL",
        default_value = "http://localhost:8787",
        help = "Base URL of the relay"
    )]
    relay_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a single action with a JSON payload
    Send {
        #[arg(help = "Action tag: launch, pause, resume or validate_phone")]
        action: WebhookAction,

        #[arg(short, long, default_value = "{}", help = "JSON payload")]
        payload: String,
    },

    /// Validate the phone of every lead in a JSON file, concurrently
    ValidatePhones {
        #[arg(help = "Path to a JSON array of leads")]
        leads: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let dispatcher = WebhookDispatcher::new(args.relay_url)?;

    match args.command {
        Commands::Send { action, payload } => {
            let payload: WebhookPayload =
                serde_json::from_str(&payload).context("Payload must be a JSON object")?;
            let result = dispatcher.send(action, &payload).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(if result.success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::ValidatePhones { leads } => {
            let leads = load_leads(&leads)?;
            let summary = dispatcher.dispatch_phone_validations(leads).await;
            println!(
                "{} validações enviadas com sucesso. {} falharam.",
                summary.succeeded, summary.failed
            );
            Ok(if summary.failed == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}
