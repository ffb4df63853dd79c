//! Generates a full week of plans for one user.
//!
//! Usage: `generate-week <user-id> <profile.json>`

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use uuid::Uuid;

use nutria::config::OrchestratorConfig;
use nutria::logging;
use nutria::orchestrator::{progress, HttpGenerationClient, Orchestrator, Outcome};
use nutria::plan::dto::UserProfile;
use nutria::store::PgDocumentStore;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    logging::init();

    let mut args = std::env::args().skip(1);
    let (user_arg, profile_arg) = match (args.next(), args.next()) {
        (Some(u), Some(p)) => (u, p),
        _ => anyhow::bail!("usage: generate-week <user-id> <profile.json>"),
    };
    let user_id: Uuid = user_arg.parse().context("user id must be a UUID")?;
    let profile: UserProfile = serde_json::from_str(
        &std::fs::read_to_string(&profile_arg).with_context(|| format!("read {}", profile_arg))?,
    )
    .with_context(|| format!("parse profile {}", profile_arg))?;

    let config = OrchestratorConfig::from_env()?;
    let store = Arc::new(PgDocumentStore::connect(&config.database_url).await?);
    let client = Arc::new(HttpGenerationClient::new(&config.plan_api_url)?);

    let orchestrator = Orchestrator::new(client, store)
        .with_job_delay(config.job_delay)
        .with_water_reset(config.water_reset);

    let printer = tokio::spawn(progress::follow(orchestrator.subscribe(), |p| println!("{}", p)));

    let outcome = orchestrator.orchestrate(user_id, &profile).await;
    drop(orchestrator);
    if let Err(e) = printer.await {
        warn!(error = %e, "progress printer stopped");
    }

    match outcome {
        Outcome::Completed(report) => {
            info!(jobs = report.jobs.len(), "week generated");
            for date in report.dates() {
                println!("  {}", date);
            }
            Ok(ExitCode::SUCCESS)
        }
        Outcome::Aborted { alert, completed, .. } => {
            eprintln!("Ops! {}", alert);
            eprintln!("{} of 14 jobs completed before the failure", completed);
            Ok(ExitCode::FAILURE)
        }
    }
}
