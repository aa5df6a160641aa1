//! Seeds the demo salon, its owner and a super admin without starting the
//! HTTP server. Safe to run repeatedly.

use std::process::ExitCode;

use clap::Parser;
use mongodb::Client;
use tracing::{error, info, warn};

use salon_api::config::{self, AppConfig};
use salon_api::db::Repositories;
use salon_api::services::request_logger::init_tracing;
use salon_api::services::seed_service;

#[derive(Parser, Debug)]
#[command(name = "seed")]
#[command(about = "Create the demo salon, owner and super admin accounts")]
#[command(version)]
struct Cli {
    /// MongoDB connection string
    #[arg(
        long,
        env = "MONGODB_URI",
        default_value = "mongodb://localhost:27017/salon_booking"
    )]
    mongo_uri: String,

    /// Database used when the connection string names none
    #[arg(long)]
    database: Option<String>,

    #[arg(long, env = "SEED_OWNER_EMAIL")]
    owner_email: Option<String>,

    #[arg(long, env = "SEED_OWNER_PASSWORD", hide_env_values = true)]
    owner_password: Option<String>,

    #[arg(long, env = "SEED_SUPER_ADMIN_EMAIL")]
    super_admin_email: Option<String>,

    #[arg(long, env = "SEED_SUPER_ADMIN_PASSWORD", hide_env_values = true)]
    super_admin_password: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let mut config: AppConfig = config::figment().extract().unwrap_or_else(|e| {
        warn!(error = %e, "failed to load config, using defaults");
        AppConfig::default()
    });
    if let Some(database) = cli.database {
        config.database_name = database;
    }
    if let Some(email) = cli.owner_email {
        config.seed.owner_email = email;
    }
    if let Some(password) = cli.owner_password {
        config.seed.owner_password = password;
    }
    if let Some(email) = cli.super_admin_email {
        config.seed.super_admin_email = email;
    }
    if let Some(password) = cli.super_admin_password {
        config.seed.super_admin_password = password;
    }

    if let Err(e) = seed_service::ensure_seed_allowed(&config) {
        error!(environment = %config.environment, "{e}; set SEED_OWNER_PASSWORD and SEED_SUPER_ADMIN_PASSWORD");
        return ExitCode::FAILURE;
    }

    let client = match Client::with_uri_str(&cli.mongo_uri).await {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "invalid mongodb connection string");
            return ExitCode::FAILURE;
        }
    };
    let repos = Repositories::from_client(&client, &config.database_name);

    if let Err(e) = repos.ensure_indexes().await {
        error!(error = %e, "failed to ensure indexes");
        return ExitCode::FAILURE;
    }

    match seed_service::seed(&repos, &config.seed).await {
        Ok(report) => {
            info!(
                salon = %report.salon,
                users = ?report.users,
                created = ?report.created,
                "seed complete"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "seed failed");
            ExitCode::FAILURE
        }
    }
}
