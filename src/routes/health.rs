use std::time::Instant;

use chrono::{DateTime, Utc};
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{Route, State};
use serde::Serialize;
use tracing::warn;

use crate::config::AppConfig;
use crate::db::Repositories;

/// When the server was built; managed so `/health` can report uptime.
pub struct StartedAt(pub Instant);

impl Default for StartedAt {
    fn default() -> Self {
        StartedAt(Instant::now())
    }
}

#[derive(Serialize, Debug)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub uptime_secs: u64,
    pub mongodb: &'static str,
    pub environment: String,
}

#[derive(Serialize, Debug)]
pub struct ReadyResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct LiveResponse {
    pub alive: bool,
}

#[get("/health")]
async fn health(
    repos: &State<Repositories>,
    config: &State<AppConfig>,
    started: &State<StartedAt>,
) -> (Status, Json<HealthResponse>) {
    let (status, label, mongodb) = match repos.ping().await {
        Ok(()) => (Status::Ok, "ok", "connected"),
        Err(e) => {
            warn!(error = %e, "mongodb ping failed");
            (Status::ServiceUnavailable, "degraded", "disconnected")
        }
    };
    let body = HealthResponse {
        status: label,
        timestamp: Utc::now(),
        uptime_secs: started.0.elapsed().as_secs(),
        mongodb,
        environment: config.environment.clone(),
    };
    (status, Json(body))
}

/// GET /ready: 200 only once the database answers.
#[get("/ready")]
async fn ready(repos: &State<Repositories>) -> (Status, Json<ReadyResponse>) {
    match repos.ping().await {
        Ok(()) => (
            Status::Ok,
            Json(ReadyResponse {
                ready: true,
                reason: None,
            }),
        ),
        Err(e) => (
            Status::ServiceUnavailable,
            Json(ReadyResponse {
                ready: false,
                reason: Some(format!("mongodb unreachable: {e}")),
            }),
        ),
    }
}

#[get("/live")]
fn live() -> Json<LiveResponse> {
    Json(LiveResponse { alive: true })
}

pub fn routes() -> Vec<Route> {
    routes![health, ready, live]
}
