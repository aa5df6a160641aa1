use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{Route, State};
use serde::Serialize;

use crate::config::AppConfig;
use crate::db::Repositories;
use crate::error::ApiResult;
use crate::services::seed_service::{self, SeedReport, SeedStatus};

#[derive(Serialize, Debug)]
pub struct SeedResponse {
    pub status: &'static str,
    pub message: String,
    pub data: SeedReport,
}

#[derive(Serialize, Debug)]
pub struct StatusResponse {
    pub status: &'static str,
    pub seeded: bool,
    pub data: SeedStatus,
}

#[post("/init")]
async fn init(
    repos: &State<Repositories>,
    config: &State<AppConfig>,
) -> ApiResult<(Status, Json<SeedResponse>)> {
    seed_service::ensure_seed_allowed(config)?;
    let report = seed_service::seed(repos, &config.seed).await?;
    let message = if report.created.is_empty() {
        "Database already seeded".to_string()
    } else {
        format!("Database seeded ({} records created)", report.created.len())
    };
    Ok((
        Status::Created,
        Json(SeedResponse {
            status: "success",
            message,
            data: report,
        }),
    ))
}

#[get("/status")]
async fn status(
    repos: &State<Repositories>,
    config: &State<AppConfig>,
) -> ApiResult<Json<StatusResponse>> {
    let data = seed_service::seed_status(repos, &config.seed).await?;
    Ok(Json(StatusResponse {
        status: "ok",
        seeded: data.seeded,
        data,
    }))
}

pub fn routes() -> Vec<Route> {
    routes![init, status]
}
