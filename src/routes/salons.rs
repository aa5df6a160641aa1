use rocket::serde::json::Json;
use rocket::{Route, State};
use serde::{Deserialize, Serialize};

use crate::db::Repositories;
use crate::error::{ApiError, ApiResult};
use crate::models::parse_object_id;
use crate::models::salon::{SalonChanges, SalonView};
use crate::services::auth_guard::AuthUser;

#[derive(Serialize, Debug)]
pub struct SalonResponse {
    pub salon: SalonView,
}

/// Fields a salon owner can edit from the settings page.
#[derive(Deserialize, Debug, Default)]
pub struct SalonProfileRequest {
    pub name: Option<String>,
    pub logo_url: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub opening_time: Option<String>,
    pub closing_time: Option<String>,
    pub open_days: Option<Vec<String>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl From<SalonProfileRequest> for SalonChanges {
    fn from(request: SalonProfileRequest) -> Self {
        SalonChanges {
            name: request.name.filter(|name| !name.trim().is_empty()),
            logo_url: request.logo_url,
            contact_phone: request.contact_phone,
            contact_email: request.contact_email,
            address: request.address,
            city: request.city,
            country: request.country,
            opening_time: request.opening_time,
            closing_time: request.closing_time,
            open_days: request.open_days,
            latitude: request.latitude,
            longitude: request.longitude,
            ..SalonChanges::default()
        }
    }
}

#[get("/slug/<slug>")]
async fn get_by_slug(repos: &State<Repositories>, slug: &str) -> ApiResult<Json<SalonResponse>> {
    let salon = repos
        .salons
        .find_by_slug(slug)
        .await?
        .ok_or_else(|| ApiError::not_found("Salon not found"))?;
    Ok(Json(SalonResponse { salon: salon.into() }))
}

#[get("/<id>")]
async fn get_by_id(repos: &State<Repositories>, id: &str) -> ApiResult<Json<SalonResponse>> {
    let id = parse_object_id(id, "salon id")?;
    let salon = repos
        .salons
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Salon not found"))?;
    Ok(Json(SalonResponse { salon: salon.into() }))
}

#[patch("/<id>", format = "json", data = "<body>")]
async fn update_profile(
    repos: &State<Repositories>,
    auth: AuthUser,
    id: &str,
    body: Json<SalonProfileRequest>,
) -> ApiResult<Json<SalonResponse>> {
    let id = parse_object_id(id, "salon id")?;
    auth.ensure_salon_owner(id)?;

    let changes = bson::to_document(&SalonChanges::from(body.into_inner()))?;
    let salon = repos
        .salons
        .update(id, changes)
        .await?
        .ok_or_else(|| ApiError::not_found("Salon not found"))?;
    Ok(Json(SalonResponse { salon: salon.into() }))
}

pub fn routes() -> Vec<Route> {
    routes![get_by_slug, get_by_id, update_profile]
}
