use futures::future::try_join_all;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{Route, State};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::Repositories;
use crate::error::{ApiError, ApiResult};
use crate::models::salon::{Salon, SalonChanges, SalonStatus, SalonSummary, SalonView};
use crate::models::user::{normalize_email, Role, User};
use crate::models::{non_empty, parse_object_id};
use crate::services::auth_guard::SuperAdmin;
use crate::services::password::hash_password;
use crate::services::stats::PlatformStats;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Serialize, Debug)]
pub struct OverviewResponse {
    pub stats: PlatformStats,
}

#[derive(Serialize, Debug)]
pub struct SalonList {
    pub salons: Vec<SalonSummary>,
}

#[derive(Serialize, Debug)]
pub struct SalonResponse {
    pub salon: SalonView,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SalonDeleted {
    pub deleted: bool,
    pub deleted_staff_count: u64,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PasswordReset {
    pub updated: bool,
    pub owner_email: String,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewSalonRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub owner_email: Option<String>,
    pub owner_password: Option<String>,
    pub owner_name: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct SalonAdminPatch {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub status: Option<SalonStatus>,
}

#[derive(Deserialize, Debug, Default)]
pub struct StatusRequest {
    pub status: Option<SalonStatus>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub new_password: Option<String>,
}

impl SalonAdminPatch {
    fn into_changes(self) -> ApiResult<SalonChanges> {
        let name = self.name.filter(|name| !name.trim().is_empty());
        let slug = self.slug.map(|slug| slug.trim().to_string()).filter(|slug| !slug.is_empty());
        if name.is_none() && slug.is_none() && self.status.is_none() {
            return Err(ApiError::bad_request("name, slug, or status is required"));
        }
        Ok(SalonChanges {
            name,
            slug,
            status: self.status,
            ..SalonChanges::default()
        })
    }
}

async fn summarize(repos: &Repositories, salon: Salon) -> ApiResult<SalonSummary> {
    let staff_count = repos.users.count_staff(salon.id).await?;
    let appointment_count = repos.appointments.count_by_salon(salon.id).await?;
    let owner = repos.users.find_owner(salon.id).await?;

    let mut view = SalonView::from(salon);
    let owner_name = match owner {
        Some(owner) => {
            view.owner_email = owner.email;
            owner.full_name.unwrap_or_default()
        }
        None => String::new(),
    };
    Ok(SalonSummary {
        salon: view,
        staff_count,
        appointment_count,
        owner_name,
    })
}

#[get("/overview")]
async fn overview(repos: &State<Repositories>, _admin: SuperAdmin) -> ApiResult<Json<OverviewResponse>> {
    let stats = PlatformStats {
        total_salons: repos.salons.count_all().await?,
        active_salons: repos.salons.count_by_status(SalonStatus::Active).await?,
        total_revenue: repos.salons.total_revenue().await?,
    };
    Ok(Json(OverviewResponse { stats }))
}

#[get("/salons")]
async fn list_salons(repos: &State<Repositories>, _admin: SuperAdmin) -> ApiResult<Json<SalonList>> {
    let repos: &Repositories = repos;
    let salons = repos.salons.list_newest_first().await?;
    let salons = try_join_all(salons.into_iter().map(|salon| summarize(repos, salon))).await?;
    Ok(Json(SalonList { salons }))
}

#[post("/salons", format = "json", data = "<body>")]
async fn create_salon(
    repos: &State<Repositories>,
    admin: SuperAdmin,
    body: Json<NewSalonRequest>,
) -> ApiResult<(Status, Json<SalonResponse>)> {
    let body = body.into_inner();
    let (Some(name), Some(slug), Some(owner_email), Some(owner_password)) = (
        non_empty(&body.name),
        non_empty(&body.slug),
        non_empty(&body.owner_email),
        body.owner_password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::bad_request(
            "name, slug, ownerEmail, ownerPassword are required",
        ));
    };

    if repos.salons.slug_taken(slug, None).await? {
        return Err(ApiError::conflict("Salon slug already exists"));
    }
    let owner_email = normalize_email(owner_email);
    if repos.users.email_exists(&owner_email).await? {
        return Err(ApiError::conflict("Owner email already exists"));
    }

    let salon = Salon::new(name, slug, &owner_email);
    let hash = hash_password(owner_password.to_string()).await?;
    let owner = User::new(&owner_email, hash, Role::Owner, Some(salon.id))
        .with_full_name(body.owner_name.filter(|n| !n.trim().is_empty()));
    repos.create_salon_with_owner(&salon, &owner).await?;

    info!(salon = %salon.slug, owner = %owner.email, by = %admin.0.email, "salon created");
    Ok((
        Status::Created,
        Json(SalonResponse {
            salon: salon.into(),
        }),
    ))
}

#[patch("/salons/<id>", format = "json", data = "<body>")]
async fn update_salon(
    repos: &State<Repositories>,
    _admin: SuperAdmin,
    id: &str,
    body: Json<SalonAdminPatch>,
) -> ApiResult<Json<SalonResponse>> {
    let id = parse_object_id(id, "salon id")?;
    let changes = body.into_inner().into_changes()?;
    if let Some(slug) = changes.slug.as_deref() {
        if repos.salons.slug_taken(slug, Some(id)).await? {
            return Err(ApiError::conflict("Salon slug already exists"));
        }
    }

    let salon = repos
        .salons
        .update(id, bson::to_document(&changes)?)
        .await
        .map_err(|e| ApiError::conflict_on_duplicate(e, "Salon slug already exists"))?
        .ok_or_else(|| ApiError::not_found("Salon not found"))?;
    Ok(Json(SalonResponse {
        salon: salon.into(),
    }))
}

#[patch("/salons/<id>/status", format = "json", data = "<body>")]
async fn update_status(
    repos: &State<Repositories>,
    admin: SuperAdmin,
    id: &str,
    body: Json<StatusRequest>,
) -> ApiResult<Json<SalonResponse>> {
    let id = parse_object_id(id, "salon id")?;
    let status = body
        .into_inner()
        .status
        .ok_or_else(|| ApiError::bad_request("status is required"))?;

    let changes = SalonChanges {
        status: Some(status),
        ..SalonChanges::default()
    };
    let salon = repos
        .salons
        .update(id, bson::to_document(&changes)?)
        .await?
        .ok_or_else(|| ApiError::not_found("Salon not found"))?;
    info!(salon = %salon.slug, status = status.as_str(), by = %admin.0.email, "salon status changed");
    Ok(Json(SalonResponse {
        salon: salon.into(),
    }))
}

#[delete("/salons/<id>")]
async fn delete_salon(
    repos: &State<Repositories>,
    admin: SuperAdmin,
    id: &str,
) -> ApiResult<Json<SalonDeleted>> {
    let id = parse_object_id(id, "salon id")?;
    let report = repos
        .delete_salon_cascade(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Salon not found"))?;
    info!(salon_id = %id, by = %admin.0.email, "salon deleted");
    Ok(Json(SalonDeleted {
        deleted: true,
        deleted_staff_count: report.staff,
    }))
}

#[post("/salons/<id>/reset-owner-password", format = "json", data = "<body>")]
async fn reset_owner_password(
    repos: &State<Repositories>,
    admin: SuperAdmin,
    id: &str,
    body: Json<ResetPasswordRequest>,
) -> ApiResult<Json<PasswordReset>> {
    let id = parse_object_id(id, "salon id")?;
    let new_password = body
        .into_inner()
        .new_password
        .filter(|password| password.chars().count() >= MIN_PASSWORD_LEN)
        .ok_or_else(|| ApiError::bad_request("newPassword (min 6 chars) is required"))?;

    let owner = repos
        .users
        .find_owner(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Owner not found"))?;
    let hash = hash_password(new_password).await?;
    repos.users.set_password_hash(owner.id, &hash).await?;

    info!(owner = %owner.email, by = %admin.0.email, "owner password reset");
    Ok(Json(PasswordReset {
        updated: true,
        owner_email: owner.email,
    }))
}

pub fn routes() -> Vec<Route> {
    routes![
        overview,
        list_salons,
        create_salon,
        update_salon,
        update_status,
        delete_salon,
        reset_owner_password
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_patch_is_rejected() {
        let patch = SalonAdminPatch {
            name: Some("  ".into()),
            ..SalonAdminPatch::default()
        };
        let err = patch.into_changes().unwrap_err();
        assert_eq!(err.to_string(), "name, slug, or status is required");
    }

    #[test]
    fn patch_keeps_only_given_fields() {
        let patch = SalonAdminPatch {
            slug: Some(" new-slug ".into()),
            status: Some(SalonStatus::Suspended),
            ..SalonAdminPatch::default()
        };
        let doc = bson::to_document(&patch.into_changes().unwrap()).unwrap();
        assert_eq!(doc.get_str("slug").unwrap(), "new-slug");
        assert_eq!(doc.get_str("status").unwrap(), "suspended");
        assert!(!doc.contains_key("name"));
    }
}
