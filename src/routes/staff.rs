use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{Route, State};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::Repositories;
use crate::error::{ApiError, ApiResult};
use crate::models::user::{PublicStaff, Role, StaffChanges, StaffView, User};
use crate::models::{non_empty, parse_object_id};
use crate::routes::{Deleted, SalonQuery};
use crate::services::auth_guard::AuthUser;
use crate::services::password::hash_password;

#[derive(Serialize, Debug)]
pub struct PublicStaffList {
    pub staff: Vec<PublicStaff>,
}

#[derive(Serialize, Debug)]
pub struct StaffList {
    pub staff: Vec<StaffView>,
}

#[derive(Serialize, Debug)]
pub struct StaffResponse {
    pub staff: StaffView,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewStaffRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub salon_id: Option<String>,
    pub phone: Option<String>,
    pub specialty: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct StaffPatchRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub specialty: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<StaffPatchRequest> for StaffChanges {
    fn from(patch: StaffPatchRequest) -> Self {
        StaffChanges {
            full_name: patch.full_name,
            phone: patch.phone,
            specialty: patch.specialty,
            avatar_url: patch.avatar_url,
        }
    }
}

/// Loads a staff member and checks the caller may manage them.
async fn managed_staff(repos: &Repositories, auth: &AuthUser, id: &str) -> ApiResult<User> {
    let id = parse_object_id(id, "staff id")?;
    let staff = repos
        .users
        .find_staff(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Staff not found"))?;
    match staff.salon_id {
        Some(salon_id) => auth.ensure_salon_owner(salon_id)?,
        None if auth.is_super_admin => {}
        None => return Err(ApiError::forbidden("Access denied for this salon")),
    }
    Ok(staff)
}

#[get("/public?<query..>")]
async fn list_public(
    repos: &State<Repositories>,
    query: SalonQuery<'_>,
) -> ApiResult<Json<PublicStaffList>> {
    let salon_id = query.required_salon()?;
    let staff = repos.users.list_staff(salon_id).await?;
    Ok(Json(PublicStaffList {
        staff: staff.iter().map(PublicStaff::from).collect(),
    }))
}

#[get("/?<query..>")]
async fn list(
    repos: &State<Repositories>,
    auth: AuthUser,
    query: SalonQuery<'_>,
) -> ApiResult<Json<StaffList>> {
    let salon_id = auth
        .salon_or_own(query.salon()?)
        .ok_or_else(|| ApiError::bad_request("salonId is required"))?;
    auth.ensure_salon_member(salon_id)?;

    let staff = repos.users.list_staff(salon_id).await?;
    Ok(Json(StaffList {
        staff: staff.iter().map(StaffView::from).collect(),
    }))
}

#[get("/<id>")]
async fn get(
    repos: &State<Repositories>,
    auth: AuthUser,
    id: &str,
) -> ApiResult<Json<StaffResponse>> {
    let id = parse_object_id(id, "staff id")?;
    let staff = repos
        .users
        .find_staff(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Staff not found"))?;
    auth.ensure_member_of(staff.salon_id)?;
    Ok(Json(StaffResponse {
        staff: StaffView::from(&staff),
    }))
}

#[post("/", format = "json", data = "<body>")]
async fn create(
    repos: &State<Repositories>,
    auth: AuthUser,
    body: Json<NewStaffRequest>,
) -> ApiResult<(Status, Json<StaffResponse>)> {
    let body = body.into_inner();
    let explicit_salon = non_empty(&body.salon_id)
        .map(|id| parse_object_id(id, "salonId"))
        .transpose()?;
    let (Some(email), Some(password), Some(salon_id)) = (
        non_empty(&body.email),
        body.password.as_deref().filter(|p| !p.is_empty()),
        auth.salon_or_own(explicit_salon),
    ) else {
        return Err(ApiError::bad_request(
            "email, password, and salonId are required",
        ));
    };
    auth.ensure_salon_owner(salon_id)?;

    if repos.salons.find_by_id(salon_id).await?.is_none() {
        return Err(ApiError::bad_request("Invalid salon ID"));
    }
    if repos.users.email_exists(email).await? {
        return Err(ApiError::conflict("User already exists"));
    }

    let hash = hash_password(password.to_string()).await?;
    let mut staff = User::new(email, hash, Role::Staff, Some(salon_id));
    staff.full_name = body.full_name;
    staff.phone = body.phone;
    staff.specialty = body.specialty;
    staff.avatar_url = body.avatar_url;
    repos
        .users
        .insert(&staff)
        .await
        .map_err(|e| ApiError::conflict_on_duplicate(e, "User already exists"))?;

    info!(staff_id = %staff.id, salon_id = %salon_id, "staff member created");
    Ok((
        Status::Created,
        Json(StaffResponse {
            staff: StaffView::from(&staff),
        }),
    ))
}

#[patch("/<id>", format = "json", data = "<body>")]
async fn update(
    repos: &State<Repositories>,
    auth: AuthUser,
    id: &str,
    body: Json<StaffPatchRequest>,
) -> ApiResult<Json<StaffResponse>> {
    let staff = managed_staff(repos, &auth, id).await?;
    let changes = bson::to_document(&StaffChanges::from(body.into_inner()))?;
    let staff = repos
        .users
        .update_staff(staff.id, changes)
        .await?
        .ok_or_else(|| ApiError::not_found("Staff not found"))?;
    Ok(Json(StaffResponse {
        staff: StaffView::from(&staff),
    }))
}

#[delete("/<id>")]
async fn remove(repos: &State<Repositories>, auth: AuthUser, id: &str) -> ApiResult<Json<Deleted>> {
    let staff = managed_staff(repos, &auth, id).await?;
    repos
        .users
        .delete_staff(staff.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Staff not found"))?;
    let push_subscriptions = repos
        .push_subscriptions
        .delete_for_users(vec![staff.id])
        .await?;
    info!(staff_id = %staff.id, push_subscriptions, "staff member removed");
    Ok(Json(Deleted::yes()))
}

pub fn routes() -> Vec<Route> {
    routes![list_public, list, get, create, update, remove]
}
