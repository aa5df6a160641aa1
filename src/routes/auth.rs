use rocket::serde::json::Json;
use rocket::{Route, State};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::Repositories;
use crate::error::{ApiError, ApiResult};
use crate::jwt::JwtKeys;
use crate::models::user::{Role, User, UserProfile};
use crate::models::{non_empty, parse_object_id};
use crate::services::auth_guard::AuthUser;
use crate::services::password::{hash_password, verify_password};

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub salon_id: Option<String>,
    pub role: Option<Role>,
    pub full_name: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

#[derive(Serialize, Debug)]
pub struct MeResponse {
    pub user: UserProfile,
}

fn credentials<'a>(
    email: &'a Option<String>,
    password: &'a Option<String>,
) -> ApiResult<(&'a str, &'a str)> {
    match (non_empty(email), password.as_deref().filter(|p| !p.is_empty())) {
        (Some(email), Some(password)) => Ok((email, password)),
        _ => Err(ApiError::bad_request("Email and password are required")),
    }
}

fn issue(keys: &JwtKeys, user: &User) -> ApiResult<Json<AuthResponse>> {
    Ok(Json(AuthResponse {
        token: keys.create_token(user)?,
        user: UserProfile::from(user),
    }))
}

#[post("/register", format = "json", data = "<body>")]
async fn register(
    repos: &State<Repositories>,
    keys: &State<JwtKeys>,
    body: Json<RegisterRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let (email, password) = credentials(&body.email, &body.password)?;
    let salon_id = non_empty(&body.salon_id)
        .map(|id| parse_object_id(id, "salonId"))
        .transpose()?;

    // Staff are provisioned by owners and super admins by seeding; only
    // owners sign themselves up, and only for a salon listed under their email.
    let role = body.role.unwrap_or_default();
    if role != Role::Owner {
        return Err(ApiError::forbidden("Only salon owners can self-register"));
    }

    if repos.users.email_exists(email).await? {
        return Err(ApiError::conflict("User already exists"));
    }

    if let Some(salon_id) = salon_id {
        let salon = repos
            .salons
            .find_by_id(salon_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Salon not found"))?;
        if salon.owner_email != email.to_lowercase() {
            return Err(ApiError::forbidden("Email does not match the salon owner"));
        }
    }

    let hash = hash_password(password.to_string()).await?;
    let user = User::new(email, hash, role, salon_id).with_full_name(body.full_name.clone());
    repos
        .users
        .insert(&user)
        .await
        .map_err(|e| ApiError::conflict_on_duplicate(e, "User already exists"))?;

    info!(user_id = %user.id, role = role.as_str(), "user registered");
    issue(keys, &user)
}

#[post("/login", format = "json", data = "<body>")]
async fn login(
    repos: &State<Repositories>,
    keys: &State<JwtKeys>,
    body: Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let (email, password) = credentials(&body.email, &body.password)?;
    let invalid = || ApiError::Unauthorized("Invalid credentials".to_string());

    let user = repos.users.find_by_email(email).await?.ok_or_else(invalid)?;
    if !verify_password(password.to_string(), user.password_hash.clone()).await {
        return Err(invalid());
    }

    info!(user_id = %user.id, "user logged in");
    issue(keys, &user)
}

#[get("/me")]
async fn me(repos: &State<Repositories>, auth: AuthUser) -> ApiResult<Json<MeResponse>> {
    let user = repos
        .users
        .find_by_id(auth.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let mut profile = UserProfile::from(&user);
    if let Some(salon_id) = user.salon_id {
        profile.salon_slug = repos.salons.find_by_id(salon_id).await?.map(|s| s.slug);
    }
    Ok(Json(MeResponse { user: profile }))
}

pub fn routes() -> Vec<Route> {
    routes![register, login, me]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_require_both_fields() {
        let email = Some("a@b.io".to_string());
        assert!(credentials(&email, &None).is_err());
        assert!(credentials(&None, &Some("pw".into())).is_err());
        assert!(credentials(&email, &Some(String::new())).is_err());
        assert_eq!(
            credentials(&email, &Some("pw".into())).unwrap(),
            ("a@b.io", "pw")
        );
    }
}
