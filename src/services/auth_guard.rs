use mongodb::bson::oid::ObjectId;
use rocket::http::Status;
use rocket::outcome::try_outcome;
use rocket::request::{FromRequest, Outcome, Request};
use tracing::debug;

use crate::error::{ApiError, ApiResult, GuardFailure};
use crate::jwt::{Claims, JwtKeys};
use crate::models::user::Role;

pub const MISSING_TOKEN: &str = "Missing authorization token";
pub const INVALID_TOKEN: &str = "Invalid or expired token";
pub const SUPER_ADMIN_REQUIRED: &str = "Super admin access required";

/// The caller behind a valid `Authorization: Bearer` token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: ObjectId,
    pub email: String,
    pub role: Role,
    pub salon_id: Option<ObjectId>,
    pub is_super_admin: bool,
}

impl TryFrom<Claims> for AuthUser {
    type Error = mongodb::bson::oid::Error;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let salon_id = claims
            .salon_id
            .as_deref()
            .map(ObjectId::parse_str)
            .transpose()?;
        Ok(AuthUser {
            id: ObjectId::parse_str(&claims.sub)?,
            email: claims.email,
            is_super_admin: claims.is_super_admin || claims.role == Role::SuperAdmin,
            role: claims.role,
            salon_id,
        })
    }
}

impl AuthUser {
    fn belongs_to(&self, salon_id: ObjectId) -> bool {
        self.salon_id == Some(salon_id)
    }

    /// Super admins, or anyone whose token is scoped to `salon_id`.
    pub fn ensure_salon_member(&self, salon_id: ObjectId) -> ApiResult<()> {
        if self.is_super_admin || self.belongs_to(salon_id) {
            Ok(())
        } else {
            Err(ApiError::forbidden("Access denied for this salon"))
        }
    }

    /// Like `ensure_salon_member`, for records that may belong to no salon.
    /// Those are visible to super admins only.
    pub fn ensure_member_of(&self, salon_id: Option<ObjectId>) -> ApiResult<()> {
        match salon_id {
            Some(salon_id) => self.ensure_salon_member(salon_id),
            None if self.is_super_admin => Ok(()),
            None => Err(ApiError::forbidden("Access denied for this salon")),
        }
    }

    /// Super admins, or the owner of `salon_id`.
    pub fn ensure_salon_owner(&self, salon_id: ObjectId) -> ApiResult<()> {
        if self.is_super_admin || (self.role == Role::Owner && self.belongs_to(salon_id)) {
            Ok(())
        } else {
            Err(ApiError::forbidden("Only the salon owner can do this"))
        }
    }

    /// Target salon for routes where the body may omit it: the explicit one
    /// if given, the caller's own otherwise.
    pub fn salon_or_own(&self, explicit: Option<ObjectId>) -> Option<ObjectId> {
        explicit.or(self.salon_id)
    }
}

fn reject<T>(request: &Request<'_>, status: Status, reason: &'static str) -> Outcome<T, &'static str> {
    request.local_cache(|| GuardFailure(Some(reason)));
    Outcome::Error((status, reason))
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthUser {
    type Error = &'static str;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let Some(keys) = request.rocket().state::<JwtKeys>() else {
            return Outcome::Error((Status::InternalServerError, "jwt keys not configured"));
        };

        let token = request
            .headers()
            .get_one("Authorization")
            .and_then(|header| header.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty());
        let Some(token) = token else {
            return reject(request, Status::Unauthorized, MISSING_TOKEN);
        };

        match keys.verify_token(token) {
            Ok(claims) => match AuthUser::try_from(claims) {
                Ok(user) => Outcome::Success(user),
                Err(_) => reject(request, Status::Unauthorized, INVALID_TOKEN),
            },
            Err(e) => {
                debug!(error = %e, "rejected bearer token");
                reject(request, Status::Unauthorized, INVALID_TOKEN)
            }
        }
    }
}

/// An [`AuthUser`] holding the cross-tenant administrator role.
#[derive(Debug, Clone)]
pub struct SuperAdmin(pub AuthUser);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for SuperAdmin {
    type Error = &'static str;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let user = try_outcome!(request.guard::<AuthUser>().await);
        if user.is_super_admin {
            Outcome::Success(SuperAdmin(user))
        } else {
            reject(request, Status::Forbidden, SUPER_ADMIN_REQUIRED)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role, salon_id: Option<ObjectId>) -> AuthUser {
        AuthUser {
            id: ObjectId::new(),
            email: "u@example.com".into(),
            role,
            salon_id,
            is_super_admin: role == Role::SuperAdmin,
        }
    }

    #[test]
    fn owner_controls_only_own_salon() {
        let salon = ObjectId::new();
        let owner = user(Role::Owner, Some(salon));
        assert!(owner.ensure_salon_owner(salon).is_ok());
        assert!(owner.ensure_salon_owner(ObjectId::new()).is_err());
    }

    #[test]
    fn staff_is_member_but_not_owner() {
        let salon = ObjectId::new();
        let staff = user(Role::Staff, Some(salon));
        assert!(staff.ensure_salon_member(salon).is_ok());
        assert!(staff.ensure_salon_owner(salon).is_err());
        assert!(staff.ensure_salon_member(ObjectId::new()).is_err());
    }

    #[test]
    fn unassigned_records_are_for_super_admins() {
        let salon = ObjectId::new();
        assert!(user(Role::Owner, Some(salon)).ensure_member_of(None).is_err());
        assert!(user(Role::Staff, Some(salon)).ensure_member_of(None).is_err());
        assert!(user(Role::Staff, Some(salon)).ensure_member_of(Some(salon)).is_ok());
        assert!(user(Role::SuperAdmin, None).ensure_member_of(None).is_ok());
    }

    #[test]
    fn super_admin_reaches_every_salon() {
        let admin = user(Role::SuperAdmin, None);
        assert!(admin.ensure_salon_owner(ObjectId::new()).is_ok());
        assert!(admin.ensure_salon_member(ObjectId::new()).is_ok());
    }

    #[test]
    fn claims_with_bad_subject_are_refused() {
        let claims = Claims {
            sub: "not-an-object-id".into(),
            email: "x@example.com".into(),
            role: Role::Owner,
            salon_id: None,
            is_super_admin: false,
            iat: 0,
            exp: 0,
        };
        assert!(AuthUser::try_from(claims).is_err());
    }
}
