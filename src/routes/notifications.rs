use mongodb::bson::oid::ObjectId;
use rocket::serde::json::Json;
use rocket::{Route, State};
use serde::{Deserialize, Serialize};

use crate::db::Repositories;
use crate::error::{ApiError, ApiResult};
use crate::models::appointment::AppointmentView;
use crate::models::parse_object_id;
use crate::models::user::Role;
use crate::repository::AppointmentScope;
use crate::routes::SalonQuery;
use crate::services::auth_guard::AuthUser;

const SCOPE_REQUIRED: &str = "salonId and role are required";

#[derive(Serialize, Debug)]
pub struct UnreadCount {
    pub count: u64,
}

#[derive(Serialize, Debug)]
pub struct MarkedAll {
    pub updated: bool,
    pub modified: u64,
}

#[derive(Serialize, Debug)]
pub struct MarkedOne {
    pub appointment: AppointmentView,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct MarkAllRequest {
    pub salon_id: Option<String>,
    pub role: Option<String>,
    pub staff_id: Option<String>,
}

/// Builds the notification scope for a salon. A staff role with a staff id
/// only sees its own bookings; every other role sees the whole salon.
fn notification_scope(
    auth: &AuthUser,
    salon_id: Option<ObjectId>,
    role: Option<&str>,
    staff_id: Option<ObjectId>,
) -> ApiResult<AppointmentScope> {
    let (Some(salon_id), Some(role)) = (salon_id, role.map(str::trim).filter(|r| !r.is_empty()))
    else {
        return Err(ApiError::bad_request(SCOPE_REQUIRED));
    };
    auth.ensure_salon_member(salon_id)?;

    let staff_id = if role == Role::Staff.as_str() {
        staff_id
    } else {
        None
    };
    Ok(AppointmentScope {
        salon_id: Some(salon_id),
        staff_id,
    })
}

#[get("/unread-count?<query..>")]
async fn unread_count(
    repos: &State<Repositories>,
    auth: AuthUser,
    query: SalonQuery<'_>,
) -> ApiResult<Json<UnreadCount>> {
    let scope = notification_scope(&auth, query.salon()?, query.role, query.staff()?)?;
    let count = repos.appointments.count_unread(scope).await?;
    Ok(Json(UnreadCount { count }))
}

#[post("/mark-all-read", format = "json", data = "<body>")]
async fn mark_all_read(
    repos: &State<Repositories>,
    auth: AuthUser,
    body: Json<MarkAllRequest>,
) -> ApiResult<Json<MarkedAll>> {
    let body = body.into_inner();
    let query = SalonQuery {
        salon_id: body.salon_id.as_deref(),
        staff_id: body.staff_id.as_deref(),
        role: body.role.as_deref(),
    };
    let scope = notification_scope(&auth, query.salon()?, query.role, query.staff()?)?;
    let modified = repos.appointments.mark_all_read(scope).await?;
    Ok(Json(MarkedAll {
        updated: true,
        modified,
    }))
}

#[post("/mark-read/<id>")]
async fn mark_read(
    repos: &State<Repositories>,
    auth: AuthUser,
    id: &str,
) -> ApiResult<Json<MarkedOne>> {
    let id = parse_object_id(id, "appointment id")?;
    let appointment = repos
        .appointments
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Appointment not found"))?;
    auth.ensure_salon_member(appointment.salon_id)?;

    let appointment = repos
        .appointments
        .mark_read(appointment.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Appointment not found"))?;
    Ok(Json(MarkedOne {
        appointment: AppointmentView::from(&appointment),
    }))
}

pub fn routes() -> Vec<Route> {
    routes![unread_count, mark_all_read, mark_read]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(role: Role, salon_id: ObjectId) -> AuthUser {
        AuthUser {
            id: ObjectId::new(),
            email: "member@example.com".into(),
            role,
            salon_id: Some(salon_id),
            is_super_admin: false,
        }
    }

    #[test]
    fn scope_requires_salon_and_role() {
        let salon = ObjectId::new();
        let auth = member(Role::Owner, salon);
        let err = notification_scope(&auth, Some(salon), None, None).unwrap_err();
        assert_eq!(err.to_string(), SCOPE_REQUIRED);
        let err = notification_scope(&auth, None, Some("owner"), None).unwrap_err();
        assert_eq!(err.to_string(), SCOPE_REQUIRED);
    }

    #[test]
    fn staff_role_narrows_to_staff_member() {
        let salon = ObjectId::new();
        let staff = ObjectId::new();
        let auth = member(Role::Staff, salon);

        let scope = notification_scope(&auth, Some(salon), Some("staff"), Some(staff)).unwrap();
        assert_eq!(scope.staff_id, Some(staff));

        let scope = notification_scope(&auth, Some(salon), Some("owner"), Some(staff)).unwrap();
        assert_eq!(scope.staff_id, None);
        assert_eq!(scope.salon_id, Some(salon));
    }

    #[test]
    fn other_salons_are_refused() {
        let auth = member(Role::Owner, ObjectId::new());
        let err = notification_scope(&auth, Some(ObjectId::new()), Some("owner"), None);
        assert_eq!(err.unwrap_err().status(), rocket::http::Status::Forbidden);
    }
}
