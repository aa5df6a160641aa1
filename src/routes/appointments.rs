use std::collections::HashMap;

use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{Route, State};
use serde::Serialize;
use tracing::{info, warn};

use crate::db::Repositories;
use crate::error::{ApiError, ApiResult};
use crate::models::appointment::{
    bookable_service, check_staff_member, Appointment, AppointmentChanges, AppointmentPatch,
    AppointmentRequest, AppointmentView, PopulatedAppointment,
};
use crate::models::parse_object_id;
use crate::models::service::{Service, ServiceView};
use crate::models::user::StaffSummary;
use crate::repository::AppointmentScope;
use crate::routes::{Deleted, SalonQuery};
use crate::services::auth_guard::AuthUser;
use crate::services::push_notifier::PushNotifier;
use crate::services::stats::{staff_stats, StaffStats};

#[derive(Serialize, Debug)]
pub struct AppointmentResponse {
    pub appointment: AppointmentView,
}

#[derive(Serialize, Debug)]
pub struct PopulatedResponse {
    pub appointment: PopulatedAppointment,
}

#[derive(Serialize, Debug)]
pub struct AppointmentList {
    pub appointments: Vec<PopulatedAppointment>,
}

#[derive(Serialize, Debug)]
pub struct StatsResponse {
    pub stats: StaffStats,
}

/// Resolves service and staff for each appointment with one query per
/// collection.
async fn populate(
    repos: &Repositories,
    appointments: &[Appointment],
) -> ApiResult<Vec<PopulatedAppointment>> {
    let mut service_ids: Vec<ObjectId> = appointments.iter().map(|a| a.service_id).collect();
    let mut staff_ids: Vec<ObjectId> = appointments.iter().map(|a| a.staff_id).collect();
    service_ids.sort();
    service_ids.dedup();
    staff_ids.sort();
    staff_ids.dedup();

    let services: HashMap<ObjectId, ServiceView> = repos
        .services
        .find_many(service_ids)
        .await?
        .iter()
        .map(|service| (service.id, ServiceView::from(service)))
        .collect();
    let staff: HashMap<ObjectId, StaffSummary> = repos
        .users
        .find_many(staff_ids)
        .await?
        .iter()
        .map(|user| (user.id, StaffSummary::from(user)))
        .collect();

    Ok(appointments
        .iter()
        .map(|appointment| PopulatedAppointment {
            appointment: AppointmentView::from(appointment),
            service: services.get(&appointment.service_id).cloned(),
            staff: staff.get(&appointment.staff_id).cloned(),
        })
        .collect())
}

/// Checks the booking's references against the database: the salon takes
/// bookings and both the service and the staff member belong to it. Fills
/// in the service price when no amount was given.
async fn check_booking(
    repos: &Repositories,
    appointment: &mut Appointment,
    amount_given: bool,
) -> ApiResult<Service> {
    let salon = repos
        .salons
        .find_by_id(appointment.salon_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Salon not found"))?;
    if !salon.accepts_bookings() {
        return Err(ApiError::forbidden("Salon is not accepting bookings"));
    }

    let service = bookable_service(
        salon.id,
        repos.services.find_by_id(appointment.service_id).await?,
    )?;
    let staff = repos.users.find_by_id(appointment.staff_id).await?;
    check_staff_member(salon.id, staff.as_ref())?;

    if !amount_given {
        appointment.amount = service.price;
    }
    Ok(service)
}

/// Stores the booking, credits revenue when it is already completed and
/// sends the push alert in the background.
async fn book(
    repos: &Repositories,
    notifier: &PushNotifier,
    request: AppointmentRequest,
) -> ApiResult<Appointment> {
    let amount_given = request.amount.is_some();
    let mut appointment = request.into_appointment()?;
    let service = check_booking(repos, &mut appointment, amount_given).await?;
    repos.appointments.insert(&appointment).await?;
    info!(
        appointment_id = %appointment.id,
        salon_id = %appointment.salon_id,
        date = %appointment.appointment_date,
        "appointment booked"
    );

    record_revenue(repos, appointment.salon_id, appointment.earned()).await;

    if notifier.is_enabled() {
        let notifier = notifier.clone();
        let repos = repos.clone();
        let booked = appointment.clone();
        tokio::spawn(async move {
            notifier.notify_booking(&repos, &booked, &service.name).await;
        });
    }
    Ok(appointment)
}

/// A failed revenue update is logged and never fails the request.
async fn record_revenue(repos: &Repositories, salon_id: ObjectId, delta: f64) {
    if delta == 0.0 {
        return;
    }
    if let Err(e) = repos.salons.add_revenue(salon_id, delta).await {
        warn!(error = %e, salon_id = %salon_id, delta, "failed to record revenue");
    }
}

/// A patch may only move an appointment to staff and services of its own
/// salon.
async fn check_patch_references(
    repos: &Repositories,
    salon_id: ObjectId,
    changes: &AppointmentChanges,
) -> ApiResult<()> {
    if let Some(service_id) = changes.service_id {
        bookable_service(salon_id, repos.services.find_by_id(service_id).await?)?;
    }
    if let Some(staff_id) = changes.staff_id {
        let staff = repos.users.find_by_id(staff_id).await?;
        check_staff_member(salon_id, staff.as_ref())?;
    }
    Ok(())
}

async fn visible_appointment(
    repos: &Repositories,
    auth: &AuthUser,
    id: &str,
) -> ApiResult<Appointment> {
    let id = parse_object_id(id, "appointment id")?;
    let appointment = repos
        .appointments
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Appointment not found"))?;
    auth.ensure_salon_member(appointment.salon_id)?;
    Ok(appointment)
}

#[post("/public", format = "json", data = "<body>")]
async fn create_public(
    repos: &State<Repositories>,
    notifier: &State<PushNotifier>,
    body: Json<AppointmentRequest>,
) -> ApiResult<(Status, Json<AppointmentResponse>)> {
    let appointment = book(repos, notifier, body.into_inner().public()).await?;
    Ok((
        Status::Created,
        Json(AppointmentResponse {
            appointment: AppointmentView::from(&appointment),
        }),
    ))
}

#[post("/", format = "json", data = "<body>")]
async fn create(
    repos: &State<Repositories>,
    notifier: &State<PushNotifier>,
    auth: AuthUser,
    body: Json<AppointmentRequest>,
) -> ApiResult<(Status, Json<AppointmentResponse>)> {
    let request = body.into_inner();
    if let Some(salon_id) = request.salon_id.as_deref() {
        if let Ok(salon_id) = ObjectId::parse_str(salon_id.trim()) {
            auth.ensure_salon_member(salon_id)?;
        }
    }
    let appointment = book(repos, notifier, request).await?;
    Ok((
        Status::Created,
        Json(AppointmentResponse {
            appointment: AppointmentView::from(&appointment),
        }),
    ))
}

#[get("/?<query..>")]
async fn list(
    repos: &State<Repositories>,
    auth: AuthUser,
    query: SalonQuery<'_>,
) -> ApiResult<Json<AppointmentList>> {
    let scope = AppointmentScope {
        salon_id: query.salon()?,
        staff_id: query.staff()?,
    };
    match (scope.salon_id, scope.staff_id) {
        (None, None) => return Err(ApiError::bad_request("salonId or staffId is required")),
        (Some(salon_id), _) => auth.ensure_salon_member(salon_id)?,
        (None, Some(staff_id)) => {
            if !auth.is_super_admin && staff_id != auth.id {
                let staff = repos.users.find_by_id(staff_id).await?;
                match staff.and_then(|staff| staff.salon_id) {
                    Some(salon_id) => auth.ensure_salon_member(salon_id)?,
                    None => return Err(ApiError::not_found("Staff not found")),
                }
            }
        }
    }

    let appointments = repos.appointments.list(scope).await?;
    Ok(Json(AppointmentList {
        appointments: populate(repos, &appointments).await?,
    }))
}

#[get("/stats/staff/<staff_id>")]
async fn staff_stats_route(
    repos: &State<Repositories>,
    auth: AuthUser,
    staff_id: &str,
) -> ApiResult<Json<StatsResponse>> {
    let staff_id = parse_object_id(staff_id, "staff id")?;
    if !auth.is_super_admin && staff_id != auth.id {
        let staff = repos
            .users
            .find_by_id(staff_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Staff not found"))?;
        auth.ensure_member_of(staff.salon_id)?;
    }

    let today = Utc::now().format("%Y-%m-%d").to_string();
    let appointments = repos.appointments.list_by_staff(staff_id).await?;
    Ok(Json(StatsResponse {
        stats: staff_stats(&appointments, &today),
    }))
}

#[get("/<id>")]
async fn get(
    repos: &State<Repositories>,
    auth: AuthUser,
    id: &str,
) -> ApiResult<Json<PopulatedResponse>> {
    let appointment = visible_appointment(repos, &auth, id).await?;
    let mut populated = populate(repos, std::slice::from_ref(&appointment)).await?;
    let appointment = populated
        .pop()
        .ok_or_else(|| ApiError::Internal("populate returned nothing".into()))?;
    Ok(Json(PopulatedResponse { appointment }))
}

#[patch("/<id>", format = "json", data = "<body>")]
async fn update(
    repos: &State<Repositories>,
    auth: AuthUser,
    id: &str,
    body: Json<AppointmentPatch>,
) -> ApiResult<Json<AppointmentResponse>> {
    let before = visible_appointment(repos, &auth, id).await?;
    let changes = AppointmentChanges::try_from(body.into_inner())?;
    check_patch_references(repos, before.salon_id, &changes).await?;
    let after = repos
        .appointments
        .update(before.id, bson::to_document(&changes)?)
        .await?
        .ok_or_else(|| ApiError::not_found("Appointment not found"))?;

    record_revenue(repos, after.salon_id, Appointment::revenue_delta(&before, &after)).await;

    Ok(Json(AppointmentResponse {
        appointment: AppointmentView::from(&after),
    }))
}

#[delete("/<id>")]
async fn remove(repos: &State<Repositories>, auth: AuthUser, id: &str) -> ApiResult<Json<Deleted>> {
    let appointment = visible_appointment(repos, &auth, id).await?;
    if !repos.appointments.delete(appointment.id).await? {
        return Err(ApiError::not_found("Appointment not found"));
    }
    Ok(Json(Deleted::yes()))
}

pub fn routes() -> Vec<Route> {
    routes![
        create_public,
        create,
        list,
        staff_stats_route,
        get,
        update,
        remove
    ]
}
