pub mod admin;
pub mod appointments;
pub mod auth;
pub mod health;
pub mod notifications;
pub mod push_subscriptions;
pub mod salons;
pub mod seed;
pub mod services;
pub mod staff;

use mongodb::bson::oid::ObjectId;
use rocket::{Build, Rocket};
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::models::parse_object_id;

/// Query string shared by the salon-scoped listings.
#[derive(FromForm, Debug, Default)]
pub struct SalonQuery<'r> {
    #[field(name = "salonId")]
    pub salon_id: Option<&'r str>,
    #[field(name = "staffId")]
    pub staff_id: Option<&'r str>,
    pub role: Option<&'r str>,
}

fn optional_id(raw: Option<&str>, what: &str) -> ApiResult<Option<ObjectId>> {
    raw.map(str::trim)
        .filter(|raw| !raw.is_empty())
        .map(|raw| parse_object_id(raw, what))
        .transpose()
}

impl SalonQuery<'_> {
    pub fn salon(&self) -> ApiResult<Option<ObjectId>> {
        optional_id(self.salon_id, "salonId")
    }

    pub fn staff(&self) -> ApiResult<Option<ObjectId>> {
        optional_id(self.staff_id, "staffId")
    }

    pub fn required_salon(&self) -> ApiResult<ObjectId> {
        self.salon()?
            .ok_or_else(|| ApiError::bad_request("salonId is required"))
    }
}

#[derive(Serialize, Debug)]
pub struct Deleted {
    pub deleted: bool,
}

impl Deleted {
    pub fn yes() -> Self {
        Deleted { deleted: true }
    }
}

pub fn mount(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket
        .mount("/", health::routes())
        .mount("/", routes![crate::services::cors_fairing::all_options])
        .mount("/api/auth", auth::routes())
        .mount("/api/salons", salons::routes())
        .mount("/api/services", services::routes())
        .mount("/api/staff", staff::routes())
        .mount("/api/appointments", appointments::routes())
        .mount("/api/notifications", notifications::routes())
        .mount("/api/admin", admin::routes())
        .mount("/api/push-subscriptions", push_subscriptions::routes())
        .mount("/api/seed", seed::routes())
}
