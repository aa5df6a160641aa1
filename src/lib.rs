#[macro_use]
extern crate rocket;

pub mod config;
pub mod db;
pub mod error;
pub mod jwt;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;

use rocket::fairing::AdHoc;
use rocket::figment::Figment;
use rocket::{Build, Rocket};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::jwt::JwtKeys;
use crate::routes::health::StartedAt;
use crate::services::cors_fairing::Cors;
use crate::services::push_notifier::PushNotifier;
use crate::services::request_logger::RequestLogger;

pub fn build() -> Rocket<Build> {
    build_with(config::figment())
}

/// Assembles the server from `figment`. Tests pass their own to avoid
/// depending on the environment.
pub fn build_with(figment: Figment) -> Rocket<Build> {
    let rocket = rocket::custom(figment)
        .attach(AdHoc::config::<AppConfig>())
        .attach(AdHoc::try_on_ignite("JWT keys", |rocket| async {
            let Some(config) = rocket.state::<AppConfig>() else {
                return Err(rocket);
            };
            if config.jwt_secret == AppConfig::default().jwt_secret && !config.is_development() {
                warn!("jwt_secret is the built-in default; set JWT_SECRET");
            }
            let keys = JwtKeys::from_config(config);
            info!(environment = %config.environment, "jwt keys loaded");
            Ok(rocket.manage(keys))
        }))
        .attach(AdHoc::try_on_ignite("Web Push", |rocket| async {
            let Some(config) = rocket.state::<AppConfig>() else {
                return Err(rocket);
            };
            let notifier = PushNotifier::from_config(&config.push);
            Ok(rocket.manage(notifier))
        }))
        .attach(db::stage())
        .attach(Cors)
        .attach(RequestLogger)
        .manage(StartedAt::default())
        .register("/", error::catchers());

    routes::mount(rocket)
}
