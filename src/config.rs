// src/config.rs
use rocket::figment::providers::Env;
use rocket::figment::Figment;
use serde::{Deserialize, Serialize};

/// Name of the `rocket_db_pools` database holding every collection.
pub const DATABASE_KEY: &str = "salon_db";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub environment: String,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    /// Comma separated list; the first entry is the fallback origin.
    pub cors_origin: String,
    /// Used when the connection url carries no default database.
    pub database_name: String,
    pub seed: SeedConfig,
    pub push: PushConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            environment: "development".to_string(),
            jwt_secret: "change-me".to_string(),
            jwt_ttl_hours: 24 * 7,
            cors_origin: "http://localhost:5173".to_string(),
            database_name: "salon_booking".to_string(),
            seed: SeedConfig::default(),
            push: PushConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn allowed_origins(&self) -> impl Iterator<Item = &str> {
        self.cors_origin
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub salon_name: String,
    pub salon_slug: String,
    pub owner_email: String,
    pub owner_password: String,
    pub super_admin_email: String,
    pub super_admin_password: String,
}

impl Default for SeedConfig {
    fn default() -> Self {
        SeedConfig {
            salon_name: "Demo Salon".to_string(),
            salon_slug: "demo-salon".to_string(),
            owner_email: "owner@barbershop.com".to_string(),
            owner_password: "ChangeMe123!".to_string(),
            super_admin_email: "superadmin@barbershop.com".to_string(),
            super_admin_password: "ChangeMe123!".to_string(),
        }
    }
}

impl SeedConfig {
    /// True while either seeded account would get the built-in password.
    pub fn uses_default_passwords(&self) -> bool {
        let defaults = SeedConfig::default();
        self.owner_password == defaults.owner_password
            || self.super_admin_password == defaults.super_admin_password
    }
}

/// VAPID credentials for Web Push. Delivery is off unless both keys are set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PushConfig {
    /// Uncompressed P-256 point, base64url.
    pub vapid_public_key: Option<String>,
    /// Raw 32 byte P-256 scalar, base64url.
    pub vapid_private_key: Option<String>,
    pub vapid_subject: String,
}

impl Default for PushConfig {
    fn default() -> Self {
        PushConfig {
            vapid_public_key: None,
            vapid_private_key: None,
            vapid_subject: "mailto:admin@localhost".to_string(),
        }
    }
}

/// Rocket's own figment (`Rocket.toml`, `ROCKET_*`) extended with the plain
/// variables deployments already set: `JWT_SECRET`, `CORS_ORIGIN`, `PORT`
/// `MONGODB_URI` and the `VAPID_*` keys.
pub fn figment() -> Figment {
    rocket::Config::figment()
        .merge(Env::raw().only(&["JWT_SECRET", "CORS_ORIGIN", "PORT"]))
        .merge(
            Env::raw()
                .only(&["MONGODB_URI"])
                .map(|_| format!("databases.{DATABASE_KEY}.url").into()),
        )
        .merge(
            Env::raw()
                .only(&["VAPID_PUBLIC_KEY", "VAPID_PRIVATE_KEY", "VAPID_SUBJECT"])
                .map(|key| format!("push.{}", key.as_str().to_ascii_lowercase()).into()),
        )
}
