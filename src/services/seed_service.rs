use serde::Serialize;
use tracing::info;

use crate::config::{AppConfig, SeedConfig};
use crate::db::Repositories;
use crate::error::{ApiError, ApiResult};
use crate::models::salon::Salon;
use crate::models::user::{Role, User};
use crate::services::password::hash_password;

#[derive(Serialize, Debug, Clone)]
pub struct SeedReport {
    pub salon: String,
    pub users: Vec<String>,
    pub created: Vec<String>,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SeedStatus {
    #[serde(skip_serializing)]
    pub seeded: bool,
    pub admin_user: &'static str,
    pub salon: &'static str,
    pub total_users: u64,
    pub total_salons: u64,
}

fn presence(found: bool) -> &'static str {
    if found {
        "exists"
    } else {
        "missing"
    }
}

/// Outside development the built-in seed passwords are refused, so a
/// deployed server never gets a super admin anyone can log into.
pub fn ensure_seed_allowed(config: &AppConfig) -> ApiResult<()> {
    if !config.is_development() && config.seed.uses_default_passwords() {
        return Err(ApiError::forbidden(
            "Seeding with default passwords is only allowed in development",
        ));
    }
    Ok(())
}

/// Creates the demo salon, its owner and a super admin. Safe to run again:
/// anything already present is left as it is.
pub async fn seed(repos: &Repositories, seed: &SeedConfig) -> ApiResult<SeedReport> {
    if seed.owner_email.trim().is_empty() || seed.super_admin_email.trim().is_empty() {
        return Err(ApiError::Internal("seed identities are not configured".into()));
    }

    let mut created = Vec::new();

    let salon = match repos.salons.find_by_slug(&seed.salon_slug).await? {
        Some(salon) => salon,
        None => {
            let salon = Salon::new(&seed.salon_name, &seed.salon_slug, &seed.owner_email);
            repos.salons.insert(&salon).await?;
            info!(slug = %salon.slug, "seeded salon");
            created.push(format!("salon:{}", salon.slug));
            salon
        }
    };

    if !repos.users.email_exists(&seed.owner_email).await? {
        let hash = hash_password(seed.owner_password.clone()).await?;
        let owner = User::new(&seed.owner_email, hash, Role::Owner, Some(salon.id))
            .with_full_name(Some("Owner Admin".to_string()));
        repos.users.insert(&owner).await?;
        info!(email = %owner.email, "seeded salon owner");
        created.push(format!("user:{}", owner.email));
    }

    if !repos.users.email_exists(&seed.super_admin_email).await? {
        let hash = hash_password(seed.super_admin_password.clone()).await?;
        let admin = User::new(&seed.super_admin_email, hash, Role::SuperAdmin, None)
            .with_full_name(Some("Super Admin".to_string()));
        repos.users.insert(&admin).await?;
        info!(email = %admin.email, "seeded super admin");
        created.push(format!("user:{}", admin.email));
    }

    Ok(SeedReport {
        salon: salon.name,
        users: vec![
            seed.owner_email.to_lowercase(),
            seed.super_admin_email.to_lowercase(),
        ],
        created,
    })
}

pub async fn seed_status(repos: &Repositories, seed: &SeedConfig) -> ApiResult<SeedStatus> {
    let admin_exists = repos.users.email_exists(&seed.owner_email).await?;
    let salon_exists = repos.salons.find_by_slug(&seed.salon_slug).await?.is_some();
    Ok(SeedStatus {
        seeded: admin_exists && salon_exists,
        admin_user: presence(admin_exists),
        salon: presence(salon_exists),
        total_users: repos.users.count_all().await?,
        total_salons: repos.salons.count_all().await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_passwords_only_seed_in_development() {
        let mut config = AppConfig::default();
        assert!(ensure_seed_allowed(&config).is_ok());

        config.environment = "production".to_string();
        let err = ensure_seed_allowed(&config).unwrap_err();
        assert_eq!(err.status(), rocket::http::Status::Forbidden);

        config.seed.owner_password = "owner-pass-1".to_string();
        config.seed.super_admin_password = "admin-pass-1".to_string();
        assert!(ensure_seed_allowed(&config).is_ok());
    }
}
