// src/db.rs
use mongodb::bson::doc;
use mongodb::bson::oid::ObjectId;
use mongodb::error::Result;
use mongodb::{Client, Database as MongoDatabase};
use rocket::fairing::AdHoc;
use rocket_db_pools::Database;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::{ApiError, ApiResult};
use crate::models::salon::Salon;
use crate::models::user::User;
use crate::repository::{
    AppointmentRepository, PushSubscriptionRepository, SalonRepository, ServiceRepository,
    UserRepository,
};

#[derive(Database)]
#[database("salon_db")]
pub struct SalonDb(rocket_db_pools::mongodb::Client);

/// One repository per collection, all bound to the same database.
#[derive(Clone)]
pub struct Repositories {
    pub salons: SalonRepository,
    pub users: UserRepository,
    pub services: ServiceRepository,
    pub appointments: AppointmentRepository,
    pub push_subscriptions: PushSubscriptionRepository,
    database: MongoDatabase,
}

/// What a salon removal took with it.
#[derive(Debug, Default, Clone, Copy)]
pub struct CascadeReport {
    pub users: u64,
    pub staff: u64,
    pub services: u64,
    pub appointments: u64,
    pub push_subscriptions: u64,
}

impl Repositories {
    pub fn new(database: &MongoDatabase) -> Self {
        Repositories {
            salons: SalonRepository::new(database),
            users: UserRepository::new(database),
            services: ServiceRepository::new(database),
            appointments: AppointmentRepository::new(database),
            push_subscriptions: PushSubscriptionRepository::new(database),
            database: database.clone(),
        }
    }

    /// Uses the database named in the connection url, `fallback` otherwise.
    pub fn from_client(client: &Client, fallback: &str) -> Self {
        let database = client
            .default_database()
            .unwrap_or_else(|| client.database(fallback));
        Repositories::new(&database)
    }

    pub async fn ensure_indexes(&self) -> Result<()> {
        self.salons.ensure_indexes().await?;
        self.users.ensure_indexes().await?;
        self.services.ensure_indexes().await?;
        self.appointments.ensure_indexes().await?;
        self.push_subscriptions.ensure_indexes().await
    }

    pub async fn ping(&self) -> Result<()> {
        self.database
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map(|_| ())
    }

    /// Inserts `salon`, then its `owner`. A salon whose owner cannot be
    /// stored is deleted again.
    pub async fn create_salon_with_owner(&self, salon: &Salon, owner: &User) -> ApiResult<()> {
        self.salons
            .insert(salon)
            .await
            .map_err(|e| ApiError::conflict_on_duplicate(e, "Salon slug already exists"))?;
        if let Err(e) = self.users.insert(owner).await {
            if let Err(undo) = self.salons.delete(salon.id).await {
                warn!(error = %undo, salon = %salon.slug, "failed to remove salon without owner");
            }
            return Err(ApiError::conflict_on_duplicate(e, "Owner email already exists"));
        }
        Ok(())
    }

    /// Deletes the salon and everything scoped to it. `None` when the salon
    /// does not exist. Each step is independent; a failure part way leaves
    /// the earlier deletions in place.
    pub async fn delete_salon_cascade(&self, salon_id: ObjectId) -> Result<Option<CascadeReport>> {
        let Some(salon) = self.salons.delete(salon_id).await? else {
            return Ok(None);
        };

        let staff = self.users.count_staff(salon.id).await?;
        let user_ids = self.users.ids_by_salon(salon.id).await?;
        let push_subscriptions = self.push_subscriptions.delete_for_users(user_ids).await?;
        let users = self.users.delete_by_salon(salon.id).await?;
        let services = self.services.delete_by_salon(salon.id).await?;
        let appointments = self.appointments.delete_by_salon(salon.id).await?;

        info!(
            salon = %salon.slug,
            users, services, appointments, push_subscriptions,
            "salon removed"
        );
        Ok(Some(CascadeReport {
            users,
            staff,
            services,
            appointments,
            push_subscriptions,
        }))
    }
}

/// Connection pool, repositories, and index creation once the server is up.
pub fn stage() -> AdHoc {
    AdHoc::on_ignite("MongoDB", |rocket| async {
        rocket
            .attach(SalonDb::init())
            .attach(AdHoc::try_on_ignite("Repositories", |rocket| async {
                let fallback = rocket
                    .state::<AppConfig>()
                    .map(|config| config.database_name.clone())
                    .unwrap_or_else(|| AppConfig::default().database_name);
                let repositories = match SalonDb::fetch(&rocket) {
                    Some(db) => Repositories::from_client(db, &fallback),
                    None => return Err(rocket),
                };
                Ok(rocket.manage(repositories))
            }))
            .attach(AdHoc::on_liftoff("MongoDB indexes", |rocket| {
                Box::pin(async move {
                    if let Some(repositories) = rocket.state::<Repositories>() {
                        match repositories.ensure_indexes().await {
                            Ok(()) => info!("mongodb indexes ensured"),
                            Err(e) => warn!(error = %e, "failed to ensure mongodb indexes"),
                        }
                    }
                })
            }))
    })
}
