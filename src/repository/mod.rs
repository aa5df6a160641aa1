pub mod appointment_repository;
pub mod push_subscription_repository;
pub mod salon_repository;
pub mod service_repository;
pub mod user_repository;

pub use appointment_repository::{AppointmentRepository, AppointmentScope};
pub use push_subscription_repository::{NewSubscription, PushSubscriptionRepository};
pub use salon_repository::SalonRepository;
pub use service_repository::ServiceRepository;
pub use user_repository::UserRepository;
