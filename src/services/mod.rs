pub mod auth_guard;
pub mod cors_fairing;
pub mod password;
pub mod push_notifier;
pub mod request_logger;
pub mod seed_service;
pub mod stats;
