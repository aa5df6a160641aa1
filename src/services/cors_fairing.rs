use std::path::PathBuf;

use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Status};
use rocket::{Request, Response};

use crate::config::AppConfig;

/// Adds the cross-origin headers the dashboard needs. The request's `Origin`
/// is echoed when it is on the configured list; otherwise the first
/// configured origin is sent.
pub struct Cors;

fn allowed_origin(config: &AppConfig, requested: Option<&str>) -> String {
    let mut allowed = config.allowed_origins();
    let fallback = allowed.next().unwrap_or("*").to_string();
    match requested {
        Some(origin) if origin == fallback || config.allowed_origins().any(|o| o == origin) => {
            origin.to_string()
        }
        _ => fallback,
    }
}

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        let default_config;
        let config = match request.rocket().state::<AppConfig>() {
            Some(config) => config,
            None => {
                default_config = AppConfig::default();
                &default_config
            }
        };
        let origin = allowed_origin(config, request.headers().get_one("Origin"));

        response.set_header(Header::new("Access-Control-Allow-Origin", origin));
        response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "GET, POST, PATCH, DELETE, OPTIONS",
        ));
        response.set_header(Header::new(
            "Access-Control-Allow-Headers",
            "Content-Type, Authorization",
        ));
        response.set_header(Header::new("Access-Control-Max-Age", "86400"));
        response.set_header(Header::new("Vary", "Origin"));
    }
}

/// Answers every preflight; the fairing above supplies the headers.
#[options("/<_path..>")]
pub fn all_options(_path: PathBuf) -> Status {
    Status::NoContent
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(origins: &str) -> AppConfig {
        AppConfig {
            cors_origin: origins.to_string(),
            ..AppConfig::default()
        }
    }

    #[test]
    fn echoes_listed_origin() {
        let config = config("https://app.example, http://localhost:5173");
        assert_eq!(
            allowed_origin(&config, Some("http://localhost:5173")),
            "http://localhost:5173"
        );
    }

    #[test]
    fn falls_back_to_first_origin() {
        let config = config("https://app.example, http://localhost:5173");
        assert_eq!(
            allowed_origin(&config, Some("https://evil.example")),
            "https://app.example"
        );
        assert_eq!(allowed_origin(&config, None), "https://app.example");
    }
}
