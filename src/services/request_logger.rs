use std::time::Instant;

use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::Header;
use rocket::{Data, Request, Response};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Tags every request with an id and logs it on the way in and out.
pub struct RequestLogger;

struct RequestStart(Instant);

struct RequestId(String);

#[rocket::async_trait]
impl Fairing for RequestLogger {
    fn info(&self) -> Info {
        Info {
            name: "Request logger",
            kind: Kind::Request | Kind::Response,
        }
    }

    async fn on_request(&self, request: &mut Request<'_>, _: &mut Data<'_>) {
        request.local_cache(|| RequestStart(Instant::now()));
        let id = request.local_cache(|| RequestId(Uuid::new_v4().to_string()));
        let user_agent = request
            .headers()
            .get_one("User-Agent")
            .map(|agent| agent.chars().take(100).collect::<String>());
        debug!(
            request_id = %id.0,
            method = %request.method(),
            path = %request.uri().path(),
            ip = ?request.client_ip(),
            user_agent = ?user_agent,
            "request"
        );
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        let started = request.local_cache(|| RequestStart(Instant::now()));
        let id = request.local_cache(|| RequestId(Uuid::new_v4().to_string()));
        let duration_ms = started.0.elapsed().as_millis() as u64;
        let status = response.status().code;

        response.set_header(Header::new("X-Request-Id", id.0.clone()));
        if status >= 400 {
            warn!(
                request_id = %id.0,
                method = %request.method(),
                path = %request.uri().path(),
                status,
                duration_ms,
                "response"
            );
        } else {
            info!(
                request_id = %id.0,
                method = %request.method(),
                path = %request.uri().path(),
                status,
                duration_ms,
                "response"
            );
        }
    }
}

/// Installs the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,rocket=warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
