// src/error.rs
use mongodb::error::{ErrorKind, WriteFailure};
use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::Request;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

const DUPLICATE_KEY: i32 = 11000;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),
    #[error("bson encoding failed: {0}")]
    Encoding(#[from] bson::ser::Error),
    #[error("token signing failed: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("password hashing failed: {0}")]
    Password(#[from] bcrypt::BcryptError),
    #[error("{0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    /// Turns a unique index violation into a 409 with `message`; any other
    /// database error is passed through.
    pub fn conflict_on_duplicate(err: mongodb::error::Error, message: &str) -> Self {
        if is_duplicate_key(&err) {
            ApiError::conflict(message)
        } else {
            ApiError::Database(err)
        }
    }

    pub fn status(&self) -> Status {
        match self {
            ApiError::BadRequest(_) => Status::BadRequest,
            ApiError::Unauthorized(_) => Status::Unauthorized,
            ApiError::Forbidden(_) => Status::Forbidden,
            ApiError::NotFound(_) => Status::NotFound,
            ApiError::Conflict(_) => Status::Conflict,
            ApiError::Database(_)
            | ApiError::Encoding(_)
            | ApiError::Token(_)
            | ApiError::Password(_)
            | ApiError::Internal(_) => Status::InternalServerError,
        }
    }
}

pub fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY
    )
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Json<Self> {
        Json(ErrorBody {
            error: message.into(),
        })
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        let message = if status == Status::InternalServerError {
            error!(
                method = %request.method(),
                path = %request.uri().path(),
                error = %self,
                "request failed"
            );
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, ErrorBody::new(message)).respond_to(request)
    }
}

/// Reason a request guard rejected the request, kept in the request-local
/// cache so the catchers can report it.
#[derive(Debug, Default)]
pub struct GuardFailure(pub Option<&'static str>);

fn guard_reason(request: &Request<'_>) -> Option<&'static str> {
    request.local_cache(GuardFailure::default).0
}

#[catch(400)]
pub fn bad_request(_request: &Request) -> Json<ErrorBody> {
    ErrorBody::new("Bad request")
}

#[catch(401)]
pub fn unauthorized(request: &Request) -> Json<ErrorBody> {
    ErrorBody::new(guard_reason(request).unwrap_or("Unauthorized"))
}

#[catch(403)]
pub fn forbidden(request: &Request) -> Json<ErrorBody> {
    ErrorBody::new(guard_reason(request).unwrap_or("Forbidden"))
}

#[catch(404)]
pub fn not_found(request: &Request) -> Json<ErrorBody> {
    ErrorBody::new(format!("Route {} not found", request.uri().path()))
}

#[catch(422)]
pub fn unprocessable(_request: &Request) -> Json<ErrorBody> {
    ErrorBody::new("Malformed request body")
}

#[catch(500)]
pub fn internal_error(_request: &Request) -> Json<ErrorBody> {
    ErrorBody::new("Internal server error")
}

#[catch(default)]
pub fn default_catcher(status: Status, _request: &Request) -> Json<ErrorBody> {
    ErrorBody::new(status.reason().unwrap_or("Unexpected error"))
}

pub fn catchers() -> Vec<rocket::Catcher> {
    catchers![
        bad_request,
        unauthorized,
        forbidden,
        not_found,
        unprocessable,
        internal_error,
        default_catcher
    ]
}
