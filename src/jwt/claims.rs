// src/jwt/claims.rs
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::user::{Role, User};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub sub: String, // user id, hex
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salon_id: Option<String>,
    #[serde(default)]
    pub is_super_admin: bool,
    pub iat: usize,
    pub exp: usize,
}

impl Claims {
    pub fn for_user(user: &User, ttl: Duration) -> Self {
        let now = Utc::now();
        Claims {
            sub: user.id.to_hex(),
            email: user.email.clone(),
            role: user.role,
            salon_id: user.salon_id.map(|id| id.to_hex()),
            is_super_admin: user.is_super_admin,
            iat: now.timestamp() as usize,
            exp: (now + ttl).timestamp() as usize,
        }
    }
}
