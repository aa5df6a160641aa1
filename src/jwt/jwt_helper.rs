// src/jwt/jwt_helper.rs
use chrono::Duration;
use jsonwebtoken::{
    decode, encode, errors::Result as JwtResult, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};

use crate::config::AppConfig;
use crate::jwt::claims::Claims;
use crate::models::user::User;

/// HS256 signing material plus the lifetime stamped into new tokens.
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtKeys {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        JwtKeys {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        JwtKeys::new(&config.jwt_secret, config.jwt_ttl_hours)
    }

    pub fn create_token(&self, user: &User) -> JwtResult<String> {
        self.sign(&Claims::for_user(user, self.ttl))
    }

    pub fn sign(&self, claims: &Claims) -> JwtResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
    }

    pub fn verify_token(&self, token: &str) -> JwtResult<Claims> {
        decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;
    use mongodb::bson::oid::ObjectId;

    fn owner() -> User {
        User::new(
            "Owner@Example.com",
            "hash".to_string(),
            Role::Owner,
            Some(ObjectId::new()),
        )
    }

    #[test]
    fn issued_token_carries_role_and_tenant() {
        let keys = JwtKeys::new("secret", 1);
        let user = owner();
        let token = keys.create_token(&user).unwrap();
        let claims = keys.verify_token(&token).unwrap();

        assert_eq!(claims.sub, user.id.to_hex());
        assert_eq!(claims.email, "owner@example.com");
        assert_eq!(claims.role, Role::Owner);
        assert_eq!(claims.salon_id, user.salon_id.map(|id| id.to_hex()));
        assert!(!claims.is_super_admin);
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let token = JwtKeys::new("one", 1).create_token(&owner()).unwrap();
        assert!(JwtKeys::new("two", 1).verify_token(&token).is_err());
    }

    #[test]
    fn rejects_expired_token() {
        let keys = JwtKeys::new("secret", 1);
        let mut claims = Claims::for_user(&owner(), Duration::hours(1));
        claims.iat -= 7200;
        claims.exp = claims.iat + 60;
        let token = keys.sign(&claims).unwrap();
        assert!(keys.verify_token(&token).is_err());
    }

    #[test]
    fn claims_use_camel_case_on_the_wire() {
        let claims = Claims::for_user(&owner(), Duration::hours(1));
        let json = serde_json::to_value(&claims).unwrap();
        assert!(json.get("salonId").is_some());
        assert_eq!(json["isSuperAdmin"], false);
        assert_eq!(json["role"], "owner");
    }
}
