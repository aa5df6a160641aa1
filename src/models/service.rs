use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Service {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub salon_id: ObjectId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub duration: i32, // minutes
    pub price: f64,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl Service {
    pub fn new(
        salon_id: ObjectId,
        name: &str,
        price: f64,
        duration: i32,
        description: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Service {
            id: ObjectId::new(),
            salon_id,
            name: name.trim().to_string(),
            description,
            duration,
            price,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ServiceView {
    pub id: String,
    pub salon_id: String,
    pub name: String,
    pub description: Option<String>,
    pub duration: i32,
    pub price: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Service> for ServiceView {
    fn from(service: &Service) -> Self {
        ServiceView {
            id: service.id.to_hex(),
            salon_id: service.salon_id.to_hex(),
            name: service.name.clone(),
            description: service.description.clone(),
            duration: service.duration,
            price: service.price,
            is_active: service.is_active,
            created_at: service.created_at,
            updated_at: service.updated_at,
        }
    }
}

/// Body of `PATCH /api/services/<id>`.
#[derive(Deserialize, Debug, Default)]
pub struct ServicePatch {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub duration: Option<i32>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

/// Validated `$set` document for a service update.
#[derive(Serialize, Debug, Default)]
pub struct ServiceChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl TryFrom<ServicePatch> for ServiceChanges {
    type Error = ApiError;

    fn try_from(patch: ServicePatch) -> ApiResult<Self> {
        let name = match patch.name {
            Some(name) if name.trim().is_empty() => {
                return Err(ApiError::bad_request("name must not be blank"))
            }
            name => name.map(|name| name.trim().to_string()),
        };
        if patch.price.is_some_and(|price| price < 0.0 || !price.is_finite()) {
            return Err(ApiError::bad_request("price must not be negative"));
        }
        if patch.duration.is_some_and(|duration| duration <= 0) {
            return Err(ApiError::bad_request("duration must be positive"));
        }
        Ok(ServiceChanges {
            name,
            price: patch.price,
            duration: patch.duration,
            description: patch.description,
            is_active: patch.is_active,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_rejects_bad_price_duration_and_name() {
        let negative = ServicePatch {
            price: Some(-5.0),
            ..ServicePatch::default()
        };
        let err = ServiceChanges::try_from(negative).unwrap_err();
        assert_eq!(err.to_string(), "price must not be negative");

        let zero_minutes = ServicePatch {
            duration: Some(0),
            ..ServicePatch::default()
        };
        let err = ServiceChanges::try_from(zero_minutes).unwrap_err();
        assert_eq!(err.to_string(), "duration must be positive");

        let blank = ServicePatch {
            name: Some("   ".into()),
            ..ServicePatch::default()
        };
        let err = ServiceChanges::try_from(blank).unwrap_err();
        assert_eq!(err.to_string(), "name must not be blank");
    }

    #[test]
    fn patch_keeps_only_given_fields() {
        let patch = ServicePatch {
            name: Some(" Fade ".into()),
            price: Some(0.0),
            ..ServicePatch::default()
        };
        let doc = bson::to_document(&ServiceChanges::try_from(patch).unwrap()).unwrap();
        assert_eq!(doc.get_str("name").unwrap(), "Fade");
        assert_eq!(doc.get_f64("price").unwrap(), 0.0);
        assert!(!doc.contains_key("duration"));
        assert!(!doc.contains_key("is_active"));
    }
}
