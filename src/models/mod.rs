pub mod appointment;
pub mod push_subscription;
pub mod salon;
pub mod service;
pub mod user;

use mongodb::bson::oid::ObjectId;

use crate::error::{ApiError, ApiResult};

/// Parses a hex id from a path, query or body field; `what` names the field
/// in the 400 message.
pub fn parse_object_id(raw: &str, what: &str) -> ApiResult<ObjectId> {
    ObjectId::parse_str(raw.trim()).map_err(|_| ApiError::bad_request(format!("Invalid {what}")))
}

/// Treats absent and blank strings alike, the way form inputs arrive.
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_ids_and_rejects_garbage() {
        let id = ObjectId::new();
        assert_eq!(parse_object_id(&id.to_hex(), "salonId").unwrap(), id);

        let err = parse_object_id("not-an-id", "salonId").unwrap_err();
        assert_eq!(err.to_string(), "Invalid salonId");
    }

    #[test]
    fn blank_strings_count_as_missing() {
        assert_eq!(non_empty(&None), None);
        assert_eq!(non_empty(&Some("  ".into())), None);
        assert_eq!(non_empty(&Some(" a ".into())), Some("a"));
    }
}
