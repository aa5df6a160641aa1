use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SalonStatus {
    #[default]
    Active,
    Suspended,
    Cancelled,
}

impl SalonStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SalonStatus::Active => "active",
            SalonStatus::Suspended => "suspended",
            SalonStatus::Cancelled => "cancelled",
        }
    }
}

/// A tenant. Everything else (users, services, appointments) points back
/// here through `salon_id` and is removed with it.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Salon {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub slug: String, // unique
    pub owner_email: String,
    #[serde(default)]
    pub status: SalonStatus,
    #[serde(default = "default_plan")]
    pub subscription_plan: String,
    #[serde(default)]
    pub total_revenue: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opening_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closing_time: Option<String>,
    #[serde(default)]
    pub open_days: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

fn default_plan() -> String {
    "basic".to_string()
}

impl Salon {
    pub fn new(name: &str, slug: &str, owner_email: &str) -> Self {
        let now = Utc::now();
        Salon {
            id: ObjectId::new(),
            name: name.trim().to_string(),
            slug: slug.trim().to_string(),
            owner_email: owner_email.trim().to_lowercase(),
            status: SalonStatus::Active,
            subscription_plan: default_plan(),
            total_revenue: 0.0,
            logo_url: None,
            contact_phone: None,
            contact_email: None,
            address: None,
            city: None,
            country: None,
            opening_time: None,
            closing_time: None,
            open_days: Vec::new(),
            latitude: None,
            longitude: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn accepts_bookings(&self) -> bool {
        self.status == SalonStatus::Active
    }
}

/// Salon as returned over JSON: the stored fields with `id` as a hex string.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SalonView {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub owner_email: String,
    pub status: SalonStatus,
    pub subscription_plan: String,
    pub total_revenue: f64,
    pub logo_url: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub opening_time: Option<String>,
    pub closing_time: Option<String>,
    pub open_days: Vec<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Salon> for SalonView {
    fn from(salon: Salon) -> Self {
        SalonView {
            id: salon.id.to_hex(),
            name: salon.name,
            slug: salon.slug,
            owner_email: salon.owner_email,
            status: salon.status,
            subscription_plan: salon.subscription_plan,
            total_revenue: salon.total_revenue,
            logo_url: salon.logo_url,
            contact_phone: salon.contact_phone,
            contact_email: salon.contact_email,
            address: salon.address,
            city: salon.city,
            country: salon.country,
            opening_time: salon.opening_time,
            closing_time: salon.closing_time,
            open_days: salon.open_days,
            latitude: salon.latitude,
            longitude: salon.longitude,
            created_at: salon.created_at,
            updated_at: salon.updated_at,
        }
    }
}

/// Salon row on the super admin dashboard.
#[derive(Serialize, Debug, Clone)]
pub struct SalonSummary {
    #[serde(flatten)]
    pub salon: SalonView,
    pub staff_count: u64,
    pub appointment_count: u64,
    pub owner_name: String,
}

/// `$set` payload for salon edits. Used both for the owner's profile form
/// and for the super admin's name/slug/status changes.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct SalonChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SalonStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opening_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closing_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_days: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_salon_is_active_on_basic_plan() {
        let salon = Salon::new(" Fade Factory ", "fade-factory", "Boss@Fade.io");
        assert_eq!(salon.name, "Fade Factory");
        assert_eq!(salon.owner_email, "boss@fade.io");
        assert_eq!(salon.subscription_plan, "basic");
        assert!(salon.accepts_bookings());
    }

    #[test]
    fn view_exposes_hex_id() {
        let salon = Salon::new("A", "a", "a@a.io");
        let hex = salon.id.to_hex();
        let json = serde_json::to_value(SalonView::from(salon)).unwrap();
        assert_eq!(json["id"], hex);
        assert_eq!(json["status"], "active");
    }

    #[test]
    fn changes_skip_untouched_fields() {
        let changes = SalonChanges {
            status: Some(SalonStatus::Suspended),
            ..SalonChanges::default()
        };
        let doc = bson::to_document(&changes).unwrap();
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.get_str("status").unwrap(), "suspended");
    }
}
