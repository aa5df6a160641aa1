use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::models::service::{Service, ServiceView};
use crate::models::user::{StaffSummary, User};
use crate::models::{non_empty, parse_object_id};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppointmentStatus {
    #[default]
    #[serde(alias = "pending")]
    Pending,
    #[serde(alias = "confirmed")]
    Confirmed,
    #[serde(alias = "completed")]
    Completed,
    #[serde(alias = "cancelled")]
    Cancelled,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Appointment {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub salon_id: ObjectId,
    pub staff_id: ObjectId,
    pub service_id: ObjectId,
    pub customer_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    pub appointment_date: String, // YYYY-MM-DD
    pub appointment_time: String, // HH:MM
    #[serde(default)]
    pub status: AppointmentStatus,
    #[serde(default)]
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_read: bool,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Amount this appointment contributes to its salon's revenue.
    pub fn earned(&self) -> f64 {
        if self.status == AppointmentStatus::Completed {
            self.amount
        } else {
            0.0
        }
    }

    /// Change in salon revenue when `before` is replaced by `after`.
    pub fn revenue_delta(before: &Appointment, after: &Appointment) -> f64 {
        after.earned() - before.earned()
    }
}

/// A bookable service must be active and belong to `salon_id`.
pub fn bookable_service(salon_id: ObjectId, service: Option<Service>) -> ApiResult<Service> {
    service
        .filter(|service| service.salon_id == salon_id && service.is_active)
        .ok_or_else(|| ApiError::bad_request("service_id does not belong to this salon"))
}

pub fn check_staff_member(salon_id: ObjectId, staff: Option<&User>) -> ApiResult<()> {
    match staff {
        Some(staff) if staff.salon_id == Some(salon_id) => Ok(()),
        _ => Err(ApiError::bad_request("staff_id does not belong to this salon")),
    }
}

pub fn validate_date(raw: &str) -> ApiResult<()> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| ApiError::bad_request("appointment_date must be YYYY-MM-DD"))
}

pub fn validate_time(raw: &str) -> ApiResult<()> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map(|_| ())
        .map_err(|_| ApiError::bad_request("appointment_time must be HH:MM"))
}

/// Booking body shared by the public booking form and the dashboard.
#[derive(Deserialize, Debug, Default)]
pub struct AppointmentRequest {
    pub salon_id: Option<String>,
    pub staff_id: Option<String>,
    pub service_id: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub appointment_date: Option<String>,
    pub appointment_time: Option<String>,
    pub status: Option<AppointmentStatus>,
    pub amount: Option<f64>,
    pub notes: Option<String>,
}

impl AppointmentRequest {
    /// Anonymous bookings always start out pending.
    pub fn public(self) -> Self {
        AppointmentRequest {
            status: None,
            ..self
        }
    }

    /// Checks required fields in a fixed order (the first one missing is
    /// reported), then id and date/time formats.
    pub fn into_appointment(self) -> ApiResult<Appointment> {
        let required = [
            ("salon_id", &self.salon_id),
            ("staff_id", &self.staff_id),
            ("service_id", &self.service_id),
            ("customer_name", &self.customer_name),
            ("appointment_date", &self.appointment_date),
            ("appointment_time", &self.appointment_time),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| non_empty(value).is_none()) {
            return Err(ApiError::bad_request(format!("{field} is required")));
        }

        let field = |value: &Option<String>| non_empty(value).unwrap_or_default().to_string();
        let salon_id = parse_object_id(&field(&self.salon_id), "salon_id")?;
        let staff_id = parse_object_id(&field(&self.staff_id), "staff_id")?;
        let service_id = parse_object_id(&field(&self.service_id), "service_id")?;
        let appointment_date = field(&self.appointment_date);
        let appointment_time = field(&self.appointment_time);
        validate_date(&appointment_date)?;
        validate_time(&appointment_time)?;

        let now = Utc::now();
        Ok(Appointment {
            id: ObjectId::new(),
            salon_id,
            staff_id,
            service_id,
            customer_name: field(&self.customer_name),
            customer_email: self.customer_email,
            customer_phone: self.customer_phone,
            appointment_date,
            appointment_time,
            status: self.status.unwrap_or_default(),
            amount: self.amount.unwrap_or_default(),
            notes: self.notes,
            is_read: false,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Body of `PATCH /api/appointments/<id>`.
#[derive(Deserialize, Debug, Default)]
pub struct AppointmentPatch {
    pub staff_id: Option<String>,
    pub service_id: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub appointment_date: Option<String>,
    pub appointment_time: Option<String>,
    pub status: Option<AppointmentStatus>,
    pub amount: Option<f64>,
    pub notes: Option<String>,
    pub is_read: Option<bool>,
}

/// Validated `$set` document for an appointment update.
#[derive(Serialize, Debug, Default)]
pub struct AppointmentChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staff_id: Option<ObjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_id: Option<ObjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_read: Option<bool>,
}

impl TryFrom<AppointmentPatch> for AppointmentChanges {
    type Error = ApiError;

    fn try_from(patch: AppointmentPatch) -> ApiResult<Self> {
        if let Some(date) = &patch.appointment_date {
            validate_date(date)?;
        }
        if let Some(time) = &patch.appointment_time {
            validate_time(time)?;
        }
        Ok(AppointmentChanges {
            staff_id: patch
                .staff_id
                .as_deref()
                .map(|id| parse_object_id(id, "staff_id"))
                .transpose()?,
            service_id: patch
                .service_id
                .as_deref()
                .map(|id| parse_object_id(id, "service_id"))
                .transpose()?,
            customer_name: patch.customer_name,
            customer_email: patch.customer_email,
            customer_phone: patch.customer_phone,
            appointment_date: patch.appointment_date,
            appointment_time: patch.appointment_time,
            status: patch.status,
            amount: patch.amount,
            notes: patch.notes,
            is_read: patch.is_read,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AppointmentView {
    pub id: String,
    pub salon_id: String,
    pub staff_id: String,
    pub service_id: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub appointment_date: String,
    pub appointment_time: String,
    pub status: AppointmentStatus,
    pub amount: f64,
    pub notes: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Appointment> for AppointmentView {
    fn from(appointment: &Appointment) -> Self {
        AppointmentView {
            id: appointment.id.to_hex(),
            salon_id: appointment.salon_id.to_hex(),
            staff_id: appointment.staff_id.to_hex(),
            service_id: appointment.service_id.to_hex(),
            customer_name: appointment.customer_name.clone(),
            customer_email: appointment.customer_email.clone(),
            customer_phone: appointment.customer_phone.clone(),
            appointment_date: appointment.appointment_date.clone(),
            appointment_time: appointment.appointment_time.clone(),
            status: appointment.status,
            amount: appointment.amount,
            notes: appointment.notes.clone(),
            is_read: appointment.is_read,
            created_at: appointment.created_at,
            updated_at: appointment.updated_at,
        }
    }
}

/// Appointment with its service and staff member resolved.
#[derive(Serialize, Debug, Clone)]
pub struct PopulatedAppointment {
    #[serde(flatten)]
    pub appointment: AppointmentView,
    pub service: Option<ServiceView>,
    pub staff: Option<StaffSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking() -> AppointmentRequest {
        AppointmentRequest {
            salon_id: Some(ObjectId::new().to_hex()),
            staff_id: Some(ObjectId::new().to_hex()),
            service_id: Some(ObjectId::new().to_hex()),
            customer_name: Some("Ada".into()),
            appointment_date: Some("2026-03-14".into()),
            appointment_time: Some("09:30".into()),
            ..AppointmentRequest::default()
        }
    }

    #[test]
    fn reports_first_missing_field() {
        let request = AppointmentRequest {
            customer_name: None,
            appointment_time: None,
            ..booking()
        };
        let err = request.into_appointment().unwrap_err();
        assert_eq!(err.to_string(), "customer_name is required");
    }

    #[test]
    fn blank_field_counts_as_missing() {
        let request = AppointmentRequest {
            salon_id: Some("   ".into()),
            ..booking()
        };
        let err = request.into_appointment().unwrap_err();
        assert_eq!(err.to_string(), "salon_id is required");
    }

    #[test]
    fn defaults_status_amount_and_read_flag() {
        let appointment = booking().into_appointment().unwrap();
        assert_eq!(appointment.status, AppointmentStatus::Pending);
        assert_eq!(appointment.amount, 0.0);
        assert!(!appointment.is_read);
    }

    #[test]
    fn rejects_malformed_date_and_time() {
        let bad_date = AppointmentRequest {
            appointment_date: Some("14/03/2026".into()),
            ..booking()
        };
        assert!(bad_date.into_appointment().is_err());

        let bad_time = AppointmentRequest {
            appointment_time: Some("half past nine".into()),
            ..booking()
        };
        assert!(bad_time.into_appointment().is_err());
        assert!(validate_time("09:30:00").is_ok());
    }

    #[test]
    fn only_completed_appointments_earn() {
        let mut appointment = AppointmentRequest {
            amount: Some(40.0),
            ..booking()
        }
        .into_appointment()
        .unwrap();
        assert_eq!(appointment.earned(), 0.0);
        appointment.status = AppointmentStatus::Completed;
        assert_eq!(appointment.earned(), 40.0);
    }

    #[test]
    fn public_booking_ignores_requested_status() {
        let appointment = AppointmentRequest {
            status: Some(AppointmentStatus::Completed),
            amount: Some(500.0),
            ..booking()
        }
        .public()
        .into_appointment()
        .unwrap();
        assert_eq!(appointment.status, AppointmentStatus::Pending);
        assert_eq!(appointment.earned(), 0.0);
    }

    #[test]
    fn revenue_follows_completion() {
        let pending = AppointmentRequest {
            amount: Some(40.0),
            ..booking()
        }
        .into_appointment()
        .unwrap();
        let completed = Appointment {
            status: AppointmentStatus::Completed,
            ..pending.clone()
        };
        let repriced = Appointment {
            amount: 55.0,
            ..completed.clone()
        };
        let cancelled = Appointment {
            status: AppointmentStatus::Cancelled,
            ..repriced.clone()
        };

        assert_eq!(Appointment::revenue_delta(&pending, &completed), 40.0);
        assert_eq!(Appointment::revenue_delta(&completed, &repriced), 15.0);
        assert_eq!(Appointment::revenue_delta(&repriced, &cancelled), -55.0);
        assert_eq!(Appointment::revenue_delta(&pending, &pending), 0.0);
    }

    #[test]
    fn completed_at_creation_then_cancelled_nets_to_zero() {
        let created = AppointmentRequest {
            status: Some(AppointmentStatus::Completed),
            amount: Some(30.0),
            ..booking()
        }
        .into_appointment()
        .unwrap();
        let cancelled = Appointment {
            status: AppointmentStatus::Cancelled,
            ..created.clone()
        };
        let added_on_create = created.earned();
        assert_eq!(added_on_create + Appointment::revenue_delta(&created, &cancelled), 0.0);
    }

    #[test]
    fn references_must_belong_to_the_salon() {
        let salon = ObjectId::new();
        let other = ObjectId::new();

        let service = Service::new(salon, "Cut", 20.0, 30, None);
        assert!(bookable_service(salon, Some(service.clone())).is_ok());
        let err = bookable_service(other, Some(service.clone())).unwrap_err();
        assert_eq!(err.to_string(), "service_id does not belong to this salon");
        let inactive = Service {
            is_active: false,
            ..service
        };
        assert!(bookable_service(salon, Some(inactive)).is_err());
        assert!(bookable_service(salon, None).is_err());

        let staff = User::new("s@x.io", String::new(), crate::models::user::Role::Staff, Some(salon));
        assert!(check_staff_member(salon, Some(&staff)).is_ok());
        let err = check_staff_member(other, Some(&staff)).unwrap_err();
        assert_eq!(err.to_string(), "staff_id does not belong to this salon");
        assert!(check_staff_member(salon, None).is_err());
    }

    #[test]
    fn patch_validates_ids() {
        let patch = AppointmentPatch {
            staff_id: Some("nope".into()),
            ..AppointmentPatch::default()
        };
        assert!(AppointmentChanges::try_from(patch).is_err());

        let patch = AppointmentPatch {
            status: Some(AppointmentStatus::Confirmed),
            ..AppointmentPatch::default()
        };
        let doc = bson::to_document(&AppointmentChanges::try_from(patch).unwrap()).unwrap();
        assert_eq!(doc.get_str("status").unwrap(), "Confirmed");
    }

    #[test]
    fn status_accepts_lowercase_alias() {
        let status: AppointmentStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(status, AppointmentStatus::Cancelled);
    }
}
