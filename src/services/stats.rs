use serde::{Deserialize, Serialize};

use crate::models::appointment::{Appointment, AppointmentStatus};

/// Dashboard numbers for one staff member.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct StaffStats {
    pub today_appointments: u32,
    pub today_earnings: f64,
    pub completed_appointments: u32,
    pub total_earnings: f64,
}

/// `today` is a `YYYY-MM-DD` date compared verbatim with
/// `appointment_date`. Cancelled bookings never count for today; earnings
/// for today include anything not cancelled, totals only completed work.
pub fn staff_stats(appointments: &[Appointment], today: &str) -> StaffStats {
    appointments
        .iter()
        .fold(StaffStats::default(), |mut stats, appointment| {
            let cancelled = appointment.status == AppointmentStatus::Cancelled;
            if appointment.appointment_date == today && !cancelled {
                stats.today_appointments += 1;
                stats.today_earnings += appointment.amount;
            }
            if appointment.status == AppointmentStatus::Completed {
                stats.completed_appointments += 1;
                stats.total_earnings += appointment.amount;
            }
            stats
        })
}

/// Platform-wide numbers for the super admin overview.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStats {
    pub total_salons: u64,
    pub active_salons: u64,
    pub total_revenue: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::appointment::AppointmentRequest;
    use mongodb::bson::oid::ObjectId;

    fn appointment(date: &str, status: AppointmentStatus, amount: f64) -> Appointment {
        AppointmentRequest {
            salon_id: Some(ObjectId::new().to_hex()),
            staff_id: Some(ObjectId::new().to_hex()),
            service_id: Some(ObjectId::new().to_hex()),
            customer_name: Some("Grace".into()),
            appointment_date: Some(date.into()),
            appointment_time: Some("10:00".into()),
            status: Some(status),
            amount: Some(amount),
            ..AppointmentRequest::default()
        }
        .into_appointment()
        .unwrap()
    }

    #[test]
    fn splits_today_from_completed_totals() {
        let today = "2026-10-16";
        let appointments = vec![
            appointment(today, AppointmentStatus::Pending, 20.0),
            appointment(today, AppointmentStatus::Completed, 30.0),
            appointment(today, AppointmentStatus::Cancelled, 50.0),
            appointment("2026-10-01", AppointmentStatus::Completed, 45.0),
            appointment("2026-10-01", AppointmentStatus::Confirmed, 99.0),
        ];

        let stats = staff_stats(&appointments, today);
        assert_eq!(
            stats,
            StaffStats {
                today_appointments: 2,
                today_earnings: 50.0,
                completed_appointments: 2,
                total_earnings: 75.0,
            }
        );
    }

    #[test]
    fn empty_history_is_all_zero() {
        assert_eq!(staff_stats(&[], "2026-10-16"), StaffStats::default());
    }

    #[test]
    fn platform_stats_use_camel_case() {
        let json = serde_json::to_value(PlatformStats {
            total_salons: 3,
            active_salons: 2,
            total_revenue: 120.5,
        })
        .unwrap();
        assert_eq!(json["totalSalons"], 3);
        assert_eq!(json["activeSalons"], 2);
    }
}
