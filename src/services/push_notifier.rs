//! Web Push alerts for new bookings. Payloads are encrypted with
//! `aes128gcm` (RFC 8291) and every request carries a VAPID token
//! (RFC 8292) signed with the server's P-256 key.

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use p256::pkcs8::{EncodePrivateKey, LineEnding};
use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::PushConfig;
use crate::db::Repositories;
use crate::models::appointment::Appointment;
use crate::models::push_subscription::PushSubscription;

const TTL_SECONDS: &str = "86400";

#[derive(Error, Debug)]
pub enum PushError {
    #[error("invalid VAPID key: {0}")]
    Key(String),
    #[error("invalid subscription: {0}")]
    Subscription(String),
    #[error("payload encryption failed: {0}")]
    Encryption(String),
    #[error("VAPID token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("payload: {0}")]
    Payload(#[from] serde_json::Error),
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    pub url: String,
    pub appointment_id: String,
    pub customer_name: String,
    pub service_name: String,
    pub salon_id: String,
}

/// JSON shown by the dashboard's service worker.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub tag: String,
    pub data: NotificationData,
}

impl NotificationPayload {
    pub fn new_booking(appointment: &Appointment, service_name: &str) -> Self {
        NotificationPayload {
            title: "New Appointment".to_string(),
            body: format!(
                "{} booked {} at {} {}",
                appointment.customer_name,
                service_name,
                appointment.appointment_date,
                appointment.appointment_time
            ),
            icon: "/icon-192.png".to_string(),
            badge: "/icon-72.png".to_string(),
            tag: format!("appointment-{}", appointment.id.to_hex()),
            data: NotificationData {
                url: "/dashboard".to_string(),
                appointment_id: appointment.id.to_hex(),
                customer_name: appointment.customer_name.clone(),
                service_name: service_name.to_string(),
                salon_id: appointment.salon_id.to_hex(),
            },
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// The push service no longer knows the endpoint.
    Gone,
    Rejected(StatusCode),
    Unreachable(String),
}

impl Delivery {
    pub fn from_status(status: StatusCode) -> Self {
        if status.is_success() {
            Delivery::Sent
        } else if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            Delivery::Gone
        } else {
            Delivery::Rejected(status)
        }
    }
}

#[derive(Serialize)]
struct VapidClaims {
    aud: String,
    exp: i64,
    sub: String,
}

struct Vapid {
    public_key: String,
    signing_key: EncodingKey,
    subject: String,
}

impl Vapid {
    /// `None` when either key is missing.
    fn from_config(config: &PushConfig) -> Result<Option<Self>, PushError> {
        let (Some(public_key), Some(private_key)) = (
            config.vapid_public_key.as_deref(),
            config.vapid_private_key.as_deref(),
        ) else {
            return Ok(None);
        };

        let raw = decode_key(private_key).map_err(PushError::Key)?;
        let secret = p256::SecretKey::from_slice(&raw).map_err(|e| PushError::Key(e.to_string()))?;
        let pem = secret
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| PushError::Key(e.to_string()))?;
        Ok(Some(Vapid {
            public_key: public_key.trim().to_string(),
            signing_key: EncodingKey::from_ec_pem(pem.as_bytes())?,
            subject: config.vapid_subject.clone(),
        }))
    }

    /// `Authorization` header value for a push to `endpoint`.
    fn authorization(&self, endpoint: &str) -> Result<String, PushError> {
        let url = url::Url::parse(endpoint).map_err(|e| PushError::Subscription(e.to_string()))?;
        let claims = VapidClaims {
            aud: url.origin().ascii_serialization(),
            exp: (Utc::now() + Duration::hours(12)).timestamp(),
            sub: self.subject.clone(),
        };
        let token = jsonwebtoken::encode(&Header::new(Algorithm::ES256), &claims, &self.signing_key)?;
        Ok(format!("vapid t={token},k={}", self.public_key))
    }
}

fn decode_key(raw: &str) -> Result<Vec<u8>, String> {
    URL_SAFE_NO_PAD
        .decode(raw.trim().trim_end_matches('='))
        .map_err(|e| e.to_string())
}

/// Encrypts `payload` for the browser holding `subscription`.
pub fn encrypt(payload: &[u8], subscription: &PushSubscription) -> Result<Vec<u8>, PushError> {
    let p256dh = decode_key(&subscription.p256dh).map_err(PushError::Subscription)?;
    let auth = decode_key(&subscription.auth).map_err(PushError::Subscription)?;
    ece::encrypt(&p256dh, &auth, payload).map_err(|e| PushError::Encryption(e.to_string()))
}

#[derive(Clone)]
pub struct PushNotifier {
    vapid: Option<Arc<Vapid>>,
    http: reqwest::Client,
}

impl PushNotifier {
    /// A bad key disables delivery instead of failing startup.
    pub fn from_config(config: &PushConfig) -> Self {
        let vapid = match Vapid::from_config(config) {
            Ok(Some(vapid)) => {
                info!("web push enabled");
                Some(Arc::new(vapid))
            }
            Ok(None) => {
                info!("web push disabled, no VAPID keys configured");
                None
            }
            Err(e) => {
                warn!(error = %e, "web push disabled");
                None
            }
        };
        PushNotifier {
            vapid,
            http: reqwest::Client::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.vapid.is_some()
    }

    pub async fn send(
        &self,
        subscription: &PushSubscription,
        payload: &NotificationPayload,
    ) -> Result<Delivery, PushError> {
        let Some(vapid) = &self.vapid else {
            return Ok(Delivery::Unreachable("web push disabled".to_string()));
        };
        let body = encrypt(&serde_json::to_vec(payload)?, subscription)?;
        let authorization = vapid.authorization(&subscription.endpoint)?;

        let response = self
            .http
            .post(&subscription.endpoint)
            .header("Content-Type", "application/octet-stream")
            .header("Content-Encoding", "aes128gcm")
            .header("TTL", TTL_SECONDS)
            .header("Authorization", authorization)
            .body(body)
            .send()
            .await;
        Ok(match response {
            Ok(response) => Delivery::from_status(response.status()),
            Err(e) => Delivery::Unreachable(e.to_string()),
        })
    }

    /// Alerts the salon owner and the booked staff member. Failures are
    /// logged; endpoints the push service reports gone are deleted.
    /// Returns how many pushes were accepted.
    pub async fn notify_booking(
        &self,
        repos: &Repositories,
        appointment: &Appointment,
        service_name: &str,
    ) -> usize {
        if !self.is_enabled() {
            return 0;
        }

        let mut recipients = vec![appointment.staff_id];
        match repos.users.find_owner(appointment.salon_id).await {
            Ok(Some(owner)) if owner.id != appointment.staff_id => recipients.push(owner.id),
            Ok(_) => {}
            Err(e) => warn!(error = %e, salon_id = %appointment.salon_id, "failed to load salon owner"),
        }
        let subscriptions = match repos.push_subscriptions.list_for_users(recipients).await {
            Ok(subscriptions) => subscriptions,
            Err(e) => {
                warn!(error = %e, "failed to load push subscriptions");
                return 0;
            }
        };

        let payload = NotificationPayload::new_booking(appointment, service_name);
        let mut sent = 0;
        for subscription in &subscriptions {
            match self.send(subscription, &payload).await {
                Ok(Delivery::Sent) => {
                    sent += 1;
                    if let Err(e) = repos.push_subscriptions.touch(subscription.id).await {
                        debug!(error = %e, subscription_id = %subscription.id, "failed to stamp subscription");
                    }
                }
                Ok(Delivery::Gone) => {
                    info!(subscription_id = %subscription.id, "removing expired push subscription");
                    if let Err(e) = repos.push_subscriptions.delete_by_id(subscription.id).await {
                        warn!(error = %e, subscription_id = %subscription.id, "failed to remove push subscription");
                    }
                }
                Ok(Delivery::Rejected(status)) => {
                    warn!(subscription_id = %subscription.id, %status, "push rejected");
                }
                Ok(Delivery::Unreachable(e)) => {
                    warn!(subscription_id = %subscription.id, error = %e, "push service unreachable");
                }
                Err(e) => {
                    warn!(subscription_id = %subscription.id, error = %e, "push not sent");
                }
            }
        }
        debug!(
            appointment_id = %appointment.id,
            sent,
            total = subscriptions.len(),
            "booking push finished"
        );
        sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::appointment::AppointmentRequest;
    use mongodb::bson::oid::ObjectId;
    use p256::elliptic_curve::sec1::ToEncodedPoint;

    const SCALAR: [u8; 32] = [7; 32];

    fn keys() -> PushConfig {
        let secret = p256::SecretKey::from_slice(&SCALAR).unwrap();
        let public = secret.public_key().to_encoded_point(false);
        PushConfig {
            vapid_public_key: Some(URL_SAFE_NO_PAD.encode(public.as_bytes())),
            vapid_private_key: Some(URL_SAFE_NO_PAD.encode(SCALAR)),
            vapid_subject: "mailto:ops@salon.example".to_string(),
        }
    }

    fn booked() -> Appointment {
        AppointmentRequest {
            salon_id: Some(ObjectId::new().to_hex()),
            staff_id: Some(ObjectId::new().to_hex()),
            service_id: Some(ObjectId::new().to_hex()),
            customer_name: Some("Ada".into()),
            appointment_date: Some("2026-03-14".into()),
            appointment_time: Some("09:30".into()),
            ..AppointmentRequest::default()
        }
        .into_appointment()
        .unwrap()
    }

    fn subscription_for(secret: &p256::SecretKey) -> PushSubscription {
        let public = secret.public_key().to_encoded_point(false);
        PushSubscription {
            id: ObjectId::new(),
            user_id: Some(ObjectId::new()),
            endpoint: "https://push.example/send/abc".to_string(),
            p256dh: URL_SAFE_NO_PAD.encode(public.as_bytes()),
            auth: URL_SAFE_NO_PAD.encode([3u8; 16]),
            user_agent: None,
            last_used_at: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn booking_payload_names_customer_and_service() {
        let appointment = booked();
        let payload = NotificationPayload::new_booking(&appointment, "Beard trim");
        assert_eq!(payload.body, "Ada booked Beard trim at 2026-03-14 09:30");
        assert_eq!(payload.tag, format!("appointment-{}", appointment.id.to_hex()));

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["data"]["serviceName"], "Beard trim");
        assert_eq!(json["data"]["salonId"], appointment.salon_id.to_hex());
    }

    #[test]
    fn gone_endpoints_are_told_apart() {
        assert_eq!(Delivery::from_status(StatusCode::CREATED), Delivery::Sent);
        assert_eq!(Delivery::from_status(StatusCode::GONE), Delivery::Gone);
        assert_eq!(Delivery::from_status(StatusCode::NOT_FOUND), Delivery::Gone);
        assert_eq!(
            Delivery::from_status(StatusCode::TOO_MANY_REQUESTS),
            Delivery::Rejected(StatusCode::TOO_MANY_REQUESTS)
        );
    }

    #[test]
    fn missing_or_broken_keys_disable_delivery() {
        assert!(!PushNotifier::from_config(&PushConfig::default()).is_enabled());

        let broken = PushConfig {
            vapid_private_key: Some("not base64 at all!".to_string()),
            ..keys()
        };
        assert!(Vapid::from_config(&broken).is_err());
        assert!(!PushNotifier::from_config(&broken).is_enabled());
        assert!(PushNotifier::from_config(&keys()).is_enabled());
    }

    #[test]
    fn vapid_header_carries_es256_token_and_public_key() {
        let config = keys();
        let vapid = Vapid::from_config(&config).unwrap().unwrap();
        let header = vapid.authorization("https://push.example:8443/send/abc").unwrap();

        let public_key = config.vapid_public_key.unwrap();
        assert!(header.starts_with("vapid t="));
        assert!(header.ends_with(&format!(",k={public_key}")));

        let token = header
            .trim_start_matches("vapid t=")
            .split(',')
            .next()
            .unwrap();
        assert_eq!(jsonwebtoken::decode_header(token).unwrap().alg, Algorithm::ES256);
        assert!(vapid.authorization("not a url").is_err());
    }

    #[test]
    fn encrypted_body_has_aes128gcm_header() {
        let browser = p256::SecretKey::from_slice(&[9; 32]).unwrap();
        let body = encrypt(b"{\"title\":\"hi\"}", &subscription_for(&browser)).unwrap();
        // salt(16) | record size(4) | key id length(1) | sender key(65) | ciphertext
        assert_eq!(body[20], 65);
        assert!(body.len() > 16 + 4 + 1 + 65);
    }

    #[test]
    fn malformed_subscription_keys_are_rejected() {
        let browser = p256::SecretKey::from_slice(&[9; 32]).unwrap();
        let subscription = PushSubscription {
            p256dh: "@@@".to_string(),
            ..subscription_for(&browser)
        };
        assert!(matches!(
            encrypt(b"{}", &subscription),
            Err(PushError::Subscription(_))
        ));
    }
}
