use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Web Push endpoint registered by a signed-in browser. `endpoint` is
/// unique: re-subscribing the same browser rebinds the existing record.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PushSubscription {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<ObjectId>,
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<bson::DateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<bson::DateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<bson::DateTime>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PushSubscriptionView {
    pub id: String,
    pub user_id: Option<String>,
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
    pub user_agent: Option<String>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<&PushSubscription> for PushSubscriptionView {
    fn from(subscription: &PushSubscription) -> Self {
        PushSubscriptionView {
            id: subscription.id.to_hex(),
            user_id: subscription.user_id.map(|id| id.to_hex()),
            endpoint: subscription.endpoint.clone(),
            p256dh: subscription.p256dh.clone(),
            auth: subscription.auth.clone(),
            user_agent: subscription.user_agent.clone(),
            last_used_at: subscription.last_used_at.map(|at| at.to_chrono()),
            created_at: subscription.created_at.map(|at| at.to_chrono()),
        }
    }
}
