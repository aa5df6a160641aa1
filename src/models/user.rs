use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Owner,
    Staff,
    SuperAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Staff => "staff",
            Role::SuperAdmin => "super_admin",
        }
    }
}

/// Every account: salon owners, staff members and super admins share the
/// `users` collection and are told apart by `role`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub email: String, // always lowercase
    pub password_hash: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salon_id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default)]
    pub is_super_admin: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: &str, password_hash: String, role: Role, salon_id: Option<ObjectId>) -> Self {
        let now = Utc::now();
        User {
            id: ObjectId::new(),
            email: normalize_email(email),
            password_hash,
            role,
            salon_id,
            full_name: None,
            is_super_admin: role == Role::SuperAdmin,
            phone: None,
            specialty: None,
            avatar_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_full_name(mut self, full_name: Option<String>) -> Self {
        self.full_name = full_name;
        self
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// What `/api/auth` hands back about the signed-in account.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub salon_id: Option<String>,
    pub is_super_admin: bool,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salon_slug: Option<String>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        UserProfile {
            id: user.id.to_hex(),
            email: user.email.clone(),
            role: user.role,
            salon_id: user.salon_id.map(|id| id.to_hex()),
            is_super_admin: user.is_super_admin,
            full_name: user.full_name.clone().unwrap_or_default(),
            salon_slug: None,
        }
    }
}

/// Full staff record as seen by the salon's own members. Never includes the
/// password hash.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct StaffView {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub salon_id: Option<String>,
    pub full_name: String,
    pub phone: Option<String>,
    pub specialty: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for StaffView {
    fn from(user: &User) -> Self {
        StaffView {
            id: user.id.to_hex(),
            email: user.email.clone(),
            role: user.role,
            salon_id: user.salon_id.map(|id| id.to_hex()),
            full_name: user.full_name.clone().unwrap_or_default(),
            phone: user.phone.clone(),
            specialty: user.specialty.clone(),
            avatar_url: user.avatar_url.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Staff card shown on the public booking page.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PublicStaff {
    pub id: String,
    pub full_name: String,
    pub specialty: String,
    pub avatar_url: String,
}

impl From<&User> for PublicStaff {
    fn from(user: &User) -> Self {
        PublicStaff {
            id: user.id.to_hex(),
            full_name: user.full_name.clone().unwrap_or_default(),
            specialty: user.specialty.clone().unwrap_or_default(),
            avatar_url: user.avatar_url.clone().unwrap_or_default(),
        }
    }
}

/// Staff fields embedded into populated appointments.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct StaffSummary {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub specialty: Option<String>,
}

impl From<&User> for StaffSummary {
    fn from(user: &User) -> Self {
        StaffSummary {
            id: user.id.to_hex(),
            full_name: user.full_name.clone().unwrap_or_default(),
            email: user.email.clone(),
            specialty: user.specialty.clone(),
        }
    }
}

/// `$set` payload for staff profile edits; unset fields are left alone.
#[derive(Serialize, Debug, Default)]
pub struct StaffChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}
