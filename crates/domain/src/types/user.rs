//! Cached user record
//!
//! The backend returns the signed-in user alongside login tokens; the SDK
//! keeps a copy in client-local storage so the UI can render without a
//! round trip.

use serde::{Deserialize, Serialize};

use crate::impl_wire_name_conversions;

/// Account role on the marketplace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Client,
    Freelancer,
    Admin,
}

impl_wire_name_conversions!(UserRole {
    Client => "client",
    Freelancer => "freelancer",
    Admin => "admin",
});

/// User profile as cached alongside the session tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub email_verified: bool,
    /// Fields the SDK does not interpret, kept so a round trip is lossless
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UserRecord {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn unknown_fields_survive_a_round_trip() {
        let raw = serde_json::json!({
            "id": "u-1",
            "email": "ada@example.com",
            "role": "freelancer",
            "emailVerified": true,
            "avatarUrl": "https://cdn.example.com/a.png"
        });

        let user: UserRecord = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(user.role, UserRole::Freelancer);
        assert!(user.email_verified);
        assert_eq!(user.extra["avatarUrl"], "https://cdn.example.com/a.png");

        assert_eq!(serde_json::to_value(&user).unwrap(), raw);
    }

    #[test]
    fn role_defaults_to_client() {
        let user: UserRecord =
            serde_json::from_str(r#"{ "id": "u-2", "email": "b@example.com" }"#).unwrap();

        assert_eq!(user.role, UserRole::Client);
        assert!(!user.is_admin());
    }

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!(UserRole::from_str("ADMIN").unwrap(), UserRole::Admin);
        assert_eq!(UserRole::Freelancer.to_string(), "freelancer");
    }
}
