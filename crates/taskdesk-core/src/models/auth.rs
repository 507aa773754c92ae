use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct SignInRequest {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub login: String,
    pub username: String,
    pub password: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

/// Credential pair as issued by `/auth/signin` and `/auth/refresh`.
///
/// The refresh endpoint may omit `refreshToken` when the authority does not
/// rotate it.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Moderator,
    User,
    #[serde(other)]
    Unknown,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Moderator => "MODERATOR",
            Role::User => "USER",
            Role::Unknown => "UNKNOWN",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "ADMIN" => Some(Role::Admin),
            "MODERATOR" => Some(Role::Moderator),
            "USER" => Some(Role::User),
            _ => None,
        }
    }
}

/// Identity of the signed-in user, fetched once per session establishment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub id: Option<i64>,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub is_blocked: Option<bool>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

impl Profile {
    pub fn is_admin(&self) -> bool {
        self.roles.contains(&Role::Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_profile() {
        let json = r#"{"id": 7, "username": "ada", "email": "ada@example.com", "phoneNumber": "+15551234567", "roles": ["USER", "ADMIN"], "isBlocked": false, "date": "2025-01-12T10:00:00Z"}"#;
        let profile: Profile = serde_json::from_str(json).expect("Failed to parse profile JSON");

        assert_eq!(profile.username, "ada");
        assert_eq!(profile.phone_number.as_deref(), Some("+15551234567"));
        assert!(profile.is_admin());
    }

    #[test]
    fn test_parse_profile_minimal_fields() {
        let json = r#"{"username": "bob", "email": "bob@example.com", "roles": ["SUPERVISOR"]}"#;
        let profile: Profile = serde_json::from_str(json).expect("Failed to parse profile JSON");

        assert_eq!(profile.roles, vec![Role::Unknown]);
        assert!(!profile.is_admin());
        assert!(profile.id.is_none());
    }

    #[test]
    fn test_token_response_without_rotation() {
        let tokens: TokenResponse =
            serde_json::from_str(r#"{"accessToken": "a2"}"#).expect("Failed to parse tokens");
        assert_eq!(tokens.access_token, "a2");
        assert!(tokens.refresh_token.is_none());
        assert!(!format!("{:?}", tokens).contains("a2"));
    }

    #[test]
    fn test_registration_wire_names() {
        let registration = Registration {
            login: "ada".into(),
            username: "Ada".into(),
            password: "secret".into(),
            email: "ada@example.com".into(),
            phone_number: None,
        };
        let value = serde_json::to_value(&registration).unwrap();
        assert_eq!(value["login"], "ada");
        assert!(value.get("phoneNumber").is_none());
    }
}
