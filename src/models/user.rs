use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Profile of the currently signed-in user, as returned by `/users/me`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    #[serde(rename = "firstName")]
    pub first_name: Option<String>,
    #[serde(rename = "lastName")]
    pub last_name: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "roleId")]
    pub role_id: Option<i64>,
    #[serde(rename = "schoolId")]
    pub school_id: Option<i64>,
    #[serde(rename = "schoolName")]
    pub school_name: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    pub fn full_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(first), None) => first.to_string(),
            (None, Some(last)) => last.to_string(),
            (None, None) => self.username.clone(),
        }
    }

    /// Display name for the role id. Role ids come from the Central
    /// Server role table; unknown ids are shown numerically.
    pub fn role_display(&self) -> String {
        match self.role_id {
            Some(1) => "Administrator".to_string(),
            Some(2) => "School Manager".to_string(),
            Some(3) => "Canteen Staff".to_string(),
            Some(other) => format!("Role {}", other),
            None => "Unknown".to_string(),
        }
    }
}

/// Permission strings attached to the current user.
/// The server returns these alongside the profile in some deployments
/// and as a separate list in others, so both shapes parse.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CurrentUserResponse {
    #[serde(flatten)]
    pub profile: UserProfile,
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_current_user() {
        let json = r#"{
            "id": 42,
            "username": "mrossi",
            "firstName": "Maria",
            "lastName": "Rossi",
            "email": "maria.rossi@example.org",
            "roleId": 2,
            "schoolId": 7,
            "schoolName": "Scuola Primaria Nord",
            "createdAt": "2024-09-01T08:00:00Z",
            "permissions": ["reports:read", "notifications:archive"]
        }"#;

        let resp: CurrentUserResponse =
            serde_json::from_str(json).expect("Failed to parse current user JSON");
        assert_eq!(resp.profile.id, 42);
        assert_eq!(resp.profile.full_name(), "Maria Rossi");
        assert_eq!(resp.profile.role_display(), "School Manager");
        assert_eq!(resp.permissions.len(), 2);
    }

    #[test]
    fn test_full_name_falls_back_to_username() {
        let profile = UserProfile {
            username: "jdoe".to_string(),
            ..Default::default()
        };
        assert_eq!(profile.full_name(), "jdoe");
    }
}
