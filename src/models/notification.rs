use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A server-issued notification shown on the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub archived: bool,
}

impl Notification {
    /// One-line summary for list rows.
    pub fn summary(&self) -> &str {
        &self.title
    }

    pub fn created_display(&self) -> String {
        match self.created_at {
            Some(dt) => dt.format("%b %d, %Y %H:%M").to_string(),
            None => "-".to_string(),
        }
    }
}

/// Some deployments wrap the notification list, others return a bare
/// array. The client accepts both.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct NotificationsWrapper {
    #[serde(default, alias = "data", alias = "items")]
    pub notifications: Vec<Notification>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_notification_array() {
        let json = r#"[
            {"id": 1, "title": "Menu updated", "message": "The March menu was published.", "createdAt": "2026-03-01T07:30:00Z"},
            {"id": 2, "title": "Report due", "archived": true}
        ]"#;

        let list: Vec<Notification> =
            serde_json::from_str(json).expect("Failed to parse notification array");
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].summary(), "Menu updated");
        assert!(!list[0].archived);
        assert!(list[1].archived);
        assert_eq!(list[1].created_display(), "-");
    }

    #[test]
    fn test_parse_notification_wrapper() {
        let json = r#"{"data": [{"id": 5, "title": "Holiday closure"}]}"#;
        let wrapper: NotificationsWrapper =
            serde_json::from_str(json).expect("Failed to parse notification wrapper");
        assert_eq!(wrapper.notifications.len(), 1);
        assert_eq!(wrapper.notifications[0].id, 5);
    }
}
