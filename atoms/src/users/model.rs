use serde::{Deserialize, Serialize};

/// User profile row. Credentials live in the external auth service and are
/// never stored or returned here.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub profile_picture: String,
    #[serde(default)]
    pub notification_settings: NotificationSettings,
    #[serde(default)]
    pub theme: Theme,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    pub enabled: bool,
    pub task_reminders: bool,
    pub social_interactions: bool,
    pub ringtone: String,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            task_reminders: true,
            social_interactions: true,
            ringtone: "default".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            "system" => Some(Self::System),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    pub profile_picture: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserPayload {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_picture: Option<String>,
    pub notification_settings: Option<NotificationSettings>,
    pub theme: Option<Theme>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_defaults_to_system() {
        assert_eq!(Theme::default(), Theme::System);
        assert_eq!(Theme::parse("dark"), Some(Theme::Dark));
        assert_eq!(Theme::parse("midnight"), None);
    }

    #[test]
    fn unknown_theme_rejected_on_decode() {
        let result: Result<Theme, _> = serde_json::from_str("\"midnight\"");
        assert!(result.is_err());
    }

    #[test]
    fn notification_settings_default_on() {
        let s = NotificationSettings::default();
        assert!(s.enabled && s.task_reminders && s.social_interactions);
        assert_eq!(s.ringtone, "default");
    }

    #[test]
    fn create_payload_uses_camel_case() {
        let payload: CreateUserPayload = serde_json::from_str(
            r#"{"firstName":"Ada","lastName":"Lovelace","email":"ada@example.com","username":"ada"}"#,
        )
        .unwrap();
        assert_eq!(payload.username, "ada");
        assert!(payload.profile_picture.is_none());
    }
}
