use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use clockin_shared::ApiError;

use super::model::{CreateUserPayload, NotificationSettings, Theme, UpdateUserPayload, User};

fn user_pk(user_id: &str) -> String {
    format!("USER#{}", user_id)
}

fn settings_to_item(settings: &NotificationSettings) -> AttributeValue {
    let mut map = HashMap::new();
    map.insert("enabled".to_string(), AttributeValue::Bool(settings.enabled));
    map.insert(
        "task_reminders".to_string(),
        AttributeValue::Bool(settings.task_reminders),
    );
    map.insert(
        "social_interactions".to_string(),
        AttributeValue::Bool(settings.social_interactions),
    );
    map.insert(
        "ringtone".to_string(),
        AttributeValue::S(settings.ringtone.clone()),
    );
    AttributeValue::M(map)
}

fn settings_from_item(value: Option<&AttributeValue>) -> NotificationSettings {
    let defaults = NotificationSettings::default();
    let Some(map) = value.and_then(|v| v.as_m().ok()) else {
        return defaults;
    };
    NotificationSettings {
        enabled: map
            .get("enabled")
            .and_then(|v| v.as_bool().ok())
            .copied()
            .unwrap_or(defaults.enabled),
        task_reminders: map
            .get("task_reminders")
            .and_then(|v| v.as_bool().ok())
            .copied()
            .unwrap_or(defaults.task_reminders),
        social_interactions: map
            .get("social_interactions")
            .and_then(|v| v.as_bool().ok())
            .copied()
            .unwrap_or(defaults.social_interactions),
        ringtone: map
            .get("ringtone")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or(defaults.ringtone),
    }
}

pub(crate) fn user_from_item(user_id: &str, item: &HashMap<String, AttributeValue>) -> User {
    User {
        user_id: user_id.to_string(),
        first_name: item
            .get("first_name")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        last_name: item
            .get("last_name")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        email: item
            .get("email")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        username: item
            .get("username")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        profile_picture: item
            .get("profile_picture")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        notification_settings: settings_from_item(item.get("notification_settings")),
        theme: item
            .get("theme")
            .and_then(|v| v.as_s().ok())
            .and_then(|s| Theme::parse(s))
            .unwrap_or_default(),
        created_at: item
            .get("created_at")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
    }
}

/// Register the profile row after external signup. One row per user id.
pub async fn create_user(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    payload: CreateUserPayload,
) -> Result<User, ApiError> {
    if payload.username.trim().is_empty() {
        return Err(ApiError::validation("Username is required"));
    }

    let now = chrono::Utc::now().to_rfc3339();
    let pk = user_pk(user_id);
    let settings = NotificationSettings::default();

    client
        .put_item()
        .table_name(table_name)
        .item("PK", AttributeValue::S(pk.clone()))
        .item("SK", AttributeValue::S(pk))
        .item("first_name", AttributeValue::S(payload.first_name.clone()))
        .item("last_name", AttributeValue::S(payload.last_name.clone()))
        .item("email", AttributeValue::S(payload.email.clone()))
        .item("username", AttributeValue::S(payload.username.clone()))
        .item(
            "profile_picture",
            AttributeValue::S(payload.profile_picture.clone().unwrap_or_default()),
        )
        .item("notification_settings", settings_to_item(&settings))
        .item("theme", AttributeValue::S(Theme::default().as_str().to_string()))
        .item("created_at", AttributeValue::S(now.clone()))
        .condition_expression("attribute_not_exists(PK)")
        .send()
        .await
        .map_err(|e| {
            let service_err = e.into_service_error();
            if service_err.is_conditional_check_failed_exception() {
                ApiError::validation("User already registered")
            } else {
                ApiError::Upstream(format!("DynamoDB put_item error: {}", service_err))
            }
        })?;

    Ok(User {
        user_id: user_id.to_string(),
        first_name: payload.first_name,
        last_name: payload.last_name,
        email: payload.email,
        username: payload.username,
        profile_picture: payload.profile_picture.unwrap_or_default(),
        notification_settings: settings,
        theme: Theme::default(),
        created_at: now,
    })
}

/// Fetch a user profile by id.
pub async fn get_user(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
) -> Result<User, ApiError> {
    let pk = user_pk(user_id);

    let result = client
        .get_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(pk.clone()))
        .key("SK", AttributeValue::S(pk))
        .send()
        .await
        .map_err(|e| ApiError::Upstream(format!("DynamoDB get_item error: {}", e)))?;

    match result.item() {
        Some(item) => Ok(user_from_item(user_id, item)),
        None => Err(ApiError::NotFound("User")),
    }
}

/// Partial profile update.
pub async fn update_user(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    payload: UpdateUserPayload,
) -> Result<User, ApiError> {
    let pk = user_pk(user_id);

    let mut update_expr = vec![];
    let mut expr_values = HashMap::new();

    if let Some(first_name) = payload.first_name {
        update_expr.push("first_name = :first_name");
        expr_values.insert(":first_name".to_string(), AttributeValue::S(first_name));
    }

    if let Some(last_name) = payload.last_name {
        update_expr.push("last_name = :last_name");
        expr_values.insert(":last_name".to_string(), AttributeValue::S(last_name));
    }

    if let Some(picture) = payload.profile_picture {
        update_expr.push("profile_picture = :profile_picture");
        expr_values.insert(":profile_picture".to_string(), AttributeValue::S(picture));
    }

    if let Some(settings) = payload.notification_settings {
        update_expr.push("notification_settings = :notification_settings");
        expr_values.insert(
            ":notification_settings".to_string(),
            settings_to_item(&settings),
        );
    }

    if let Some(theme) = payload.theme {
        update_expr.push("theme = :theme");
        expr_values.insert(
            ":theme".to_string(),
            AttributeValue::S(theme.as_str().to_string()),
        );
    }

    if !update_expr.is_empty() {
        let mut builder = client
            .update_item()
            .table_name(table_name)
            .key("PK", AttributeValue::S(pk.clone()))
            .key("SK", AttributeValue::S(pk))
            .update_expression(format!("SET {}", update_expr.join(", ")));

        for (k, v) in expr_values {
            builder = builder.expression_attribute_values(k, v);
        }

        builder
            .send()
            .await
            .map_err(|e| ApiError::Upstream(format!("DynamoDB update_item error: {}", e)))?;
    }

    get_user(client, table_name, user_id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_round_trip_through_item() {
        let settings = NotificationSettings {
            enabled: false,
            task_reminders: true,
            social_interactions: false,
            ringtone: "chime".to_string(),
        };
        let back = settings_from_item(Some(&settings_to_item(&settings)));
        assert!(!back.enabled);
        assert!(back.task_reminders);
        assert!(!back.social_interactions);
        assert_eq!(back.ringtone, "chime");
    }

    #[test]
    fn missing_settings_fall_back_to_defaults() {
        let back = settings_from_item(None);
        assert!(back.enabled);
        assert_eq!(back.ringtone, "default");
    }

    #[test]
    fn user_from_item_reads_all_fields() {
        let mut item = HashMap::new();
        item.insert("first_name".to_string(), AttributeValue::S("Ada".into()));
        item.insert("last_name".to_string(), AttributeValue::S("Lovelace".into()));
        item.insert("email".to_string(), AttributeValue::S("ada@example.com".into()));
        item.insert("username".to_string(), AttributeValue::S("ada".into()));
        item.insert("theme".to_string(), AttributeValue::S("dark".into()));
        item.insert("created_at".to_string(), AttributeValue::S("2026-01-01T00:00:00Z".into()));

        let user = user_from_item("u-1", &item);
        assert_eq!(user.user_id, "u-1");
        assert_eq!(user.username, "ada");
        assert_eq!(user.theme, Theme::Dark);
        assert_eq!(user.profile_picture, "");
    }
}
