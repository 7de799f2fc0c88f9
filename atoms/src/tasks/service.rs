use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use clockin_shared::ApiError;

use super::model::{Alarm, Category, CreateTaskPayload, Task, TaskStatus, UpdateTaskPayload};

const TASK_PARTITION: &str = "TASK";

fn task_sk(task_id: &str) -> String {
    format!("TASK#{}", task_id)
}

fn alarm_to_item(alarm: &Alarm) -> AttributeValue {
    let mut map = HashMap::new();
    map.insert("enabled".to_string(), AttributeValue::Bool(alarm.enabled));
    map.insert(
        "minutes_before".to_string(),
        AttributeValue::N(alarm.minutes_before.to_string()),
    );
    AttributeValue::M(map)
}

fn alarm_from_item(value: Option<&AttributeValue>) -> Alarm {
    let defaults = Alarm::default();
    let Some(map) = value.and_then(|v| v.as_m().ok()) else {
        return defaults;
    };
    Alarm {
        enabled: map
            .get("enabled")
            .and_then(|v| v.as_bool().ok())
            .copied()
            .unwrap_or(defaults.enabled),
        minutes_before: map
            .get("minutes_before")
            .and_then(|v| v.as_n().ok())
            .and_then(|n| n.parse().ok())
            .unwrap_or(defaults.minutes_before),
    }
}

fn images_to_item(images: &[String]) -> AttributeValue {
    AttributeValue::L(
        images
            .iter()
            .map(|url| AttributeValue::S(url.clone()))
            .collect(),
    )
}

fn images_from_item(value: Option<&AttributeValue>) -> Vec<String> {
    value
        .and_then(|v| v.as_l().ok())
        .map(|list| {
            list.iter()
                .filter_map(|v| v.as_s().ok())
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default()
}

/// Marshal a task out of a DynamoDB item. The task id comes from the SK.
pub(crate) fn task_from_item(item: &HashMap<String, AttributeValue>) -> Option<Task> {
    let sk = item.get("SK").and_then(|v| v.as_s().ok())?;
    let task_id = sk.strip_prefix("TASK#")?;
    Some(Task {
        task_id: task_id.to_string(),
        user_id: item
            .get("user_id")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        task_title: item
            .get("task_title")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        category: item
            .get("category")
            .and_then(|v| v.as_s().ok())
            .and_then(|s| Category::parse(s))
            .unwrap_or_default(),
        time_range: item
            .get("time_range")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        description: item
            .get("description")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        status: item
            .get("status")
            .and_then(|v| v.as_s().ok())
            .and_then(|s| TaskStatus::parse(s))
            .unwrap_or_default(),
        images: images_from_item(item.get("images")),
        set_public: item
            .get("set_public")
            .and_then(|v| v.as_bool().ok())
            .copied()
            .unwrap_or(false),
        completed_at: item
            .get("completed_at")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
        alarm: alarm_from_item(item.get("alarm")),
        created_at: item
            .get("created_at")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        updated_at: item
            .get("updated_at")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
    })
}

/// Value to write for `completed_at` on this update, if any.
///
/// Stamped with the update's own timestamp when status transitions to
/// completed and the payload carries no explicit stamp; never overwritten once
/// set.
pub(crate) fn completion_stamp(
    current: &Task,
    payload: &UpdateTaskPayload,
    now: &str,
) -> Option<String> {
    if current.completed_at.is_some() {
        return None;
    }
    match payload.status {
        Some(TaskStatus::Completed) if current.status != TaskStatus::Completed => Some(
            payload
                .completed_at
                .clone()
                .unwrap_or_else(|| now.to_string()),
        ),
        _ => payload.completed_at.clone(),
    }
}

/// List all tasks owned by a user, newest first. No pagination.
pub async fn list_tasks_for_user(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
) -> Result<Vec<Task>, ApiError> {
    let result = client
        .query()
        .table_name(table_name)
        .key_condition_expression("PK = :pk")
        .filter_expression("user_id = :uid")
        .expression_attribute_values(":pk", AttributeValue::S(TASK_PARTITION.to_string()))
        .expression_attribute_values(":uid", AttributeValue::S(user_id.to_string()))
        .send()
        .await
        .map_err(|e| ApiError::Upstream(format!("DynamoDB query error: {}", e)))?;

    let mut tasks: Vec<Task> = result.items().iter().filter_map(task_from_item).collect();
    tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(tasks)
}

/// Create a new task for a user.
pub async fn create_task(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    payload: CreateTaskPayload,
) -> Result<Task, ApiError> {
    payload.validate()?;

    let task_id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    let task = Task {
        task_id: task_id.clone(),
        user_id: user_id.to_string(),
        task_title: payload.task_title,
        category: payload.category.unwrap_or_default(),
        time_range: payload.time_range,
        description: payload.description.unwrap_or_default(),
        status: payload.status.unwrap_or_default(),
        images: payload.images.unwrap_or_default(),
        set_public: payload.set_public.unwrap_or(false),
        completed_at: None,
        alarm: payload.alarm.unwrap_or_default(),
        created_at: now.clone(),
        updated_at: now,
    };

    client
        .put_item()
        .table_name(table_name)
        .item("PK", AttributeValue::S(TASK_PARTITION.to_string()))
        .item("SK", AttributeValue::S(task_sk(&task_id)))
        .item("user_id", AttributeValue::S(task.user_id.clone()))
        .item("task_title", AttributeValue::S(task.task_title.clone()))
        .item(
            "category",
            AttributeValue::S(task.category.as_str().to_string()),
        )
        .item("time_range", AttributeValue::S(task.time_range.clone()))
        .item("description", AttributeValue::S(task.description.clone()))
        .item("status", AttributeValue::S(task.status.as_str().to_string()))
        .item("images", images_to_item(&task.images))
        .item("set_public", AttributeValue::Bool(task.set_public))
        .item("alarm", alarm_to_item(&task.alarm))
        .item("created_at", AttributeValue::S(task.created_at.clone()))
        .item("updated_at", AttributeValue::S(task.updated_at.clone()))
        .send()
        .await
        .map_err(|e| ApiError::Upstream(format!("DynamoDB put_item error: {}", e)))?;

    Ok(task)
}

/// Get a specific task.
pub async fn get_task(
    client: &DynamoClient,
    table_name: &str,
    task_id: &str,
) -> Result<Task, ApiError> {
    let result = client
        .get_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(TASK_PARTITION.to_string()))
        .key("SK", AttributeValue::S(task_sk(task_id)))
        .send()
        .await
        .map_err(|e| ApiError::Upstream(format!("DynamoDB get_item error: {}", e)))?;

    result
        .item()
        .and_then(task_from_item)
        .ok_or(ApiError::NotFound("Task"))
}

/// Get a task, rejecting callers other than the owner.
pub async fn get_owned_task(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    task_id: &str,
) -> Result<Task, ApiError> {
    let task = get_task(client, table_name, task_id).await?;
    if task.user_id != user_id {
        return Err(ApiError::Forbidden);
    }
    Ok(task)
}

/// Partial task update. Only the owner may update.
pub async fn update_task(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    task_id: &str,
    payload: UpdateTaskPayload,
) -> Result<Task, ApiError> {
    payload.validate()?;
    let current = get_owned_task(client, table_name, user_id, task_id).await?;

    let now = chrono::Utc::now().to_rfc3339();
    let completed_at = completion_stamp(&current, &payload, &now);

    let mut update_expr = vec![];
    let mut expr_names = HashMap::new();
    let mut expr_values = HashMap::new();

    if let Some(title) = payload.task_title {
        update_expr.push("#task_title = :task_title");
        expr_names.insert("#task_title".to_string(), "task_title".to_string());
        expr_values.insert(":task_title".to_string(), AttributeValue::S(title));
    }

    if let Some(category) = payload.category {
        update_expr.push("#category = :category");
        expr_names.insert("#category".to_string(), "category".to_string());
        expr_values.insert(
            ":category".to_string(),
            AttributeValue::S(category.as_str().to_string()),
        );
    }

    if let Some(range) = payload.time_range {
        update_expr.push("#time_range = :time_range");
        expr_names.insert("#time_range".to_string(), "time_range".to_string());
        expr_values.insert(":time_range".to_string(), AttributeValue::S(range));
    }

    if let Some(description) = payload.description {
        update_expr.push("#description = :description");
        expr_names.insert("#description".to_string(), "description".to_string());
        expr_values.insert(":description".to_string(), AttributeValue::S(description));
    }

    if let Some(status) = payload.status {
        update_expr.push("#status = :status");
        expr_names.insert("#status".to_string(), "status".to_string());
        expr_values.insert(
            ":status".to_string(),
            AttributeValue::S(status.as_str().to_string()),
        );
    }

    if let Some(images) = payload.images {
        update_expr.push("#images = :images");
        expr_names.insert("#images".to_string(), "images".to_string());
        expr_values.insert(":images".to_string(), images_to_item(&images));
    }

    if let Some(set_public) = payload.set_public {
        update_expr.push("#set_public = :set_public");
        expr_names.insert("#set_public".to_string(), "set_public".to_string());
        expr_values.insert(":set_public".to_string(), AttributeValue::Bool(set_public));
    }

    if let Some(stamp) = completed_at {
        update_expr.push("#completed_at = :completed_at");
        expr_names.insert("#completed_at".to_string(), "completed_at".to_string());
        expr_values.insert(":completed_at".to_string(), AttributeValue::S(stamp));
    }

    if let Some(alarm) = payload.alarm {
        update_expr.push("#alarm = :alarm");
        expr_names.insert("#alarm".to_string(), "alarm".to_string());
        expr_values.insert(":alarm".to_string(), alarm_to_item(&alarm));
    }

    if !update_expr.is_empty() {
        update_expr.push("#updated_at = :updated_at");
        expr_names.insert("#updated_at".to_string(), "updated_at".to_string());
        expr_values.insert(":updated_at".to_string(), AttributeValue::S(now));

        let mut builder = client
            .update_item()
            .table_name(table_name)
            .key("PK", AttributeValue::S(TASK_PARTITION.to_string()))
            .key("SK", AttributeValue::S(task_sk(task_id)))
            .update_expression(format!("SET {}", update_expr.join(", ")));

        for (k, v) in expr_names {
            builder = builder.expression_attribute_names(k, v);
        }

        for (k, v) in expr_values {
            builder = builder.expression_attribute_values(k, v);
        }

        builder
            .send()
            .await
            .map_err(|e| ApiError::Upstream(format!("DynamoDB update_item error: {}", e)))?;
    }

    get_task(client, table_name, task_id).await
}

/// Delete a task. Only the owner may delete.
pub async fn delete_task(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    task_id: &str,
) -> Result<(), ApiError> {
    get_owned_task(client, table_name, user_id, task_id).await?;

    client
        .delete_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(TASK_PARTITION.to_string()))
        .key("SK", AttributeValue::S(task_sk(task_id)))
        .send()
        .await
        .map_err(|e| ApiError::Upstream(format!("DynamoDB delete_item error: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_task() -> Task {
        Task {
            task_id: "t-1".to_string(),
            user_id: "u-1".to_string(),
            task_title: "Write report".to_string(),
            category: Category::Personal,
            time_range: "09:00-10:00".to_string(),
            description: String::new(),
            status: TaskStatus::Pending,
            images: vec![],
            set_public: false,
            completed_at: None,
            alarm: Alarm::default(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    fn task_item(task: &Task) -> HashMap<String, AttributeValue> {
        let mut item = HashMap::new();
        item.insert("PK".to_string(), AttributeValue::S("TASK".into()));
        item.insert("SK".to_string(), AttributeValue::S(task_sk(&task.task_id)));
        item.insert("user_id".to_string(), AttributeValue::S(task.user_id.clone()));
        item.insert(
            "task_title".to_string(),
            AttributeValue::S(task.task_title.clone()),
        );
        item.insert(
            "category".to_string(),
            AttributeValue::S(task.category.as_str().to_string()),
        );
        item.insert(
            "time_range".to_string(),
            AttributeValue::S(task.time_range.clone()),
        );
        item.insert(
            "status".to_string(),
            AttributeValue::S(task.status.as_str().to_string()),
        );
        item.insert("images".to_string(), images_to_item(&task.images));
        item.insert("set_public".to_string(), AttributeValue::Bool(task.set_public));
        item.insert("alarm".to_string(), alarm_to_item(&task.alarm));
        item.insert(
            "created_at".to_string(),
            AttributeValue::S(task.created_at.clone()),
        );
        item.insert(
            "updated_at".to_string(),
            AttributeValue::S(task.updated_at.clone()),
        );
        item
    }

    #[test]
    fn task_round_trips_through_item() {
        let mut task = sample_task();
        task.images = vec!["https://img/1".to_string(), "https://img/2".to_string()];
        task.set_public = true;

        let back = task_from_item(&task_item(&task)).unwrap();
        assert_eq!(back.task_id, "t-1");
        assert_eq!(back.images, task.images);
        assert!(back.set_public);
        assert_eq!(back.category, Category::Personal);
        assert!(back.completed_at.is_none());
    }

    #[test]
    fn item_without_task_sk_is_skipped() {
        let mut item = task_item(&sample_task());
        item.insert("SK".to_string(), AttributeValue::S("POST#p-1".into()));
        assert!(task_from_item(&item).is_none());
    }

    #[test]
    fn completion_stamped_on_transition() {
        let task = sample_task();
        let payload = UpdateTaskPayload {
            status: Some(TaskStatus::Completed),
            ..Default::default()
        };
        let stamp = completion_stamp(&task, &payload, "2026-02-01T12:00:00Z");
        assert_eq!(stamp.as_deref(), Some("2026-02-01T12:00:00Z"));
    }

    #[test]
    fn explicit_completion_stamp_wins() {
        let task = sample_task();
        let payload = UpdateTaskPayload {
            status: Some(TaskStatus::Completed),
            completed_at: Some("2026-01-15T08:00:00Z".to_string()),
            ..Default::default()
        };
        let stamp = completion_stamp(&task, &payload, "2026-02-01T12:00:00Z");
        assert_eq!(stamp.as_deref(), Some("2026-01-15T08:00:00Z"));
    }

    #[test]
    fn completion_stamp_set_only_once() {
        let mut task = sample_task();
        task.status = TaskStatus::Completed;
        task.completed_at = Some("2026-01-10T00:00:00Z".to_string());
        let payload = UpdateTaskPayload {
            status: Some(TaskStatus::Completed),
            ..Default::default()
        };
        assert!(completion_stamp(&task, &payload, "2026-02-01T12:00:00Z").is_none());
    }

    #[test]
    fn no_stamp_without_status_change() {
        let task = sample_task();
        let payload = UpdateTaskPayload {
            task_title: Some("New title".to_string()),
            ..Default::default()
        };
        assert!(completion_stamp(&task, &payload, "2026-02-01T12:00:00Z").is_none());
    }
}
