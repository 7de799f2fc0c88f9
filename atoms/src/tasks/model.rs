use clockin_shared::ApiError;
use serde::{Deserialize, Serialize};

/// A task may carry at most this many image URLs.
pub const MAX_TASK_IMAGES: usize = 10;

/// Task domain model - a private to-do item owned by one user.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub task_id: String,
    pub user_id: String,
    pub task_title: String,
    pub category: Category,
    pub time_range: String,
    #[serde(default)]
    pub description: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub images: Vec<String>,
    pub set_public: bool,
    /// Stamped once, when status first transitions to completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub alarm: Alarm,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Work,
    #[default]
    #[serde(rename = "self")]
    Personal,
    School,
    House,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::Personal => "self",
            Self::School => "school",
            Self::House => "house",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "work" => Some(Self::Work),
            "self" => Some(Self::Personal),
            "school" => Some(Self::School),
            "house" => Some(Self::House),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// Reminder configuration. `minutes_before` is restricted to a fixed set of
/// lead times.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Alarm {
    pub enabled: bool,
    pub minutes_before: u32,
}

pub const ALARM_LEAD_MINUTES: [u32; 4] = [5, 10, 30, 60];

impl Default for Alarm {
    fn default() -> Self {
        Self {
            enabled: false,
            minutes_before: 10,
        }
    }
}

impl Alarm {
    pub fn validate(&self) -> Result<(), ApiError> {
        if ALARM_LEAD_MINUTES.contains(&self.minutes_before) {
            Ok(())
        } else {
            Err(ApiError::validation(format!(
                "alarm.minutesBefore must be one of {:?}",
                ALARM_LEAD_MINUTES
            )))
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskPayload {
    pub task_title: String,
    pub category: Option<Category>,
    pub time_range: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub images: Option<Vec<String>>,
    pub set_public: Option<bool>,
    pub alarm: Option<Alarm>,
}

impl CreateTaskPayload {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.task_title.trim().is_empty() {
            return Err(ApiError::validation("taskTitle is required"));
        }
        if self.time_range.trim().is_empty() {
            return Err(ApiError::validation("timeRange is required"));
        }
        if let Some(images) = &self.images {
            validate_image_count(images)?;
        }
        if let Some(alarm) = &self.alarm {
            alarm.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskPayload {
    pub task_title: Option<String>,
    pub category: Option<Category>,
    pub time_range: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub images: Option<Vec<String>>,
    pub set_public: Option<bool>,
    pub completed_at: Option<String>,
    pub alarm: Option<Alarm>,
}

impl UpdateTaskPayload {
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(title) = &self.task_title {
            if title.trim().is_empty() {
                return Err(ApiError::validation("taskTitle cannot be empty"));
            }
        }
        if let Some(range) = &self.time_range {
            if range.trim().is_empty() {
                return Err(ApiError::validation("timeRange cannot be empty"));
            }
        }
        if let Some(images) = &self.images {
            validate_image_count(images)?;
        }
        if let Some(alarm) = &self.alarm {
            alarm.validate()?;
        }
        Ok(())
    }
}

pub fn validate_image_count(images: &[String]) -> Result<(), ApiError> {
    if images.len() > MAX_TASK_IMAGES {
        return Err(ApiError::validation(format!(
            "Cannot attach more than {} images per task",
            MAX_TASK_IMAGES
        )));
    }
    Ok(())
}
