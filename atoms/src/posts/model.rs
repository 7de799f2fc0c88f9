use clockin_shared::ApiError;
use serde::{Deserialize, Serialize};

use crate::tasks::model::{Category, Task};
use crate::users::model::User;

/// Post domain model - a public, denormalized projection of a task, carrying
/// social state. At most one post exists per source task.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub post_id: String,
    pub user_id: String,
    pub task_id: String,
    /// Owner's username, snapshotted at publish time.
    pub username: String,
    #[serde(default)]
    pub profile_picture: String,
    pub task_title: String,
    pub category: Category,
    pub time_range: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub likes: i64,
    #[serde(default)]
    pub liked_by: Vec<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    pub created_at: String,
}

impl Post {
    /// Fresh mirror of a task: display fields copied, social state empty.
    pub fn mirror_from(task: &Task, user: &User) -> Self {
        Self {
            post_id: uuid::Uuid::new_v4().to_string(),
            user_id: task.user_id.clone(),
            task_id: task.task_id.clone(),
            username: user.username.clone(),
            profile_picture: user.profile_picture.clone(),
            task_title: task.task_title.clone(),
            category: task.category,
            time_range: task.time_range.clone(),
            description: task.description.clone(),
            images: task.images.clone(),
            likes: 0,
            liked_by: vec![],
            comments: vec![],
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub comment_id: String,
    pub user_id: String,
    pub username: String,
    #[serde(default)]
    pub profile_picture: String,
    pub comment: String,
    pub created_at: String,
}

impl Comment {
    /// Build a comment from trimmed text, rejecting empty input.
    pub fn new(user: &User, text: &str) -> Result<Self, ApiError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ApiError::validation("Comment cannot be empty"));
        }
        Ok(Self {
            comment_id: uuid::Uuid::new_v4().to_string(),
            user_id: user.user_id.clone(),
            username: user.username.clone(),
            profile_picture: user.profile_picture.clone(),
            comment: trimmed.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
        })
    }
}

/// Which way a like toggle goes for this caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeAction {
    Like,
    Unlike,
}

pub fn like_action(liked_by: &[String], user_id: &str) -> LikeAction {
    if liked_by.iter().any(|id| id == user_id) {
        LikeAction::Unlike
    } else {
        LikeAction::Like
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishPostPayload {
    pub task_id: String,
    pub set_public: bool,
}

#[derive(Debug, Deserialize)]
pub struct AddCommentPayload {
    pub comment: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeSummary {
    pub likes: i64,
    pub liked_by: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::model::{Alarm, TaskStatus};

    fn sample_user() -> User {
        User {
            user_id: "u-1".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            username: "ada".to_string(),
            profile_picture: "https://img/ada".to_string(),
            notification_settings: Default::default(),
            theme: Default::default(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    fn sample_task() -> Task {
        Task {
            task_id: "t-1".to_string(),
            user_id: "u-1".to_string(),
            task_title: "Write report".to_string(),
            category: Category::Work,
            time_range: "09:00-10:00".to_string(),
            description: "quarterly".to_string(),
            status: TaskStatus::Pending,
            images: vec!["https://img/1".to_string()],
            set_public: true,
            completed_at: None,
            alarm: Alarm::default(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn mirror_copies_display_fields_and_starts_unliked() {
        let post = Post::mirror_from(&sample_task(), &sample_user());
        assert_eq!(post.task_id, "t-1");
        assert_eq!(post.username, "ada");
        assert_eq!(post.task_title, "Write report");
        assert_eq!(post.category, Category::Work);
        assert_eq!(post.time_range, "09:00-10:00");
        assert_eq!(post.images, vec!["https://img/1".to_string()]);
        assert_eq!(post.likes, 0);
        assert!(post.liked_by.is_empty());
        assert!(post.comments.is_empty());
    }

    #[test]
    fn empty_comment_rejected() {
        let user = sample_user();
        assert!(Comment::new(&user, "  ").is_err());
        assert!(Comment::new(&user, "").is_err());
    }

    #[test]
    fn comment_text_is_trimmed() {
        let comment = Comment::new(&sample_user(), "  nice job  ").unwrap();
        assert_eq!(comment.comment, "nice job");
        assert_eq!(comment.username, "ada");
    }

    #[test]
    fn double_toggle_is_identity() {
        let mut liked_by: Vec<String> = vec!["other".to_string()];
        let mut likes = 1i64;

        for _ in 0..2 {
            match like_action(&liked_by, "u-1") {
                LikeAction::Like => {
                    liked_by.push("u-1".to_string());
                    likes += 1;
                }
                LikeAction::Unlike => {
                    liked_by.retain(|id| id != "u-1");
                    likes = (likes - 1).max(0);
                }
            }
        }

        assert_eq!(likes, 1);
        assert_eq!(liked_by, vec!["other".to_string()]);
    }
}
