use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use clockin_shared::ApiError;

use super::model::{like_action, Comment, LikeAction, LikeSummary, Post};
use crate::tasks::model::{Category, Task};
use crate::users::model::User;

const POST_PARTITION: &str = "POST";
const TOGGLE_RETRIES: usize = 3;

fn post_sk(post_id: &str) -> String {
    format!("POST#{}", post_id)
}

fn comment_to_item(comment: &Comment) -> AttributeValue {
    let mut map = HashMap::new();
    map.insert(
        "comment_id".to_string(),
        AttributeValue::S(comment.comment_id.clone()),
    );
    map.insert(
        "user_id".to_string(),
        AttributeValue::S(comment.user_id.clone()),
    );
    map.insert(
        "username".to_string(),
        AttributeValue::S(comment.username.clone()),
    );
    map.insert(
        "profile_picture".to_string(),
        AttributeValue::S(comment.profile_picture.clone()),
    );
    map.insert(
        "comment".to_string(),
        AttributeValue::S(comment.comment.clone()),
    );
    map.insert(
        "created_at".to_string(),
        AttributeValue::S(comment.created_at.clone()),
    );
    AttributeValue::M(map)
}

fn comment_from_item(value: &AttributeValue) -> Option<Comment> {
    let map = value.as_m().ok()?;
    let field = |name: &str| {
        map.get(name)
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default()
    };
    Some(Comment {
        comment_id: field("comment_id"),
        user_id: field("user_id"),
        username: field("username"),
        profile_picture: field("profile_picture"),
        comment: field("comment"),
        created_at: field("created_at"),
    })
}

fn comments_from_item(value: Option<&AttributeValue>) -> Vec<Comment> {
    value
        .and_then(|v| v.as_l().ok())
        .map(|list| list.iter().filter_map(comment_from_item).collect())
        .unwrap_or_default()
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

fn images_to_item(images: &[String]) -> AttributeValue {
    AttributeValue::L(
        images
            .iter()
            .map(|url| AttributeValue::S(url.clone()))
            .collect(),
    )
}

/// Marshal a post out of a DynamoDB item. The post id comes from the SK; the
/// like set is a string set that is absent while empty (DynamoDB rejects
/// empty sets), and the count is floored at zero on the way out.
pub(crate) fn post_from_item(item: &HashMap<String, AttributeValue>) -> Option<Post> {
    let sk = item.get("SK").and_then(|v| v.as_s().ok())?;
    let post_id = sk.strip_prefix("POST#")?;
    Some(Post {
        post_id: post_id.to_string(),
        user_id: item
            .get("user_id")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        task_id: item
            .get("task_id")
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
        images: images_from_item(item.get("images")),
        likes: item
            .get("likes")
            .and_then(|v| v.as_n().ok())
            .and_then(|n| n.parse::<i64>().ok())
            .unwrap_or(0)
            .max(0),
        liked_by: item
            .get("liked_by")
            .and_then(|v| v.as_ss().ok())
            .cloned()
            .unwrap_or_default(),
        comments: comments_from_item(item.get("comments")),
        created_at: item
            .get("created_at")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
    })
}

/// List all posts, newest first.
pub async fn list_posts(client: &DynamoClient, table_name: &str) -> Result<Vec<Post>, ApiError> {
    let result = client
        .query()
        .table_name(table_name)
        .key_condition_expression("PK = :pk")
        .expression_attribute_values(":pk", AttributeValue::S(POST_PARTITION.to_string()))
        .send()
        .await
        .map_err(|e| ApiError::Upstream(format!("DynamoDB query error: {}", e)))?;

    let mut posts: Vec<Post> = result.items().iter().filter_map(post_from_item).collect();
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(posts)
}

/// Get a specific post.
pub async fn get_post(
    client: &DynamoClient,
    table_name: &str,
    post_id: &str,
) -> Result<Post, ApiError> {
    let result = client
        .get_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(POST_PARTITION.to_string()))
        .key("SK", AttributeValue::S(post_sk(post_id)))
        .send()
        .await
        .map_err(|e| ApiError::Upstream(format!("DynamoDB get_item error: {}", e)))?;

    result
        .item()
        .and_then(post_from_item)
        .ok_or(ApiError::NotFound("Post"))
}

/// Find the post mirroring a task, if one exists.
pub async fn find_post_by_task(
    client: &DynamoClient,
    table_name: &str,
    task_id: &str,
) -> Result<Option<Post>, ApiError> {
    let result = client
        .query()
        .table_name(table_name)
        .key_condition_expression("PK = :pk")
        .filter_expression("task_id = :tid")
        .expression_attribute_values(":pk", AttributeValue::S(POST_PARTITION.to_string()))
        .expression_attribute_values(":tid", AttributeValue::S(task_id.to_string()))
        .send()
        .await
        .map_err(|e| ApiError::Upstream(format!("DynamoDB query error: {}", e)))?;

    Ok(result.items().iter().find_map(post_from_item))
}

async fn put_post(client: &DynamoClient, table_name: &str, post: &Post) -> Result<(), ApiError> {
    // liked_by is omitted while empty; DynamoDB string sets cannot be empty.
    let mut builder = client
        .put_item()
        .table_name(table_name)
        .item("PK", AttributeValue::S(POST_PARTITION.to_string()))
        .item("SK", AttributeValue::S(post_sk(&post.post_id)))
        .item("user_id", AttributeValue::S(post.user_id.clone()))
        .item("task_id", AttributeValue::S(post.task_id.clone()))
        .item("username", AttributeValue::S(post.username.clone()))
        .item(
            "profile_picture",
            AttributeValue::S(post.profile_picture.clone()),
        )
        .item("task_title", AttributeValue::S(post.task_title.clone()))
        .item(
            "category",
            AttributeValue::S(post.category.as_str().to_string()),
        )
        .item("time_range", AttributeValue::S(post.time_range.clone()))
        .item("description", AttributeValue::S(post.description.clone()))
        .item("images", images_to_item(&post.images))
        .item("likes", AttributeValue::N(post.likes.to_string()))
        .item(
            "comments",
            AttributeValue::L(post.comments.iter().map(comment_to_item).collect()),
        )
        .item("created_at", AttributeValue::S(post.created_at.clone()));

    if !post.liked_by.is_empty() {
        builder = builder.item("liked_by", AttributeValue::Ss(post.liked_by.clone()));
    }

    builder
        .send()
        .await
        .map_err(|e| ApiError::Upstream(format!("DynamoDB put_item error: {}", e)))?;
    Ok(())
}

/// Overwrite the mirrored display fields of an existing post, leaving social
/// state untouched.
async fn refresh_mirrored_fields(
    client: &DynamoClient,
    table_name: &str,
    post_id: &str,
    task: &Task,
) -> Result<(), ApiError> {
    client
        .update_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(POST_PARTITION.to_string()))
        .key("SK", AttributeValue::S(post_sk(post_id)))
        .update_expression(
            "SET task_title = :task_title, category = :category, \
             time_range = :time_range, description = :description, images = :images",
        )
        .expression_attribute_values(":task_title", AttributeValue::S(task.task_title.clone()))
        .expression_attribute_values(
            ":category",
            AttributeValue::S(task.category.as_str().to_string()),
        )
        .expression_attribute_values(":time_range", AttributeValue::S(task.time_range.clone()))
        .expression_attribute_values(":description", AttributeValue::S(task.description.clone()))
        .expression_attribute_values(":images", images_to_item(&task.images))
        .send()
        .await
        .map_err(|e| ApiError::Upstream(format!("DynamoDB update_item error: {}", e)))?;
    Ok(())
}

/// Mirror cascade: after this call exactly one post exists for the task iff
/// the task is public.
pub async fn sync_post_for_task(
    client: &DynamoClient,
    table_name: &str,
    task: &Task,
    user: &User,
) -> Result<Option<Post>, ApiError> {
    if !task.set_public {
        delete_post_for_task(client, table_name, &task.task_id).await?;
        return Ok(None);
    }

    match find_post_by_task(client, table_name, &task.task_id).await? {
        Some(existing) => {
            refresh_mirrored_fields(client, table_name, &existing.post_id, task).await?;
            let post = get_post(client, table_name, &existing.post_id).await?;
            Ok(Some(post))
        }
        None => {
            let post = Post::mirror_from(task, user);
            put_post(client, table_name, &post).await?;
            tracing::info!(task_id = %task.task_id, post_id = %post.post_id, "published task");
            Ok(Some(post))
        }
    }
}

/// Remove the post mirroring a task, if any. Absence is not an error.
pub async fn delete_post_for_task(
    client: &DynamoClient,
    table_name: &str,
    task_id: &str,
) -> Result<(), ApiError> {
    let Some(post) = find_post_by_task(client, table_name, task_id).await? else {
        return Ok(());
    };

    client
        .delete_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(POST_PARTITION.to_string()))
        .key("SK", AttributeValue::S(post_sk(&post.post_id)))
        .send()
        .await
        .map_err(|e| ApiError::Upstream(format!("DynamoDB delete_item error: {}", e)))?;
    Ok(())
}

/// Toggle the caller's like on a post.
///
/// Read to pick a direction, then apply a conditional set/counter update; a
/// concurrent toggle fails the condition and the loop re-reads. Two toggles
/// by the same user always return the post to its original state.
pub async fn toggle_like(
    client: &DynamoClient,
    table_name: &str,
    post_id: &str,
    user_id: &str,
) -> Result<LikeSummary, ApiError> {
    for _ in 0..TOGGLE_RETRIES {
        let post = get_post(client, table_name, post_id).await?;

        let builder = client
            .update_item()
            .table_name(table_name)
            .key("PK", AttributeValue::S(POST_PARTITION.to_string()))
            .key("SK", AttributeValue::S(post_sk(post_id)))
            .expression_attribute_values(
                ":uid_set",
                AttributeValue::Ss(vec![user_id.to_string()]),
            )
            .expression_attribute_values(":uid", AttributeValue::S(user_id.to_string()))
            .expression_attribute_values(":one", AttributeValue::N("1".to_string()));

        let builder = match like_action(&post.liked_by, user_id) {
            LikeAction::Like => builder
                .update_expression(
                    "SET likes = if_not_exists(likes, :zero) + :one ADD liked_by :uid_set",
                )
                .condition_expression(
                    "attribute_not_exists(liked_by) OR NOT contains(liked_by, :uid)",
                )
                .expression_attribute_values(":zero", AttributeValue::N("0".to_string())),
            LikeAction::Unlike => builder
                .update_expression("SET likes = likes - :one DELETE liked_by :uid_set")
                .condition_expression("contains(liked_by, :uid)"),
        };

        match builder.send().await {
            Ok(_) => {
                let post = get_post(client, table_name, post_id).await?;
                return Ok(LikeSummary {
                    likes: post.likes,
                    liked_by: post.liked_by,
                });
            }
            Err(e) => {
                let service_err = e.into_service_error();
                if service_err.is_conditional_check_failed_exception() {
                    // Lost the race; re-read and go the other way.
                    continue;
                }
                return Err(ApiError::Upstream(format!(
                    "DynamoDB update_item error: {}",
                    service_err
                )));
            }
        }
    }

    Err(ApiError::Upstream("like toggle contention".to_string()))
}

/// Append a comment and return the full updated list.
pub async fn add_comment(
    client: &DynamoClient,
    table_name: &str,
    post_id: &str,
    user: &User,
    text: &str,
) -> Result<Vec<Comment>, ApiError> {
    let comment = Comment::new(user, text)?;

    // Ensure the post exists before appending.
    get_post(client, table_name, post_id).await?;

    client
        .update_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(POST_PARTITION.to_string()))
        .key("SK", AttributeValue::S(post_sk(post_id)))
        .update_expression("SET comments = list_append(if_not_exists(comments, :empty), :new)")
        .expression_attribute_values(":empty", AttributeValue::L(vec![]))
        .expression_attribute_values(":new", AttributeValue::L(vec![comment_to_item(&comment)]))
        .send()
        .await
        .map_err(|e| ApiError::Upstream(format!("DynamoDB update_item error: {}", e)))?;

    let post = get_post(client, table_name, post_id).await?;
    Ok(post.comments)
}

/// Comment list only.
pub async fn get_comments(
    client: &DynamoClient,
    table_name: &str,
    post_id: &str,
) -> Result<Vec<Comment>, ApiError> {
    let post = get_post(client, table_name, post_id).await?;
    Ok(post.comments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_post_item() -> HashMap<String, AttributeValue> {
        let mut item = HashMap::new();
        item.insert("PK".to_string(), AttributeValue::S("POST".into()));
        item.insert("SK".to_string(), AttributeValue::S("POST#p-1".into()));
        item.insert("user_id".to_string(), AttributeValue::S("u-1".into()));
        item.insert("task_id".to_string(), AttributeValue::S("t-1".into()));
        item.insert("username".to_string(), AttributeValue::S("ada".into()));
        item.insert(
            "task_title".to_string(),
            AttributeValue::S("Write report".into()),
        );
        item.insert("category".to_string(), AttributeValue::S("work".into()));
        item.insert(
            "time_range".to_string(),
            AttributeValue::S("09:00-10:00".into()),
        );
        item.insert("likes".to_string(), AttributeValue::N("2".into()));
        item.insert(
            "liked_by".to_string(),
            AttributeValue::Ss(vec!["u-2".into(), "u-3".into()]),
        );
        item.insert(
            "created_at".to_string(),
            AttributeValue::S("2026-01-02T00:00:00Z".into()),
        );
        item
    }

    #[test]
    fn post_round_trips_through_item() {
        let post = post_from_item(&sample_post_item()).unwrap();
        assert_eq!(post.post_id, "p-1");
        assert_eq!(post.task_id, "t-1");
        assert_eq!(post.likes, 2);
        assert_eq!(post.liked_by.len(), 2);
        assert_eq!(post.category, Category::Work);
        assert!(post.comments.is_empty());
    }

    #[test]
    fn negative_like_count_floored() {
        let mut item = sample_post_item();
        item.insert("likes".to_string(), AttributeValue::N("-1".into()));
        let post = post_from_item(&item).unwrap();
        assert_eq!(post.likes, 0);
    }

    #[test]
    fn absent_like_set_reads_as_empty() {
        let mut item = sample_post_item();
        item.remove("liked_by");
        item.remove("likes");
        let post = post_from_item(&item).unwrap();
        assert_eq!(post.likes, 0);
        assert!(post.liked_by.is_empty());
    }

    #[test]
    fn comment_round_trips_through_item() {
        let comment = Comment {
            comment_id: "c-1".to_string(),
            user_id: "u-2".to_string(),
            username: "bob".to_string(),
            profile_picture: String::new(),
            comment: "nice job".to_string(),
            created_at: "2026-01-03T00:00:00Z".to_string(),
        };
        let back = comment_from_item(&comment_to_item(&comment)).unwrap();
        assert_eq!(back.comment_id, "c-1");
        assert_eq!(back.comment, "nice job");
        assert_eq!(back.username, "bob");
    }

    #[test]
    fn comments_preserve_order() {
        let make = |id: &str| Comment {
            comment_id: id.to_string(),
            user_id: "u".to_string(),
            username: "u".to_string(),
            profile_picture: String::new(),
            comment: format!("text {}", id),
            created_at: "2026-01-03T00:00:00Z".to_string(),
        };
        let items = AttributeValue::L(vec![
            comment_to_item(&make("c-1")),
            comment_to_item(&make("c-2")),
        ]);
        let comments = comments_from_item(Some(&items));
        assert_eq!(comments[0].comment_id, "c-1");
        assert_eq!(comments[1].comment_id, "c-2");
    }

    #[test]
    fn non_post_item_is_skipped() {
        let mut item = sample_post_item();
        item.insert("SK".to_string(), AttributeValue::S("TASK#t-1".into()));
        assert!(post_from_item(&item).is_none());
    }
}
