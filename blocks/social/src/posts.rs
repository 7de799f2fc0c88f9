use aws_sdk_dynamodb::Client as DynamoClient;
use clockin_atoms::posts::model::{AddCommentPayload, PublishPostPayload};
use clockin_atoms::tasks::model::UpdateTaskPayload;
use clockin_atoms::{posts, tasks, users};
use clockin_shared::http::json_response;
use clockin_shared::ApiError;
use lambda_http::{http::StatusCode, Body, Error, Response};

/// GET /posts - the public feed, newest first.
pub async fn list_posts(
    client: &DynamoClient,
    table_name: &str,
) -> Result<Response<Body>, Error> {
    match posts::service::list_posts(client, table_name).await {
        Ok(posts) => json_response(StatusCode::OK, &posts),
        Err(e) => e.into_response(),
    }
}

/// POST /posts - explicit publish or unpublish of a task.
///
/// Flips the task's public flag and runs the mirror cascade, so the flag and
/// the post stay consistent.
pub async fn publish_post(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let payload: PublishPostPayload = match serde_json::from_slice(body) {
        Ok(p) => p,
        Err(e) => return ApiError::from(e).into_response(),
    };

    let result = async {
        let update = UpdateTaskPayload {
            set_public: Some(payload.set_public),
            ..Default::default()
        };
        let task =
            tasks::service::update_task(client, table_name, user_id, &payload.task_id, update)
                .await?;
        let user = users::service::get_user(client, table_name, user_id).await?;
        posts::service::sync_post_for_task(client, table_name, &task, &user).await
    }
    .await;

    match result {
        Ok(Some(post)) => json_response(
            StatusCode::OK,
            &serde_json::json!({ "message": "Post created/updated", "post": post }),
        ),
        Ok(None) => json_response(
            StatusCode::OK,
            &serde_json::json!({ "message": "Post removed" }),
        ),
        Err(e) => e.into_response(),
    }
}

/// POST /posts/{postId}/like - toggle the caller's like.
pub async fn toggle_like(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    post_id: &str,
) -> Result<Response<Body>, Error> {
    match posts::service::toggle_like(client, table_name, post_id, user_id).await {
        Ok(summary) => json_response(
            StatusCode::OK,
            &serde_json::json!({
                "message": "Like toggled",
                "likes": summary.likes,
                "likedBy": summary.liked_by,
            }),
        ),
        Err(e) => e.into_response(),
    }
}

/// POST /posts/{postId}/comment - append a comment.
pub async fn add_comment(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    post_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let payload: AddCommentPayload = match serde_json::from_slice(body) {
        Ok(p) => p,
        Err(e) => return ApiError::from(e).into_response(),
    };

    let result = async {
        let user = users::service::get_user(client, table_name, user_id).await?;
        posts::service::add_comment(client, table_name, post_id, &user, &payload.comment).await
    }
    .await;

    match result {
        Ok(comments) => json_response(
            StatusCode::OK,
            &serde_json::json!({ "message": "Comment added", "comments": comments }),
        ),
        Err(e) => e.into_response(),
    }
}

/// GET /posts/{postId}/comments - the comment list only.
pub async fn get_comments(
    client: &DynamoClient,
    table_name: &str,
    post_id: &str,
) -> Result<Response<Body>, Error> {
    match posts::service::get_comments(client, table_name, post_id).await {
        Ok(comments) => json_response(StatusCode::OK, &comments),
        Err(e) => e.into_response(),
    }
}
