use aws_sdk_dynamodb::Client as DynamoClient;
use clockin_atoms::tasks::model::{CreateTaskPayload, UpdateTaskPayload};
use clockin_atoms::{posts, tasks, users};
use clockin_shared::http::json_response;
use clockin_shared::ApiError;
use lambda_http::{http::StatusCode, Body, Error, Response};

/// GET /tasks - list the caller's tasks.
pub async fn list_tasks(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
) -> Result<Response<Body>, Error> {
    match tasks::service::list_tasks_for_user(client, table_name, user_id).await {
        Ok(tasks) => json_response(StatusCode::OK, &serde_json::json!({ "tasks": tasks })),
        Err(e) => e.into_response(),
    }
}

/// POST /tasks - create a task for the caller.
pub async fn create_task(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let payload: CreateTaskPayload = match serde_json::from_slice(body) {
        Ok(p) => p,
        Err(e) => return ApiError::from(e).into_response(),
    };

    match tasks::service::create_task(client, table_name, user_id, payload).await {
        Ok(task) => json_response(StatusCode::CREATED, &task),
        Err(e) => e.into_response(),
    }
}

/// PUT /tasks/{id} - partial update; runs the post mirror cascade when the
/// payload touches the public flag.
pub async fn update_task(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    task_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let payload: UpdateTaskPayload = match serde_json::from_slice(body) {
        Ok(p) => p,
        Err(e) => return ApiError::from(e).into_response(),
    };
    let cascades = payload.set_public.is_some();

    let updated = match tasks::service::update_task(client, table_name, user_id, task_id, payload)
        .await
    {
        Ok(task) => task,
        Err(e) => return e.into_response(),
    };

    if cascades {
        let result = async {
            let user = users::service::get_user(client, table_name, user_id).await?;
            posts::service::sync_post_for_task(client, table_name, &updated, &user).await
        }
        .await;
        if let Err(e) = result {
            return e.into_response();
        }
    }

    json_response(StatusCode::OK, &updated)
}

/// DELETE /tasks/{id} - delete a task and any post mirroring it.
pub async fn delete_task(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    task_id: &str,
) -> Result<Response<Body>, Error> {
    if let Err(e) = tasks::service::delete_task(client, table_name, user_id, task_id).await {
        return e.into_response();
    }

    // A deleted task must not leave an orphaned post behind.
    if let Err(e) = posts::service::delete_post_for_task(client, table_name, task_id).await {
        return e.into_response();
    }

    json_response(
        StatusCode::OK,
        &serde_json::json!({ "message": "Task deleted successfully" }),
    )
}
