use std::env;
use std::sync::Arc;

use clockin_shared::{auth, AppState};
use lambda_http::http::header::HeaderValue;
use lambda_http::{
    http::{Method, StatusCode},
    Body, Error, Request, Response,
};
use social_block::{posts, tasks, uploads, users};

fn with_cors_headers(mut resp: Response<Body>) -> Response<Body> {
    let headers = resp.headers_mut();
    headers.insert("Access-Control-Allow-Origin", HeaderValue::from_static("*"));
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET,POST,PUT,PATCH,DELETE,OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type,Authorization"),
    );
    resp
}

fn finalize_response(resp: Result<Response<Body>, Error>) -> Result<Response<Body>, Error> {
    resp.map(with_cors_headers)
}

/// Main Lambda handler - authenticates the caller and routes to the social
/// block handlers.
pub(crate) async fn function_handler(
    event: Request,
    state: Arc<AppState>,
) -> Result<Response<Body>, Error> {
    let method = event.method();
    let path = event.uri().path();
    let body = event.body();
    tracing::info!("API invoked - Method: {} Path: {}", method, path);

    // Handle CORS preflight
    if method == "OPTIONS" {
        let resp = Response::builder()
            .status(StatusCode::OK)
            .body(Body::Empty)
            .map_err(Box::new)?;
        return Ok(with_cors_headers(resp));
    }

    let auth_secret = env::var("AUTH_SECRET").expect("AUTH_SECRET must be set");
    let table_name = env::var("TABLE_NAME").unwrap_or_else(|_| "clockin".to_string());

    // Every route below requires an authenticated caller.
    let auth_ctx = match auth::authenticate_request(event.headers(), &auth_secret) {
        Ok(ctx) => ctx,
        Err(e) => return finalize_response(e.into_response()),
    };
    let user_id = auth_ctx.user_id.as_str();

    let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let resp = match (method, parts.as_slice()) {
        // --- TASKS ---
        (&Method::GET, ["tasks"]) => {
            tasks::list_tasks(&state.dynamo_client, &table_name, user_id).await
        }
        (&Method::POST, ["tasks"]) => {
            tasks::create_task(&state.dynamo_client, &table_name, user_id, body).await
        }
        (&Method::PUT, ["tasks", task_id]) => {
            tasks::update_task(&state.dynamo_client, &table_name, user_id, task_id, body).await
        }
        (&Method::DELETE, ["tasks", task_id]) => {
            tasks::delete_task(&state.dynamo_client, &table_name, user_id, task_id).await
        }

        // --- POSTS ---
        (&Method::GET, ["posts"]) => posts::list_posts(&state.dynamo_client, &table_name).await,
        (&Method::POST, ["posts"]) => {
            posts::publish_post(&state.dynamo_client, &table_name, user_id, body).await
        }
        (&Method::POST, ["posts", post_id, "like"]) => {
            posts::toggle_like(&state.dynamo_client, &table_name, user_id, post_id).await
        }
        (&Method::POST, ["posts", post_id, "comment"]) => {
            posts::add_comment(&state.dynamo_client, &table_name, user_id, post_id, body).await
        }
        (&Method::GET, ["posts", post_id, "comments"]) => {
            posts::get_comments(&state.dynamo_client, &table_name, post_id).await
        }

        // --- UPLOADS ---
        (&Method::POST, ["uploads"]) => {
            let bucket = env::var("S3_BUCKET_NAME").unwrap_or_else(|_| "clockin-app".to_string());
            let content_type = event
                .headers()
                .get("Content-Type")
                .and_then(|v| v.to_str().ok());
            uploads::upload_images(&state.s3_client, &bucket, content_type, body).await
        }

        // --- USERS ---
        (&Method::POST, ["users"]) => {
            users::create_user(&state.dynamo_client, &table_name, user_id, body).await
        }
        (&Method::GET, ["users", "me"]) => {
            users::get_me(&state.dynamo_client, &table_name, user_id).await
        }
        (&Method::PATCH, ["users", "me"]) => {
            users::update_me(&state.dynamo_client, &table_name, user_id, body).await
        }

        _ => {
            tracing::warn!("No route matched - Method: {} Path: {}", method, path);
            not_found()
        }
    };

    finalize_response(resp)
}

fn not_found() -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", "application/json")
        .body(
            serde_json::json!({"message": "Not found"})
                .to_string()
                .into(),
        )
        .map_err(Box::new)?)
}
