use aws_sdk_dynamodb::Client as DynamoClient;
use clockin_atoms::users;
use clockin_atoms::users::model::{CreateUserPayload, UpdateUserPayload};
use clockin_shared::http::json_response;
use clockin_shared::ApiError;
use lambda_http::{http::StatusCode, Body, Error, Response};

/// POST /users - register the caller's profile row after external signup.
pub async fn create_user(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let payload: CreateUserPayload = match serde_json::from_slice(body) {
        Ok(p) => p,
        Err(e) => return ApiError::from(e).into_response(),
    };

    match users::service::create_user(client, table_name, user_id, payload).await {
        Ok(user) => json_response(StatusCode::CREATED, &user),
        Err(e) => e.into_response(),
    }
}

/// GET /users/me - the caller's profile.
pub async fn get_me(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
) -> Result<Response<Body>, Error> {
    match users::service::get_user(client, table_name, user_id).await {
        Ok(user) => json_response(StatusCode::OK, &user),
        Err(e) => e.into_response(),
    }
}

/// PATCH /users/me - partial profile update.
pub async fn update_me(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let payload: UpdateUserPayload = match serde_json::from_slice(body) {
        Ok(p) => p,
        Err(e) => return ApiError::from(e).into_response(),
    };

    match users::service::update_user(client, table_name, user_id, payload).await {
        Ok(user) => json_response(StatusCode::OK, &user),
        Err(e) => e.into_response(),
    }
}
