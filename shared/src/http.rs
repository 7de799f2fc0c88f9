use lambda_http::{http::StatusCode, Body, Error as LambdaError, Response};
use serde::Serialize;

/// Build a JSON response with the standard headers every endpoint carries.
pub fn json_response<T: Serialize>(
    status: StatusCode,
    value: &T,
) -> Result<Response<Body>, LambdaError> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::to_string(value)?.into())
        .map_err(Box::new)?)
}

/// JSON error body in the `{"message": ...}` shape clients expect.
pub fn json_error(status: StatusCode, message: &str) -> Result<Response<Body>, LambdaError> {
    json_response(status, &serde_json::json!({ "message": message }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_carries_message_field() {
        let resp = json_error(StatusCode::NOT_FOUND, "Task not found").unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = match resp.body() {
            Body::Text(t) => t.clone(),
            _ => panic!("expected text body"),
        };
        let v: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(v["message"], "Task not found");
    }
}
