pub mod auth;
pub mod error;
pub mod http;

use aws_sdk_dynamodb::Client as DynamoClient;
use aws_sdk_s3::Client as S3Client;

pub use error::ApiError;

/// Shared clients, built once in main and passed to every handler.
pub struct AppState {
    pub dynamo_client: DynamoClient,
    pub s3_client: S3Client,
}

impl AppState {
    pub async fn from_env() -> Self {
        let config = aws_config::load_from_env().await;
        Self {
            dynamo_client: DynamoClient::new(&config),
            s3_client: S3Client::new(&config),
        }
    }
}
