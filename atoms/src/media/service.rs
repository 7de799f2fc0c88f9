use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use clockin_shared::ApiError;
use futures::future::try_join_all;
use image::ImageFormat;

use super::model::{UploadFile, MAX_FILES_PER_BATCH, MAX_FILE_BYTES};

const UPLOAD_PREFIX: &str = "tasks";

/// Reject payloads that do not carry an image magic number.
pub(crate) fn sniff_image(file: &UploadFile) -> Result<ImageFormat, ApiError> {
    image::guess_format(&file.data).map_err(|_| {
        ApiError::validation(format!(
            "File '{}' is not a supported image format",
            file.file_name
        ))
    })
}

pub fn validate_batch(files: &[UploadFile]) -> Result<(), ApiError> {
    if files.is_empty() {
        return Err(ApiError::validation("No images provided"));
    }
    if files.len() > MAX_FILES_PER_BATCH {
        return Err(ApiError::validation(format!(
            "Cannot upload more than {} images",
            MAX_FILES_PER_BATCH
        )));
    }
    for file in files {
        if file.data.len() > MAX_FILE_BYTES {
            return Err(ApiError::validation(format!(
                "File '{}' exceeds the {} MiB limit",
                file.file_name,
                MAX_FILE_BYTES / (1024 * 1024)
            )));
        }
        sniff_image(file)?;
    }
    Ok(())
}

pub(crate) fn public_url(bucket: &str, key: &str) -> String {
    format!("https://{}.s3.amazonaws.com/{}", bucket, key)
}

/// Upload a batch of images concurrently and return their public URLs in
/// input order. Any single failure fails the whole batch.
pub async fn upload_images(
    s3: &S3Client,
    bucket: &str,
    files: Vec<UploadFile>,
) -> Result<Vec<String>, ApiError> {
    validate_batch(&files)?;
    tracing::info!(count = files.len(), "uploading image batch");

    // try_join_all keeps result order aligned with input order regardless of
    // which upload finishes first.
    let uploads = files.into_iter().map(|file| async move {
        let format = sniff_image(&file)?;
        let ext = format.extensions_str().first().copied().unwrap_or("jpg");
        let key = format!("{}/{}.{}", UPLOAD_PREFIX, uuid::Uuid::new_v4(), ext);

        let content_type = if file.content_type.starts_with("image/") {
            file.content_type.clone()
        } else {
            format!("image/{}", ext)
        };

        s3.put_object()
            .bucket(bucket)
            .key(&key)
            .content_type(content_type)
            .body(ByteStream::from(file.data))
            .send()
            .await
            .map_err(|e| ApiError::Upstream(format!("S3 put_object error: {}", e)))?;

        Ok::<String, ApiError>(public_url(bucket, &key))
    });

    try_join_all(uploads).await
}
