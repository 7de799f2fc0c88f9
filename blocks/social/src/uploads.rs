use std::convert::Infallible;

use aws_sdk_s3::Client as S3Client;
use clockin_atoms::media;
use clockin_atoms::media::model::{UploadFile, UploadResponse};
use clockin_shared::http::json_response;
use clockin_shared::ApiError;
use lambda_http::{http::StatusCode, Body, Error, Response};

/// Extract the `images` fields from a buffered multipart/form-data body.
pub(crate) async fn parse_multipart(
    content_type: &str,
    body: &[u8],
) -> Result<Vec<UploadFile>, ApiError> {
    let boundary = multer::parse_boundary(content_type)
        .map_err(|_| ApiError::validation("Expected a multipart/form-data body"))?;

    let data = body.to_vec();
    let stream = futures::stream::once(async move { Ok::<Vec<u8>, Infallible>(data) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some("images") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .map(|m| m.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation(format!("Malformed multipart body: {}", e)))?
            .to_vec();
        files.push(UploadFile {
            file_name,
            content_type,
            data,
        });
    }

    Ok(files)
}

/// POST /uploads - multipart image batch, forwarded to S3. Responds with the
/// public URLs in the same order the files were sent.
pub async fn upload_images(
    s3: &S3Client,
    bucket: &str,
    content_type: Option<&str>,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let Some(content_type) = content_type else {
        return ApiError::validation("Missing Content-Type header").into_response();
    };

    let files = match parse_multipart(content_type, body).await {
        Ok(files) => files,
        Err(e) => return e.into_response(),
    };

    match media::service::upload_images(s3, bucket, files).await {
        Ok(images) => json_response(StatusCode::OK, &UploadResponse { images }),
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

    fn multipart_body(field_name: &str, file_name: &str, payload: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(b"--BOUNDARY\r\n");
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                field_name, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
        body.extend_from_slice(payload);
        body.extend_from_slice(b"\r\n--BOUNDARY--\r\n");
        body
    }

    #[tokio::test]
    async fn parses_image_fields() {
        let body = multipart_body("images", "a.png", PNG_MAGIC);
        let files = parse_multipart("multipart/form-data; boundary=BOUNDARY", &body)
            .await
            .unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name, "a.png");
        assert_eq!(files[0].content_type, "image/png");
        assert_eq!(files[0].data, PNG_MAGIC);
    }

    #[tokio::test]
    async fn ignores_other_fields() {
        let body = multipart_body("attachment", "a.png", PNG_MAGIC);
        let files = parse_multipart("multipart/form-data; boundary=BOUNDARY", &body)
            .await
            .unwrap();
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn rejects_non_multipart_content_type() {
        let result = parse_multipart("application/json", b"{}").await;
        assert!(result.is_err());
    }
}
