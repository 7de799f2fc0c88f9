use serde::Serialize;

/// Server-enforced batch cap.
pub const MAX_FILES_PER_BATCH: usize = 10;

/// Server-enforced per-file size ceiling (5 MiB).
pub const MAX_FILE_BYTES: usize = 5 * 1024 * 1024;

/// One image payload extracted from the multipart request.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Wire shape of a successful upload batch.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub images: Vec<String>,
}
