pub mod model;
pub mod service;

pub use model::{UploadFile, UploadResponse, MAX_FILES_PER_BATCH, MAX_FILE_BYTES};
