pub mod model;
pub mod service;

pub use model::{CreateUserPayload, NotificationSettings, Theme, UpdateUserPayload, User};
