pub mod model;
pub mod service;

pub use model::{AddCommentPayload, Comment, LikeSummary, Post, PublishPostPayload};
