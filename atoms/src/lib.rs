pub mod media;
pub mod posts;
pub mod tasks;
pub mod users;
