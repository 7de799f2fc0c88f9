pub mod posts;
pub mod tasks;
pub mod uploads;
pub mod users;
