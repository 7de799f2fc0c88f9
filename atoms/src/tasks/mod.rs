pub mod model;
pub mod service;

pub use model::{Alarm, Category, CreateTaskPayload, Task, TaskStatus, UpdateTaskPayload};
