//! Task module: owner-scoped task records behind a repository seam.

pub mod domain;
pub mod repository;
pub mod service;
pub mod repo;

pub use domain::{NewTask, Task, TaskStatus, TaskUpdate};
pub use service::TaskService;
