//! HTTP client for the task board.
//!
//! [`TaskClient`] is a thin typed wrapper over the JSON API that keeps the
//! `auth_token` cookie in its cookie store. [`TaskBoard`] is the task view:
//! it re-fetches the full list after every successful mutation and filters
//! the last snapshot locally.

pub mod api;
pub mod board;
pub mod error;
pub mod types;

pub use api::TaskClient;
pub use board::{StatusFilter, TaskBoard};
pub use error::{ClientError, ClientResult};
pub use types::{LoginResponse, NewTask, Task, TaskStatus, TaskUpdate, User};
