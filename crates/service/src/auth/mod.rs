//! Auth module: three-layer architecture (domain, repository, service).
//!
//! Registration, login, server-held sessions and token resolution live here;
//! the HTTP layer only moves cookies around.

pub mod domain;
pub mod errors;
pub mod repository;
pub mod service;
pub mod repo;

pub use domain::SessionContext;
pub use service::{AuthConfig, AuthService};
