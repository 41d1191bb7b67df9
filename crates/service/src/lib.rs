//! Service layer providing business-oriented operations on top of models.
//! - Separates business logic from data access (repository traits with
//!   SeaORM and in-memory implementations).
//! - Reuses validation and entity definitions in `models` crate.
//! - Every task operation receives an explicit `SessionContext`.

pub mod errors;
pub mod auth;
pub mod task;
#[cfg(test)]
pub mod test_support;
