pub mod errors;
pub mod db;
pub mod user;
pub mod user_credentials;
pub mod session;
pub mod task;

#[cfg(test)]
mod tests;
