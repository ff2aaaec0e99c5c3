//! Database schema, models and queries

pub mod init;
pub mod models;
pub mod projections;
pub mod reports;

pub use init::init_database;
pub use models::{Beat, User};
