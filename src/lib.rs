//! # Beats Interaction Service
//!
//! Backend for the beats platform's interaction features. Two subsystems:
//! - An event-driven projection engine consuming `beats-events` and
//!   `users-events`, keeping local read-optimized copies of users and
//!   beats current and cascading deletes into comments, ratings and
//!   playlists, with poison messages isolated on a dead-letter topic.
//! - A moderation-report integrity engine enforcing single-target,
//!   no-self-report, visibility and at-most-one-active-report rules under
//!   concurrent writes.
//!
//! The comment/rating/playlist CRUD surface and the HTTP route layer are
//! external collaborators; they consume [`moderation::ReportService`] and
//! the [`broker::BrokerProbe`] health surface as a library.

pub mod broker;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod ingest;
pub mod moderation;

pub use config::Config;
pub use error::{Error, Result};
pub use moderation::ReportService;
