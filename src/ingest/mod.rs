//! Inbound event ingestion

pub mod processor;

pub use processor::{EventProcessor, ProcessOutcome};
