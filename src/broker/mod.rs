//! Broker clients
//!
//! Explicitly constructed, owned clients for the event broker: the
//! connection supervisor around the long-lived consumer, the outbound
//! producers, and the short-lived reachability probe.

pub mod probe;
pub mod publisher;
pub mod supervisor;

pub use probe::BrokerProbe;
pub use publisher::{DeadLetterPublisher, EventPublisher};
pub use supervisor::{ConnectionState, ConnectionSupervisor};
