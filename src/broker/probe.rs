//! Broker reachability probe
//!
//! A short-lived admin-style client: connect, query cluster metadata,
//! disconnect. Reports reachability independently of the long-lived
//! consumer connection; a stalled consumer and a failing probe are
//! different signals, and this is the cheap one.

use std::time::Duration;

use rdkafka::config::ClientConfig;
use rdkafka::consumer::{BaseConsumer, Consumer};
use tracing::{debug, warn};

use crate::config::BrokerConfig;
use crate::{Error, Result};

/// Reachability probe for the event broker
pub struct BrokerProbe {
    brokers: String,
    timeout: Duration,
}

impl BrokerProbe {
    pub fn new(config: &BrokerConfig) -> BrokerProbe {
        BrokerProbe {
            brokers: config.brokers.clone(),
            timeout: Duration::from_secs(config.metadata_timeout_secs),
        }
    }

    /// Query cluster metadata, returning the advertised broker count
    pub async fn check(&self) -> Result<usize> {
        fetch_cluster_broker_count(self.brokers.clone(), self.timeout).await
    }

    /// Boolean reachability: can the cluster answer a metadata query?
    pub async fn reachable(&self) -> bool {
        match self.check().await {
            Ok(broker_count) => {
                debug!(broker_count, "event broker reachable");
                true
            }
            Err(err) => {
                warn!(error = %err, "event broker unreachable");
                false
            }
        }
    }
}

/// Connect a throwaway client, fetch cluster metadata, disconnect.
///
/// The metadata call is blocking, so it runs on the blocking pool.
pub(crate) async fn fetch_cluster_broker_count(
    brokers: String,
    timeout: Duration,
) -> Result<usize> {
    tokio::task::spawn_blocking(move || -> Result<usize> {
        let client: BaseConsumer = ClientConfig::new()
            .set("bootstrap.servers", &brokers)
            .create()?;
        let metadata = client.fetch_metadata(None, timeout)?;
        Ok(metadata.brokers().len())
    })
    .await
    .map_err(|err| Error::Internal(format!("metadata probe task failed: {}", err)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_broker_reports_false() {
        // Nothing listens on this port; the metadata query times out
        let probe = BrokerProbe {
            brokers: "127.0.0.1:1".to_string(),
            timeout: Duration::from_secs(1),
        };
        assert!(!probe.reachable().await);
    }
}
