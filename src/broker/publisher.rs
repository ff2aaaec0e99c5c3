//! Outbound broker producers
//!
//! Two owned producer objects with explicit connect/disconnect lifecycles:
//! `EventPublisher` for the domain-event topic and `DeadLetterPublisher`
//! for poison messages. The dead-letter publisher swallows its own
//! failures; a broken error channel must never stop consumption.

use std::time::Duration;

use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use tracing::{debug, error, warn};

use crate::config::BrokerConfig;
use crate::events::{DeadLetterMessage, SocialEvent};
use crate::{Error, Result};

/// Publisher for the outbound domain-event topic
pub struct EventPublisher {
    producer: FutureProducer,
    topic: String,
    publish_timeout: Duration,
}

impl EventPublisher {
    /// Create the producer for the configured domain-event topic
    pub fn connect(config: &BrokerConfig) -> Result<EventPublisher> {
        Ok(EventPublisher {
            producer: create_producer(config)?,
            topic: config.social_events_topic.clone(),
            publish_timeout: Duration::from_secs(config.publish_timeout_secs),
        })
    }

    /// Publish a `{type, payload}` domain event, keyed for per-entity ordering
    pub async fn publish(&self, key: &str, event: &SocialEvent) -> Result<()> {
        let payload = serde_json::to_string(event)?;
        self.producer
            .send(
                FutureRecord::to(&self.topic).key(key).payload(&payload),
                Timeout::After(self.publish_timeout),
            )
            .await
            .map_err(|(err, _)| Error::Broker(err))?;

        debug!(topic = %self.topic, event_type = %event.event_type, "published domain event");
        Ok(())
    }

    /// Flush pending deliveries and release the producer
    pub fn disconnect(&self) {
        if let Err(err) = self.producer.flush(Timeout::After(self.publish_timeout)) {
            warn!(error = %err, topic = %self.topic, "producer flush failed on disconnect");
        }
    }
}

/// Publisher isolating poison messages on the dead-letter topic
pub struct DeadLetterPublisher {
    producer: FutureProducer,
    topic: String,
    publish_timeout: Duration,
}

impl DeadLetterPublisher {
    /// Create the producer for the configured dead-letter topic
    pub fn connect(config: &BrokerConfig) -> Result<DeadLetterPublisher> {
        Ok(DeadLetterPublisher {
            producer: create_producer(config)?,
            topic: config.dead_letter_topic.clone(),
            publish_timeout: Duration::from_secs(config.publish_timeout_secs),
        })
    }

    /// Publish the original raw message with the failure reason.
    ///
    /// Infallible by contract: a dead-letter publish failure is logged and
    /// dropped so the consumer loop keeps running.
    pub async fn publish(&self, original_event: &str, error: &str) {
        let message = DeadLetterMessage::new(original_event, error);
        let payload = match serde_json::to_string(&message) {
            Ok(payload) => payload,
            Err(err) => {
                error!(error = %err, "failed to encode dead-letter message");
                return;
            }
        };

        let record = FutureRecord::<(), _>::to(&self.topic).payload(&payload);
        match self
            .producer
            .send(record, Timeout::After(self.publish_timeout))
            .await
        {
            Ok(_) => debug!(topic = %self.topic, "dead-lettered message"),
            Err((err, _)) => {
                error!(error = %err, topic = %self.topic, "failed to publish to dead-letter topic");
            }
        }
    }

    /// Flush pending deliveries and release the producer
    pub fn disconnect(&self) {
        if let Err(err) = self.producer.flush(Timeout::After(self.publish_timeout)) {
            warn!(error = %err, topic = %self.topic, "producer flush failed on disconnect");
        }
    }
}

fn create_producer(config: &BrokerConfig) -> Result<FutureProducer> {
    let producer = ClientConfig::new()
        .set("bootstrap.servers", &config.brokers)
        .set(
            "message.timeout.ms",
            (config.publish_timeout_secs * 1000).to_string(),
        )
        .create()?;
    Ok(producer)
}
