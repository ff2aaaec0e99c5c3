//! Connection supervisor
//!
//! Owns the broker connection lifecycle as an explicit state machine:
//! Connecting → Connected → (on failure) Retrying with a fixed delay for a
//! bounded number of attempts → Cooldown with a longer sleep → Connecting
//! again, looping indefinitely. There is no terminal failure state; only a
//! shutdown signal stops the supervisor, and the in-flight message is
//! allowed to finish first.

use std::time::Duration;

use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::error::KafkaError;
use rdkafka::message::BorrowedMessage;
use rdkafka::Message;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::broker::probe;
use crate::broker::publisher::DeadLetterPublisher;
use crate::config::BrokerConfig;
use crate::ingest::{EventProcessor, ProcessOutcome};
use crate::Result;

/// Supervisor connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Attempting the initial connection of a cycle
    Connecting,
    /// Subscribed and consuming
    Connected,
    /// Bounded re-attempts with a fixed delay between them
    Retrying { attempt: u32 },
    /// Attempts exhausted; one longer sleep before the cycle restarts
    Cooldown,
}

impl ConnectionState {
    /// State transition after a failed connect or a lost connection
    pub fn next_after_failure(self, max_attempts: u32) -> ConnectionState {
        match self {
            ConnectionState::Retrying { attempt } if attempt >= max_attempts => {
                ConnectionState::Cooldown
            }
            ConnectionState::Retrying { attempt } => ConnectionState::Retrying {
                attempt: attempt + 1,
            },
            ConnectionState::Connecting
            | ConnectionState::Connected
            | ConnectionState::Cooldown => ConnectionState::Retrying { attempt: 1 },
        }
    }

    /// How long to wait before the next connection attempt in this state
    pub fn backoff(&self, config: &BrokerConfig) -> Option<Duration> {
        match self {
            ConnectionState::Retrying { .. } => {
                Some(Duration::from_secs(config.retry_delay_secs))
            }
            ConnectionState::Cooldown => Some(Duration::from_secs(config.cooldown_secs)),
            ConnectionState::Connecting | ConnectionState::Connected => None,
        }
    }
}

/// How a connected consume session ended
enum SessionEnd {
    Shutdown,
    ConnectionLost(KafkaError),
}

/// Owns the long-lived consumer connection and the consume loop
pub struct ConnectionSupervisor {
    config: BrokerConfig,
    processor: EventProcessor,
    dead_letters: DeadLetterPublisher,
    shutdown: watch::Receiver<bool>,
}

impl ConnectionSupervisor {
    pub fn new(
        config: BrokerConfig,
        processor: EventProcessor,
        dead_letters: DeadLetterPublisher,
        shutdown: watch::Receiver<bool>,
    ) -> ConnectionSupervisor {
        ConnectionSupervisor {
            config,
            processor,
            dead_letters,
            shutdown,
        }
    }

    /// Drive the connection cycle until a shutdown signal arrives
    pub async fn run(self) {
        let mut state = ConnectionState::Connecting;
        loop {
            if *self.shutdown.borrow() {
                break;
            }

            match self.connect().await {
                Ok(consumer) => {
                    state = ConnectionState::Connected;
                    info!(
                        beats_topic = %self.config.beat_events_topic,
                        users_topic = %self.config.user_events_topic,
                        "connected to event broker, consuming from earliest offset"
                    );
                    match self.consume(&consumer).await {
                        SessionEnd::Shutdown => break,
                        SessionEnd::ConnectionLost(err) => {
                            warn!(error = %err, "event stream interrupted");
                        }
                    }
                }
                Err(err) => {
                    warn!(error = %err, state = ?state, "broker connection failed");
                }
            }

            state = state.next_after_failure(self.config.connect_attempts);
            if let Some(delay) = state.backoff(&self.config) {
                info!(state = ?state, delay_secs = delay.as_secs(), "waiting before reconnecting");
                if self.sleep_or_shutdown(delay).await {
                    break;
                }
            }
        }

        self.dead_letters.disconnect();
        info!("event consumer stopped");
    }

    /// Verify the broker answers a metadata query, then build and
    /// subscribe the stream consumer
    async fn connect(&self) -> Result<StreamConsumer> {
        probe::fetch_cluster_broker_count(
            self.config.brokers.clone(),
            Duration::from_secs(self.config.metadata_timeout_secs),
        )
        .await?;

        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &self.config.brokers)
            .set("group.id", &self.config.group_id)
            .set("auto.offset.reset", "earliest")
            .set("enable.auto.commit", "false")
            .create()?;

        consumer.subscribe(&[
            self.config.beat_events_topic.as_str(),
            self.config.user_events_topic.as_str(),
        ])?;

        Ok(consumer)
    }

    /// Sequential consume loop: one message is fully processed and
    /// committed before the next is pulled. The shutdown signal is only
    /// observed between messages.
    async fn consume(&self, consumer: &StreamConsumer) -> SessionEnd {
        let mut shutdown = self.shutdown.clone();
        loop {
            tokio::select! {
                _ = shutdown.changed() => return SessionEnd::Shutdown,
                message = consumer.recv() => match message {
                    Ok(message) => {
                        self.handle_message(&message).await;
                        if let Err(err) = consumer.commit_message(&message, CommitMode::Async) {
                            warn!(error = %err, "failed to commit consumed offset");
                        }
                    }
                    Err(err) => return SessionEnd::ConnectionLost(err),
                }
            }
        }
    }

    /// Process one message; failures are dead-lettered, never propagated
    async fn handle_message(&self, message: &BorrowedMessage<'_>) {
        let raw = match message.payload() {
            Some(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            None => String::new(),
        };

        match self.processor.process(&raw).await {
            Ok(ProcessOutcome::Applied) => debug!(
                topic = message.topic(),
                offset = message.offset(),
                "event applied"
            ),
            Ok(ProcessOutcome::Ignored) => {}
            Err(err) => {
                error!(
                    error = %err,
                    topic = message.topic(),
                    offset = message.offset(),
                    "event processing failed, forwarding to dead-letter topic"
                );
                self.dead_letters.publish(&raw, &err.to_string()).await;
            }
        }
    }

    /// Cancellable backoff sleep; true means a shutdown arrived
    async fn sleep_or_shutdown(&self, delay: Duration) -> bool {
        let mut shutdown = self.shutdown.clone();
        tokio::select! {
            _ = tokio::time::sleep(delay) => false,
            _ = shutdown.changed() => true,
        }
    }
}
