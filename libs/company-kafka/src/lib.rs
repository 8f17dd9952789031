//! Kafka event publisher for the company service
//!
//! Implements the domain's `EventPublisher` port with an rdkafka
//! `FutureProducer`. Works with any Kafka-compatible broker (Apache Kafka,
//! Redpanda, MSK).
//!
//! # Delivery Semantics
//!
//! - `publish` resolves once the broker acknowledged the message or the
//!   delivery timed out. librdkafka retries internally within
//!   `message.timeout.ms`; nothing above that is retried here.
//! - Messages are keyed by the company id, so all events for one company
//!   land on the same partition in emission order.
//!
//! # Example
//!
//! ```no_run
//! use company_kafka::KafkaEventPublisher;
//! use std::time::Duration;
//!
//! # fn example() -> Result<(), company_kafka::KafkaConfigError> {
//! let publisher = KafkaEventPublisher::builder()
//!     .brokers("localhost:9092")
//!     .acks("all")
//!     .timeout(Duration::from_secs(5))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::time::Duration;

use company_domain::{company::PublishError, ports::EventPublisher};
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use thiserror::Error;
use tracing::{debug, error, info};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_ACKS: &str = "all";

/// Errors raised while building the producer
#[derive(Error, Debug)]
pub enum KafkaConfigError {
    /// No bootstrap servers were given
    #[error("Kafka brokers not configured")]
    MissingBrokers,

    /// librdkafka rejected the configuration
    #[error("Failed to create Kafka producer: {0}")]
    Producer(String),
}

/// Kafka-backed implementation of the EventPublisher port
///
/// The producer is shared by every request; cloning the publisher clones
/// a handle to the same librdkafka instance.
#[derive(Clone)]
pub struct KafkaEventPublisher {
    producer: FutureProducer,
    brokers: String,
    timeout: Duration,
}

impl KafkaEventPublisher {
    /// Start configuring a publisher; brokers are required
    pub fn builder() -> KafkaEventPublisherBuilder {
        KafkaEventPublisherBuilder::default()
    }

    /// Bootstrap servers this publisher was built with
    pub fn brokers(&self) -> &str {
        &self.brokers
    }

    /// Wait for queued messages to be delivered
    ///
    /// Called once at shutdown, after the HTTP server stopped accepting
    /// requests.
    pub fn flush(&self, timeout: Duration) {
        match self.producer.flush(Timeout::After(timeout)) {
            Ok(()) => info!("Kafka producer flushed"),
            Err(err) => error!(error = %err, "Kafka producer flush incomplete"),
        }
    }
}

/// Builder for a [`KafkaEventPublisher`]
#[derive(Default)]
pub struct KafkaEventPublisherBuilder {
    brokers: Option<String>,
    acks: Option<String>,
    timeout: Option<Duration>,
}

impl KafkaEventPublisherBuilder {
    /// Comma-separated bootstrap servers, e.g. `"localhost:9092"`
    pub fn brokers(mut self, brokers: impl Into<String>) -> Self {
        self.brokers = Some(brokers.into());
        self
    }

    /// Acknowledgment mode: `"0"`, `"1"` or `"all"` (default `"all"`)
    pub fn acks(mut self, acks: impl Into<String>) -> Self {
        self.acks = Some(acks.into());
        self
    }

    /// How long a publish may take before it is reported as failed
    ///
    /// Default: 5 seconds
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the publisher
    ///
    /// # Errors
    ///
    /// Returns `KafkaConfigError::MissingBrokers` if no brokers were set and
    /// `KafkaConfigError::Producer` if librdkafka rejects the configuration
    pub fn build(self) -> Result<KafkaEventPublisher, KafkaConfigError> {
        let brokers = self
            .brokers
            .filter(|b| !b.trim().is_empty())
            .ok_or(KafkaConfigError::MissingBrokers)?;
        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        let acks = self.acks.unwrap_or_else(|| DEFAULT_ACKS.to_string());

        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &brokers)
            .set("message.timeout.ms", timeout.as_millis().to_string())
            .set("acks", &acks)
            .create()
            .map_err(|e| KafkaConfigError::Producer(e.to_string()))?;

        info!(
            brokers = %brokers,
            acks = %acks,
            timeout_ms = timeout.as_millis() as u64,
            "KafkaEventPublisher created"
        );

        Ok(KafkaEventPublisher {
            producer,
            brokers,
            timeout,
        })
    }
}

impl EventPublisher for KafkaEventPublisher {
    fn publish(
        &self,
        stream: &str,
        key: &[u8],
        payload: &[u8],
    ) -> impl Future<Output = Result<(), PublishError>> + Send {
        let producer = self.producer.clone();
        let timeout = self.timeout;

        async move {
            let record = FutureRecord::to(stream).key(key).payload(payload);

            match producer.send(record, Timeout::After(timeout)).await {
                Ok((partition, offset)) => {
                    debug!(
                        topic = %stream,
                        partition = partition,
                        offset = offset,
                        "Event published"
                    );
                    Ok(())
                }
                Err((kafka_error, _)) => {
                    error!(topic = %stream, error = %kafka_error, "Failed to publish event");
                    Err(PublishError::new(format!(
                        "publish to '{stream}' failed: {kafka_error}"
                    )))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_brokers() {
        let result = KafkaEventPublisher::builder().build();
        assert!(matches!(result, Err(KafkaConfigError::MissingBrokers)));

        let result = KafkaEventPublisher::builder().brokers("  ").build();
        assert!(matches!(result, Err(KafkaConfigError::MissingBrokers)));
    }

    #[test]
    fn test_builder_keeps_settings() {
        let publisher = KafkaEventPublisher::builder()
            .brokers("localhost:9092")
            .timeout(Duration::from_millis(250))
            .build()
            .unwrap();

        assert_eq!(publisher.brokers(), "localhost:9092");
        assert_eq!(publisher.timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_builder_rejects_invalid_acks() {
        let result = KafkaEventPublisher::builder()
            .brokers("localhost:9092")
            .acks("sometimes")
            .build();
        assert!(matches!(result, Err(KafkaConfigError::Producer(_))));
    }

    #[tokio::test]
    async fn test_publish_to_unreachable_broker_fails() {
        let publisher = KafkaEventPublisher::builder()
            .brokers("127.0.0.1:1")
            .timeout(Duration::from_millis(200))
            .build()
            .unwrap();

        let result = publisher
            .publish("company-events", b"0123456789abcdef", b"{}")
            .await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("company-events"));
    }
}
