//! Domain events and their delivery state
//!
//! Every successful mutation produces exactly one `CompanyEvent`. Because the
//! store write and the stream publish cannot be made atomic, each event goes
//! through an explicit delivery state machine:
//!
//! ```text
//!             ┌──────────► Published
//!  Written ───┤
//!             └──────────► FailedToPublish
//! ```
//!
//! `Written` means the store mutation is durable. Every transition is logged
//! with the company id and event type, which is what an out-of-band
//! reconciler needs to find and re-emit unannounced mutations.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::company::{
    entity::Company,
    error::{CompanyError, Operation},
};

/// What happened to the company
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Created,
    Updated,
    Deleted,
}

impl EventKind {
    /// Wire label, as used in the event `type` field
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Created => "created",
            EventKind::Updated => "updated",
            EventKind::Deleted => "deleted",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A completed mutation, as published on the stream
///
/// Wire form: `{"type": "created", "company": {...}}`. For `deleted` the
/// snapshot is the state immediately before removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub company: Company,
}

impl CompanyEvent {
    /// Create an event carrying a snapshot of `company`
    pub fn new(kind: EventKind, company: Company) -> Self {
        Self { kind, company }
    }

    /// Partition key: raw bytes of the company id, so per-company order holds
    pub fn partition_key(&self) -> &[u8] {
        self.company.id().as_bytes()
    }

    /// JSON body of the stream message
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Where an event stands relative to its store mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    Written,
    Published,
    FailedToPublish,
}

impl DeliveryState {
    /// Label used in the `delivery_state` log field
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryState::Written => "written",
            DeliveryState::Published => "published",
            DeliveryState::FailedToPublish => "failed-to-publish",
        }
    }

    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DeliveryState::Written)
    }
}

impl fmt::Display for DeliveryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event whose store mutation is durable but which is not yet announced
///
/// Consuming `mark_published` or `mark_failed` is the only way out of the
/// `Written` state, so an event cannot be resolved twice.
#[derive(Debug)]
#[must_use = "a written event must be marked published or failed"]
pub struct PendingDelivery {
    operation: Operation,
    event: CompanyEvent,
}

impl PendingDelivery {
    /// Record that the store mutation behind `event` has been written
    pub fn written(operation: Operation, event: CompanyEvent) -> Self {
        info!(
            company_id = %event.company.id(),
            event_type = %event.kind,
            delivery_state = %DeliveryState::Written,
            "Company mutation written"
        );
        Self { operation, event }
    }

    /// Current delivery state, always `Written` while the value exists
    pub fn state(&self) -> DeliveryState {
        DeliveryState::Written
    }

    /// The event awaiting delivery
    pub fn event(&self) -> &CompanyEvent {
        &self.event
    }

    /// The event reached the stream
    pub fn mark_published(self) -> CompanyEvent {
        info!(
            company_id = %self.event.company.id(),
            event_type = %self.event.kind,
            delivery_state = %DeliveryState::Published,
            "Company event published"
        );
        self.event
    }

    /// The event did not reach the stream; the mutation stays in place
    pub fn mark_failed(self, reason: impl Into<String>) -> CompanyError {
        let reason = reason.into();
        error!(
            company_id = %self.event.company.id(),
            event_type = %self.event.kind,
            delivery_state = %DeliveryState::FailedToPublish,
            error = %reason,
            "Company event not published after durable write"
        );
        CompanyError::publish_failed(self.operation, self.event, reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::company::{
        entity::{CompanyType, NewCompany},
        error::ErrorKind,
        ids::CompanyId,
    };

    fn acme() -> Company {
        Company::from_new(
            CompanyId::new(),
            NewCompany {
                name: "Acme".to_string(),
                description: None,
                employee_count: 10,
                is_registered: true,
                company_type: CompanyType::NonProfit,
            },
        )
    }

    #[test]
    fn test_event_wire_format() {
        let company = acme();
        let event = CompanyEvent::new(EventKind::Created, company.clone());

        let value: serde_json::Value = serde_json::from_slice(&event.encode().unwrap()).unwrap();

        assert_eq!(value["type"], "created");
        assert_eq!(value["company"]["id"], company.id().to_string());
        assert_eq!(value["company"]["name"], "Acme");
        assert_eq!(value["company"]["employeeCount"], 10);
        assert!(value["company"]["description"].is_null());
    }

    #[test]
    fn test_partition_key_is_raw_id_bytes() {
        let company = acme();
        let event = CompanyEvent::new(EventKind::Deleted, company.clone());
        assert_eq!(event.partition_key(), company.id().as_bytes());
        assert_eq!(event.partition_key().len(), 16);
    }

    #[test]
    fn test_pending_delivery_published() {
        let pending = PendingDelivery::written(
            Operation::Update,
            CompanyEvent::new(EventKind::Updated, acme()),
        );
        assert_eq!(pending.state(), DeliveryState::Written);
        assert!(!pending.state().is_terminal());

        let event = pending.mark_published();
        assert_eq!(event.kind, EventKind::Updated);
    }

    #[test]
    fn test_pending_delivery_failed_keeps_event() {
        let company = acme();
        let pending = PendingDelivery::written(
            Operation::Delete,
            CompanyEvent::new(EventKind::Deleted, company.clone()),
        );

        let err = pending.mark_failed("broker unavailable");

        assert_eq!(err.kind(), ErrorKind::Publish);
        assert_eq!(err.undelivered_event().unwrap().company, company);
        assert!(DeliveryState::FailedToPublish.is_terminal());
    }
}
