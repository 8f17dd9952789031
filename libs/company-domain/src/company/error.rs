//! Domain errors for company lifecycle operations
//!
//! `CompanyError` is what the lifecycle service returns to its callers.
//! `StoreError` and `PublishError` are what the ports return; the service
//! wraps them with the operation name and the company id.

use std::fmt;

use thiserror::Error;

use crate::company::{event::CompanyEvent, ids::CompanyId};

/// Lifecycle operation, used as error and log context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
    Delete,
    Get,
}

impl Operation {
    /// Lowercase verb used in log fields and error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Get => "get",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by the company lifecycle service
#[derive(Error, Debug)]
pub enum CompanyError {
    /// Malformed or constraint-violating input
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Another live company already holds this name
    #[error("Company name '{name}' is already taken")]
    Conflict { name: String },

    /// No company exists with this id
    #[error("Company {0} not found")]
    NotFound(CompanyId),

    /// The document store call failed; nothing was announced
    #[error("Failed to {operation} company {id}: storage error: {message}")]
    Persistence {
        operation: Operation,
        id: CompanyId,
        message: String,
    },

    /// The store mutation is durable but its event never reached the stream
    ///
    /// The undelivered event is carried so it can be re-emitted later.
    #[error("Company {id} was {operation}d in storage but its event was not published: {message}")]
    Publish {
        operation: Operation,
        id: CompanyId,
        message: String,
        event: Box<CompanyEvent>,
    },

    /// The caller cancelled the operation while a port call was in flight
    #[error("{operation} of company {id} was cancelled")]
    Cancelled { operation: Operation, id: CompanyId },
}

/// Coarse error category, the only part of the error the boundary relies on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    Persistence,
    Publish,
    Cancelled,
}

impl CompanyError {
    /// Create a validation error with a message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a conflict error for the given name
    pub fn conflict(name: impl Into<String>) -> Self {
        Self::Conflict { name: name.into() }
    }

    /// Wrap a store failure with operation context
    ///
    /// A duplicate-key rejection from the store's own unique index is a
    /// conflict, not a storage failure.
    pub fn from_store(operation: Operation, id: CompanyId, err: StoreError) -> Self {
        match err {
            StoreError::DuplicateName(name) => Self::Conflict { name },
            StoreError::Backend(message) => Self::Persistence {
                operation,
                id,
                message,
            },
        }
    }

    /// Wrap a publish failure with operation context and the lost event
    pub fn publish_failed(
        operation: Operation,
        event: CompanyEvent,
        message: impl Into<String>,
    ) -> Self {
        Self::Publish {
            operation,
            id: *event.company.id(),
            message: message.into(),
            event: Box::new(event),
        }
    }

    /// Coarse category of this error
    ///
    /// The HTTP boundary maps status codes from this alone.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CompanyError::Validation(_) => ErrorKind::Validation,
            CompanyError::Conflict { .. } => ErrorKind::Conflict,
            CompanyError::NotFound(_) => ErrorKind::NotFound,
            CompanyError::Persistence { .. } => ErrorKind::Persistence,
            CompanyError::Publish { .. } => ErrorKind::Publish,
            CompanyError::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    /// The event that was not delivered, if this is a publish failure
    pub fn undelivered_event(&self) -> Option<&CompanyEvent> {
        match self {
            CompanyError::Publish { event, .. } => Some(event),
            _ => None,
        }
    }
}

/// Errors returned by a persistence gateway
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store's unique index on `name` rejected the write
    #[error("a company named '{0}' already exists")]
    DuplicateName(String),

    /// Any other driver or connection failure
    #[error("{0}")]
    Backend(String),
}

impl StoreError {
    /// Create a backend failure with a message
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// Error returned by an event publisher
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct PublishError(pub String);

impl PublishError {
    /// Create a publish failure with a message
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Result type alias for company operations
pub type Result<T> = std::result::Result<T, CompanyError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::company::{
        entity::{Company, CompanyType, NewCompany},
        event::EventKind,
    };

    fn sample_event() -> CompanyEvent {
        let company = Company::from_new(
            CompanyId::new(),
            NewCompany {
                name: "Acme".to_string(),
                description: None,
                employee_count: 10,
                is_registered: true,
                company_type: CompanyType::NonProfit,
            },
        );
        CompanyEvent::new(EventKind::Created, company)
    }

    #[test]
    fn test_store_duplicate_maps_to_conflict() {
        let err = CompanyError::from_store(
            Operation::Create,
            CompanyId::new(),
            StoreError::DuplicateName("Acme".to_string()),
        );
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.to_string(), "Company name 'Acme' is already taken");
    }

    #[test]
    fn test_store_backend_keeps_operation_and_id() {
        let id = CompanyId::new();
        let err = CompanyError::from_store(
            Operation::Delete,
            id,
            StoreError::backend("connection reset"),
        );
        assert_eq!(err.kind(), ErrorKind::Persistence);
        let msg = err.to_string();
        assert!(msg.contains("delete"));
        assert!(msg.contains(&id.to_string()));
        assert!(msg.contains("connection reset"));
    }

    #[test]
    fn test_publish_failure_carries_event() {
        let event = sample_event();
        let id = *event.company.id();
        let err = CompanyError::publish_failed(Operation::Create, event, "broker down");

        assert_eq!(err.kind(), ErrorKind::Publish);
        assert_eq!(err.undelivered_event().unwrap().kind, EventKind::Created);
        assert_eq!(
            err.to_string(),
            format!("Company {id} was created in storage but its event was not published: broker down")
        );
    }

    #[test]
    fn test_validation_error() {
        let err = CompanyError::validation("name must not be empty");
        assert!(matches!(err, CompanyError::Validation(_)));
        assert!(err.undelivered_event().is_none());
    }
}
