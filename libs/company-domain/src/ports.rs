//! Ports (trait definitions) for external dependencies
//!
//! The domain defines what it needs from the document store and the message
//! stream; adapter crates provide the implementations.
//!
//! ## Static Dispatch
//!
//! We use native Rust async traits with `impl Future` return types instead of
//! `async_trait` so the service is monomorphized over its collaborators.

use std::future::Future;
use std::sync::Arc;

use crate::company::{
    entity::Company,
    error::{PublishError, StoreError},
    ids::CompanyId,
    patch::CompanyPatch,
};

/// Port for the persistence gateway
///
/// Every method is a single-document operation against a keyed document
/// store. No multi-document transaction is assumed, so the service cannot
/// make "check name, then insert" or "write, then publish" atomic through
/// this port.
///
/// Implementations must:
/// - Convert infrastructure errors to `StoreError::Backend`
/// - Report a unique-index rejection on `name` as `StoreError::DuplicateName`
pub trait CompanyRepository: Send + Sync {
    /// Insert a new company document
    ///
    /// # Errors
    ///
    /// `StoreError::DuplicateName` if the store enforces name uniqueness and
    /// the name is taken, `StoreError::Backend` otherwise
    fn insert(&self, company: &Company) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Look a company up by id, `Ok(None)` when absent
    fn find_by_id(
        &self,
        id: &CompanyId,
    ) -> impl Future<Output = Result<Option<Company>, StoreError>> + Send;

    /// Look a company up by exact name, `Ok(None)` when absent
    fn find_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Company>, StoreError>> + Send;

    /// Apply a `$set`-style merge of only the patched fields
    ///
    /// # Returns
    ///
    /// `true` if a document with this id existed and was matched
    fn update_fields(
        &self,
        id: &CompanyId,
        patch: &CompanyPatch,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Remove a company document
    ///
    /// # Returns
    ///
    /// `true` if a document was removed
    fn delete_by_id(&self, id: &CompanyId) -> impl Future<Output = Result<bool, StoreError>> + Send;
}

/// Port for the event publisher
///
/// A synchronous, at-least-once publish primitive: the returned future
/// resolves once the broker acknowledged the message or the send failed.
pub trait EventPublisher: Send + Sync {
    /// Push one message to `stream`, partitioned by `key`
    ///
    /// # Errors
    ///
    /// Returns `PublishError` when the broker is unreachable or rejects the
    /// message
    fn publish(
        &self,
        stream: &str,
        key: &[u8],
        payload: &[u8],
    ) -> impl Future<Output = Result<(), PublishError>> + Send;
}

// Shared, process-wide handles: the service borrows them through an `Arc`
// while bootstrap keeps ownership for shutdown.

impl<T: CompanyRepository> CompanyRepository for Arc<T> {
    fn insert(&self, company: &Company) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).insert(company)
    }

    fn find_by_id(
        &self,
        id: &CompanyId,
    ) -> impl Future<Output = Result<Option<Company>, StoreError>> + Send {
        (**self).find_by_id(id)
    }

    fn find_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Company>, StoreError>> + Send {
        (**self).find_by_name(name)
    }

    fn update_fields(
        &self,
        id: &CompanyId,
        patch: &CompanyPatch,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send {
        (**self).update_fields(id, patch)
    }

    fn delete_by_id(&self, id: &CompanyId) -> impl Future<Output = Result<bool, StoreError>> + Send {
        (**self).delete_by_id(id)
    }
}

impl<T: EventPublisher> EventPublisher for Arc<T> {
    fn publish(
        &self,
        stream: &str,
        key: &[u8],
        payload: &[u8],
    ) -> impl Future<Output = Result<(), PublishError>> + Send {
        (**self).publish(stream, key, payload)
    }
}
