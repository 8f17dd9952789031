//! Port trait for the company lifecycle service
//!
//! The HTTP layer depends on this trait rather than on the concrete
//! `CompanyService<R, P, G>`, so handlers can be exercised against any
//! store/publisher combination.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::company::{
    entity::{Company, NewCompany},
    error::CompanyError,
    ids::CompanyId,
    patch::CompanyPatch,
};

/// Port trait for lifecycle operations
///
/// Every operation takes the caller's cancellation token; cancelling it
/// aborts the in-flight store or stream call.
pub trait CompanyLifecycle: Send + Sync {
    /// Create a company and announce it
    ///
    /// # Returns
    ///
    /// The stored company, including its assigned id
    ///
    /// # Errors
    ///
    /// - `CompanyError::Validation` if the input breaks a field constraint
    /// - `CompanyError::Conflict` if the name is taken
    /// - `CompanyError::Persistence` if the store call fails
    /// - `CompanyError::Publish` if the company was stored but not announced
    fn create(
        &self,
        ctx: &CancellationToken,
        company: NewCompany,
    ) -> impl Future<Output = Result<Company, CompanyError>> + Send;

    /// Merge `patch` into the stored company and announce the new state
    ///
    /// # Errors
    ///
    /// - `CompanyError::NotFound` if no company has this id
    /// - `CompanyError::Conflict` if the patch renames onto a taken name
    /// - `CompanyError::Persistence` / `CompanyError::Publish` as for `create`
    fn update(
        &self,
        ctx: &CancellationToken,
        id: CompanyId,
        patch: CompanyPatch,
    ) -> impl Future<Output = Result<(), CompanyError>> + Send;

    /// Remove the company and announce its last state
    ///
    /// # Errors
    ///
    /// - `CompanyError::NotFound` if no company has this id
    /// - `CompanyError::Persistence` / `CompanyError::Publish` as for `create`
    fn delete(
        &self,
        ctx: &CancellationToken,
        id: CompanyId,
    ) -> impl Future<Output = Result<(), CompanyError>> + Send;

    /// Read a company, `Ok(None)` when it does not exist
    fn get(
        &self,
        ctx: &CancellationToken,
        id: CompanyId,
    ) -> impl Future<Output = Result<Option<Company>, CompanyError>> + Send;
}
