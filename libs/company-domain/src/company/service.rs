//! Company lifecycle service - Business logic orchestration
//!
//! The service assigns ids, enforces name uniqueness, performs the store
//! mutation and then announces it on the event stream.
//!
//! ## Consistency contract
//!
//! - The store write always happens before the publish. A failed write fails
//!   the operation and nothing is announced.
//! - A successful write followed by a failed publish is reported as a
//!   failure (`CompanyError::Publish`). The write is not rolled back and the
//!   publish is not retried here; the error carries the undelivered event.
//! - `update` and `delete` read the company to build the event. If that
//!   read fails after the mutation, the operation fails with the mutation
//!   already applied.
//! - The name check and the insert are two separate store calls. Two
//!   concurrent creates with the same name can both pass the check; a unique
//!   index in the store turns that race into a `Conflict` on insert.

use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::{
    entity::{Company, NewCompany},
    error::{CompanyError, Operation, PublishError, Result, StoreError},
    event::{CompanyEvent, EventKind, PendingDelivery},
    ids::{CompanyId, IdGenerator, UuidV7Generator},
    patch::CompanyPatch,
    ports::CompanyLifecycle,
};
use crate::ports::{CompanyRepository, EventPublisher};

/// Default stream for company events
pub const DEFAULT_STREAM: &str = "company-events";

/// Configuration for the lifecycle service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Stream every company event is published to
    pub stream_name: String,
    /// Look the name up before inserting or renaming
    pub enforce_unique_names: bool,
    /// Publish an event after each successful mutation
    pub emit_events: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            stream_name: DEFAULT_STREAM.to_string(),
            enforce_unique_names: true,
            emit_events: true,
        }
    }
}

/// Service managing the company lifecycle
///
/// Generic over its store, publisher and id source. It holds no mutable
/// state of its own and needs no locking; concurrent requests coordinate
/// only through the store.
pub struct CompanyService<R, P, G = UuidV7Generator> {
    repository: R,
    publisher: P,
    ids: G,
    config: ServiceConfig,
}

impl<R, P> CompanyService<R, P, UuidV7Generator>
where
    R: CompanyRepository,
    P: EventPublisher,
{
    /// Create a service with UUID v7 ids and default configuration
    pub fn with_defaults(repository: R, publisher: P) -> Self {
        Self::new(repository, publisher, UuidV7Generator, ServiceConfig::default())
    }
}

impl<R, P, G> CompanyService<R, P, G>
where
    R: CompanyRepository,
    P: EventPublisher,
    G: IdGenerator,
{
    /// Create a new CompanyService from its collaborators
    ///
    /// # Arguments
    ///
    /// * `repository` - Persistence gateway for company documents
    /// * `publisher` - Sink for lifecycle events
    /// * `ids` - Source of identifiers for new companies
    /// * `config` - Stream name and feature toggles
    pub fn new(repository: R, publisher: P, ids: G, config: ServiceConfig) -> Self {
        Self {
            repository,
            publisher,
            ids,
            config,
        }
    }

    /// Create a company and announce it
    ///
    /// This method:
    /// 1. Validates the input and assigns a fresh id
    /// 2. Rejects the name if another company holds it (when enabled)
    /// 3. Inserts the company
    /// 4. Publishes a `created` event (when enabled)
    ///
    /// # Arguments
    ///
    /// * `ctx` - Cancellation token for the request
    /// * `company` - Creation input, without an id
    ///
    /// # Returns
    ///
    /// The stored company, including its assigned id
    ///
    /// # Errors
    ///
    /// Returns `Validation`, `Conflict`, `Persistence` or `Cancelled` with
    /// nothing written, or `Publish` after the insert already succeeded
    #[instrument(skip(self, ctx, company), fields(company_name = %company.name))]
    pub async fn create(&self, ctx: &CancellationToken, company: NewCompany) -> Result<Company> {
        let company = company.validate()?;
        let id = self.ids.next_id();
        let op = Operation::Create;

        if self.config.enforce_unique_names {
            let holder = guarded(ctx, op, id, self.repository.find_by_name(&company.name)).await?;
            if holder.is_some() {
                warn!(company_name = %company.name, "Company name already taken");
                return Err(CompanyError::conflict(company.name));
            }
        }

        let company = Company::from_new(id, company);
        guarded(ctx, op, id, self.repository.insert(&company)).await?;
        info!(company_id = %id, "Company stored");

        self.announce(ctx, op, CompanyEvent::new(EventKind::Created, company.clone()))
            .await?;

        Ok(company)
    }

    /// Merge a patch into the stored company, re-read it and announce it
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the company does not exist and `Conflict` if a
    /// rename targets a name held by another company. A `Publish` error means
    /// the update is stored but was not announced.
    #[instrument(skip(self, ctx, patch), fields(company_id = %id))]
    pub async fn update(
        &self,
        ctx: &CancellationToken,
        id: CompanyId,
        patch: CompanyPatch,
    ) -> Result<()> {
        let op = Operation::Update;

        let current = guarded(ctx, op, id, self.repository.find_by_id(&id))
            .await?
            .ok_or_else(|| not_found(op, id))?;

        if self.config.enforce_unique_names {
            if let Some(name) = patch.new_name().filter(|name| *name != current.name()) {
                let holder = guarded(ctx, op, id, self.repository.find_by_name(name)).await?;
                if holder.is_some_and(|holder| holder.id() != &id) {
                    warn!(company_name = %name, "Rename target already taken");
                    return Err(CompanyError::conflict(name));
                }
            }
        }

        let matched = guarded(ctx, op, id, self.repository.update_fields(&id, &patch)).await?;
        if !matched {
            return Err(not_found(op, id));
        }
        info!(fields = patch.changes().len(), "Company updated");

        let updated = guarded(ctx, op, id, self.repository.find_by_id(&id))
            .await?
            .ok_or_else(|| {
                error!("Company vanished before its update could be announced");
                CompanyError::from_store(
                    op,
                    id,
                    StoreError::backend("company was removed before its update could be read back"),
                )
            })?;

        self.announce(ctx, op, CompanyEvent::new(EventKind::Updated, updated))
            .await
    }

    /// Snapshot the company, remove it, then announce the snapshot
    #[instrument(skip(self, ctx), fields(company_id = %id))]
    pub async fn delete(&self, ctx: &CancellationToken, id: CompanyId) -> Result<()> {
        let op = Operation::Delete;

        let snapshot = guarded(ctx, op, id, self.repository.find_by_id(&id))
            .await?
            .ok_or_else(|| not_found(op, id))?;

        let removed = guarded(ctx, op, id, self.repository.delete_by_id(&id)).await?;
        if !removed {
            // Lost a race with a concurrent delete, which announces it instead
            return Err(not_found(op, id));
        }
        info!("Company deleted");

        self.announce(ctx, op, CompanyEvent::new(EventKind::Deleted, snapshot))
            .await
    }

    /// Fetch a company by id
    ///
    /// # Arguments
    ///
    /// * `ctx` - Cancellation token for the request
    /// * `id` - Company to look up
    ///
    /// # Returns
    ///
    /// `Ok(None)` when the company does not exist. Never publishes.
    #[instrument(skip(self, ctx), fields(company_id = %id))]
    pub async fn get(&self, ctx: &CancellationToken, id: CompanyId) -> Result<Option<Company>> {
        guarded(ctx, Operation::Get, id, self.repository.find_by_id(&id)).await
    }

    /// Publish the event for a mutation that is already durable
    async fn announce(
        &self,
        ctx: &CancellationToken,
        operation: Operation,
        event: CompanyEvent,
    ) -> Result<()> {
        if !self.config.emit_events {
            debug!(event_type = %event.kind, "Event emission disabled");
            return Ok(());
        }

        let pending = PendingDelivery::written(operation, event);

        let payload = match pending.event().encode() {
            Ok(payload) => payload,
            Err(err) => return Err(pending.mark_failed(format!("failed to encode event: {err}"))),
        };

        let outcome: std::result::Result<(), PublishError> = {
            let event = pending.event();
            tokio::select! {
                biased;
                _ = ctx.cancelled() => Err(PublishError::new("cancelled before the event was published")),
                result = self.publisher.publish(&self.config.stream_name, event.partition_key(), &payload) => result,
            }
        };

        match outcome {
            Ok(()) => {
                pending.mark_published();
                Ok(())
            }
            Err(err) => Err(pending.mark_failed(err.to_string())),
        }
    }
}

impl<R, P, G> CompanyLifecycle for CompanyService<R, P, G>
where
    R: CompanyRepository,
    P: EventPublisher,
    G: IdGenerator,
{
    fn create(
        &self,
        ctx: &CancellationToken,
        company: NewCompany,
    ) -> impl Future<Output = Result<Company>> + Send {
        CompanyService::create(self, ctx, company)
    }

    fn update(
        &self,
        ctx: &CancellationToken,
        id: CompanyId,
        patch: CompanyPatch,
    ) -> impl Future<Output = Result<()>> + Send {
        CompanyService::update(self, ctx, id, patch)
    }

    fn delete(&self, ctx: &CancellationToken, id: CompanyId) -> impl Future<Output = Result<()>> + Send {
        CompanyService::delete(self, ctx, id)
    }

    fn get(
        &self,
        ctx: &CancellationToken,
        id: CompanyId,
    ) -> impl Future<Output = Result<Option<Company>>> + Send {
        CompanyService::get(self, ctx, id)
    }
}

/// Run one store call, aborting it if the caller cancels first
async fn guarded<T, F>(
    ctx: &CancellationToken,
    operation: Operation,
    id: CompanyId,
    call: F,
) -> Result<T>
where
    F: Future<Output = std::result::Result<T, StoreError>>,
{
    tokio::select! {
        biased;
        _ = ctx.cancelled() => {
            warn!(%operation, company_id = %id, "Operation cancelled");
            Err(CompanyError::Cancelled { operation, id })
        }
        result = call => result.map_err(|err| {
            let err = CompanyError::from_store(operation, id, err);
            if let CompanyError::Persistence { .. } = &err {
                error!(%operation, company_id = %id, error = %err, "Store call failed");
            }
            err
        }),
    }
}

fn not_found(operation: Operation, id: CompanyId) -> CompanyError {
    warn!(%operation, company_id = %id, "Company not found");
    CompanyError::NotFound(id)
}
