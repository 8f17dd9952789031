//! In-memory port implementations for tests
//!
//! `InMemoryCompanyRepository` behaves like a keyed document store with
//! single-document operations; `RecordingPublisher` captures what would have
//! been sent to the stream. Both can be told to fail deterministically.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use crate::{
    company::{
        entity::Company,
        error::{PublishError, StoreError},
        event::CompanyEvent,
        ids::CompanyId,
        patch::CompanyPatch,
    },
    ports::{CompanyRepository, EventPublisher},
};

/// Repository operation, used to target fault injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepoOp {
    Insert,
    FindById,
    FindByName,
    UpdateFields,
    DeleteById,
}

#[derive(Default)]
struct StoreState {
    documents: HashMap<CompanyId, Company>,
    unique_names: bool,
    /// Remaining successful calls before the operation starts failing
    failures: HashMap<RepoOp, usize>,
}

impl StoreState {
    fn check_fault(&mut self, op: RepoOp) -> Result<(), StoreError> {
        match self.failures.get_mut(&op) {
            Some(0) => Err(StoreError::backend(format!("injected {op:?} failure"))),
            Some(remaining) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn name_taken_by_other(&self, name: &str, id: &CompanyId) -> bool {
        self.documents
            .values()
            .any(|c| c.name() == name && c.id() != id)
    }
}

/// Keyed document store held in memory
#[derive(Clone, Default)]
pub struct InMemoryCompanyRepository {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryCompanyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject duplicate names at write time, like a unique index would
    pub fn with_unique_index() -> Self {
        let repo = Self::new();
        repo.lock().unique_names = true;
        repo
    }

    /// Make every call to `op` fail from now on
    pub fn fail_on(&self, op: RepoOp) {
        self.fail_after(op, 0);
    }

    /// Let `successes` calls to `op` through, then fail every following call
    pub fn fail_after(&self, op: RepoOp, successes: usize) {
        self.lock().failures.insert(op, successes);
    }

    /// Number of stored companies
    pub fn len(&self) -> usize {
        self.lock().documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored state of one company, bypassing fault injection
    pub fn stored(&self, id: &CompanyId) -> Option<Company> {
        self.lock().documents.get(id).cloned()
    }

    pub fn all(&self) -> Vec<Company> {
        self.lock().documents.values().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CompanyRepository for InMemoryCompanyRepository {
    fn insert(&self, company: &Company) -> impl Future<Output = Result<(), StoreError>> + Send {
        let company = company.clone();
        let state = self.state.clone();

        async move {
            let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
            state.check_fault(RepoOp::Insert)?;
            if state.documents.contains_key(company.id()) {
                return Err(StoreError::backend(format!(
                    "duplicate key {}",
                    company.id()
                )));
            }
            if state.unique_names && state.name_taken_by_other(company.name(), company.id()) {
                return Err(StoreError::DuplicateName(company.name().to_string()));
            }
            state.documents.insert(*company.id(), company);
            Ok(())
        }
    }

    fn find_by_id(
        &self,
        id: &CompanyId,
    ) -> impl Future<Output = Result<Option<Company>, StoreError>> + Send {
        let id = *id;
        let state = self.state.clone();

        async move {
            let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
            state.check_fault(RepoOp::FindById)?;
            Ok(state.documents.get(&id).cloned())
        }
    }

    fn find_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Company>, StoreError>> + Send {
        let name = name.to_string();
        let state = self.state.clone();

        async move {
            let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
            state.check_fault(RepoOp::FindByName)?;
            Ok(state.documents.values().find(|c| c.name() == name).cloned())
        }
    }

    fn update_fields(
        &self,
        id: &CompanyId,
        patch: &CompanyPatch,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send {
        let id = *id;
        let patch = patch.clone();
        let state = self.state.clone();

        async move {
            let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
            state.check_fault(RepoOp::UpdateFields)?;
            if let Some(name) = patch.new_name() {
                if state.unique_names && state.name_taken_by_other(name, &id) {
                    return Err(StoreError::DuplicateName(name.to_string()));
                }
            }
            match state.documents.get_mut(&id) {
                Some(current) => {
                    *current = patch.apply(current);
                    Ok(true)
                }
                None => Ok(false),
            }
        }
    }

    fn delete_by_id(&self, id: &CompanyId) -> impl Future<Output = Result<bool, StoreError>> + Send {
        let id = *id;
        let state = self.state.clone();

        async move {
            let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
            state.check_fault(RepoOp::DeleteById)?;
            Ok(state.documents.remove(&id).is_some())
        }
    }
}

/// A message captured by `RecordingPublisher`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub stream: String,
    pub key: Vec<u8>,
    pub payload: Vec<u8>,
}

impl PublishedMessage {
    /// Decode the payload back into a domain event
    pub fn event(&self) -> Result<CompanyEvent, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }
}

/// Publisher that records messages instead of sending them
#[derive(Clone, Default)]
pub struct RecordingPublisher {
    messages: Arc<Mutex<Vec<PublishedMessage>>>,
    failing: Arc<AtomicBool>,
    stalled: Arc<AtomicBool>,
    publish_started: Arc<Notify>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every publish while set
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Never complete a publish while set; only cancellation gets the caller out
    pub fn set_stalled(&self, stalled: bool) {
        self.stalled.store(stalled, Ordering::SeqCst);
    }

    /// Notified each time a publish call starts
    pub fn publish_started(&self) -> Arc<Notify> {
        self.publish_started.clone()
    }

    /// Messages accepted so far, in publish order
    pub fn messages(&self) -> Vec<PublishedMessage> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Recorded messages decoded as events, skipping undecodable payloads
    pub fn events(&self) -> Vec<CompanyEvent> {
        self.messages()
            .iter()
            .filter_map(|m| m.event().ok())
            .collect()
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish(
        &self,
        stream: &str,
        key: &[u8],
        payload: &[u8],
    ) -> impl Future<Output = Result<(), PublishError>> + Send {
        let message = PublishedMessage {
            stream: stream.to_string(),
            key: key.to_vec(),
            payload: payload.to_vec(),
        };
        let messages = self.messages.clone();
        let failing = self.failing.load(Ordering::SeqCst);
        let stalled = self.stalled.load(Ordering::SeqCst);
        let started = self.publish_started.clone();

        async move {
            started.notify_one();
            if stalled {
                std::future::pending::<()>().await;
            }
            if failing {
                return Err(PublishError::new("injected publish failure"));
            }
            messages
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(message);
            Ok(())
        }
    }
}
