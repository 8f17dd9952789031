//! Company API - HTTP boundary of the company service
//!
//! Exposes the lifecycle operations over HTTP, behind bearer-token
//! authentication. The binary in `main.rs` wires the MongoDB store and the
//! Kafka publisher into a [`CompanyService`](company_domain::CompanyService);
//! tests wire in-memory doubles instead.

pub mod auth;
pub mod config;
pub mod dto;
pub mod handlers;
pub mod routes;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::auth::TokenVerifier;

/// Application state shared across handlers
pub struct AppState<S> {
    pub service: Arc<S>,
    pub verifier: TokenVerifier,
    /// Cancelled when the server shuts down
    pub shutdown: CancellationToken,
}

impl<S> AppState<S> {
    /// Wrap the service for sharing across handlers
    pub fn new(service: S, verifier: TokenVerifier, shutdown: CancellationToken) -> Self {
        Self {
            service: Arc::new(service),
            verifier,
            shutdown,
        }
    }
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            verifier: self.verifier.clone(),
            shutdown: self.shutdown.clone(),
        }
    }
}
