//! Company domain module
//!
//! This module contains the company entity, its merge-patch updates, the
//! events announcing each mutation and the lifecycle service tying them to
//! the store and stream ports.

pub mod entity;
pub mod error;
pub mod event;
pub mod ids;
pub mod patch;
pub mod ports;
pub mod service;

pub use entity::{Company, CompanyType, NewCompany};
pub use error::{CompanyError, ErrorKind, Operation, PublishError, Result, StoreError};
pub use event::{CompanyEvent, DeliveryState, EventKind, PendingDelivery};
pub use ids::{CompanyId, IdGenerator, UuidV7Generator};
pub use patch::{CompanyPatch, FieldChange};
pub use ports::CompanyLifecycle;
pub use service::{CompanyService, ServiceConfig, DEFAULT_STREAM};
