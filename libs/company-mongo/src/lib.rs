//! MongoDB adapter for the company persistence port
//!
//! Companies are stored one document per company, keyed by the canonical
//! UUID string in `_id`. Name uniqueness is backed by a unique index so
//! concurrent creates with the same name cannot both succeed.

pub mod infrastructure;

pub use infrastructure::{MongoCompanyRepository, MongoSettings};
