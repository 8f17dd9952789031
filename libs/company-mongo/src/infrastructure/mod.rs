//! Infrastructure adapters

mod mongo_repository;

pub use mongo_repository::{MongoCompanyRepository, MongoSettings};
