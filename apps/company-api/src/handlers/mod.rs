//! HTTP handlers

pub mod company;
mod error;

pub use error::ApiError;
