//! # Company Domain Layer
//!
//! This crate contains the business rules for the company service. It follows
//! hexagonal architecture principles:
//!
//! - **Entities**: Core domain models (Company, CompanyEvent)
//! - **Ports**: Trait definitions for external dependencies (CompanyRepository, EventPublisher)
//! - **Services**: Lifecycle orchestration (CompanyService)
//!
//! ## Architecture
//!
//! This layer has NO dependencies on infrastructure concerns (MongoDB, Kafka, HTTP).
//! The document store and the message stream are reached only through the
//! ports, implemented by adapter crates.
//!
//! ## Example
//!
//! ```rust
//! use company_domain::company::{CompanyService, CompanyType, NewCompany};
//! use company_domain::ports::{CompanyRepository, EventPublisher};
//! use tokio_util::sync::CancellationToken;
//!
//! async fn example<R: CompanyRepository, P: EventPublisher>(service: CompanyService<R, P>) {
//!     let ctx = CancellationToken::new();
//!     let input = NewCompany {
//!         name: "Acme".to_string(),
//!         description: None,
//!         employee_count: 10,
//!         is_registered: true,
//!         company_type: CompanyType::NonProfit,
//!     };
//!     let company = service.create(&ctx, input).await.unwrap();
//!     println!("Created company: {}", company.id());
//! }
//! ```

pub mod company;
pub mod ports;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export commonly used types
pub use company::{Company, CompanyError, CompanyEvent, CompanyId, CompanyService};
pub use ports::{CompanyRepository, EventPublisher};
