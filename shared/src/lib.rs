//! Shared types and models for the Inventory & Billing platform
//!
//! This crate contains the domain types and pure business rules shared
//! between the backend, the browser client (via WASM), and tests.

pub mod invoice;
pub mod models;
pub mod sequence;
pub mod types;
pub mod validation;

pub use invoice::*;
pub use models::*;
pub use sequence::*;
pub use types::*;
pub use validation::*;
