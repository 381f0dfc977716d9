//! Domain models for the Inventory & Billing platform

mod billing;
mod business;
mod catalog;
mod customer;
mod stock;
mod user;

pub use billing::*;
pub use business::*;
pub use catalog::*;
pub use customer::*;
pub use stock::*;
pub use user::*;
