//! HTTP handlers

pub mod area;
pub mod auth;
pub mod business;
pub mod category;
pub mod customer;
pub mod customer_bill;
pub mod health;
pub mod item;
pub mod location;
pub mod stock;
pub mod supplier;
pub mod supplier_bill;

pub use area::*;
pub use auth::*;
pub use business::*;
pub use category::*;
pub use customer::*;
pub use customer_bill::*;
pub use health::*;
pub use item::*;
pub use location::*;
pub use stock::*;
pub use supplier::*;
pub use supplier_bill::*;
