//! Business logic services for the Inventory & Billing platform

pub mod area;
pub mod auth;
pub mod business;
pub mod category;
pub mod customer;
pub mod customer_bill;
pub mod item;
pub mod location;
pub mod stock;
pub mod supplier;
pub mod supplier_bill;

pub use area::AreaService;
pub use auth::AuthService;
pub use business::BusinessService;
pub use category::CategoryService;
pub use customer::CustomerService;
pub use customer_bill::CustomerBillService;
pub use item::ItemService;
pub use location::LocationService;
pub use stock::StockService;
pub use supplier::SupplierService;
pub use supplier_bill::SupplierBillService;
