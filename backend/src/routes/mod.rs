//! Route definitions for the Inventory & Billing API

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes; everything except health, register and login
/// requires a bearer token
pub fn api_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/auth/profile", get(handlers::profile))
        .nest("/businesses", business_routes())
        .nest("/areas", area_routes())
        .nest("/categories", category_routes())
        .nest("/suppliers", supplier_routes())
        .nest("/items", item_routes())
        .nest("/customers", customer_routes())
        .nest("/locations", location_routes())
        .nest("/stocks", stock_routes())
        .nest("/supplier-bills", supplier_bill_routes())
        .nest("/customer-bills", customer_bill_routes())
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .merge(protected)
}

fn business_routes() -> Router<AppState> {
    Router::new().route(
        "/",
        get(handlers::list_businesses).post(handlers::create_business),
    )
}

fn area_routes() -> Router<AppState> {
    Router::new().route("/", get(handlers::list_areas).post(handlers::create_area))
}

fn category_routes() -> Router<AppState> {
    Router::new().route(
        "/",
        get(handlers::list_categories).post(handlers::create_category),
    )
}

fn supplier_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_suppliers).post(handlers::create_supplier),
        )
        .route("/dropdown", get(handlers::supplier_dropdown))
        .route(
            "/:supplier_id",
            get(handlers::get_supplier)
                .put(handlers::update_supplier)
                .delete(handlers::delete_supplier),
        )
}

fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_items).post(handlers::create_item))
        .route("/:item_id", get(handlers::get_item))
}

fn customer_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_customers).post(handlers::create_customer),
        )
        .route("/:customer_id", get(handlers::get_customer))
}

fn location_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_locations).post(handlers::create_location),
        )
        .route("/dropdown", get(handlers::location_dropdown))
        .route("/main", get(handlers::list_main_locations))
        .route("/main/:business_id", get(handlers::main_location_for_business))
        .route(
            "/:location_id",
            get(handlers::get_location)
                .put(handlers::update_location)
                .delete(handlers::delete_location),
        )
}

fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_stocks).post(handlers::add_stock))
        .route("/export", get(handlers::export_stocks_csv))
        .route(
            "/transfers",
            get(handlers::list_transfers).post(handlers::create_stock_transfer),
        )
        .route("/transfers/:transfer_id", get(handlers::get_transfer))
}

fn supplier_bill_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_supplier_bills).post(handlers::create_supplier_bill),
        )
        .route("/:bill_id", get(handlers::get_supplier_bill))
}

fn customer_bill_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_customer_bills).post(handlers::create_customer_bill),
        )
        .route("/frontend", post(handlers::create_customer_bill_from_frontend))
        .route("/validate", post(handlers::validate_customer_bill))
        .route("/orders", get(handlers::list_orders))
        .route("/my-orders", get(handlers::my_orders))
        .route("/:bill_id", get(handlers::get_customer_bill))
        .route("/:bill_id/order", get(handlers::get_order))
        .route("/:bill_id/confirm", patch(handlers::confirm_order))
        .route("/:bill_id/checking", patch(handlers::move_to_checking))
        .route("/:bill_id/delivered", patch(handlers::mark_delivered))
        .route("/:bill_id/cancel", patch(handlers::cancel_order))
        .route("/:bill_id/payments", post(handlers::record_payment))
}
