//! Database-backed workflow tests
//!
//! These run against a real PostgreSQL database named by
//! `IB_TEST_DATABASE_URL` and are skipped when it is not set. Every test
//! creates its own business, locations and items so runs can share one
//! database.

use chrono::Utc;
use inventory_billing_backend::error::AppError;
use inventory_billing_backend::middleware::AuthUser;
use inventory_billing_backend::services::location::CreateLocationInput;
use inventory_billing_backend::services::stock::{AddStockInput, CreateTransferInput, TransferLineInput};
use inventory_billing_backend::services::{CustomerBillService, LocationService, StockService};
use rust_decimal::Decimal;
use shared::{
    transfer_prefix, BillStatus, CreateCustomerBillRequest, CustomerBillLine, OrderStatus, UserRole,
};
use sqlx::PgPool;
use uuid::Uuid;

const ENV_DB_URL: &str = "IB_TEST_DATABASE_URL";

async fn connect() -> anyhow::Result<Option<PgPool>> {
    let url = match std::env::var(ENV_DB_URL) {
        Ok(v) => v,
        Err(_) => {
            eprintln!("SKIP: {} not set", ENV_DB_URL);
            return Ok(None);
        }
    };

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(8)
        .connect(&url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(Some(pool))
}

fn tag() -> String {
    Uuid::new_v4().simple().to_string()[..10].to_string()
}

// ============================================================================
// Fixtures
// ============================================================================

async fn insert_business(pool: &PgPool) -> anyhow::Result<Uuid> {
    let id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO businesses (name, business_type) VALUES ($1, 'retail') RETURNING id",
    )
    .bind(format!("Test business {}", tag()))
    .fetch_one(pool)
    .await?;
    Ok(id)
}

async fn insert_user(pool: &PgPool, role: UserRole, business_id: Uuid) -> anyhow::Result<AuthUser> {
    let email = format!("{}@example.com", tag());
    let user_id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO users (username, email, password_hash, role, business_id)
        VALUES ($1, $2, 'not-a-real-hash', $3, $4)
        RETURNING id
        "#,
    )
    .bind(format!("user-{}", tag()))
    .bind(&email)
    .bind(role)
    .bind(business_id)
    .fetch_one(pool)
    .await?;

    Ok(AuthUser {
        user_id,
        email,
        role,
        business_id: Some(business_id),
    })
}

/// Item with its own supplier and category
async fn insert_item(pool: &PgPool, cost_price: i64) -> anyhow::Result<Uuid> {
    let category_id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO categories (category_name, category_code, category_type) VALUES ('Soap', 'SOAP', 'goods') RETURNING id",
    )
    .fetch_one(pool)
    .await?;

    let supplier_id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO suppliers (supplier_code, supplier_name, address, phone_number, contact_person)
        VALUES ('SUP1', $1, 'Main street', $2, 'Nimal')
        RETURNING id
        "#,
    )
    .bind(format!("Supplier {}", tag()))
    .bind(tag())
    .fetch_one(pool)
    .await?;

    let item_id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO items (item_code, item_name, cost_price, mrp, selling_price, unit_type, supplier_id, category_id)
        VALUES ($1, 'Lavender soap', $2, $3, $3, 'pcs', $4, $5)
        RETURNING id
        "#,
    )
    .bind(format!("IT-{}", tag()))
    .bind(Decimal::from(cost_price))
    .bind(Decimal::from(cost_price * 2))
    .bind(supplier_id)
    .bind(category_id)
    .fetch_one(pool)
    .await?;
    Ok(item_id)
}

async fn insert_customer(pool: &PgPool) -> anyhow::Result<Uuid> {
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO customers (customer_code, customer_name, shop_name, contact_number)
        VALUES ($1, 'Kamal', 'Kamal Stores', $2)
        RETURNING id
        "#,
    )
    .bind(format!("T{}", tag()))
    .bind(tag())
    .fetch_one(pool)
    .await?;
    Ok(id)
}

async fn create_location(
    locations: &LocationService,
    business_id: Uuid,
    main: Option<bool>,
) -> Result<inventory_billing_backend::services::location::StockLocation, AppError> {
    locations
        .create_location(CreateLocationInput {
            location_code: format!("LOC-{}", tag()),
            location_name: "Store".into(),
            business_id,
            responsible_user_id: None,
            parent_location_id: None,
            main,
        })
        .await
}

async fn stock_of(pool: &PgPool, item_id: Uuid, location_id: Uuid) -> anyhow::Result<i32> {
    let quantity = sqlx::query_scalar::<_, i32>(
        "SELECT quantity FROM stocks WHERE item_id = $1 AND location_id = $2",
    )
    .bind(item_id)
    .bind(location_id)
    .fetch_optional(pool)
    .await?;
    Ok(quantity.unwrap_or(0))
}

async fn add_stock(stock: &StockService, item_id: Uuid, location_id: Uuid, quantity: i32) -> anyhow::Result<()> {
    stock
        .add_stock(AddStockInput {
            item_id,
            location_id,
            quantity,
        })
        .await?;
    Ok(())
}

fn transfer(source: Uuid, destination: Uuid, lines: &[(Uuid, i32)]) -> CreateTransferInput {
    CreateTransferInput {
        source_location_id: source,
        destination_location_id: destination,
        transfer_date: None,
        notes: None,
        items: lines
            .iter()
            .map(|(item_id, quantity)| TransferLineInput {
                item_id: *item_id,
                requested_quantity: *quantity,
                unit_cost: None,
            })
            .collect(),
    }
}

fn order_request(customer_id: Uuid, location_id: Uuid, item_id: Uuid, quantity: i32, free: i32) -> CreateCustomerBillRequest {
    CreateCustomerBillRequest {
        customer_id,
        invoice_no: None,
        billing_date: None,
        payment_method: None,
        status: None,
        extra_discount: None,
        extra_discount_amount: None,
        notes: None,
        location_id: Some(location_id),
        items: vec![CustomerBillLine {
            item_id: Some(item_id),
            item_code: None,
            item_name: None,
            unit_price: Decimal::ZERO,
            quantity,
            unit: None,
            discount_percentage: None,
            free_quantity: Some(free),
            notes: None,
        }],
    }
}

fn sequence_of(transfer_number: &str) -> u32 {
    transfer_number
        .rsplit('-')
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0)
}

// ============================================================================
// Stock transfers
// ============================================================================

#[tokio::test]
async fn transfer_moves_stock_and_numbers_by_day() -> anyhow::Result<()> {
    let Some(pool) = connect().await? else { return Ok(()) };
    let locations = LocationService::new(pool.clone());
    let stock = StockService::new(pool.clone());

    let business_id = insert_business(&pool).await?;
    let admin = insert_user(&pool, UserRole::Admin, business_id).await?;
    let source = create_location(&locations, business_id, None).await?;
    let destination = create_location(&locations, business_id, None).await?;
    let item_id = insert_item(&pool, 25).await?;
    add_stock(&stock, item_id, source.id, 10).await?;

    let first = stock
        .create_stock_transfer(transfer(source.id, destination.id, &[(item_id, 3), (item_id, 1)]), admin.user_id)
        .await?;
    assert!(first.transfer_number.starts_with(&transfer_prefix(Utc::now().date_naive())));
    assert_eq!(stock_of(&pool, item_id, source.id).await?, 6);
    assert_eq!(stock_of(&pool, item_id, destination.id).await?, 4);

    let detail = stock.get_transfer(first.transfer_id).await?;
    assert_eq!(detail.transfer.total_items, 2);
    assert_eq!(detail.transfer.total_quantity, 4);
    assert_eq!(detail.transfer.total_value, Decimal::from(100));
    assert!(detail
        .items
        .iter()
        .all(|line| line.shipped_quantity == line.requested_quantity
            && line.received_quantity == line.requested_quantity));

    let second = stock
        .create_stock_transfer(transfer(source.id, destination.id, &[(item_id, 2)]), admin.user_id)
        .await?;
    assert_ne!(first.transfer_number, second.transfer_number);
    assert!(sequence_of(&second.transfer_number) > sequence_of(&first.transfer_number));
    Ok(())
}

#[tokio::test]
async fn transfer_shortage_rolls_back_every_line() -> anyhow::Result<()> {
    let Some(pool) = connect().await? else { return Ok(()) };
    let locations = LocationService::new(pool.clone());
    let stock = StockService::new(pool.clone());

    let business_id = insert_business(&pool).await?;
    let admin = insert_user(&pool, UserRole::Admin, business_id).await?;
    let source = create_location(&locations, business_id, None).await?;
    let destination = create_location(&locations, business_id, None).await?;
    let plenty = insert_item(&pool, 10).await?;
    let scarce = insert_item(&pool, 10).await?;
    add_stock(&stock, plenty, source.id, 5).await?;
    add_stock(&stock, scarce, source.id, 2).await?;

    let result = stock
        .create_stock_transfer(transfer(source.id, destination.id, &[(plenty, 3), (scarce, 10)]), admin.user_id)
        .await;
    assert!(matches!(result, Err(AppError::InsufficientStock(_))));

    assert_eq!(stock_of(&pool, plenty, source.id).await?, 5);
    assert_eq!(stock_of(&pool, scarce, source.id).await?, 2);
    assert_eq!(stock_of(&pool, plenty, destination.id).await?, 0);

    let transfers = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM stock_transfers WHERE source_location_id = $1",
    )
    .bind(source.id)
    .fetch_one(&pool)
    .await?;
    assert_eq!(transfers, 0);
    Ok(())
}

#[tokio::test]
async fn concurrent_transfers_never_oversell() -> anyhow::Result<()> {
    let Some(pool) = connect().await? else { return Ok(()) };
    let locations = LocationService::new(pool.clone());
    let stock = StockService::new(pool.clone());

    let business_id = insert_business(&pool).await?;
    let admin = insert_user(&pool, UserRole::Admin, business_id).await?;
    let source = create_location(&locations, business_id, None).await?;
    let destination = create_location(&locations, business_id, None).await?;
    let item_id = insert_item(&pool, 10).await?;
    add_stock(&stock, item_id, source.id, 10).await?;

    let (a, b) = tokio::join!(
        stock.create_stock_transfer(transfer(source.id, destination.id, &[(item_id, 6)]), admin.user_id),
        stock.create_stock_transfer(transfer(source.id, destination.id, &[(item_id, 6)]), admin.user_id),
    );
    assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
    assert_eq!(stock_of(&pool, item_id, source.id).await?, 4);
    assert_eq!(stock_of(&pool, item_id, destination.id).await?, 6);
    Ok(())
}

// ============================================================================
// Order confirmation
// ============================================================================

#[tokio::test]
async fn order_confirmation_deducts_stock_exactly_once() -> anyhow::Result<()> {
    let Some(pool) = connect().await? else { return Ok(()) };
    let locations = LocationService::new(pool.clone());
    let stock = StockService::new(pool.clone());
    let bills = CustomerBillService::new(pool.clone());

    let business_id = insert_business(&pool).await?;
    let admin = insert_user(&pool, UserRole::Admin, business_id).await?;
    let rep = insert_user(&pool, UserRole::Representative, business_id).await?;
    let store = create_location(&locations, business_id, None).await?;
    let item_id = insert_item(&pool, 40).await?;
    let customer_id = insert_customer(&pool).await?;
    add_stock(&stock, item_id, store.id, 10).await?;

    let order = bills
        .create_customer_bill(order_request(customer_id, store.id, item_id, 3, 1), &rep)
        .await?;
    assert!(order.bill.is_order);
    assert!(order.bill.invoice_no.starts_with("ORD-"));
    assert_eq!(order.bill.order_status, Some(OrderStatus::Pending));
    assert_eq!(stock_of(&pool, item_id, store.id).await?, 10);

    let denied = bills.confirm_order(order.bill.id, &rep).await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));

    let confirmed = bills.confirm_order(order.bill.id, &admin).await?;
    assert_eq!(confirmed.bill.order_status, Some(OrderStatus::Confirmed));
    assert_eq!(confirmed.bill.status, BillStatus::Pending);
    assert!(confirmed.bill.order_confirmed_at.is_some());
    assert_eq!(confirmed.bill.confirmed_by.map(|u| u.id), Some(admin.user_id));
    assert_eq!(stock_of(&pool, item_id, store.id).await?, 6);

    let again = bills.confirm_order(order.bill.id, &admin).await;
    assert!(matches!(again, Err(AppError::InvalidStateTransition(_))));
    assert_eq!(stock_of(&pool, item_id, store.id).await?, 6);
    Ok(())
}

#[tokio::test]
async fn concurrent_confirmations_deduct_once() -> anyhow::Result<()> {
    let Some(pool) = connect().await? else { return Ok(()) };
    let locations = LocationService::new(pool.clone());
    let stock = StockService::new(pool.clone());
    let bills = CustomerBillService::new(pool.clone());

    let business_id = insert_business(&pool).await?;
    let admin = insert_user(&pool, UserRole::Admin, business_id).await?;
    let rep = insert_user(&pool, UserRole::Representative, business_id).await?;
    let store = create_location(&locations, business_id, None).await?;
    let item_id = insert_item(&pool, 40).await?;
    let customer_id = insert_customer(&pool).await?;
    add_stock(&stock, item_id, store.id, 20).await?;

    let order = bills
        .create_customer_bill(order_request(customer_id, store.id, item_id, 5, 0), &rep)
        .await?;

    let (a, b) = tokio::join!(
        bills.confirm_order(order.bill.id, &admin),
        bills.confirm_order(order.bill.id, &admin),
    );
    assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
    assert_eq!(stock_of(&pool, item_id, store.id).await?, 15);
    Ok(())
}

#[tokio::test]
async fn confirming_an_order_without_stock_changes_nothing() -> anyhow::Result<()> {
    let Some(pool) = connect().await? else { return Ok(()) };
    let locations = LocationService::new(pool.clone());
    let stock = StockService::new(pool.clone());
    let bills = CustomerBillService::new(pool.clone());

    let business_id = insert_business(&pool).await?;
    let admin = insert_user(&pool, UserRole::Admin, business_id).await?;
    let rep = insert_user(&pool, UserRole::Representative, business_id).await?;
    let store = create_location(&locations, business_id, None).await?;
    let item_id = insert_item(&pool, 40).await?;
    let customer_id = insert_customer(&pool).await?;
    add_stock(&stock, item_id, store.id, 4).await?;

    // 4 on hand, 4 ordered plus 1 free
    let order = bills
        .create_customer_bill(order_request(customer_id, store.id, item_id, 4, 1), &rep)
        .await?;
    let result = bills.confirm_order(order.bill.id, &admin).await;
    assert!(matches!(result, Err(AppError::InsufficientStock(_))));

    let unchanged = bills.get_bill(order.bill.id).await?;
    assert_eq!(unchanged.bill.order_status, Some(OrderStatus::Pending));
    assert_eq!(stock_of(&pool, item_id, store.id).await?, 4);
    Ok(())
}

// ============================================================================
// Locations
// ============================================================================

#[tokio::test]
async fn one_main_location_per_business() -> anyhow::Result<()> {
    let Some(pool) = connect().await? else { return Ok(()) };
    let locations = LocationService::new(pool.clone());

    let business_id = insert_business(&pool).await?;
    let first = create_location(&locations, business_id, Some(false)).await?;
    assert!(first.is_main);

    let second = create_location(&locations, business_id, None).await?;
    assert!(!second.is_main);

    let another_main = create_location(&locations, business_id, Some(true)).await;
    assert!(matches!(another_main, Err(AppError::Conflict(_))));

    let main = locations.main_location_for_business(business_id).await?;
    assert_eq!(main.id, first.id);
    Ok(())
}

#[tokio::test]
async fn location_delete_guards() -> anyhow::Result<()> {
    let Some(pool) = connect().await? else { return Ok(()) };
    let locations = LocationService::new(pool.clone());
    let stock = StockService::new(pool.clone());

    let business_id = insert_business(&pool).await?;
    let main = create_location(&locations, business_id, None).await?;
    let stocked = create_location(&locations, business_id, None).await?;
    let empty = create_location(&locations, business_id, None).await?;
    let item_id = insert_item(&pool, 10).await?;
    add_stock(&stock, item_id, stocked.id, 2).await?;

    let result = locations.delete_location(main.id).await;
    assert!(matches!(result, Err(AppError::InvalidStateTransition(_))));

    let result = locations.delete_location(stocked.id).await;
    assert!(matches!(result, Err(AppError::InvalidStateTransition(_))));
    assert_eq!(stock_of(&pool, item_id, stocked.id).await?, 2);

    locations.delete_location(empty.id).await?;
    let result = locations.get_location(empty.id).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
    Ok(())
}
