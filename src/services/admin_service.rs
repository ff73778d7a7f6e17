use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::{
        admin::{CustomerList, CustomerSummary, DashboardStats, UpdateOrderStatusRequest},
        orders::{OrderDetail, OrderList},
        products::ProductList,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Order, Role},
    response::{ApiResponse, Meta},
    routes::params::{LowStockQuery, OrderListQuery},
    services::{
        auth_service::load_users,
        order_service::{order_detail, sort_by_created},
        product_service::load_products,
    },
    state::AppState,
    store::{keys, load_list, save_list},
};

pub const DEFAULT_LOW_STOCK_THRESHOLD: u32 = 5;

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    let mut orders: Vec<Order> = load_orders(state)
        .await?
        .into_iter()
        .filter(|o| query.status.is_none_or(|s| o.status == s))
        .collect();

    sort_by_created(&mut orders, query.sort_order.unwrap_or_default());

    let (items, meta) = query.pagination().apply(orders);
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

pub async fn get_order_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderDetail>> {
    ensure_admin(user)?;
    let order = load_orders(state)
        .await?
        .into_iter()
        .find(|o| o.id == id)
        .ok_or(AppError::NotFound)?;

    Ok(ApiResponse::success(
        "Order found",
        order_detail(order, chrono::Utc::now()),
        Some(Meta::empty()),
    ))
}

/// Set any status on any order. There is no transition check on this path.
pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;

    let (order, previous) = {
        let _gate = state.write_gate.lock().await;
        let mut orders = load_orders(state).await?;
        let order = orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(AppError::NotFound)?;
        let previous = order.status;
        order.status = payload.status;
        let updated = order.clone();
        save_list(state.store.as_ref(), keys::ORDERS, &orders).await?;
        (updated, previous)
    };

    log_audit(
        Some(user.user_id),
        "order_status_update",
        Some("orders"),
        Some(serde_json::json!({
            "order_id": order.id,
            "from": previous.as_str(),
            "status": order.status.as_str(),
        })),
    );

    Ok(ApiResponse::success(
        "Order updated",
        order,
        Some(Meta::empty()),
    ))
}

pub async fn list_customers(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<CustomerList>> {
    ensure_admin(user)?;
    let orders = load_orders(state).await?;
    let items: Vec<CustomerSummary> = load_users(state)
        .await?
        .into_iter()
        .filter(|u| u.role == Role::Customer)
        .map(|u| {
            let placed: Vec<&Order> = orders.iter().filter(|o| o.user_id == u.id).collect();
            CustomerSummary {
                order_count: placed.len(),
                total_spent: placed.iter().map(|o| o.total).sum(),
                customer: u.profile(),
            }
        })
        .collect();

    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Customers", CustomerList { items }, Some(meta)))
}

pub async fn dashboard(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<DashboardStats>> {
    ensure_admin(user)?;
    let orders = load_orders(state).await?;
    let users = load_users(state).await?;
    let products = load_products(state).await?;

    let stats = DashboardStats {
        total_revenue: orders.iter().map(|o| o.total).sum::<Decimal>(),
        total_orders: orders.len(),
        total_customers: users.iter().filter(|u| u.role == Role::Customer).count(),
        total_products: products.len(),
    };
    Ok(ApiResponse::success("Dashboard", stats, Some(Meta::empty())))
}

pub async fn list_low_stock(
    state: &AppState,
    user: &AuthUser,
    query: LowStockQuery,
) -> AppResult<ApiResponse<ProductList>> {
    ensure_admin(user)?;
    let threshold = query.threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD);

    let mut low: Vec<_> = load_products(state)
        .await?
        .into_iter()
        .filter(|p| p.stock <= threshold)
        .collect();
    low.sort_by(|a, b| a.stock.cmp(&b.stock).then_with(|| a.name.cmp(&b.name)));

    let (items, meta) = query.pagination().apply(low);
    Ok(ApiResponse::success("Low stock", ProductList { items }, Some(meta)))
}

async fn load_orders(state: &AppState) -> AppResult<Vec<Order>> {
    Ok(load_list(state.store.as_ref(), keys::ORDERS).await?)
}
