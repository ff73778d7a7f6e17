use std::{sync::LazyLock, time::Duration as StdDuration};

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::{OrderDetail, OrderList, PlaceOrderRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{CartItem, Order, OrderStatus},
    pricing::{CartTotals, format_amount},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::cart_service::cart_too_large,
    state::AppState,
    store::{keys, load_list, save_list},
};

/// Customers may cancel within this many hours of placing an order.
pub const CANCELLATION_WINDOW_HOURS: i64 = 24;

static NEPAL_PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^98\d{8}$").expect("phone pattern is valid"));

/// Nepal mobile numbers: `98` followed by eight digits.
pub fn is_valid_phone(phone: &str) -> bool {
    NEPAL_PHONE.is_match(phone)
}

/// Time left to self-cancel, or `None` once the window closed or the status no longer allows it.
pub fn cancellation_window(order: &Order, now: DateTime<Utc>) -> Option<Duration> {
    if !order.status.is_self_cancellable() {
        return None;
    }
    let remaining = order.created_at + Duration::hours(CANCELLATION_WINDOW_HOURS) - now;
    (remaining > Duration::zero()).then_some(remaining)
}

pub fn can_cancel(order: &Order, now: DateTime<Utc>) -> bool {
    cancellation_window(order, now).is_some()
}

/// `5 hours`, or `42 minutes` under one hour.
pub fn format_time_remaining(remaining: Duration) -> String {
    if remaining < Duration::hours(1) {
        format!("{} minutes", remaining.num_minutes())
    } else {
        format!("{} hours", remaining.num_hours())
    }
}

pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
    payload: PlaceOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    let phone = payload.customer_phone.trim();
    if phone.is_empty() {
        return Err(AppError::BadRequest("Phone number is required".into()));
    }
    if !is_valid_phone(phone) {
        return Err(AppError::BadRequest(
            "Please enter a valid Nepal phone number (98XXXXXXXX)".into(),
        ));
    }
    if !payload.shipping_address.is_complete() {
        return Err(AppError::BadRequest("Shipping address is incomplete".into()));
    }
    let billing_address = match (payload.same_as_shipping, payload.billing_address) {
        (false, Some(billing)) => {
            if !billing.is_complete() {
                return Err(AppError::BadRequest("Billing address is incomplete".into()));
            }
            billing
        }
        _ => payload.shipping_address.clone(),
    };

    // Taking the lines out makes a concurrent checkout of the same cart see it empty.
    let items = take_cart(state, user.user_id).await;
    if items.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    let Some(totals) = CartTotals::from_items(&items) else {
        restore_cart(state, user.user_id, items).await;
        return Err(cart_too_large());
    };
    let order = Order {
        id: Uuid::new_v4(),
        user_id: user.user_id,
        customer_phone: phone.to_string(),
        items,
        subtotal: totals.subtotal,
        tax: totals.tax,
        shipping: totals.shipping,
        total: totals.total,
        status: OrderStatus::Pending,
        created_at: Utc::now(),
        shipping_address: payload.shipping_address,
        billing_address,
        payment_method: payload.payment_method,
    };

    simulate_payment(state.config.payment_delay, &order).await;

    if let Err(err) = append_order(state, &order).await {
        tracing::warn!(order_id = %order.id, error = %err, "order append failed, restoring cart");
        restore_cart(state, user.user_id, order.items).await;
        return Err(err);
    }

    log_audit(
        Some(user.user_id),
        "checkout",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "total": format_amount(order.total) })),
    );

    Ok(ApiResponse::success(
        "Order placed",
        order,
        Some(Meta::empty()),
    ))
}

async fn append_order(state: &AppState, order: &Order) -> AppResult<()> {
    let _gate = state.write_gate.lock().await;
    let mut orders: Vec<Order> = load_list(state.store.as_ref(), keys::ORDERS).await?;
    orders.push(order.clone());
    save_list(state.store.as_ref(), keys::ORDERS, &orders).await?;
    Ok(())
}

async fn take_cart(state: &AppState, user_id: Uuid) -> Vec<CartItem> {
    state
        .carts
        .write()
        .await
        .remove(&user_id)
        .unwrap_or_default()
}

/// Put checked-out lines back in front of anything added meanwhile.
async fn restore_cart(state: &AppState, user_id: Uuid, mut items: Vec<CartItem>) {
    let mut carts = state.carts.write().await;
    let cart = carts.entry(user_id).or_default();
    for added in cart.drain(..) {
        match items.iter_mut().find(|item| item.product.id == added.product.id) {
            Some(item) => item.quantity = item.quantity.saturating_add(added.quantity),
            None => items.push(added),
        }
    }
    *cart = items;
}

async fn simulate_payment(delay: StdDuration, order: &Order) {
    tracing::debug!(
        order_id = %order.id,
        method = ?order.payment_method,
        amount = %format_amount(order.total),
        delay_ms = delay.as_millis() as u64,
        "processing payment"
    );
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let orders: Vec<Order> = load_list(state.store.as_ref(), keys::ORDERS).await?;
    let mut mine: Vec<Order> = orders
        .into_iter()
        .filter(|o| o.user_id == user.user_id)
        .filter(|o| query.status.is_none_or(|s| o.status == s))
        .collect();

    sort_by_created(&mut mine, query.sort_order.unwrap_or_default());

    let (items, meta) = query.pagination().apply(mine);
    Ok(ApiResponse::success("Ok", OrderList { items }, Some(meta)))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderDetail>> {
    let orders: Vec<Order> = load_list(state.store.as_ref(), keys::ORDERS).await?;
    let order = orders
        .into_iter()
        .find(|o| o.id == id && o.user_id == user.user_id)
        .ok_or(AppError::NotFound)?;

    Ok(ApiResponse::success(
        "OK",
        order_detail(order, Utc::now()),
        Some(Meta::empty()),
    ))
}

/// Self-service cancellation. Once cancelled there is no way back through this path.
pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    let order = {
        let _gate = state.write_gate.lock().await;
        let mut orders: Vec<Order> = load_list(state.store.as_ref(), keys::ORDERS).await?;
        let order = orders
            .iter_mut()
            .find(|o| o.id == id && o.user_id == user.user_id)
            .ok_or(AppError::NotFound)?;

        if !can_cancel(order, Utc::now()) {
            return Err(AppError::BadRequest(
                "Order can no longer be cancelled".into(),
            ));
        }
        order.status = OrderStatus::Cancelled;
        let cancelled = order.clone();
        save_list(state.store.as_ref(), keys::ORDERS, &orders).await?;
        cancelled
    };

    log_audit(
        Some(user.user_id),
        "order_cancel",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id })),
    );

    Ok(ApiResponse::success(
        "Order cancelled",
        order,
        Some(Meta::empty()),
    ))
}

pub(crate) fn order_detail(order: Order, now: DateTime<Utc>) -> OrderDetail {
    let remaining = cancellation_window(&order, now);
    OrderDetail {
        can_cancel: remaining.is_some(),
        cancel_time_remaining: remaining.map(format_time_remaining),
        order,
    }
}

pub(crate) fn sort_by_created(orders: &mut [Order], sort_order: SortOrder) {
    match sort_order {
        SortOrder::Asc => orders.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        SortOrder::Desc => orders.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    }
}
