mod common;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use storefront_api::{
    dto::{
        admin::UpdateOrderStatusRequest, cart::AddToCartRequest, orders::PlaceOrderRequest,
        products::UpdateProductRequest,
    },
    error::AppError,
    models::{Order, OrderStatus, PaymentMethod},
    routes::params::OrderListQuery,
    services::{admin_service, cart_service, order_service, product_service},
    state::AppState,
    store::{KvStore, MemoryStore, StoreError, keys, load_list, save_list},
};

fn slow_payment_state() -> AppState {
    let mut config = common::test_config();
    config.payment_delay = std::time::Duration::from_millis(300);
    AppState::in_memory(config)
}

/// Memory store that refuses to write the order list.
struct OrdersUnwritable(MemoryStore);

#[async_trait]
impl KvStore for OrdersUnwritable {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.0.get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        if key == keys::ORDERS {
            return Err(StoreError::Io(std::io::Error::other("disk full")));
        }
        self.0.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.0.remove(key).await
    }
}

// Customer adds to cart -> places order -> product is edited -> cancels; admin overrides status.
#[tokio::test]
async fn checkout_cancel_and_admin_override_flow() -> anyhow::Result<()> {
    let state = common::test_state();
    let admin = common::default_admin(&state).await;
    let customer = common::register_customer(&state, "sita@example.com", "Sita").await;

    let product = common::add_product(&state, &admin, "Test Lipstick", Decimal::new(1000, 0), 10).await;

    cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            product_id: product.id,
            quantity: 2,
        },
    )
    .await?;

    let order = order_service::place_order(&state, &customer, common::checkout_request("9812345678"))
        .await?
        .data
        .expect("order");

    assert_eq!(order.subtotal, Decimal::new(2000, 0));
    assert_eq!(order.shipping, Decimal::ZERO);
    assert_eq!(order.tax, Decimal::new(360, 0));
    assert_eq!(order.total, Decimal::new(2360, 0));
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.billing_address, order.shipping_address);
    assert_eq!(order.payment_method, PaymentMethod::Cod);

    // Checkout clears the cart.
    let cart = cart_service::get_cart(&state, &customer).await?.data.expect("cart");
    assert!(cart.items.is_empty());

    // Editing the product does not touch the stored snapshot.
    product_service::update_product(
        &state,
        &admin,
        product.id,
        UpdateProductRequest {
            name: Some("Renamed Lipstick".into()),
            price: Some(Decimal::new(5000, 0)),
            ..Default::default()
        },
    )
    .await?;
    let detail = order_service::get_order(&state, &customer, order.id)
        .await?
        .data
        .expect("order detail");
    assert_eq!(detail.order.items[0].product.name, "Test Lipstick");
    assert_eq!(detail.order.items[0].product.price, Decimal::new(1000, 0));
    assert!(detail.can_cancel);
    assert!(detail.cancel_time_remaining.is_some());

    // Self-service cancellation is one way.
    let cancelled = order_service::cancel_order(&state, &customer, order.id)
        .await?
        .data
        .expect("cancelled order");
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    let again = order_service::cancel_order(&state, &customer, order.id).await;
    assert!(matches!(again, Err(AppError::BadRequest(_))));

    // Admin transitions are unrestricted, even out of cancelled.
    let shipped = admin_service::update_order_status(
        &state,
        &admin,
        order.id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Shipped,
        },
    )
    .await?
    .data
    .expect("updated order");
    assert_eq!(shipped.status, OrderStatus::Shipped);
    let admin_view = admin_service::get_order_admin(&state, &admin, order.id)
        .await?
        .data
        .expect("order detail");
    assert_eq!(admin_view.order.status, OrderStatus::Shipped);
    assert!(!admin_view.can_cancel);

    let stats = admin_service::dashboard(&state, &admin).await?.data.expect("stats");
    assert_eq!(stats.total_orders, 1);
    assert_eq!(stats.total_revenue, Decimal::new(2360, 0));
    assert_eq!(stats.total_customers, 1);
    assert_eq!(stats.total_products, 1);

    Ok(())
}

#[tokio::test]
async fn small_order_pays_flat_shipping() -> anyhow::Result<()> {
    let state = common::test_state();
    let admin = common::default_admin(&state).await;
    let customer = common::register_customer(&state, "ram@example.com", "Ram").await;
    let product = common::add_product(&state, &admin, "Mascara", Decimal::new(150, 0), 5).await;

    cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            product_id: product.id,
            quantity: 2,
        },
    )
    .await?;

    let order = order_service::place_order(&state, &customer, common::checkout_request("9800000001"))
        .await?
        .data
        .expect("order");
    assert_eq!(order.subtotal, Decimal::new(300, 0));
    assert_eq!(order.shipping, Decimal::new(99, 0));
    assert_eq!(order.tax, Decimal::new(54, 0));
    assert_eq!(order.total, Decimal::new(453, 0));
    Ok(())
}

#[tokio::test]
async fn rejected_checkout_keeps_the_cart() -> anyhow::Result<()> {
    let state = common::test_state();
    let admin = common::default_admin(&state).await;
    let customer = common::register_customer(&state, "gita@example.com", "Gita").await;
    let product = common::add_product(&state, &admin, "Brush Set", Decimal::new(1899, 0), 3).await;

    let missing_phone = order_service::place_order(&state, &customer, common::checkout_request("")).await;
    assert!(matches!(missing_phone, Err(AppError::BadRequest(msg)) if msg == "Phone number is required"));

    let empty_cart =
        order_service::place_order(&state, &customer, common::checkout_request("9812345678")).await;
    assert!(matches!(empty_cart, Err(AppError::BadRequest(_))));

    cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            product_id: product.id,
            quantity: 1,
        },
    )
    .await?;

    let bad_phone =
        order_service::place_order(&state, &customer, common::checkout_request("9712345678")).await;
    assert!(matches!(bad_phone, Err(AppError::BadRequest(_))));

    let mut incomplete = common::checkout_request("9812345678");
    incomplete.shipping_address.city = "  ".into();
    let result = order_service::place_order(&state, &customer, incomplete).await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    let cart = cart_service::get_cart(&state, &customer).await?.data.expect("cart");
    assert_eq!(cart.total_items, 1);

    let orders: Vec<Order> = load_list(state.store.as_ref(), keys::ORDERS).await?;
    assert!(orders.is_empty());
    Ok(())
}

#[tokio::test]
async fn separate_billing_address_is_kept() -> anyhow::Result<()> {
    let state = common::test_state();
    let admin = common::default_admin(&state).await;
    let customer = common::register_customer(&state, "hari@example.com", "Hari").await;
    let product = common::add_product(&state, &admin, "Gown", Decimal::new(8999, 0), 2).await;
    cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            product_id: product.id,
            quantity: 1,
        },
    )
    .await?;

    let mut billing = common::address();
    billing.city = "Pokhara".into();
    let request = PlaceOrderRequest {
        billing_address: Some(billing.clone()),
        same_as_shipping: false,
        payment_method: PaymentMethod::Card,
        ..common::checkout_request("9812345678")
    };
    let order = order_service::place_order(&state, &customer, request)
        .await?
        .data
        .expect("order");
    assert_eq!(order.billing_address, billing);
    assert_eq!(order.shipping_address.city, "Kathmandu");
    Ok(())
}

#[tokio::test]
async fn cancellation_closes_after_a_day() -> anyhow::Result<()> {
    let state = common::test_state();
    let admin = common::default_admin(&state).await;
    let customer = common::register_customer(&state, "maya@example.com", "Maya").await;
    let product = common::add_product(&state, &admin, "Palette", Decimal::new(3299, 0), 4).await;
    cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            product_id: product.id,
            quantity: 1,
        },
    )
    .await?;
    let order = order_service::place_order(&state, &customer, common::checkout_request("9812345678"))
        .await?
        .data
        .expect("order");

    // Backdate the stored order past the window.
    let mut orders: Vec<Order> = load_list(state.store.as_ref(), keys::ORDERS).await?;
    orders[0].created_at = Utc::now() - Duration::hours(25);
    save_list(state.store.as_ref(), keys::ORDERS, &orders).await?;

    let result = order_service::cancel_order(&state, &customer, order.id).await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    let detail = order_service::get_order(&state, &customer, order.id)
        .await?
        .data
        .expect("detail");
    assert!(!detail.can_cancel);
    assert_eq!(detail.order.status, OrderStatus::Pending);
    Ok(())
}

#[tokio::test]
async fn customers_only_see_their_own_orders() -> anyhow::Result<()> {
    let state = common::test_state();
    let admin = common::default_admin(&state).await;
    let alice = common::register_customer(&state, "alice@example.com", "Alice").await;
    let bob = common::register_customer(&state, "bob@example.com", "Bob").await;
    let product = common::add_product(&state, &admin, "Dress", Decimal::new(4599, 0), 10).await;

    let mut placed = Vec::new();
    for customer in [&alice, &alice, &bob] {
        cart_service::add_to_cart(
            &state,
            customer,
            AddToCartRequest {
                product_id: product.id,
                quantity: 1,
            },
        )
        .await?;
        let order = order_service::place_order(&state, customer, common::checkout_request("9812345678"))
            .await?
            .data
            .expect("order");
        placed.push(order);
    }

    let resp = order_service::list_orders(&state, &alice, OrderListQuery::default()).await?;
    let meta = resp.meta.clone().expect("meta");
    let mine = resp.data.expect("orders").items;
    assert_eq!(mine.len(), 2);
    assert_eq!(meta.total, Some(2));
    assert!(mine.iter().all(|o| o.user_id == alice.user_id));
    assert!(mine[0].created_at >= mine[1].created_at);

    let foreign = order_service::get_order(&state, &alice, placed[2].id).await;
    assert!(matches!(foreign, Err(AppError::NotFound)));
    let foreign_cancel = order_service::cancel_order(&state, &alice, placed[2].id).await;
    assert!(matches!(foreign_cancel, Err(AppError::NotFound)));

    order_service::cancel_order(&state, &alice, placed[0].id).await?;
    let pending = order_service::list_orders(
        &state,
        &alice,
        OrderListQuery {
            status: Some(OrderStatus::Pending),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("orders")
    .items;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, placed[1].id);

    let forbidden = admin_service::list_all_orders(&state, &alice, OrderListQuery::default()).await;
    assert!(matches!(forbidden, Err(AppError::Forbidden)));

    let all = admin_service::list_all_orders(&state, &admin, OrderListQuery::default())
        .await?
        .data
        .expect("orders")
        .items;
    assert_eq!(all.len(), 3);

    let customers = admin_service::list_customers(&state, &admin)
        .await?
        .data
        .expect("customers")
        .items;
    let alice_summary = customers
        .iter()
        .find(|c| c.customer.id == alice.user_id)
        .expect("alice listed");
    assert_eq!(alice_summary.order_count, 2);
    assert_eq!(alice_summary.total_spent, placed[0].total + placed[1].total);
    Ok(())
}

#[tokio::test]
async fn items_added_during_payment_stay_in_the_cart() -> anyhow::Result<()> {
    let state = slow_payment_state();
    let admin = common::default_admin(&state).await;
    let customer = common::register_customer(&state, "nabin@example.com", "Nabin").await;
    let first = common::add_product(&state, &admin, "Cleanser", Decimal::new(600, 0), 5).await;
    let second = common::add_product(&state, &admin, "Sunscreen", Decimal::new(450, 0), 5).await;

    cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            product_id: first.id,
            quantity: 1,
        },
    )
    .await?;

    let checkout = tokio::spawn({
        let state = state.clone();
        let customer = customer.clone();
        async move {
            order_service::place_order(&state, &customer, common::checkout_request("9812345678")).await
        }
    });

    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            product_id: second.id,
            quantity: 1,
        },
    )
    .await?;

    let order = checkout.await??.data.expect("order");
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].product.id, first.id);

    let cart = cart_service::get_cart(&state, &customer).await?.data.expect("cart");
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].product.id, second.id);
    Ok(())
}

#[tokio::test]
async fn double_submit_places_one_order() -> anyhow::Result<()> {
    let state = slow_payment_state();
    let admin = common::default_admin(&state).await;
    let customer = common::register_customer(&state, "sarita@example.com", "Sarita").await;
    let product = common::add_product(&state, &admin, "Eyeliner", Decimal::new(800, 0), 5).await;

    cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            product_id: product.id,
            quantity: 1,
        },
    )
    .await?;

    let (a, b) = tokio::join!(
        order_service::place_order(&state, &customer, common::checkout_request("9812345678")),
        order_service::place_order(&state, &customer, common::checkout_request("9812345678")),
    );
    assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
    let rejected = if a.is_err() { a } else { b };
    assert!(matches!(rejected, Err(AppError::BadRequest(msg)) if msg == "Cart is empty"));

    let orders: Vec<Order> = load_list(state.store.as_ref(), keys::ORDERS).await?;
    assert_eq!(orders.len(), 1);
    Ok(())
}

#[tokio::test]
async fn failed_order_write_keeps_the_cart() -> anyhow::Result<()> {
    let store = Arc::new(OrdersUnwritable(MemoryStore::new()));
    let state = AppState::new(store, common::test_config());
    let admin = common::default_admin(&state).await;
    let customer = common::register_customer(&state, "dipak@example.com", "Dipak").await;
    let product = common::add_product(&state, &admin, "Nail Kit", Decimal::new(350, 0), 5).await;

    cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            product_id: product.id,
            quantity: 2,
        },
    )
    .await?;

    let result =
        order_service::place_order(&state, &customer, common::checkout_request("9812345678")).await;
    assert!(matches!(result, Err(AppError::Store(StoreError::Io(_)))));

    let cart = cart_service::get_cart(&state, &customer).await?.data.expect("cart");
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.total_items, 2);

    let orders: Vec<Order> = load_list(state.store.as_ref(), keys::ORDERS).await?;
    assert!(orders.is_empty());
    Ok(())
}
