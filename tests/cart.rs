mod common;

use rust_decimal::Decimal;
use storefront_api::{
    dto::{
        cart::{AddToCartRequest, UpdateCartItemRequest},
        products::UpdateProductRequest,
    },
    error::AppError,
    services::{cart_service, product_service},
};
use uuid::Uuid;

#[tokio::test]
async fn adding_merges_lines_and_respects_stock() -> anyhow::Result<()> {
    let state = common::test_state();
    let admin = common::default_admin(&state).await;
    let customer = common::register_customer(&state, "asha@example.com", "Asha").await;
    let lipstick = common::add_product(&state, &admin, "Lipstick", Decimal::new(250, 0), 3).await;
    let blush = common::add_product(&state, &admin, "Blush", Decimal::new(100, 0), 10).await;

    for _ in 0..2 {
        cart_service::add_to_cart(
            &state,
            &customer,
            AddToCartRequest {
                product_id: lipstick.id,
                quantity: 1,
            },
        )
        .await?;
    }
    let view = cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            product_id: blush.id,
            quantity: 1,
        },
    )
    .await?
    .data
    .expect("cart");

    assert_eq!(view.items.len(), 2);
    assert_eq!(view.items[0].quantity, 2);
    assert_eq!(view.total_items, 3);
    assert_eq!(view.totals.subtotal, Decimal::new(600, 0));
    assert_eq!(view.totals.shipping, Decimal::ZERO);
    assert_eq!(view.totals.tax, Decimal::new(108, 0));
    assert_eq!(view.totals.total, Decimal::new(708, 0));

    let too_many = cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            product_id: lipstick.id,
            quantity: 2,
        },
    )
    .await;
    assert!(matches!(too_many, Err(AppError::BadRequest(_))));

    let zero = cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            product_id: blush.id,
            quantity: 0,
        },
    )
    .await;
    assert!(matches!(zero, Err(AppError::BadRequest(_))));

    let unknown = cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            product_id: Uuid::new_v4(),
            quantity: 1,
        },
    )
    .await;
    assert!(matches!(unknown, Err(AppError::BadRequest(msg)) if msg == "product not found"));

    let view = cart_service::get_cart(&state, &customer).await?.data.expect("cart");
    assert_eq!(view.total_items, 3);
    Ok(())
}

#[tokio::test]
async fn quantity_updates_and_removal() -> anyhow::Result<()> {
    let state = common::test_state();
    let admin = common::default_admin(&state).await;
    let customer = common::register_customer(&state, "binod@example.com", "Binod").await;
    let product = common::add_product(&state, &admin, "Primer", Decimal::new(120, 0), 5).await;

    cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            product_id: product.id,
            quantity: 1,
        },
    )
    .await?;

    let view = cart_service::update_quantity(
        &state,
        &customer,
        product.id,
        UpdateCartItemRequest { quantity: 4 },
    )
    .await?
    .data
    .expect("cart");
    assert_eq!(view.items[0].quantity, 4);
    assert_eq!(view.totals.subtotal, Decimal::new(480, 0));
    assert_eq!(view.totals.shipping, Decimal::new(99, 0));

    let over = cart_service::update_quantity(
        &state,
        &customer,
        product.id,
        UpdateCartItemRequest { quantity: 6 },
    )
    .await;
    assert!(matches!(over, Err(AppError::BadRequest(_))));

    let view = cart_service::update_quantity(
        &state,
        &customer,
        product.id,
        UpdateCartItemRequest { quantity: 0 },
    )
    .await?
    .data
    .expect("cart");
    assert!(view.items.is_empty());
    assert_eq!(view.totals.subtotal, Decimal::ZERO);

    let missing = cart_service::remove_from_cart(&state, &customer, product.id).await;
    assert!(matches!(missing, Err(AppError::NotFound)));
    Ok(())
}

#[tokio::test]
async fn carts_are_per_user_and_keep_their_snapshot() -> anyhow::Result<()> {
    let state = common::test_state();
    let admin = common::default_admin(&state).await;
    let first = common::register_customer(&state, "one@example.com", "One").await;
    let second = common::register_customer(&state, "two@example.com", "Two").await;
    let product = common::add_product(&state, &admin, "Serum", Decimal::new(700, 0), 5).await;

    cart_service::add_to_cart(
        &state,
        &first,
        AddToCartRequest {
            product_id: product.id,
            quantity: 1,
        },
    )
    .await?;

    let other = cart_service::get_cart(&state, &second).await?.data.expect("cart");
    assert!(other.items.is_empty());

    // Deleting the product leaves the cart line usable.
    product_service::delete_product(&state, &admin, product.id).await?;
    let mine = cart_service::get_cart(&state, &first).await?.data.expect("cart");
    assert_eq!(mine.items.len(), 1);
    assert_eq!(mine.items[0].product.name, "Serum");

    cart_service::remove_from_cart(&state, &first, product.id).await?;
    let cleared = cart_service::clear_cart(&state, &first).await?.data.expect("cart");
    assert!(cleared.items.is_empty());
    Ok(())
}

#[tokio::test]
async fn quantity_changes_follow_current_stock() -> anyhow::Result<()> {
    let state = common::test_state();
    let admin = common::default_admin(&state).await;
    let customer = common::register_customer(&state, "mina@example.com", "Mina").await;
    let product = common::add_product(&state, &admin, "Face Mist", Decimal::new(300, 0), 5).await;

    cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            product_id: product.id,
            quantity: 1,
        },
    )
    .await?;

    let restock = |stock| UpdateProductRequest {
        stock: Some(stock),
        ..Default::default()
    };

    product_service::update_product(&state, &admin, product.id, restock(2)).await?;
    let over = cart_service::update_quantity(
        &state,
        &customer,
        product.id,
        UpdateCartItemRequest { quantity: 4 },
    )
    .await;
    assert!(matches!(over, Err(AppError::BadRequest(_))));

    product_service::update_product(&state, &admin, product.id, restock(10)).await?;
    let view = cart_service::update_quantity(
        &state,
        &customer,
        product.id,
        UpdateCartItemRequest { quantity: 8 },
    )
    .await?
    .data
    .expect("cart");
    assert_eq!(view.items[0].quantity, 8);
    assert_eq!(view.items[0].product.stock, 10);
    Ok(())
}
