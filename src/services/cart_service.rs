use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::cart::{AddToCartRequest, CartView, UpdateCartItemRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::CartItem,
    pricing::CartTotals,
    response::{ApiResponse, Meta},
    services::product_service::find_product,
    state::AppState,
};

pub async fn get_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartView>> {
    let items = cart_items(state, user.user_id).await;
    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("OK", cart_view(items)?, Some(meta)))
}

/// Add `quantity` of a product, merging into an existing line.
pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartView>> {
    let quantity = positive_quantity(payload.quantity)?;
    let product = match find_product(state, payload.product_id).await {
        Ok(p) => p,
        Err(AppError::NotFound) => {
            return Err(AppError::BadRequest("product not found".to_string()));
        }
        Err(err) => return Err(err),
    };

    let view = {
        let mut carts = state.carts.write().await;
        let cart = carts.entry(user.user_id).or_default();
        let existing = cart
            .iter()
            .position(|item| item.product.id == product.id);
        let current = existing.map(|idx| cart[idx].quantity).unwrap_or(0);
        let wanted = current.saturating_add(quantity);
        ensure_in_stock(product.stock, wanted)?;

        let mut updated = cart.clone();
        match existing {
            Some(idx) => {
                updated[idx].quantity = wanted;
                updated[idx].product = product;
            }
            None => updated.push(CartItem { product, quantity }),
        }
        let view = cart_view(updated)?;
        *cart = view.items.clone();
        view
    };

    log_audit(
        Some(user.user_id),
        "cart_update",
        Some("cart"),
        Some(serde_json::json!({ "product_id": payload.product_id, "quantity": quantity })),
    );

    Ok(ApiResponse::success("OK", view, None))
}

pub async fn update_quantity(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<CartView>> {
    // Stock is checked against the catalog; a line whose product was deleted keeps its snapshot.
    let current = if payload.quantity > 0 {
        match find_product(state, product_id).await {
            Ok(p) => Some(p),
            Err(AppError::NotFound) => None,
            Err(err) => return Err(err),
        }
    } else {
        None
    };

    let view = {
        let mut carts = state.carts.write().await;
        let cart = carts.get_mut(&user.user_id).ok_or(AppError::NotFound)?;
        let idx = cart
            .iter()
            .position(|item| item.product.id == product_id)
            .ok_or(AppError::NotFound)?;

        let mut updated = cart.clone();
        if payload.quantity <= 0 {
            updated.remove(idx);
        } else {
            let quantity = payload.quantity as u32;
            if let Some(product) = current {
                updated[idx].product = product;
            }
            ensure_in_stock(updated[idx].product.stock, quantity)?;
            updated[idx].quantity = quantity;
        }
        let view = cart_view(updated)?;
        *cart = view.items.clone();
        view
    };

    log_audit(
        Some(user.user_id),
        "cart_update",
        Some("cart"),
        Some(serde_json::json!({ "product_id": product_id, "quantity": payload.quantity })),
    );

    Ok(ApiResponse::success("OK", view, None))
}

pub async fn remove_from_cart(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<CartView>> {
    let items = {
        let mut carts = state.carts.write().await;
        let cart = carts.get_mut(&user.user_id).ok_or(AppError::NotFound)?;
        let before = cart.len();
        cart.retain(|item| item.product.id != product_id);
        if cart.len() == before {
            return Err(AppError::NotFound);
        }
        cart.clone()
    };

    log_audit(
        Some(user.user_id),
        "cart_remove",
        Some("cart"),
        Some(serde_json::json!({ "product_id": product_id })),
    );

    Ok(ApiResponse::success(
        "Removed from cart",
        cart_view(items)?,
        Some(Meta::empty()),
    ))
}

pub async fn clear_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartView>> {
    state.carts.write().await.remove(&user.user_id);
    Ok(ApiResponse::success(
        "Cart cleared",
        cart_view(Vec::new())?,
        Some(Meta::empty()),
    ))
}

pub(crate) async fn cart_items(state: &AppState, user_id: Uuid) -> Vec<CartItem> {
    state
        .carts
        .read()
        .await
        .get(&user_id)
        .cloned()
        .unwrap_or_default()
}

fn cart_view(items: Vec<CartItem>) -> AppResult<CartView> {
    let totals = CartTotals::from_items(&items).ok_or_else(cart_too_large)?;
    let total_items = items
        .iter()
        .try_fold(0u32, |acc, item| acc.checked_add(item.quantity))
        .ok_or_else(cart_too_large)?;
    Ok(CartView {
        items,
        total_items,
        totals,
    })
}

pub(crate) fn cart_too_large() -> AppError {
    AppError::BadRequest("Cart total is too large".to_string())
}

fn positive_quantity(quantity: i32) -> AppResult<u32> {
    if quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }
    Ok(quantity as u32)
}

fn ensure_in_stock(stock: u32, wanted: u32) -> AppResult<()> {
    if wanted > stock {
        return Err(AppError::BadRequest(format!(
            "Insufficient stock: {stock} available"
        )));
    }
    Ok(())
}
