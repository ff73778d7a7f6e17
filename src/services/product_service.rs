use std::collections::BTreeSet;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    catalog,
    dto::products::{CreateProductRequest, NameList, ProductList, UpdateProductRequest},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Product,
    pricing::{MAX_PRICE, format_amount},
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy},
    state::AppState,
    store::{keys, load_list, save_list},
};

/// Rating given to products before they have any reviews.
pub const INITIAL_RATING: f64 = 4.5;

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let products = load_products(state).await?;

    let term = query
        .q
        .as_ref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    let mut matches: Vec<Product> = products
        .into_iter()
        .filter(|p| term.as_deref().is_none_or(|t| matches_term(p, t)))
        .filter(|p| {
            query
                .category
                .as_deref()
                .filter(|c| !c.is_empty())
                .is_none_or(|c| p.category == c)
        })
        .filter(|p| {
            query
                .brand
                .as_deref()
                .filter(|b| !b.is_empty())
                .is_none_or(|b| p.brand == b)
        })
        .filter(|p| query.min_price.is_none_or(|min| p.price >= min))
        .filter(|p| query.max_price.is_none_or(|max| p.price <= max))
        .filter(|p| query.featured.is_none_or(|f| p.featured == f))
        .collect();

    match query.sort_by.unwrap_or_default() {
        ProductSortBy::Name => {
            matches.sort_by_cached_key(|p| p.name.to_lowercase());
        }
        ProductSortBy::PriceLow => matches.sort_by(|a, b| a.price.cmp(&b.price)),
        ProductSortBy::PriceHigh => matches.sort_by(|a, b| b.price.cmp(&a.price)),
        ProductSortBy::Rating => matches.sort_by(|a, b| b.rating.total_cmp(&a.rating)),
    }

    let (items, meta) = query.pagination().apply(matches);
    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(meta),
    ))
}

fn matches_term(product: &Product, term: &str) -> bool {
    [
        &product.name,
        &product.description,
        &product.brand,
        &product.category,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(term))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let product = find_product(state, id).await?;
    Ok(ApiResponse::success("Product", product, None))
}

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<NameList>> {
    let products = load_products(state).await?;
    let items = distinct(products.iter().map(|p| p.category.as_str()));
    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Categories", NameList { items }, Some(meta)))
}

pub async fn list_brands(state: &AppState) -> AppResult<ApiResponse<NameList>> {
    let products = load_products(state).await?;
    let items = distinct(products.iter().map(|p| p.brand.as_str()));
    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Brands", NameList { items }, Some(meta)))
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .filter(|v| !v.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name must not be empty".into()));
    }
    validate_price(payload.price)?;

    let product = Product {
        id: Uuid::new_v4(),
        name: payload.name,
        description: payload.description,
        price: payload.price,
        image: payload.image,
        category: payload.category,
        brand: payload.brand,
        stock: payload.stock,
        featured: payload.featured,
        rating: INITIAL_RATING,
        review_count: 0,
    };

    {
        let _gate = state.write_gate.lock().await;
        let mut products = load_products(state).await?;
        products.push(product.clone());
        save_list(state.store.as_ref(), keys::PRODUCTS, &products).await?;
    }

    log_audit(
        Some(user.user_id),
        "product_create",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    );

    Ok(ApiResponse::success(
        "Product created",
        product,
        Some(Meta::empty()),
    ))
}

fn validate_price(price: Decimal) -> AppResult<()> {
    if price.is_sign_negative() {
        return Err(AppError::BadRequest("price must not be negative".into()));
    }
    if price > MAX_PRICE {
        return Err(AppError::BadRequest(format!(
            "price must not exceed {}",
            format_amount(MAX_PRICE)
        )));
    }
    Ok(())
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    if let Some(price) = payload.price {
        validate_price(price)?;
    }

    let product = {
        let _gate = state.write_gate.lock().await;
        let mut products = load_products(state).await?;
        let existing = products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(AppError::NotFound)?;

        if let Some(name) = payload.name {
            existing.name = name;
        }
        if let Some(description) = payload.description {
            existing.description = description;
        }
        if let Some(price) = payload.price {
            existing.price = price;
        }
        if let Some(image) = payload.image {
            existing.image = image;
        }
        if let Some(category) = payload.category {
            existing.category = category;
        }
        if let Some(brand) = payload.brand {
            existing.brand = brand;
        }
        if let Some(stock) = payload.stock {
            existing.stock = stock;
        }
        if let Some(featured) = payload.featured {
            existing.featured = featured;
        }

        let updated = existing.clone();
        save_list(state.store.as_ref(), keys::PRODUCTS, &products).await?;
        updated
    };

    log_audit(
        Some(user.user_id),
        "product_update",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    );

    Ok(ApiResponse::success(
        "Updated",
        product,
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    {
        let _gate = state.write_gate.lock().await;
        let mut products = load_products(state).await?;
        let before = products.len();
        products.retain(|p| p.id != id);
        if products.len() == before {
            return Err(AppError::NotFound);
        }
        save_list(state.store.as_ref(), keys::PRODUCTS, &products).await?;
    }

    log_audit(
        Some(user.user_id),
        "product_delete",
        Some("products"),
        Some(serde_json::json!({ "product_id": id })),
    );

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Load the built-in catalog when no products are stored. Returns how many were added.
pub async fn seed_catalog(state: &AppState) -> AppResult<usize> {
    let _gate = state.write_gate.lock().await;
    let products = load_products(state).await?;
    if !products.is_empty() {
        tracing::debug!(count = products.len(), "catalog already present, skipping seed");
        return Ok(0);
    }

    let seeded = catalog::default_products();
    save_list(state.store.as_ref(), keys::PRODUCTS, &seeded).await?;
    tracing::info!(count = seeded.len(), "seeded product catalog");
    Ok(seeded.len())
}

pub(crate) async fn load_products(state: &AppState) -> AppResult<Vec<Product>> {
    Ok(load_list(state.store.as_ref(), keys::PRODUCTS).await?)
}

pub(crate) async fn find_product(state: &AppState, id: Uuid) -> AppResult<Product> {
    load_products(state)
        .await?
        .into_iter()
        .find(|p| p.id == id)
        .ok_or(AppError::NotFound)
}
