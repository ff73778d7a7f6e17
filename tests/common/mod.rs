#![allow(dead_code)]

use std::time::Duration;

use rust_decimal::Decimal;
use storefront_api::{
    config::AppConfig,
    dto::{auth::RegisterRequest, orders::PlaceOrderRequest, products::CreateProductRequest},
    middleware::auth::{AuthUser, decode_token},
    models::{Address, PaymentMethod, Product, Role},
    services::{auth_service, product_service},
    state::AppState,
};

pub const JWT_SECRET: &str = "test-secret";

pub fn test_config() -> AppConfig {
    AppConfig {
        store_path: None,
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: JWT_SECRET.into(),
        payment_delay: Duration::ZERO,
        seed_on_start: false,
    }
}

pub fn test_state() -> AppState {
    AppState::in_memory(test_config())
}

/// Register a customer and return the identity carried by their token.
pub async fn register_customer(state: &AppState, email: &str, name: &str) -> AuthUser {
    let resp = auth_service::register_user(
        state,
        RegisterRequest {
            email: email.into(),
            password: "secret123".into(),
            name: name.into(),
        },
    )
    .await
    .expect("register customer");
    let login = resp.data.expect("login data");
    decode_token(&login.token, JWT_SECRET).expect("valid token")
}

pub async fn default_admin(state: &AppState) -> AuthUser {
    let user_id = auth_service::ensure_default_admin(state)
        .await
        .expect("default admin");
    AuthUser {
        user_id,
        role: Role::Admin,
    }
}

pub async fn add_product(
    state: &AppState,
    admin: &AuthUser,
    name: &str,
    price: Decimal,
    stock: u32,
) -> Product {
    product_service::create_product(
        state,
        admin,
        CreateProductRequest {
            name: name.into(),
            description: format!("{name} for testing"),
            price,
            image: String::new(),
            category: "Cosmetics".into(),
            brand: "TestBrand".into(),
            stock,
            featured: false,
        },
    )
    .await
    .expect("create product")
    .data
    .expect("product data")
}

pub fn address() -> Address {
    Address {
        full_name: "Sita Sharma".into(),
        address: "Lazimpat Road 12".into(),
        city: "Kathmandu".into(),
        state: "Bagmati".into(),
        zip_code: "44600".into(),
        country: "Nepal".into(),
    }
}

pub fn checkout_request(phone: &str) -> PlaceOrderRequest {
    PlaceOrderRequest {
        customer_phone: phone.into(),
        shipping_address: address(),
        billing_address: None,
        same_as_shipping: true,
        payment_method: PaymentMethod::Cod,
    }
}
