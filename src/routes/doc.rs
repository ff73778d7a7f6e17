use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        admin::{CustomerList, CustomerSummary, DashboardStats, UpdateOrderStatusRequest},
        auth::{ChangePasswordRequest, LoginRequest, LoginResponse, RegisterRequest, UpdateProfileRequest},
        cart::{AddToCartRequest, CartView, UpdateCartItemRequest},
        orders::{OrderDetail, OrderList, PlaceOrderRequest},
        products::{CreateProductRequest, NameList, ProductList, UpdateProductRequest},
        reviews::{CreateReviewRequest, ReviewList},
    },
    models::{
        Address, CartItem, Order, OrderStatus, PaymentMethod, Product, Review, Role, UserProfile,
    },
    pricing::CartTotals,
    response::{ApiResponse, Meta},
    routes::{admin, auth, cart, health, orders, params, products},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::logout,
        auth::password,
        auth::me,
        auth::profile,
        products::list_products,
        products::list_categories,
        products::list_brands,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        products::list_reviews,
        products::create_review,
        cart::cart_list,
        cart::add_to_cart,
        cart::update_quantity,
        cart::remove_from_cart,
        cart::clear_cart,
        orders::list_orders,
        orders::place_order,
        orders::get_order,
        orders::cancel_order,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::list_customers,
        admin::dashboard,
        admin::list_low_stock
    ),
    components(
        schemas(
            Role,
            UserProfile,
            Product,
            CartItem,
            Address,
            OrderStatus,
            PaymentMethod,
            Order,
            Review,
            CartTotals,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            ChangePasswordRequest,
            UpdateProfileRequest,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            NameList,
            AddToCartRequest,
            UpdateCartItemRequest,
            CartView,
            PlaceOrderRequest,
            OrderDetail,
            OrderList,
            CreateReviewRequest,
            ReviewList,
            UpdateOrderStatusRequest,
            CustomerSummary,
            CustomerList,
            DashboardStats,
            params::Pagination,
            params::SortOrder,
            params::ProductSortBy,
            Meta,
            ApiResponse<UserProfile>,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CartView>,
            ApiResponse<Order>,
            ApiResponse<OrderDetail>,
            ApiResponse<OrderList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration, login and profile"),
        (name = "Products", description = "Catalog browsing and admin product CRUD"),
        (name = "Reviews", description = "Product reviews"),
        (name = "Cart", description = "Per-user cart"),
        (name = "Orders", description = "Checkout, order history and cancellation"),
        (name = "Admin", description = "Admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
