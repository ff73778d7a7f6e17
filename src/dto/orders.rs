use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Address, Order, PaymentMethod};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    #[serde(default)]
    pub customer_phone: String,
    pub shipping_address: Address,
    /// Ignored when `same_as_shipping` is set.
    #[serde(default)]
    pub billing_address: Option<Address>,
    #[serde(default = "default_same_as_shipping")]
    pub same_as_shipping: bool,
    pub payment_method: PaymentMethod,
}

fn default_same_as_shipping() -> bool {
    true
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    pub order: Order,
    pub can_cancel: bool,
    /// Human readable time left to cancel, e.g. `23 hours`.
    pub cancel_time_remaining: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}
