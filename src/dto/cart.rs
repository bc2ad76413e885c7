use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    cart::{AppliedCoupon, CartLineItem, CartState, CartSummary, LineKey, PricingPolicy},
    money::Money,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddItemRequest {
    pub product_id: Uuid,
    pub name: String,
    /// Paise.
    pub unit_price: i64,
    pub quantity: i64,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub color: String,
    pub image_url: Option<String>,
}

impl From<AddItemRequest> for CartLineItem {
    fn from(req: AddItemRequest) -> Self {
        CartLineItem {
            product_id: req.product_id,
            name: req.name,
            unit_price: Money::from_paise(req.unit_price),
            quantity: req.quantity,
            size: req.size,
            color: req.color,
            image_url: req.image_url,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetQuantityRequest {
    pub product_id: Uuid,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub color: String,
    /// Zero or less removes the line.
    pub quantity: i64,
}

impl SetQuantityRequest {
    pub fn key(&self) -> LineKey {
        LineKey::new(self.product_id, self.size.clone(), self.color.clone())
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApplyCouponRequest {
    pub code: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CartView {
    pub session_id: Uuid,
    pub items: Vec<CartLineItem>,
    pub coupon: Option<AppliedCoupon>,
    pub summary: CartSummary,
}

impl CartView {
    pub fn new(session_id: Uuid, cart: &CartState, policy: &PricingPolicy) -> Self {
        Self {
            session_id,
            items: cart.items().to_vec(),
            coupon: cart.applied_coupon().cloned(),
            summary: cart.summary(policy),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CouponResultView {
    pub applied: bool,
    pub message: String,
    pub discount: Money,
    pub cart: CartView,
}
