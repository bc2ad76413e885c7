//! Shopping cart: line items, one coupon, and the pricing summary.

pub mod coupon;
pub mod line_item;
pub mod pricing;
pub mod state;

pub use coupon::{Coupon, DiscountType, normalize_code};
pub use line_item::{CartLineItem, LineKey};
pub use pricing::{CartSummary, PricingPolicy};
pub use state::{
    AppliedCoupon, CartState, CouponCleared, CouponLookup, CouponResult, MAX_CART_SUBTOTAL,
    MAX_LINE_QUANTITY, MAX_UNIT_PRICE,
};
