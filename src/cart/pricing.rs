//! Shipping and tax policy, and the summary it produces.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::money::Money;

/// Store-wide shipping and tax rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PricingPolicy {
    pub shipping_fee: Money,
    /// Orders whose discounted subtotal reaches this ship free.
    pub free_shipping_threshold: Money,
    /// Tax in basis points of the discounted subtotal.
    pub tax_rate_bps: i64,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            shipping_fee: Money::from_rupees(49),
            free_shipping_threshold: Money::from_rupees(499),
            tax_rate_bps: 0,
        }
    }
}

impl PricingPolicy {
    pub fn shipping_for(&self, discounted_subtotal: Money, is_empty: bool) -> Money {
        if is_empty || discounted_subtotal >= self.free_shipping_threshold {
            Money::ZERO
        } else {
            self.shipping_fee
        }
    }

    pub fn tax_for(&self, discounted_subtotal: Money) -> Money {
        discounted_subtotal.percent_bps(self.tax_rate_bps)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CartSummary {
    pub subtotal: Money,
    pub discount: Money,
    pub shipping: Money,
    pub tax: Money,
    pub total: Money,
    /// Sum of quantities across lines.
    pub item_count: i64,
}

impl CartSummary {
    pub fn compute(subtotal: Money, discount: Money, item_count: i64, policy: &PricingPolicy) -> Self {
        let discounted = subtotal.saturating_sub(discount);
        let shipping = policy.shipping_for(discounted, item_count == 0);
        let tax = policy.tax_for(discounted);
        Self {
            subtotal,
            discount,
            shipping,
            tax,
            total: discounted + shipping + tax,
            item_count,
        }
    }

    pub fn has_discount(&self) -> bool {
        !self.discount.is_zero()
    }
}
