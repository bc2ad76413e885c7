//! Coupon definitions and discount math.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::CartError;
use crate::money::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// `discount_value` is a whole percentage of the subtotal.
    Percent,
    /// `discount_value` is an amount in paise.
    Flat,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountType::Percent => "percent",
            DiscountType::Flat => "flat",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "percent" | "percentage" => Some(DiscountType::Percent),
            "flat" | "fixed" => Some(DiscountType::Flat),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coupon {
    /// Always stored uppercase.
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: i64,
    pub min_order_amount: Money,
    /// `None` means uncapped.
    pub max_discount_amount: Option<Money>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

/// Trim and uppercase a user-typed code.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

impl Coupon {
    pub fn percent(code: &str, percent: i64) -> Self {
        Self::new(code, DiscountType::Percent, percent)
    }

    pub fn flat(code: &str, amount: Money) -> Self {
        Self::new(code, DiscountType::Flat, amount.paise())
    }

    fn new(code: &str, discount_type: DiscountType, discount_value: i64) -> Self {
        Self {
            code: normalize_code(code),
            discount_type,
            discount_value,
            min_order_amount: Money::ZERO,
            max_discount_amount: None,
            expires_at: None,
            is_active: true,
        }
    }

    pub fn with_min_order(mut self, amount: Money) -> Self {
        self.min_order_amount = amount;
        self
    }

    pub fn with_max_discount(mut self, amount: Money) -> Self {
        self.max_discount_amount = Some(amount);
        self
    }

    pub fn expiring_at(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(at);
        self
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }

    pub fn meets_minimum(&self, subtotal: Money) -> bool {
        subtotal >= self.min_order_amount
    }

    /// Checks the coupon can be used on a cart with `subtotal` at `now`.
    pub fn validate(&self, subtotal: Money, now: DateTime<Utc>) -> Result<(), CartError> {
        if !self.is_active || self.is_expired(now) {
            return Err(CartError::CouponInvalid {
                code: self.code.clone(),
            });
        }
        if !self.meets_minimum(subtotal) {
            return Err(CartError::CouponBelowMinimum {
                code: self.code.clone(),
                required: self.min_order_amount.paise(),
                subtotal: subtotal.paise(),
            });
        }
        Ok(())
    }

    /// Discount for `subtotal`, capped by `max_discount_amount` and by the subtotal itself.
    pub fn discount_for(&self, subtotal: Money) -> Money {
        let raw = match self.discount_type {
            DiscountType::Percent => subtotal.percent(self.discount_value),
            DiscountType::Flat => Money::from_paise(self.discount_value),
        };
        let capped = match self.max_discount_amount {
            Some(max) => raw.min(max),
            None => raw,
        };
        capped.min(subtotal).max(Money::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn save20() -> Coupon {
        Coupon::percent("save20", 20)
            .with_min_order(Money::from_paise(2000))
            .with_max_discount(Money::from_paise(1000))
    }

    #[test]
    fn code_is_stored_uppercase() {
        assert_eq!(save20().code, "SAVE20");
        assert_eq!(normalize_code("  welcome10 "), "WELCOME10");
    }

    #[test]
    fn percent_discount_is_capped() {
        let coupon = save20();
        assert_eq!(coupon.discount_for(Money::from_paise(5000)), Money::from_paise(1000));
        assert_eq!(coupon.discount_for(Money::from_paise(3000)), Money::from_paise(600));
    }

    #[test]
    fn flat_discount_never_exceeds_subtotal() {
        let coupon = Coupon::flat("FLAT100", Money::from_rupees(100));
        assert_eq!(coupon.discount_for(Money::from_rupees(60)), Money::from_rupees(60));
        assert_eq!(coupon.discount_for(Money::from_rupees(500)), Money::from_rupees(100));
    }

    #[test]
    fn validate_reports_minimum() {
        let err = save20()
            .validate(Money::from_paise(1999), Utc::now())
            .unwrap_err();
        assert!(matches!(err, CartError::CouponBelowMinimum { required: 2000, .. }));
        assert!(save20().validate(Money::from_paise(2000), Utc::now()).is_ok());
    }

    #[test]
    fn validate_rejects_expired_and_inactive() {
        let now = Utc::now();
        let expired = save20().expiring_at(now - Duration::hours(1));
        assert!(matches!(
            expired.validate(Money::from_paise(5000), now),
            Err(CartError::CouponInvalid { .. })
        ));

        let mut inactive = save20();
        inactive.is_active = false;
        assert!(matches!(
            inactive.validate(Money::from_paise(5000), now),
            Err(CartError::CouponInvalid { .. })
        ));
    }

    #[test]
    fn discount_type_parse() {
        assert_eq!(DiscountType::parse("Percent"), Some(DiscountType::Percent));
        assert_eq!(DiscountType::parse("fixed"), Some(DiscountType::Flat));
        assert_eq!(DiscountType::parse("bogo"), None);
    }
}
