//! The cart itself: lines, the applied coupon and the operations on them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::cart::coupon::{Coupon, normalize_code};
use crate::cart::line_item::{CartLineItem, LineKey};
use crate::cart::pricing::{CartSummary, PricingPolicy};
use crate::error::{AppError, CartError};
use crate::money::Money;
use crate::services::coupons::CouponSource;

/// Largest quantity a single line may hold.
pub const MAX_LINE_QUANTITY: i64 = 10_000;

/// Largest unit price accepted for a line, ₹10 lakh.
pub const MAX_UNIT_PRICE: Money = Money::from_rupees(1_000_000);

/// Ceiling on the cart subtotal, ₹1 crore.
pub const MAX_CART_SUBTOTAL: Money = Money::from_rupees(10_000_000);

/// A coupon on the cart together with the discount it currently grants.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AppliedCoupon {
    pub coupon: Coupon,
    pub discount: Money,
}

/// Returned by mutations that knocked the cart below the coupon minimum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouponCleared {
    pub code: String,
    pub min_order_amount: Money,
}

impl CouponCleared {
    pub fn message(&self) -> String {
        format!(
            "Coupon {} removed: order total is below {}",
            self.code, self.min_order_amount
        )
    }
}

/// Outcome of applying a coupon. Failures are values, not errors.
#[derive(Debug, Clone, PartialEq)]
pub struct CouponResult {
    pub applied: bool,
    pub message: String,
    pub discount: Money,
    pub failure: Option<CartError>,
}

impl CouponResult {
    fn applied(code: &str, discount: Money) -> Self {
        Self {
            applied: true,
            message: format!("Coupon {code} applied. You saved {discount}"),
            discount,
            failure: None,
        }
    }

    pub fn rejected(err: CartError) -> Self {
        Self {
            applied: false,
            message: err.user_message(),
            discount: Money::ZERO,
            failure: Some(err),
        }
    }
}

/// Ticket for a coupon lookup started with [`CartState::begin_coupon_lookup`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct CouponLookup {
    pub code: String,
    generation: u64,
    ticket: u64,
}

#[derive(Debug, Clone, Default)]
pub struct CartState {
    items: Vec<CartLineItem>,
    coupon: Option<AppliedCoupon>,
    /// Bumped by `clear`, so lookups started before it can be told apart.
    generation: u64,
    /// Ticket of the lookup holding the slot.
    pending_lookup: Option<u64>,
    next_ticket: u64,
}

impl CartState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn applied_coupon(&self) -> Option<&AppliedCoupon> {
        self.coupon.as_ref()
    }

    pub fn discount(&self) -> Money {
        self.coupon.as_ref().map_or(Money::ZERO, |c| c.discount)
    }

    pub fn subtotal(&self) -> Money {
        self.items.iter().map(CartLineItem::line_total).sum()
    }

    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn lookup_in_flight(&self) -> bool {
        self.pending_lookup.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Insert a line, or add the quantity onto the line with the same key.
    ///
    /// Quantities are capped at [`MAX_LINE_QUANTITY`], unit prices at
    /// [`MAX_UNIT_PRICE`] and the subtotal at [`MAX_CART_SUBTOTAL`]. A rejected
    /// add leaves the cart as it was.
    pub fn add_item(&mut self, item: CartLineItem) -> Result<(), CartError> {
        if !(1..=MAX_LINE_QUANTITY).contains(&item.quantity) {
            return Err(CartError::InvalidQuantity(item.quantity));
        }
        if item.unit_price.is_negative() || item.unit_price > MAX_UNIT_PRICE {
            return Err(CartError::InvalidPrice(item.unit_price.paise()));
        }

        let key = item.key();
        match self.items.iter().position(|line| line.matches(&key)) {
            Some(index) => {
                let quantity = self.items[index].quantity + item.quantity;
                if quantity > MAX_LINE_QUANTITY {
                    return Err(CartError::InvalidQuantity(quantity));
                }
                self.check_subtotal(Some(index), self.items[index].unit_price * quantity)?;
                self.items[index].quantity = quantity;
            }
            None => {
                self.check_subtotal(None, item.line_total())?;
                self.items.push(item);
            }
        }
        // Adding never lowers the subtotal, so the coupon cannot be cleared here.
        let _ = self.reprice();
        Ok(())
    }

    pub fn remove_item(&mut self, key: &LineKey) -> Result<Option<CouponCleared>, CartError> {
        let before = self.items.len();
        self.items.retain(|line| !line.matches(key));
        if self.items.len() == before {
            return Err(CartError::LineNotFound);
        }
        Ok(self.reprice())
    }

    /// `quantity <= 0` removes the line.
    pub fn set_quantity(
        &mut self,
        key: &LineKey,
        quantity: i64,
    ) -> Result<Option<CouponCleared>, CartError> {
        if quantity <= 0 {
            return self.remove_item(key);
        }
        if quantity > MAX_LINE_QUANTITY {
            return Err(CartError::InvalidQuantity(quantity));
        }
        let index = self
            .items
            .iter()
            .position(|line| line.matches(key))
            .ok_or(CartError::LineNotFound)?;
        self.check_subtotal(Some(index), self.items[index].unit_price * quantity)?;
        self.items[index].quantity = quantity;
        Ok(self.reprice())
    }

    /// Reserve the single coupon-lookup slot for `code`.
    pub fn begin_coupon_lookup(&mut self, code: &str) -> Result<CouponLookup, CartError> {
        if self.pending_lookup.is_some() {
            return Err(CartError::CouponLookupInProgress);
        }
        let code = normalize_code(code);
        if code.is_empty() {
            return Err(CartError::CouponInvalid { code });
        }
        self.next_ticket += 1;
        self.pending_lookup = Some(self.next_ticket);
        Ok(CouponLookup {
            code,
            generation: self.generation,
            ticket: self.next_ticket,
        })
    }

    /// Give the slot back without touching the cart, for a lookup that will
    /// never complete. Returns whether `lookup` still held the slot.
    pub fn abandon_coupon_lookup(&mut self, lookup: &CouponLookup) -> bool {
        if self.pending_lookup != Some(lookup.ticket) {
            return false;
        }
        self.pending_lookup = None;
        true
    }

    /// Finish a lookup with whatever the coupon store returned.
    ///
    /// The cart is only touched when the coupon is valid for the current
    /// subtotal and the cart has not been cleared since the lookup began.
    pub fn complete_coupon_lookup(
        &mut self,
        lookup: CouponLookup,
        fetched: Result<Option<Coupon>, AppError>,
        now: DateTime<Utc>,
    ) -> CouponResult {
        if lookup.generation != self.generation {
            return CouponResult::rejected(CartError::StaleCart);
        }
        self.abandon_coupon_lookup(&lookup);

        let coupon = match fetched {
            Ok(Some(coupon)) => coupon,
            Ok(None) => {
                return CouponResult::rejected(CartError::CouponInvalid { code: lookup.code });
            }
            Err(err) => {
                return CouponResult::rejected(CartError::CouponUnavailable(err.to_string()));
            }
        };

        let subtotal = self.subtotal();
        if let Err(err) = coupon.validate(subtotal, now) {
            return CouponResult::rejected(err);
        }

        let discount = coupon.discount_for(subtotal);
        let result = CouponResult::applied(&coupon.code, discount);
        self.coupon = Some(AppliedCoupon { coupon, discount });
        result
    }

    /// Look `code` up through `source` and apply it.
    ///
    /// Dropping the returned future mid-lookup releases the slot.
    pub async fn apply_coupon<S>(&mut self, code: &str, source: &S, now: DateTime<Utc>) -> CouponResult
    where
        S: CouponSource + ?Sized,
    {
        let lookup = match self.begin_coupon_lookup(code) {
            Ok(lookup) => lookup,
            Err(err) => return CouponResult::rejected(err),
        };
        let mut slot = LookupSlot {
            cart: self,
            lookup: lookup.clone(),
            armed: true,
        };
        let fetched = source.fetch_coupon_by_code(&lookup.code).await;
        slot.armed = false;
        let result = slot.cart.complete_coupon_lookup(lookup, fetched, now);
        result
    }

    /// Returns whether a coupon was removed.
    pub fn remove_coupon(&mut self) -> bool {
        self.coupon.take().is_some()
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.coupon = None;
        self.pending_lookup = None;
        self.generation += 1;
    }

    pub fn summary(&self, policy: &PricingPolicy) -> CartSummary {
        CartSummary::compute(self.subtotal(), self.discount(), self.item_count(), policy)
    }

    fn check_subtotal(&self, replacing: Option<usize>, line_total: Money) -> Result<(), CartError> {
        self.items
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != replacing)
            .map(|(_, line)| line.line_total())
            .try_fold(line_total, Money::checked_add)
            .filter(|subtotal| *subtotal <= MAX_CART_SUBTOTAL)
            .map(|_| ())
            .ok_or(CartError::CartLimitExceeded)
    }

    fn reprice(&mut self) -> Option<CouponCleared> {
        let subtotal = self.subtotal();
        let below_minimum = self
            .coupon
            .as_ref()
            .is_some_and(|applied| !applied.coupon.meets_minimum(subtotal));
        if below_minimum {
            let coupon = self.coupon.take()?.coupon;
            return Some(CouponCleared {
                code: coupon.code,
                min_order_amount: coupon.min_order_amount,
            });
        }
        if let Some(applied) = self.coupon.as_mut() {
            applied.discount = applied.coupon.discount_for(subtotal);
        }
        None
    }
}

struct LookupSlot<'a> {
    cart: &'a mut CartState,
    lookup: CouponLookup,
    armed: bool,
}

impl Drop for LookupSlot<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.cart.abandon_coupon_lookup(&self.lookup);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use uuid::Uuid;

    struct Coupons(HashMap<String, Coupon>);

    #[async_trait]
    impl CouponSource for Coupons {
        async fn fetch_coupon_by_code(&self, code: &str) -> Result<Option<Coupon>, AppError> {
            Ok(self.0.get(code).cloned())
        }
    }

    fn coupons() -> Coupons {
        let save20 = Coupon::percent("SAVE20", 20)
            .with_min_order(Money::from_paise(2000))
            .with_max_discount(Money::from_paise(1000));
        let flat = Coupon::flat("FLAT50", Money::from_paise(50));
        Coupons(HashMap::from([
            (save20.code.clone(), save20),
            (flat.code.clone(), flat),
        ]))
    }

    fn item(price: i64, qty: i64) -> CartLineItem {
        CartLineItem::new(Uuid::new_v4(), "Item", Money::from_paise(price), qty)
    }

    fn no_tax_free_shipping() -> PricingPolicy {
        PricingPolicy {
            shipping_fee: Money::ZERO,
            free_shipping_threshold: Money::ZERO,
            tax_rate_bps: 0,
        }
    }

    #[test]
    fn add_merges_matching_lines() {
        let mut cart = CartState::new();
        let shirt = item(1000, 1).with_size("M").with_color("red");
        cart.add_item(shirt.clone()).unwrap();
        cart.add_item(CartLineItem { quantity: 2, ..shirt.clone() }).unwrap();
        cart.add_item(shirt.clone().with_size("L")).unwrap();

        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.items()[0].quantity, 3);
        assert_eq!(cart.subtotal(), Money::from_paise(4000));
    }

    #[test]
    fn add_rejects_bad_quantity_and_price() {
        let mut cart = CartState::new();
        assert_eq!(cart.add_item(item(100, 0)), Err(CartError::InvalidQuantity(0)));
        assert_eq!(cart.add_item(item(-1, 1)), Err(CartError::InvalidPrice(-1)));
        assert!(cart.is_empty());
    }

    #[test]
    fn oversized_lines_are_rejected_without_panicking() {
        let mut cart = CartState::new();
        assert_eq!(
            cart.add_item(item(100, i64::MAX / 2)),
            Err(CartError::InvalidQuantity(i64::MAX / 2))
        );
        assert_eq!(
            cart.add_item(item(i64::MAX, 1)),
            Err(CartError::InvalidPrice(i64::MAX))
        );
        assert!(cart.is_empty());

        let line = item(100, MAX_LINE_QUANTITY);
        cart.add_item(line.clone()).unwrap();
        assert_eq!(
            cart.add_item(CartLineItem { quantity: 1, ..line.clone() }),
            Err(CartError::InvalidQuantity(MAX_LINE_QUANTITY + 1))
        );
        assert_eq!(
            cart.set_quantity(&line.key(), i64::MAX),
            Err(CartError::InvalidQuantity(i64::MAX))
        );
        assert_eq!(cart.items()[0].quantity, MAX_LINE_QUANTITY);
    }

    #[test]
    fn subtotal_is_capped() {
        let mut cart = CartState::new();
        let pricey = CartLineItem::new(Uuid::new_v4(), "Saree", MAX_UNIT_PRICE, 10);
        cart.add_item(pricey.clone()).unwrap();
        assert_eq!(cart.subtotal(), MAX_CART_SUBTOTAL);

        assert_eq!(cart.add_item(item(1, 1)), Err(CartError::CartLimitExceeded));
        assert_eq!(
            cart.set_quantity(&pricey.key(), 11),
            Err(CartError::CartLimitExceeded)
        );
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.subtotal(), MAX_CART_SUBTOTAL);
    }

    #[test]
    fn subtotal_tracks_every_mutation() {
        let mut cart = CartState::new();
        let a = item(250, 2);
        let b = item(1000, 1);
        let c = item(75, 4);
        cart.add_item(a.clone()).unwrap();
        cart.add_item(b.clone()).unwrap();
        cart.add_item(c.clone()).unwrap();
        cart.set_quantity(&a.key(), 5).unwrap();
        cart.remove_item(&b.key()).unwrap();
        cart.set_quantity(&c.key(), 0).unwrap();

        let expected: i64 = cart
            .items()
            .iter()
            .map(|i| i.unit_price.paise() * i.quantity)
            .sum();
        assert_eq!(cart.subtotal(), Money::from_paise(expected));
        assert_eq!(cart.subtotal(), Money::from_paise(1250));
        assert_eq!(cart.items().len(), 1);
    }

    #[test]
    fn unknown_line_is_reported() {
        let mut cart = CartState::new();
        let key = LineKey::new(Uuid::new_v4(), "", "");
        assert_eq!(cart.remove_item(&key), Err(CartError::LineNotFound));
        assert_eq!(cart.set_quantity(&key, 3), Err(CartError::LineNotFound));
    }

    #[tokio::test]
    async fn save20_is_capped_at_max_discount() {
        let mut cart = CartState::new();
        cart.add_item(item(5000, 1)).unwrap();

        let result = cart.apply_coupon("save20", &coupons(), Utc::now()).await;
        assert!(result.applied);
        assert_eq!(result.discount, Money::from_paise(1000));

        let summary = cart.summary(&no_tax_free_shipping());
        assert_eq!(summary.discount, Money::from_paise(1000));
        assert_eq!(summary.total, Money::from_paise(4000));
    }

    #[tokio::test]
    async fn below_minimum_leaves_discount_at_zero() {
        let mut cart = CartState::new();
        cart.add_item(item(1500, 1)).unwrap();

        let result = cart.apply_coupon("SAVE20", &coupons(), Utc::now()).await;
        assert!(!result.applied);
        assert!(matches!(
            result.failure,
            Some(CartError::CouponBelowMinimum { .. })
        ));
        assert_eq!(cart.discount(), Money::ZERO);
        assert!(cart.applied_coupon().is_none());
        assert!(!cart.lookup_in_flight());
    }

    #[tokio::test]
    async fn unknown_code_leaves_cart_unchanged() {
        let mut cart = CartState::new();
        cart.add_item(item(5000, 1)).unwrap();
        let before = cart.items().to_vec();

        let result = cart.apply_coupon("NOPE", &coupons(), Utc::now()).await;
        assert!(matches!(result.failure, Some(CartError::CouponInvalid { .. })));
        assert_eq!(cart.items(), before.as_slice());
        assert!(cart.applied_coupon().is_none());
    }

    #[tokio::test]
    async fn removing_below_minimum_clears_coupon() {
        let mut cart = CartState::new();
        let big = item(3000, 1);
        let small = item(500, 1);
        cart.add_item(big.clone()).unwrap();
        cart.add_item(small).unwrap();
        assert!(cart.apply_coupon("SAVE20", &coupons(), Utc::now()).await.applied);
        assert_eq!(cart.discount(), Money::from_paise(700));

        let cleared = cart.remove_item(&big.key()).unwrap();
        let cleared = cleared.expect("coupon should be cleared");
        assert_eq!(cleared.code, "SAVE20");
        assert!(cleared.message().contains("SAVE20"));
        assert_eq!(cart.discount(), Money::ZERO);
        assert!(cart.applied_coupon().is_none());
    }

    #[tokio::test]
    async fn percent_discount_follows_subtotal_within_cap() {
        let mut cart = CartState::new();
        let line = item(1000, 3);
        cart.add_item(line.clone()).unwrap();
        cart.apply_coupon("SAVE20", &coupons(), Utc::now()).await;
        assert_eq!(cart.discount(), Money::from_paise(600));

        assert_eq!(cart.set_quantity(&line.key(), 4).unwrap(), None);
        assert_eq!(cart.discount(), Money::from_paise(800));

        cart.set_quantity(&line.key(), 10).unwrap();
        assert_eq!(cart.discount(), Money::from_paise(1000));
    }

    #[tokio::test]
    async fn remove_coupon_is_idempotent() {
        let mut cart = CartState::new();
        cart.add_item(item(5000, 1)).unwrap();
        cart.apply_coupon("FLAT50", &coupons(), Utc::now()).await;

        assert!(cart.remove_coupon());
        let after_first = (cart.discount(), cart.applied_coupon().cloned());
        assert!(!cart.remove_coupon());
        assert_eq!((cart.discount(), cart.applied_coupon().cloned()), after_first);
        assert_eq!(cart.discount(), Money::ZERO);
    }

    #[test]
    fn second_lookup_is_refused_while_first_in_flight() {
        let mut cart = CartState::new();
        let _first = cart.begin_coupon_lookup("SAVE20").unwrap();
        assert_eq!(
            cart.begin_coupon_lookup("FLAT50"),
            Err(CartError::CouponLookupInProgress)
        );
    }

    #[test]
    fn lookup_resolving_after_clear_is_discarded() {
        let mut cart = CartState::new();
        cart.add_item(item(5000, 1)).unwrap();
        let lookup = cart.begin_coupon_lookup("flat50").unwrap();
        cart.clear();
        cart.add_item(item(9000, 1)).unwrap();

        let coupon = Coupon::flat("FLAT50", Money::from_paise(50));
        let result = cart.complete_coupon_lookup(lookup, Ok(Some(coupon)), Utc::now());
        assert_eq!(result.failure, Some(CartError::StaleCart));
        assert!(cart.applied_coupon().is_none());
        assert!(!cart.lookup_in_flight());
    }

    #[test]
    fn store_failure_is_reported_as_unavailable() {
        let mut cart = CartState::new();
        cart.add_item(item(5000, 1)).unwrap();
        let lookup = cart.begin_coupon_lookup("SAVE20").unwrap();
        let result = cart.complete_coupon_lookup(
            lookup,
            Err(AppError::BadRequest("boom".into())),
            Utc::now(),
        );
        assert!(matches!(result.failure, Some(CartError::CouponUnavailable(_))));
        assert!(!cart.lookup_in_flight());
    }

    #[test]
    fn empty_code_is_invalid() {
        let mut cart = CartState::new();
        assert!(matches!(
            cart.begin_coupon_lookup("   "),
            Err(CartError::CouponInvalid { .. })
        ));
        assert!(!cart.lookup_in_flight());
    }

    #[test]
    fn abandoned_lookup_frees_the_slot() {
        let mut cart = CartState::new();
        let first = cart.begin_coupon_lookup("SAVE20").unwrap();
        assert!(cart.abandon_coupon_lookup(&first));
        assert!(!cart.lookup_in_flight());

        let second = cart.begin_coupon_lookup("FLAT50").unwrap();
        // A late abandon of the earlier ticket must not free the newer lookup.
        assert!(!cart.abandon_coupon_lookup(&first));
        assert!(cart.lookup_in_flight());
        assert!(cart.abandon_coupon_lookup(&second));
    }

    struct Stalled;

    #[async_trait]
    impl CouponSource for Stalled {
        async fn fetch_coupon_by_code(&self, _code: &str) -> Result<Option<Coupon>, AppError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn dropped_apply_releases_the_slot() {
        let mut cart = CartState::new();
        cart.add_item(item(5000, 1)).unwrap();

        let stalled = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            cart.apply_coupon("SAVE20", &Stalled, Utc::now()),
        )
        .await;
        assert!(stalled.is_err());
        assert!(!cart.lookup_in_flight());

        let result = cart.apply_coupon("FLAT50", &coupons(), Utc::now()).await;
        assert!(result.applied);
    }
}
