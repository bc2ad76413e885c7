use std::sync::Arc;

use chrono::Duration;

use crate::{
    cart::PricingPolicy,
    services::{coupons::CouponSource, orders::OrderStore, payment::PaymentGateway},
    session::SessionStore,
};

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub coupons: Arc<dyn CouponSource>,
    pub payments: Arc<dyn PaymentGateway>,
    pub orders: Arc<dyn OrderStore>,
    pub pricing: PricingPolicy,
}

impl AppState {
    pub fn new(
        coupons: Arc<dyn CouponSource>,
        payments: Arc<dyn PaymentGateway>,
        orders: Arc<dyn OrderStore>,
        pricing: PricingPolicy,
        toast_ttl: Duration,
    ) -> Self {
        Self {
            sessions: Arc::new(SessionStore::new(toast_ttl)),
            coupons,
            payments,
            orders,
            pricing,
        }
    }
}
