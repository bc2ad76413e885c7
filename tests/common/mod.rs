#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use storefront_cart::{
    cart::{Coupon, PricingPolicy},
    dto::{cart::AddItemRequest, orders::OrderWithItems},
    error::{AppError, AppResult},
    models::{CustomerInfo, Order, OrderItem},
    money::Money,
    routes::params::OrderListQuery,
    services::{
        coupons::CouponSource,
        orders::{NewOrder, OrderStore},
        payment::{PaymentGateway, PaymentOutcome, PaymentReceipt, PaymentRequest},
    },
    state::AppState,
};
use tokio::sync::{Mutex, Notify};
use uuid::Uuid;

pub struct InMemoryCoupons(HashMap<String, Coupon>);

impl InMemoryCoupons {
    pub fn new(coupons: impl IntoIterator<Item = Coupon>) -> Self {
        Self(coupons.into_iter().map(|c| (c.code.clone(), c)).collect())
    }
}

#[async_trait]
impl CouponSource for InMemoryCoupons {
    async fn fetch_coupon_by_code(&self, code: &str) -> AppResult<Option<Coupon>> {
        Ok(self.0.get(code).cloned())
    }
}

/// Holds every lookup until `release` is notified.
pub struct GatedCoupons {
    inner: InMemoryCoupons,
    pub started: Notify,
    pub release: Notify,
}

impl GatedCoupons {
    pub fn new(inner: InMemoryCoupons) -> Self {
        Self {
            inner,
            started: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl CouponSource for GatedCoupons {
    async fn fetch_coupon_by_code(&self, code: &str) -> AppResult<Option<Coupon>> {
        self.started.notify_one();
        self.release.notified().await;
        self.inner.fetch_coupon_by_code(code).await
    }
}

/// Replays queued outcomes, capturing when the queue is empty.
#[derive(Default)]
pub struct ScriptedGateway {
    outcomes: Mutex<VecDeque<PaymentOutcome>>,
    pub requests: Mutex<Vec<PaymentRequest>>,
}

impl ScriptedGateway {
    pub fn with_outcomes(outcomes: impl IntoIterator<Item = PaymentOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    fn method(&self) -> &'static str {
        "card"
    }

    async fn initiate_payment(&self, request: PaymentRequest) -> PaymentOutcome {
        let order_id = request.order_id;
        self.requests.lock().await.push(request);
        self.outcomes
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| captured(order_id))
    }
}

fn captured(order_id: Uuid) -> PaymentOutcome {
    PaymentOutcome::Captured(PaymentReceipt {
        payment_id: format!("pay_{}", order_id.simple()),
        method: "card".into(),
        signature: Some("sig".into()),
    })
}

/// First payment never settles; later ones capture.
#[derive(Default)]
pub struct HangingGateway {
    calls: AtomicUsize,
}

#[async_trait]
impl PaymentGateway for HangingGateway {
    fn method(&self) -> &'static str {
        "card"
    }

    async fn initiate_payment(&self, request: PaymentRequest) -> PaymentOutcome {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            std::future::pending::<()>().await;
        }
        captured(request.order_id)
    }
}

/// Captures once `release` is notified.
#[derive(Default)]
pub struct GatedGateway {
    pub started: Notify,
    pub release: Notify,
}

#[async_trait]
impl PaymentGateway for GatedGateway {
    fn method(&self) -> &'static str {
        "card"
    }

    async fn initiate_payment(&self, request: PaymentRequest) -> PaymentOutcome {
        self.started.notify_one();
        self.release.notified().await;
        captured(request.order_id)
    }
}

#[derive(Default)]
pub struct InMemoryOrders {
    pub orders: Mutex<Vec<OrderWithItems>>,
    pub fail_writes: bool,
}

#[async_trait]
impl OrderStore for InMemoryOrders {
    async fn persist_order(&self, new_order: NewOrder) -> AppResult<OrderWithItems> {
        if self.fail_writes {
            return Err(AppError::Internal(anyhow::anyhow!("order store offline")));
        }
        let now = Utc::now();
        let summary = new_order.summary;
        let order = Order {
            id: new_order.id,
            customer_name: new_order.customer.name,
            customer_email: new_order.customer.email,
            customer_phone: new_order.customer.phone,
            subtotal: summary.subtotal,
            discount: summary.discount,
            shipping: summary.shipping,
            tax: summary.tax,
            total_amount: summary.total,
            coupon_code: new_order.coupon_code,
            payment_method: new_order.payment.method,
            payment_reference: new_order.payment.payment_id,
            status: "paid".into(),
            created_at: now,
        };
        let items = new_order
            .items
            .into_iter()
            .map(|line| OrderItem {
                id: Uuid::new_v4(),
                order_id: order.id,
                product_id: line.product_id,
                name: line.name,
                size: line.size,
                color: line.color,
                quantity: line.quantity,
                unit_price: line.unit_price,
                created_at: now,
            })
            .collect();
        let saved = OrderWithItems { order, items };
        self.orders.lock().await.push(saved.clone());
        Ok(saved)
    }

    async fn list_orders(&self, query: &OrderListQuery) -> AppResult<(Vec<Order>, i64)> {
        let (_, limit, offset) = query.pagination().normalize();
        let orders = self.orders.lock().await;
        let matching: Vec<Order> = orders
            .iter()
            .filter(|o| query.email.as_ref().is_none_or(|e| &o.order.customer_email == e))
            .map(|o| o.order.clone())
            .collect();
        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        Ok((page, total))
    }

    async fn get_order(&self, id: Uuid) -> AppResult<Option<OrderWithItems>> {
        let orders = self.orders.lock().await;
        Ok(orders.iter().find(|o| o.order.id == id).cloned())
    }
}

pub fn save20() -> Coupon {
    Coupon::percent("SAVE20", 20)
        .with_min_order(Money::from_paise(2000))
        .with_max_discount(Money::from_paise(1000))
}

pub fn default_coupons() -> InMemoryCoupons {
    let expired = Coupon::flat("OLD50", Money::from_paise(50))
        .expiring_at(Utc::now() - Duration::days(1));
    InMemoryCoupons::new([save20(), Coupon::flat("FLAT50", Money::from_paise(50)), expired])
}

/// No shipping, no tax: totals equal subtotal minus discount.
pub fn flat_policy() -> PricingPolicy {
    PricingPolicy {
        shipping_fee: Money::ZERO,
        free_shipping_threshold: Money::ZERO,
        tax_rate_bps: 0,
    }
}

pub fn build_state(
    coupons: Arc<dyn CouponSource>,
    payments: Arc<dyn PaymentGateway>,
    orders: Arc<dyn OrderStore>,
) -> AppState {
    AppState::new(coupons, payments, orders, flat_policy(), Duration::seconds(3))
}

pub fn default_state() -> AppState {
    build_state(
        Arc::new(default_coupons()),
        Arc::new(ScriptedGateway::default()),
        Arc::new(InMemoryOrders::default()),
    )
}

pub fn item(product_id: Uuid, unit_price: i64, quantity: i64) -> AddItemRequest {
    AddItemRequest {
        product_id,
        name: "Linen Kurta".into(),
        unit_price,
        quantity,
        size: "M".into(),
        color: "indigo".into(),
        image_url: None,
    }
}

pub fn customer() -> CustomerInfo {
    CustomerInfo {
        name: "Asha Rao".into(),
        email: "asha@example.com".into(),
        phone: "9876543210".into(),
    }
}
