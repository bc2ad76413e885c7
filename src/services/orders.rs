use async_trait::async_trait;
use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    cart::{CartLineItem, CartSummary},
    dto::orders::OrderWithItems,
    entity::{
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
    },
    error::AppResult,
    models::{CustomerInfo, Order, OrderItem},
    money::Money,
    routes::params::{OrderListQuery, SortOrder},
    services::payment::PaymentReceipt,
};

/// Everything needed to record a paid cart.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: Uuid,
    pub customer: CustomerInfo,
    pub summary: CartSummary,
    pub coupon_code: Option<String>,
    pub payment: PaymentReceipt,
    pub items: Vec<CartLineItem>,
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn persist_order(&self, order: NewOrder) -> AppResult<OrderWithItems>;

    /// Returns the requested page and the total number of matching orders.
    async fn list_orders(&self, query: &OrderListQuery) -> AppResult<(Vec<Order>, i64)>;

    async fn get_order(&self, id: Uuid) -> AppResult<Option<OrderWithItems>>;
}

#[derive(Clone)]
pub struct PgOrderStore {
    orm: DatabaseConnection,
}

impl PgOrderStore {
    pub fn new(orm: DatabaseConnection) -> Self {
        Self { orm }
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn persist_order(&self, new_order: NewOrder) -> AppResult<OrderWithItems> {
        let txn = self.orm.begin().await?;
        let summary = new_order.summary;

        let order = OrderActive {
            id: Set(new_order.id),
            customer_name: Set(new_order.customer.name),
            customer_email: Set(new_order.customer.email),
            customer_phone: Set(new_order.customer.phone),
            subtotal: Set(summary.subtotal.paise()),
            discount: Set(summary.discount.paise()),
            shipping: Set(summary.shipping.paise()),
            tax: Set(summary.tax.paise()),
            total_amount: Set(summary.total.paise()),
            coupon_code: Set(new_order.coupon_code),
            payment_method: Set(new_order.payment.method),
            payment_reference: Set(new_order.payment.payment_id),
            status: Set("paid".into()),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;

        let mut items = Vec::with_capacity(new_order.items.len());
        for line in new_order.items {
            let item = OrderItemActive {
                id: Set(Uuid::new_v4()),
                order_id: Set(order.id),
                product_id: Set(line.product_id),
                name: Set(line.name),
                size: Set(line.size),
                color: Set(line.color),
                quantity: Set(line.quantity),
                unit_price: Set(line.unit_price.paise()),
                created_at: NotSet,
            }
            .insert(&txn)
            .await?;
            items.push(order_item_from_entity(item));
        }

        txn.commit().await?;

        Ok(OrderWithItems {
            order: order_from_entity(order),
            items,
        })
    }

    async fn list_orders(&self, query: &OrderListQuery) -> AppResult<(Vec<Order>, i64)> {
        let (_, limit, offset) = query.pagination().normalize();
        let mut condition = Condition::all();
        if let Some(email) = query.email.as_ref().filter(|e| !e.is_empty()) {
            condition = condition.add(OrderCol::CustomerEmail.eq(email.clone()));
        }

        let mut finder = Orders::find().filter(condition);
        finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
            SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
            SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
        };

        let total = finder.clone().count(&self.orm).await? as i64;
        let orders = finder
            .limit(limit as u64)
            .offset(offset as u64)
            .all(&self.orm)
            .await?
            .into_iter()
            .map(order_from_entity)
            .collect();

        Ok((orders, total))
    }

    async fn get_order(&self, id: Uuid) -> AppResult<Option<OrderWithItems>> {
        let Some(order) = Orders::find_by_id(id).one(&self.orm).await? else {
            return Ok(None);
        };

        let items = OrderItems::find()
            .filter(OrderItemCol::OrderId.eq(order.id))
            .order_by_asc(OrderItemCol::CreatedAt)
            .all(&self.orm)
            .await?
            .into_iter()
            .map(order_item_from_entity)
            .collect();

        Ok(Some(OrderWithItems {
            order: order_from_entity(order),
            items,
        }))
    }
}

fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        customer_name: model.customer_name,
        customer_email: model.customer_email,
        customer_phone: model.customer_phone,
        subtotal: Money::from_paise(model.subtotal),
        discount: Money::from_paise(model.discount),
        shipping: Money::from_paise(model.shipping),
        tax: Money::from_paise(model.tax),
        total_amount: Money::from_paise(model.total_amount),
        coupon_code: model.coupon_code,
        payment_method: model.payment_method,
        payment_reference: model.payment_reference,
        status: model.status,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        name: model.name,
        size: model.size,
        color: model.color,
        quantity: model.quantity,
        unit_price: Money::from_paise(model.unit_price),
        created_at: model.created_at.with_timezone(&Utc),
    }
}
