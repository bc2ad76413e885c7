use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::{
    cart::{Coupon, DiscountType},
    db::DbPool,
    error::{AppError, AppResult},
    money::Money,
};

/// Where coupons come from. `code` is already normalized.
#[async_trait]
pub trait CouponSource: Send + Sync {
    async fn fetch_coupon_by_code(&self, code: &str) -> AppResult<Option<Coupon>>;
}

#[derive(FromRow)]
struct CouponRow {
    code: String,
    discount_type: String,
    discount_value: i64,
    min_order_amount: i64,
    max_discount_amount: Option<i64>,
    expires_at: Option<DateTime<Utc>>,
    is_active: bool,
}

impl TryFrom<CouponRow> for Coupon {
    type Error = AppError;

    fn try_from(row: CouponRow) -> Result<Self, Self::Error> {
        let discount_type = DiscountType::parse(&row.discount_type).ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "coupon {} has unknown discount type {}",
                row.code,
                row.discount_type
            ))
        })?;
        Ok(Coupon {
            code: row.code.to_uppercase(),
            discount_type,
            discount_value: row.discount_value,
            min_order_amount: Money::from_paise(row.min_order_amount),
            max_discount_amount: row.max_discount_amount.map(Money::from_paise),
            expires_at: row.expires_at,
            is_active: row.is_active,
        })
    }
}

/// Reads the `coupons` table.
#[derive(Clone)]
pub struct PgCouponSource {
    pool: DbPool,
}

impl PgCouponSource {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CouponSource for PgCouponSource {
    async fn fetch_coupon_by_code(&self, code: &str) -> AppResult<Option<Coupon>> {
        tracing::debug!(code, "looking up coupon");
        let row = sqlx::query_as::<_, CouponRow>(
            r#"
            SELECT code, discount_type, discount_value, min_order_amount,
                   max_discount_amount, expires_at, is_active
            FROM coupons
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Coupon::try_from).transpose()
    }
}
