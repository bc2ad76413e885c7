use chrono::{Duration, Utc};
use storefront_cart::{config::AppConfig, db::create_pool};

struct SeedCoupon {
    code: &'static str,
    discount_type: &'static str,
    discount_value: i64,
    min_order_amount: i64,
    max_discount_amount: Option<i64>,
    valid_days: Option<i64>,
}

const COUPONS: &[SeedCoupon] = &[
    SeedCoupon {
        code: "SAVE20",
        discount_type: "percent",
        discount_value: 20,
        min_order_amount: 200_000,
        max_discount_amount: Some(100_000),
        valid_days: Some(90),
    },
    SeedCoupon {
        code: "WELCOME10",
        discount_type: "percent",
        discount_value: 10,
        min_order_amount: 0,
        max_discount_amount: Some(20_000),
        valid_days: None,
    },
    SeedCoupon {
        code: "FLAT100",
        discount_type: "flat",
        discount_value: 10_000,
        min_order_amount: 99_900,
        max_discount_amount: None,
        valid_days: Some(30),
    },
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    seed_coupons(&pool).await?;

    println!("Seed completed");
    Ok(())
}

async fn seed_coupons(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    for coupon in COUPONS {
        let expires_at = coupon.valid_days.map(|days| Utc::now() + Duration::days(days));
        sqlx::query(
            r#"
            INSERT INTO coupons (code, discount_type, discount_value, min_order_amount,
                                 max_discount_amount, expires_at, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, TRUE)
            ON CONFLICT (code) DO UPDATE
            SET discount_type = EXCLUDED.discount_type,
                discount_value = EXCLUDED.discount_value,
                min_order_amount = EXCLUDED.min_order_amount,
                max_discount_amount = EXCLUDED.max_discount_amount,
                expires_at = EXCLUDED.expires_at,
                is_active = TRUE
            "#,
        )
        .bind(coupon.code)
        .bind(coupon.discount_type)
        .bind(coupon.discount_value)
        .bind(coupon.min_order_amount)
        .bind(coupon.max_discount_amount)
        .bind(expires_at)
        .execute(pool)
        .await?;

        println!("Ensured coupon {}", coupon.code);
    }
    Ok(())
}
