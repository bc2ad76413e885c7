use std::env;
use std::str::FromStr;

use crate::cart::{MAX_CART_SUBTOTAL, PricingPolicy};
use crate::money::{FULL_BPS, Money};
use crate::notify::DEFAULT_TOAST_TTL_SECS;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub pricing: PricingPolicy,
    pub toast_ttl_secs: i64,
    /// Sessions untouched this long are dropped.
    pub session_idle_secs: i64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env_or("APP_PORT", 3000);

        let defaults = PricingPolicy::default();
        let pricing = PricingPolicy {
            shipping_fee: Money::from_paise(env_or(
                "SHIPPING_FEE_PAISE",
                defaults.shipping_fee.paise(),
            )),
            free_shipping_threshold: Money::from_paise(env_or(
                "FREE_SHIPPING_THRESHOLD_PAISE",
                defaults.free_shipping_threshold.paise(),
            )),
            tax_rate_bps: env_or("TAX_RATE_BPS", defaults.tax_rate_bps),
        };
        if pricing.shipping_fee.is_negative() || pricing.shipping_fee > MAX_CART_SUBTOTAL {
            anyhow::bail!("SHIPPING_FEE_PAISE must be between 0 and {}", MAX_CART_SUBTOTAL.paise());
        }
        if !(0..=FULL_BPS).contains(&pricing.tax_rate_bps) {
            anyhow::bail!("TAX_RATE_BPS must be between 0 and {FULL_BPS}");
        }

        let toast_ttl_secs = env_or("TOAST_TTL_SECS", DEFAULT_TOAST_TTL_SECS).max(1);
        let session_idle_secs = env_or("SESSION_IDLE_SECS", 24 * 60 * 60).max(60);

        Ok(Self {
            port,
            database_url,
            host,
            pricing,
            toast_ttl_secs,
            session_idle_secs,
        })
    }
}

/// Parse `key`, falling back to `default` when unset or malformed.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}
