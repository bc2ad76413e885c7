//! Rupee amounts held in paise.
//!
//! Every price, discount and total in the cart is an integer count of paise so
//! percentage math never drifts. Rates are applied with round-half-up to the
//! nearest paisa.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Paise per rupee.
pub const PAISE_PER_RUPEE: i64 = 100;

/// Basis points in 100%.
pub const FULL_BPS: i64 = 10_000;

/// An amount of Indian rupees in minor units (paise).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
#[schema(value_type = i64, example = 49900)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_paise(paise: i64) -> Self {
        Self(paise)
    }

    pub const fn from_rupees(rupees: i64) -> Self {
        Self(rupees * PAISE_PER_RUPEE)
    }

    pub const fn paise(self) -> i64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_mul(self, factor: i64) -> Option<Money> {
        self.0.checked_mul(factor).map(Money)
    }

    /// Subtraction that bottoms out at zero.
    pub fn saturating_sub(self, other: Money) -> Money {
        Money((self.0 - other.0).max(0))
    }

    /// `self * bps / 10_000`, rounded half up.
    ///
    /// ```
    /// use storefront_cart::money::Money;
    /// // 18% of ₹0.25 is 4.5 paise, which rounds up to 5.
    /// assert_eq!(Money::from_paise(25).percent_bps(1800), Money::from_paise(5));
    /// ```
    pub fn percent_bps(self, bps: i64) -> Money {
        Money(mul_div_round_half_up(self.0, bps, FULL_BPS))
    }

    /// `self * percent / 100`, rounded half up.
    pub fn percent(self, percent: i64) -> Money {
        Money(mul_div_round_half_up(self.0, percent, 100))
    }

    /// Format with the rupee sign, e.g. `₹499.00`.
    pub fn display(self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per = PAISE_PER_RUPEE as u64;
        format!("{sign}\u{20b9}{}.{:02}", abs / per, abs % per)
    }
}

/// Integer `value * numerator / denominator` rounding halves away from zero.
fn mul_div_round_half_up(value: i64, numerator: i64, denominator: i64) -> i64 {
    let product = value as i128 * numerator as i128;
    let denominator = denominator as i128;
    let half = denominator / 2;
    let rounded = if product >= 0 {
        (product + half) / denominator
    } else {
        (product - half) / denominator
    };
    rounded.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

impl Add for Money {
    type Output = Money;

    fn add(self, other: Money) -> Money {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Money) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        Money(self.0 - other.0)
    }
}

impl Mul<i64> for Money {
    type Output = Money;

    fn mul(self, factor: i64) -> Money {
        Money(self.0 * factor)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}
