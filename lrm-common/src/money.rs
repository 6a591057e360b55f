//! Dollar amounts stored as integer cents
//!
//! Stored JSON carries amounts as plain numbers (`150.0`), occasionally as
//! strings or `null`. All of those read into [`Money`]; writes always emit a
//! number in dollars so files stay readable by hand.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;

use crate::Error;

/// Amount of money in US cents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    pub const fn from_dollars(dollars: i64) -> Self {
        Money(dollars.saturating_mul(100))
    }

    /// Round a floating dollar value to the nearest cent
    pub fn from_f64(dollars: f64) -> Self {
        if dollars.is_finite() {
            Money((dollars * 100.0).round() as i64)
        } else {
            Money::ZERO
        }
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Divide evenly, rounding to the nearest cent. Division by zero yields zero.
    pub fn divide(self, divisor: u32) -> Money {
        if divisor == 0 {
            return Money::ZERO;
        }
        Money::from_f64(self.as_f64() / divisor as f64)
    }

    /// Parse a form field; blank input is zero
    pub fn parse_field(input: &str) -> Result<Money, Error> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(Money::ZERO);
        }
        trimmed.parse()
    }

    /// Plain decimal rendering (`1234.50`), used in form values and CSV
    pub fn to_decimal_string(self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        format!("{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl FromStr for Money {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned: String = s
            .trim()
            .chars()
            .filter(|c| *c != '$' && *c != ',')
            .collect();
        let dollars: f64 = cleaned
            .parse()
            .map_err(|_| Error::InvalidInput(format!("Invalid amount: {}", s)))?;
        if !dollars.is_finite() {
            return Err(Error::InvalidInput(format!("Invalid amount: {}", s)));
        }
        Ok(Money::from_f64(dollars))
    }
}

/// Currency rendering: `$1,234.56`, negatives as `-$12.00`
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let abs = self.0.unsigned_abs();
        let dollars = (abs / 100).to_string();
        let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
        for (i, ch) in dollars.chars().enumerate() {
            if i > 0 && (dollars.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        if self.0 < 0 {
            write!(f, "-")?;
        }
        write!(f, "${}.{:02}", grouped, abs % 100)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
            Null,
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(Money::from_f64(n)),
            Raw::Text(s) => Money::parse_field(&s).map_err(serde::de::Error::custom),
            Raw::Null => Ok(Money::ZERO),
        }
    }
}
