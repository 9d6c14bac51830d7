//! Tipo de dinero en unidades menores
//!
//! Todos los montos se almacenan y serializan como enteros en unidades
//! menores (paise). Nunca floats, nunca serialización ambiente de un
//! tipo primitivo.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};

/// Monto en unidades menores de moneda
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
pub struct Money(pub i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn minor(self) -> i64 {
        self.0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        Money(iter.map(|m| m.0).sum())
    }
}

impl From<i64> for Money {
    fn from(minor: i64) -> Self {
        Money(minor)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic() {
        let advance = Money(10_000);
        let expenses = Money(6_500);
        assert_eq!(advance - expenses, Money(3_500));
        assert_eq!(vec![Money(100), Money(250)].into_iter().sum::<Money>(), Money(350));
    }

    #[test]
    fn test_serializes_as_integer() {
        let json = serde_json::to_string(&Money(2_000_000)).unwrap();
        assert_eq!(json, "2000000");
        let back: Money = serde_json::from_str("2000000").unwrap();
        assert_eq!(back, Money(2_000_000));
    }
}
