//! Named-field order specifications for the three model families.
//!
//! Orders carry named fields rather than positional tuples, so the driver
//! never reconstructs a seasonal order by slicing a flat tuple.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Non-seasonal order (p, d, q): autoregressive, differencing, and
/// moving-average degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlainOrder {
    /// Autoregressive degree.
    pub p: usize,
    /// Differencing degree.
    pub d: usize,
    /// Moving-average degree.
    pub q: usize,
}

impl PlainOrder {
    /// Create a new plain order.
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    /// Number of estimated coefficients (AR + MA + intercept).
    pub fn num_coeffs(&self) -> usize {
        self.p + self.q + 1
    }
}

impl fmt::Display for PlainOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.p, self.d, self.q)
    }
}

/// Seasonal order (P, D, Q) at period m.
///
/// The period is part of the order but is fixed per search, never searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeasonalOrder {
    /// Seasonal autoregressive degree.
    pub cap_p: usize,
    /// Seasonal differencing degree.
    pub cap_d: usize,
    /// Seasonal moving-average degree.
    pub cap_q: usize,
    /// Seasonal period length (positive).
    pub m: usize,
}

impl SeasonalOrder {
    /// Create a new seasonal order.
    pub fn new(cap_p: usize, cap_d: usize, cap_q: usize, m: usize) -> Self {
        Self {
            cap_p,
            cap_d,
            cap_q,
            m,
        }
    }

    /// True when no seasonal terms are present.
    pub fn is_trivial(&self) -> bool {
        self.cap_p == 0 && self.cap_d == 0 && self.cap_q == 0
    }
}

impl fmt::Display for SeasonalOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {})[{}]",
            self.cap_p, self.cap_d, self.cap_q, self.m
        )
    }
}

/// Full seasonal model order: the plain and seasonal parts together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SarimaOrder {
    /// Non-seasonal part.
    pub plain: PlainOrder,
    /// Seasonal part, including the period.
    pub seasonal: SeasonalOrder,
}

impl SarimaOrder {
    /// Combine a plain and a seasonal order.
    pub fn new(plain: PlainOrder, seasonal: SeasonalOrder) -> Self {
        Self { plain, seasonal }
    }
}

impl fmt::Display for SarimaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.plain, self.seasonal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_order_coeff_count() {
        let order = PlainOrder::new(2, 1, 3);
        assert_eq!(order.num_coeffs(), 6);
        assert_eq!(order.to_string(), "(2, 1, 3)");
    }

    #[test]
    fn seasonal_order_display() {
        let order = SeasonalOrder::new(1, 0, 1, 7);
        assert_eq!(order.to_string(), "(1, 0, 1)[7]");
        assert!(!order.is_trivial());
        assert!(SeasonalOrder::new(0, 0, 0, 7).is_trivial());
    }

    #[test]
    fn sarima_order_display() {
        let order = SarimaOrder::new(PlainOrder::new(1, 0, 1), SeasonalOrder::new(0, 1, 1, 7));
        assert_eq!(order.to_string(), "(1, 0, 1)(0, 1, 1)[7]");
    }

    #[test]
    fn orders_serialize_round_trip() {
        let order = SarimaOrder::new(PlainOrder::new(2, 1, 0), SeasonalOrder::new(1, 1, 0, 12));
        let json = serde_json::to_string(&order).unwrap();
        let back: SarimaOrder = serde_json::from_str(&json).unwrap();
        assert_eq!(order, back);
    }
}
