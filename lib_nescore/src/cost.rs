//! The [`Cost`] type used throughout the alignment engine.
//!
//! Unlike `generic_search::cost`'s macro-generated integer cost types, scoring costs are
//! fractional (a tag mismatch costs 1.5 in the reference cost model), so this wraps
//! [`noisy_float::types::R64`] instead.

use std::{
    fmt::{Debug, Display},
    hash::{Hash, Hasher},
    ops::{Add, AddAssign, Sub, SubAssign},
    str::FromStr,
};

use generic_search::cost::AStarCost;
use noisy_float::types::R64;
use num_traits::{Bounded, CheckedAdd, CheckedSub, SaturatingSub, Zero};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cost(R64);

impl Cost {
    pub fn new(value: f64) -> Self {
        Self(R64::new(value))
    }

    pub fn as_f64(&self) -> f64 {
        self.0.raw()
    }
}

impl Hash for Cost {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.raw().to_bits().hash(state);
    }
}

impl From<R64> for Cost {
    fn from(value: R64) -> Self {
        Self(value)
    }
}

impl From<u8> for Cost {
    fn from(value: u8) -> Self {
        Self(R64::from(value))
    }
}

impl Add for Cost {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Cost {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for Cost {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Cost {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl SaturatingSub for Cost {
    fn saturating_sub(&self, rhs: &Self) -> Self {
        if self.0 <= rhs.0 {
            Self(R64::new(0.0))
        } else {
            Self(self.0 - rhs.0)
        }
    }
}

impl CheckedAdd for Cost {
    fn checked_add(&self, rhs: &Self) -> Option<Self> {
        Some(Self(self.0 + rhs.0))
    }
}

impl CheckedSub for Cost {
    fn checked_sub(&self, rhs: &Self) -> Option<Self> {
        if self.0 < rhs.0 {
            None
        } else {
            Some(Self(self.0 - rhs.0))
        }
    }
}

impl Zero for Cost {
    fn zero() -> Self {
        Self(R64::new(0.0))
    }

    fn is_zero(&self) -> bool {
        self.0 == R64::new(0.0)
    }
}

impl Bounded for Cost {
    fn min_value() -> Self {
        Self(R64::new(0.0))
    }

    fn max_value() -> Self {
        Self(R64::new(f64::MAX))
    }
}

impl Display for Cost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0.raw(), f)
    }
}

impl FromStr for Cost {
    type Err = <f64 as FromStr>::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        f64::from_str(s).map(|value| Self(R64::new(value)))
    }
}

impl AStarCost for Cost {
    type CostType = f64;

    fn as_f64(&self) -> f64 {
        self.0.raw()
    }

    fn as_u64(&self) -> u64 {
        self.0.raw() as u64
    }

    fn as_primitive(&self) -> Self::CostType {
        self.0.raw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adds_fractional_costs() {
        let a = Cost::new(1.0);
        let b = Cost::new(0.5);
        assert_eq!((a + b).as_f64(), 1.5);
    }

    #[test]
    fn zero_is_neutral() {
        let a = Cost::new(1.5);
        assert_eq!(a + Cost::zero(), a);
    }
}
