//! Normal form for simplified unit expressions: `coefficient * Π symbol^power`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Relative tolerance used when comparing coefficients
pub const DEFAULT_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Monomial {
    pub coefficient: f64,
    /// Non-zero powers keyed by symbol name
    pub powers: BTreeMap<String, i32>,
}

impl Monomial {
    pub fn number(value: f64) -> Self {
        Self {
            coefficient: value,
            powers: BTreeMap::new(),
        }
    }

    pub fn one() -> Self {
        Self::number(1.0)
    }

    pub fn symbol(name: &str) -> Self {
        let mut powers = BTreeMap::new();
        powers.insert(name.to_string(), 1);
        Self {
            coefficient: 1.0,
            powers,
        }
    }

    pub fn is_dimensionless(&self) -> bool {
        self.powers.is_empty()
    }

    /// Same symbolic part, coefficients ignored
    pub fn same_dimension(&self, other: &Self) -> bool {
        self.powers == other.powers
    }

    pub fn power_of(&self, name: &str) -> i32 {
        self.powers.get(name).copied().unwrap_or(0)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.powers.keys().map(String::as_str)
    }

    /// None if a combined power overflows `i32`
    pub fn mul(&self, other: &Self) -> Option<Self> {
        let mut powers = self.powers.clone();
        for (name, &p) in &other.powers {
            let power = powers.entry(name.clone()).or_insert(0);
            *power = power.checked_add(p)?;
        }
        powers.retain(|_, p| *p != 0);
        Some(Self {
            coefficient: self.coefficient * other.coefficient,
            powers,
        })
    }

    /// Caller checks for a zero divisor
    pub fn div(&self, other: &Self) -> Option<Self> {
        self.mul(&other.recip()?)
    }

    pub fn recip(&self) -> Option<Self> {
        Some(Self {
            coefficient: 1.0 / self.coefficient,
            powers: self
                .powers
                .iter()
                .map(|(name, &p)| Some((name.clone(), p.checked_neg()?)))
                .collect::<Option<_>>()?,
        })
    }

    pub fn powi(&self, exp: i32) -> Option<Self> {
        if exp == 0 {
            return Some(Self::one());
        }
        Some(Self {
            coefficient: self.coefficient.powi(exp),
            powers: self
                .powers
                .iter()
                .map(|(name, &p)| Some((name.clone(), p.checked_mul(exp)?)))
                .collect::<Option<_>>()?,
        })
    }

    /// Halve every power, or None if any power is odd.
    /// Sign and positivity checks are the caller's job.
    pub fn sqrt(&self) -> Option<Self> {
        if self.powers.values().any(|p| p % 2 != 0) {
            return None;
        }
        Some(Self {
            coefficient: self.coefficient.sqrt(),
            powers: self
                .powers
                .iter()
                .map(|(name, &p)| (name.clone(), p / 2))
                .collect(),
        })
    }

    pub fn scale(&self, factor: f64) -> Self {
        Self {
            coefficient: self.coefficient * factor,
            powers: self.powers.clone(),
        }
    }

    /// Same symbolic part and coefficients equal within `rel_tol`
    pub fn approx_eq(&self, other: &Self, rel_tol: f64) -> bool {
        if !self.same_dimension(other) {
            return false;
        }
        let scale = self.coefficient.abs().max(other.coefficient.abs());
        (self.coefficient - other.coefficient).abs() <= rel_tol * scale
    }

    /// Dimensionless with coefficient 1 within `rel_tol`
    pub fn is_unity(&self, rel_tol: f64) -> bool {
        self.approx_eq(&Self::one(), rel_tol)
    }

    /// Symbolic part only, e.g. `kg*m^2/(s^3*A^2)`
    pub fn unit_part(&self) -> String {
        let numerator: Vec<String> = self
            .powers
            .iter()
            .filter(|(_, p)| **p > 0)
            .map(|(name, p)| format_factor(name, *p))
            .collect();
        let denominator: Vec<String> = self
            .powers
            .iter()
            .filter(|(_, p)| **p < 0)
            .map(|(name, p)| format_factor(name, -*p))
            .collect();

        let num = if numerator.is_empty() {
            "1".to_string()
        } else {
            numerator.join("*")
        };
        match denominator.len() {
            0 => num,
            1 => format!("{}/{}", num, denominator[0]),
            _ => format!("{}/({})", num, denominator.join("*")),
        }
    }
}

fn format_factor(name: &str, power: i32) -> String {
    if power == 1 {
        name.to_string()
    } else {
        format!("{}^{}", name, power)
    }
}

impl fmt::Display for Monomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dimensionless() {
            return write!(f, "{}", self.coefficient);
        }
        if self.coefficient == 1.0 {
            write!(f, "{}", self.unit_part())
        } else {
            write!(f, "{}*{}", self.coefficient, self.unit_part())
        }
    }
}
