use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitError {
    #[error("'{0}' is not an SI base unit symbol")]
    NotBaseUnit(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaseQuantity {
    Mass,
    Length,
    Time,
    Current,
}

impl BaseQuantity {
    pub const ALL: [BaseQuantity; 4] = [Self::Mass, Self::Length, Self::Time, Self::Current];

    /// SI unit symbol used for this quantity in declaration scripts
    pub fn si_symbol(&self) -> &'static str {
        match self {
            Self::Mass => "kg",
            Self::Length => "m",
            Self::Time => "s",
            Self::Current => "A",
        }
    }

    pub fn from_si_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "kg" => Some(Self::Mass),
            "m" => Some(Self::Length),
            "s" => Some(Self::Time),
            "A" => Some(Self::Current),
            _ => None,
        }
    }

    /// Letter used in dimensional formulas (M, L, T, I)
    pub fn letter(&self) -> char {
        match self {
            Self::Mass => 'M',
            Self::Length => 'L',
            Self::Time => 'T',
            Self::Current => 'I',
        }
    }
}

impl fmt::Display for BaseQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mass => write!(f, "mass"),
            Self::Length => write!(f, "length"),
            Self::Time => write!(f, "time"),
            Self::Current => write!(f, "current"),
        }
    }
}

/// Exponents of the four base quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Dimension {
    pub mass: i32,
    pub length: i32,
    pub time: i32,
    pub current: i32,
}

impl Dimension {
    pub const DIMENSIONLESS: Dimension = Dimension {
        mass: 0,
        length: 0,
        time: 0,
        current: 0,
    };

    pub fn new(mass: i32, length: i32, time: i32, current: i32) -> Self {
        Self {
            mass,
            length,
            time,
            current,
        }
    }

    /// Build a dimension from symbol powers keyed by SI symbol name.
    /// Any other symbol makes the formula inexpressible in base quantities.
    pub fn from_powers(powers: &BTreeMap<String, i32>) -> Result<Self, UnitError> {
        let mut dim = Self::DIMENSIONLESS;
        for (symbol, &power) in powers {
            let quantity = BaseQuantity::from_si_symbol(symbol)
                .ok_or_else(|| UnitError::NotBaseUnit(symbol.clone()))?;
            *dim.exponent_mut(quantity) += power;
        }
        Ok(dim)
    }

    pub fn exponent(&self, quantity: BaseQuantity) -> i32 {
        match quantity {
            BaseQuantity::Mass => self.mass,
            BaseQuantity::Length => self.length,
            BaseQuantity::Time => self.time,
            BaseQuantity::Current => self.current,
        }
    }

    fn exponent_mut(&mut self, quantity: BaseQuantity) -> &mut i32 {
        match quantity {
            BaseQuantity::Mass => &mut self.mass,
            BaseQuantity::Length => &mut self.length,
            BaseQuantity::Time => &mut self.time,
            BaseQuantity::Current => &mut self.current,
        }
    }

    pub fn is_dimensionless(&self) -> bool {
        *self == Self::DIMENSIONLESS
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dimensionless() {
            return write!(f, "1");
        }
        let mut first = true;
        for quantity in BaseQuantity::ALL {
            let exp = self.exponent(quantity);
            if exp == 0 {
                continue;
            }
            if !first {
                write!(f, " ")?;
            }
            first = false;
            if exp == 1 {
                write!(f, "{}", quantity.letter())?;
            } else {
                write!(f, "{}^{}", quantity.letter(), exp)?;
            }
        }
        Ok(())
    }
}
