//! Simplifier: brings an expression into monomial normal form by substituting
//! the current values from a symbol table.

use super::monomial::Monomial;
use super::parser::{parse_expression, BinaryOperator, Expr, ParseError, UnaryOperator};
use super::types::{Assumption, SymbolTable};
use crate::units::UnitError;
use thiserror::Error;

/// Exponents closer than this to an integer are treated as integral
const INTEGER_EXPONENT_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// Name is neither a declared symbol nor an earlier binding
    #[error("Undefined symbol: {0}")]
    UndefinedSymbol(String),
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Unknown function: {0}")]
    UnknownFunction(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Cannot combine terms {left} and {right}")]
    IncompatibleTerms { left: String, right: String },
    #[error("Exponent must be dimensionless, got {0}")]
    DimensionedExponent(String),
    #[error("Non-integer exponent {exponent} applied to {base}")]
    NonIntegerExponent { base: String, exponent: f64 },
    #[error("{function} needs a dimensionless argument, got {argument}")]
    DimensionedArgument { function: String, argument: String },
    #[error("Symbol '{symbol}' must be declared {assumption}")]
    AssumptionRequired {
        symbol: String,
        assumption: Assumption,
    },
    /// A symbol power left the `i32` range
    #[error("Exponent overflow in {0}")]
    ExponentOverflow(String),
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: String, got: String },
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Unit(#[from] UnitError),
}

/// Simplify a parsed expression against the current table
pub fn simplify(expr: &Expr, table: &SymbolTable) -> Result<Monomial, EvalError> {
    match expr {
        Expr::Number(n) => Ok(Monomial::number(*n)),

        Expr::Symbol(name) => table
            .value(name)
            .ok_or_else(|| EvalError::UndefinedSymbol(name.clone())),

        Expr::Constant(c) => Ok(Monomial::number(c.value())),

        Expr::BinaryOp { op, left, right } => {
            let l = simplify(left, table)?;
            let r = simplify(right, table)?;
            match op {
                BinaryOperator::Add => add_terms(&l, &r, 1.0),
                BinaryOperator::Sub => add_terms(&l, &r, -1.0),
                BinaryOperator::Mul => l
                    .mul(&r)
                    .ok_or_else(|| EvalError::ExponentOverflow(format!("({})*({})", l, r))),
                BinaryOperator::Div => {
                    if r.coefficient == 0.0 {
                        return Err(EvalError::DivisionByZero);
                    }
                    l.div(&r)
                        .ok_or_else(|| EvalError::ExponentOverflow(format!("({})/({})", l, r)))
                }
                BinaryOperator::Pow => power(&l, &r),
            }
        }

        Expr::UnaryOp { op, operand } => {
            let val = simplify(operand, table)?;
            match op {
                UnaryOperator::Neg => Ok(val.scale(-1.0)),
            }
        }

        Expr::FnCall { name, arg } => {
            let val = simplify(arg, table)?;
            apply_function(name, &val, table)
        }
    }
}

fn add_terms(left: &Monomial, right: &Monomial, sign: f64) -> Result<Monomial, EvalError> {
    if !left.same_dimension(right) {
        return Err(EvalError::IncompatibleTerms {
            left: left.to_string(),
            right: right.to_string(),
        });
    }
    Ok(Monomial {
        coefficient: left.coefficient + sign * right.coefficient,
        powers: left.powers.clone(),
    })
}

fn power(base: &Monomial, exponent: &Monomial) -> Result<Monomial, EvalError> {
    if !exponent.is_dimensionless() {
        return Err(EvalError::DimensionedExponent(exponent.to_string()));
    }
    let exp = exponent.coefficient;
    let rounded = exp.round();
    let integral = (exp - rounded).abs() < INTEGER_EXPONENT_TOLERANCE;

    if integral && rounded < 0.0 && base.coefficient == 0.0 {
        return Err(EvalError::DivisionByZero);
    }
    let overflow = || EvalError::ExponentOverflow(format!("({})^{}", base, rounded));

    if integral && rounded.abs() <= i32::MAX as f64 {
        return base.powi(rounded as i32).ok_or_else(overflow);
    }

    if base.is_dimensionless() {
        if base.coefficient < 0.0 && !integral {
            return Err(EvalError::InvalidArgument(format!(
                "negative base {} with non-integer exponent {}",
                base.coefficient, exp
            )));
        }
        let exp = if integral { rounded } else { exp };
        return Ok(Monomial::number(base.coefficient.powf(exp)));
    }

    if integral {
        return Err(overflow());
    }
    Err(EvalError::NonIntegerExponent {
        base: base.to_string(),
        exponent: exp,
    })
}

/// Every symbol of `val` must be a free symbol declared positive
fn require_positive(val: &Monomial, table: &SymbolTable) -> Result<(), EvalError> {
    match val.symbols().find(|name| !table.is_positive(name)) {
        Some(name) => Err(EvalError::AssumptionRequired {
            symbol: name.to_string(),
            assumption: Assumption::Positive,
        }),
        None => Ok(()),
    }
}

fn dimensionless_arg(function: &str, val: &Monomial) -> Result<f64, EvalError> {
    if val.is_dimensionless() {
        Ok(val.coefficient)
    } else {
        Err(EvalError::DimensionedArgument {
            function: function.to_string(),
            argument: val.to_string(),
        })
    }
}

fn apply_function(name: &str, val: &Monomial, table: &SymbolTable) -> Result<Monomial, EvalError> {
    match name {
        "sqrt" => {
            if val.coefficient < 0.0 {
                return Err(EvalError::InvalidArgument("sqrt of negative number".to_string()));
            }
            require_positive(val, table)?;
            val.sqrt().ok_or_else(|| EvalError::NonIntegerExponent {
                base: val.to_string(),
                exponent: 0.5,
            })
        }
        "abs" => {
            require_positive(val, table)?;
            Ok(Monomial {
                coefficient: val.coefficient.abs(),
                powers: val.powers.clone(),
            })
        }
        "sin" => Ok(Monomial::number(dimensionless_arg(name, val)?.sin())),
        "cos" => Ok(Monomial::number(dimensionless_arg(name, val)?.cos())),
        "tan" => Ok(Monomial::number(dimensionless_arg(name, val)?.tan())),
        "exp" => Ok(Monomial::number(dimensionless_arg(name, val)?.exp())),
        "ln" => {
            let x = dimensionless_arg(name, val)?;
            if x <= 0.0 {
                Err(EvalError::InvalidArgument("ln of non-positive number".to_string()))
            } else {
                Ok(Monomial::number(x.ln()))
            }
        }
        "log10" => {
            let x = dimensionless_arg(name, val)?;
            if x <= 0.0 {
                Err(EvalError::InvalidArgument("log10 of non-positive number".to_string()))
            } else {
                Ok(Monomial::number(x.log10()))
            }
        }
        _ => Err(EvalError::UnknownFunction(name.to_string())),
    }
}

/// Parse and simplify an expression string
pub fn evaluate(expression: &str, table: &SymbolTable) -> Result<Monomial, EvalError> {
    let expr = parse_expression(expression)?;
    simplify(&expr, table)
}

/// Numeric value of an expression that simplifies to a pure number
pub fn numeric_value(expression: &str, table: &SymbolTable) -> Result<f64, EvalError> {
    let value = evaluate(expression, table)?;
    if value.is_dimensionless() {
        Ok(value.coefficient)
    } else {
        Err(EvalError::DimensionMismatch {
            expected: "1".to_string(),
            got: value.unit_part(),
        })
    }
}

/// Value of `expression` measured in `unit`, e.g. `epsilon0` in `F/m`
pub fn express_in(expression: &str, unit: &str, table: &SymbolTable) -> Result<f64, EvalError> {
    let value = evaluate(expression, table)?;
    let unit_value = evaluate(unit, table)?;
    if !value.same_dimension(&unit_value) {
        return Err(EvalError::DimensionMismatch {
            expected: unit_value.unit_part(),
            got: value.unit_part(),
        });
    }
    if unit_value.coefficient == 0.0 {
        return Err(EvalError::DivisionByZero);
    }
    Ok(value.coefficient / unit_value.coefficient)
}

#[cfg(test)]
mod evaluator_tests {
    use super::*;
    use crate::symbols::types::{Binding, Symbol};

    fn base_table() -> SymbolTable {
        let mut table = SymbolTable::new();
        for name in ["kg", "m", "s", "A"] {
            table.declare(Symbol::positive(name));
        }
        table
    }

    fn bind(table: &mut SymbolTable, name: &str, expression: &str) {
        let value = evaluate(expression, table).unwrap();
        table.bind(Binding::new(name, expression, value));
    }

    #[test]
    fn test_eval_numbers() {
        let table = SymbolTable::new();
        assert!((numeric_value("2 + 3 * 4", &table).unwrap() - 14.0).abs() < 1e-12);
        assert!((numeric_value("(2 + 3) * 4", &table).unwrap() - 20.0).abs() < 1e-12);
        assert!((numeric_value("-2^2", &table).unwrap() + 4.0).abs() < 1e-12);
        assert!((numeric_value("10^-7", &table).unwrap() - 1e-7).abs() < 1e-20);
    }

    #[test]
    fn test_eval_symbol_product() {
        let table = base_table();
        let value = evaluate("kg*m/s^2", &table).unwrap();
        assert_eq!(value.power_of("kg"), 1);
        assert_eq!(value.power_of("m"), 1);
        assert_eq!(value.power_of("s"), -2);
        assert_eq!(value.coefficient, 1.0);
    }

    #[test]
    fn test_eval_substitutes_bindings() {
        let mut table = base_table();
        bind(&mut table, "N", "kg*m/s^2");
        bind(&mut table, "J", "N*m");
        let joule = evaluate("J", &table).unwrap();
        assert_eq!(joule, evaluate("kg*m^2/s^2", &table).unwrap());
    }

    #[test]
    fn test_eval_undefined_symbol() {
        let table = base_table();
        let result = evaluate("V/m", &table);
        assert_eq!(result, Err(EvalError::UndefinedSymbol("V".to_string())));
    }

    #[test]
    fn test_eval_division_by_zero() {
        let table = base_table();
        assert_eq!(evaluate("m/0", &table), Err(EvalError::DivisionByZero));
        assert_eq!(evaluate("0^-1", &table), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn test_eval_like_terms_add() {
        let table = base_table();
        let value = evaluate("2*m + 3*m - m", &table).unwrap();
        assert!((value.coefficient - 4.0).abs() < 1e-12);
        assert_eq!(value.power_of("m"), 1);
    }

    #[test]
    fn test_eval_unlike_terms_error() {
        let table = base_table();
        assert!(matches!(
            evaluate("m + s", &table),
            Err(EvalError::IncompatibleTerms { .. })
        ));
    }

    #[test]
    fn test_eval_dimensioned_exponent_error() {
        let table = base_table();
        assert!(matches!(
            evaluate("2^m", &table),
            Err(EvalError::DimensionedExponent(_))
        ));
    }

    #[test]
    fn test_eval_fractional_power() {
        let table = base_table();
        assert!((numeric_value("4^0.5", &table).unwrap() - 2.0).abs() < 1e-12);
        assert!(matches!(
            evaluate("m^0.5", &table),
            Err(EvalError::NonIntegerExponent { .. })
        ));
    }

    #[test]
    fn test_eval_exponent_overflow() {
        let table = base_table();
        assert!(matches!(
            evaluate("(m^100000)^100000", &table),
            Err(EvalError::ExponentOverflow(_))
        ));
        assert!(matches!(
            evaluate("m^2147483647*m", &table),
            Err(EvalError::ExponentOverflow(_))
        ));
        assert!(matches!(
            evaluate("m/m^-2147483647/m", &table),
            Err(EvalError::ExponentOverflow(_))
        ));
        assert!(matches!(
            evaluate("m^1e10", &table),
            Err(EvalError::ExponentOverflow(_))
        ));
        assert!((numeric_value("1^1e10", &table).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_eval_sqrt_of_units() {
        let table = base_table();
        let value = evaluate("sqrt(4*m^2/s^2)", &table).unwrap();
        assert!((value.coefficient - 2.0).abs() < 1e-12);
        assert_eq!(value.power_of("m"), 1);
        assert_eq!(value.power_of("s"), -1);
    }

    #[test]
    fn test_eval_sqrt_needs_positive_assumption() {
        let mut table = base_table();
        table.declare(Symbol::new("x"));
        assert_eq!(
            evaluate("sqrt(x^2)", &table),
            Err(EvalError::AssumptionRequired {
                symbol: "x".to_string(),
                assumption: Assumption::Positive,
            })
        );
    }

    #[test]
    fn test_eval_sqrt_odd_power_error() {
        let table = base_table();
        assert!(matches!(
            evaluate("sqrt(m)", &table),
            Err(EvalError::NonIntegerExponent { .. })
        ));
        assert!(matches!(
            evaluate("sqrt(-1)", &table),
            Err(EvalError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_eval_transcendental_needs_dimensionless() {
        let table = base_table();
        assert!(numeric_value("cos(0)", &table).unwrap() == 1.0);
        assert!(matches!(
            evaluate("sin(m)", &table),
            Err(EvalError::DimensionedArgument { .. })
        ));
    }

    #[test]
    fn test_eval_unknown_function() {
        let table = base_table();
        assert_eq!(
            evaluate("mystery(m)", &table),
            Err(EvalError::UnknownFunction("mystery".to_string()))
        );
    }

    #[test]
    fn test_numeric_value_rejects_units() {
        let table = base_table();
        assert!(matches!(
            numeric_value("3*m", &table),
            Err(EvalError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_express_in() {
        let mut table = base_table();
        bind(&mut table, "km", "1000*m");
        let value = express_in("5000*m", "km", &table).unwrap();
        assert!((value - 5.0).abs() < 1e-12);
        assert!(matches!(
            express_in("m", "s", &table),
            Err(EvalError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_parse_error_propagates() {
        let table = base_table();
        assert!(matches!(evaluate("(m", &table), Err(EvalError::Parse(_))));
    }
}
