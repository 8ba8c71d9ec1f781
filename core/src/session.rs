//! Symbolic session: runs declaration scripts against a symbol table.

use crate::symbols::evaluator::{self, EvalError};
use crate::symbols::script::{self, Statement};
use crate::symbols::{Binding, Monomial, ParseError, Symbol, SymbolTable};
use crate::units::Dimension;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
    #[error("line {line}: {source}")]
    Parse { line: usize, source: ParseError },
    #[error("line {line}: {source}")]
    Eval { line: usize, source: EvalError },
}

impl ScriptError {
    pub fn line(&self) -> usize {
        match self {
            Self::Parse { line, .. } | Self::Eval { line, .. } => *line,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    table: SymbolTable,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_table(table: SymbolTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &SymbolTable {
        &self.table
    }

    pub fn into_table(self) -> SymbolTable {
        self.table
    }

    /// Apply one statement. Bindings are simplified against the table as it
    /// stands, so they can only see names declared before them.
    pub fn execute(&mut self, statement: &Statement) -> Result<(), EvalError> {
        match statement {
            Statement::Declare { names, assumptions } => {
                for name in names {
                    let symbol = Symbol {
                        name: name.clone(),
                        assumptions: assumptions.clone(),
                    };
                    if self.table.declare(symbol).is_some() {
                        debug!(name = %name, "redeclared symbol");
                    } else {
                        debug!(name = %name, "declared symbol");
                    }
                }
            }
            Statement::Assign { name, source, expr } => {
                let value = evaluator::simplify(expr, &self.table)?;
                debug!(name = %name, value = %value, "bound");
                if self.table.bind(Binding::new(name, source, value)).is_some() {
                    debug!(name = %name, "overwrote earlier definition");
                }
            }
        }
        Ok(())
    }

    /// Run a script in order, stopping at the first failing statement.
    /// Statements before the failure stay applied.
    /// Returns the number of statements executed.
    pub fn run_script(&mut self, source: &str) -> Result<usize, ScriptError> {
        let mut executed = 0;
        for item in script::statements(source) {
            let script_line =
                item.map_err(|(line, source)| ScriptError::Parse { line, source })?;
            self.execute(&script_line.statement)
                .map_err(|source| ScriptError::Eval {
                    line: script_line.line,
                    source,
                })?;
            executed += 1;
        }
        info!(statements = executed, names = self.table.len(), "script loaded");
        Ok(executed)
    }

    pub fn evaluate(&self, expression: &str) -> Result<Monomial, EvalError> {
        evaluator::evaluate(expression, &self.table)
    }

    pub fn value(&self, name: &str) -> Option<Monomial> {
        self.table.value(name)
    }

    pub fn express_in(&self, expression: &str, unit: &str) -> Result<f64, EvalError> {
        evaluator::express_in(expression, unit, &self.table)
    }

    /// Dimensional formula of an expression over the SI base symbols
    pub fn dimension_of(&self, expression: &str) -> Result<Dimension, EvalError> {
        let value = self.evaluate(expression)?;
        Ok(Dimension::from_powers(&value.powers)?)
    }

    /// Unit-consistency check: both sides must reduce to the same symbolic part
    pub fn check_consistent(&self, lhs: &str, rhs: &str) -> Result<(), EvalError> {
        let left = self.evaluate(lhs)?;
        let right = self.evaluate(rhs)?;
        if left.same_dimension(&right) {
            Ok(())
        } else {
            Err(EvalError::DimensionMismatch {
                expected: left.unit_part(),
                got: right.unit_part(),
            })
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_script_counts_statements() {
        let mut session = Session::new();
        let n = session
            .run_script("symbol m, s: positive\nv = m/s; a = v/s\n")
            .unwrap();
        assert_eq!(n, 3);
        assert_eq!(session.table().len(), 4);
    }

    #[test]
    fn test_forward_reference_fails_with_line() {
        let mut session = Session::new();
        let err = session
            .run_script("symbol m\nx = y*m\ny = 2\n")
            .unwrap_err();
        assert_eq!(
            err,
            ScriptError::Eval {
                line: 2,
                source: EvalError::UndefinedSymbol("y".to_string()),
            }
        );
    }

    #[test]
    fn test_failure_keeps_earlier_statements() {
        let mut session = Session::new();
        let err = session.run_script("symbol m\nL = 2*m\nbad = (\n").unwrap_err();
        assert_eq!(err.line(), 3);
        assert!(matches!(err, ScriptError::Parse { .. }));
        assert!(session.value("L").is_some());
        assert!(session.value("bad").is_none());
    }

    #[test]
    fn test_builtin_constant_cannot_be_rebound() {
        let mut session = Session::new();
        let err = session.run_script("pi = 3\nx = pi\n").unwrap_err();
        assert_eq!(err.line(), 1);
        assert!(matches!(err, ScriptError::Parse { .. }));
        assert!(session.table().is_empty());

        let x = session.evaluate("2*pi").unwrap();
        assert!((x.coefficient - 2.0 * std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn test_redefinition_last_write_wins() {
        let mut session = Session::new();
        session
            .run_script("symbol m: positive\nx = 2*m\ny = x\nx = 3*m\n")
            .unwrap();

        assert_eq!(session.value("x").unwrap().coefficient, 3.0);
        // y was simplified before the redefinition
        assert_eq!(session.value("y").unwrap().coefficient, 2.0);
        let names: Vec<_> = session.table().names().collect();
        assert_eq!(names, vec!["m", "x", "y"]);
    }

    #[test]
    fn test_binding_can_shadow_symbol() {
        let mut session = Session::new();
        session.run_script("symbol k\nk = 5").unwrap();
        assert_eq!(session.value("k"), Some(Monomial::number(5.0)));
        assert!(session.table().symbol("k").is_none());
    }

    #[test]
    fn test_check_consistent() {
        let mut session = Session::new();
        session.run_script("symbol m, s: positive\nv = m/s").unwrap();
        assert!(session.check_consistent("v*s", "3*m").is_ok());
        assert!(matches!(
            session.check_consistent("v", "m"),
            Err(EvalError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_dimension_of_non_base_symbol() {
        let mut session = Session::new();
        session.run_script("symbol q").unwrap();
        assert!(matches!(
            session.dimension_of("q"),
            Err(EvalError::Unit(_))
        ));
    }
}
