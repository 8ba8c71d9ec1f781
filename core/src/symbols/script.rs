//! Declaration script statements.
//!
//! ```text
//! # comment
//! symbol kg, m, s, A: positive
//! u_E = V/m; u_D = C/m^2
//! ```

use super::parser::{is_identifier, is_reserved, parse_expression, Expr, ParseError};
use super::types::Assumption;

const SYMBOL_KEYWORD: &str = "symbol";

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `symbol a, b: positive`
    Declare {
        names: Vec<String>,
        assumptions: Vec<Assumption>,
    },
    /// `name = expression`
    Assign {
        name: String,
        source: String,
        expr: Expr,
    },
}

/// A statement with the 1-based line it came from
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptLine {
    pub line: usize,
    pub statement: Statement,
}

/// Parse a single statement
pub fn parse_statement(text: &str) -> Result<Statement, ParseError> {
    let trimmed = text.trim();
    // Positions count chars, like the lexer
    let lead = text.chars().take_while(|c| c.is_whitespace()).count();

    if let Some(rest) = trimmed.strip_prefix(SYMBOL_KEYWORD) {
        if rest.starts_with(char::is_whitespace) {
            return parse_declaration(rest, lead + SYMBOL_KEYWORD.len());
        }
    }

    let Some(eq) = trimmed.find('=') else {
        return Err(ParseError::new("Expected 'name = expression' or 'symbol ...'", lead));
    };

    let name = trimmed[..eq].trim();
    if !is_identifier(name) {
        return Err(ParseError::new(format!("Invalid name: '{}'", name), lead));
    }
    if is_reserved(name) {
        return Err(ParseError::new(format!("Reserved name: '{}'", name), lead));
    }

    let source = &trimmed[eq + 1..];
    let source_start = lead + trimmed[..eq].chars().count() + 1;
    let expr = parse_expression(source).map_err(|e| e.offset(source_start))?;

    Ok(Statement::Assign {
        name: name.to_string(),
        source: source.trim().to_string(),
        expr,
    })
}

fn parse_declaration(rest: &str, offset: usize) -> Result<Statement, ParseError> {
    let (names_part, assumptions_part) = match rest.split_once(':') {
        Some((names, assumptions)) => (names, Some(assumptions)),
        None => (rest, None),
    };

    let names = split_list(names_part)
        .map(|name| {
            if !is_identifier(name) {
                Err(ParseError::new(format!("Invalid symbol name: '{}'", name), offset))
            } else if is_reserved(name) {
                Err(ParseError::new(format!("Reserved name: '{}'", name), offset))
            } else {
                Ok(name.to_string())
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    if names.is_empty() {
        return Err(ParseError::new("Expected at least one symbol name", offset));
    }

    let assumptions = match assumptions_part {
        Some(part) => split_list(part)
            .map(|word| {
                Assumption::parse(word).ok_or_else(|| {
                    ParseError::new(format!("Unknown assumption: '{}'", word), offset)
                })
            })
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };

    Ok(Statement::Declare { names, assumptions })
}

fn split_list(text: &str) -> impl Iterator<Item = &str> {
    text.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// Lazily parse a script, one statement at a time.
/// A malformed statement yields its line number with the error.
pub fn statements(source: &str) -> impl Iterator<Item = Result<ScriptLine, (usize, ParseError)>> + '_ {
    source.lines().enumerate().flat_map(|(index, raw)| {
        let line = index + 1;
        let code = match raw.find('#') {
            Some(pos) => &raw[..pos],
            None => raw,
        };
        code.split(';')
            .filter(|part| !part.trim().is_empty())
            .map(move |part| {
                parse_statement(part)
                    .map(|statement| ScriptLine { line, statement })
                    .map_err(|e| (line, e))
            })
    })
}

/// Parse a whole script, failing on the first malformed statement
pub fn parse_script(source: &str) -> Result<Vec<ScriptLine>, (usize, ParseError)> {
    statements(source).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_declaration() {
        let stmt = parse_statement("symbol kg, m, s, A: positive").unwrap();
        assert_eq!(
            stmt,
            Statement::Declare {
                names: vec!["kg".into(), "m".into(), "s".into(), "A".into()],
                assumptions: vec![Assumption::Positive],
            }
        );
    }

    #[test]
    fn test_parse_declaration_without_assumptions() {
        let stmt = parse_statement("symbol x").unwrap();
        assert_eq!(
            stmt,
            Statement::Declare {
                names: vec!["x".into()],
                assumptions: vec![],
            }
        );
    }

    #[test]
    fn test_parse_assignment() {
        match parse_statement("u_E = V/m").unwrap() {
            Statement::Assign { name, source, .. } => {
                assert_eq!(name, "u_E");
                assert_eq!(source, "V/m");
            }
            other => panic!("Expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_name_starting_with_keyword_is_assignment() {
        assert!(matches!(
            parse_statement("symbolic = 2").unwrap(),
            Statement::Assign { .. }
        ));
    }

    #[test]
    fn test_parse_unknown_assumption() {
        let err = parse_statement("symbol x: imaginary").unwrap_err();
        assert!(err.message.contains("imaginary"));
    }

    #[test]
    fn test_parse_invalid_name() {
        assert!(parse_statement("2x = 3").is_err());
        assert!(parse_statement("just words").is_err());
    }

    #[test]
    fn test_expression_error_position_is_line_relative() {
        let err = parse_statement("x = 1 $ 2").unwrap_err();
        assert_eq!(err.position, 6);
    }

    #[test]
    fn test_error_position_counts_chars() {
        // no-break spaces are two bytes each
        let err = parse_statement("\u{a0}x\u{a0}= 1 $ 2").unwrap_err();
        assert_eq!(err.position, 7);
    }

    #[test]
    fn test_reserved_names_rejected() {
        let err = parse_statement("pi = 3").unwrap_err();
        assert!(err.message.contains("Reserved"));
        assert!(parse_statement("PI = 3").is_err());
        assert!(parse_statement("sqrt = m").is_err());
        assert!(parse_statement("symbol pi").is_err());
        assert!(parse_statement("symbol x, ln: positive").is_err());
        assert!(parse_statement("pie = 3").is_ok());
    }

    #[test]
    fn test_parse_script_lines_and_comments() {
        let script = "# header\nsymbol m: positive\n\nL = 2*m; M = L*m # area\n";
        let lines = parse_script(script).unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].line, 2);
        assert_eq!(lines[1].line, 4);
        assert_eq!(lines[2].line, 4);
    }

    #[test]
    fn test_parse_script_reports_line() {
        let script = "symbol m\nx = (m\n";
        let (line, _) = parse_script(script).unwrap_err();
        assert_eq!(line, 2);
    }
}
