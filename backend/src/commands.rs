//! Text command protocol spoken over the WebSocket.

use emunits_core::symbols::EvalError;
use emunits_core::Session;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::RwLock;
use tracing::{info, warn};

/// Format an error as a JSON message for the client
pub fn format_error(code: &str, message: &str, severity: &str) -> String {
    format!(
        "ERROR_UPDATE:{}",
        json!({
            "code": code,
            "message": message,
            "severity": severity
        })
    )
}

#[derive(Debug, Serialize)]
struct EvalResult {
    expression: String,
    value: String,
    coefficient: f64,
    unit: String,
    /// Only present when every symbol is an SI base symbol
    dimension: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CheckCmd {
    lhs: String,
    rhs: String,
}

#[derive(Debug, Deserialize)]
struct ExpressCmd {
    expression: String,
    unit: String,
}

fn table_update(session: &Session) -> String {
    match session.to_json() {
        Ok(json) => format!("TABLE_UPDATE:{}", json),
        Err(e) => format_error("SERIALIZE_FAILED", &e.to_string(), "error"),
    }
}

fn eval_error(code: &str, err: &EvalError) -> String {
    warn!("{} failed: {}", code, err);
    format_error(code, &err.to_string(), "error")
}

/// Handle one text command and produce the reply message
pub fn handle_command(session: &RwLock<Session>, text: &str) -> String {
    if text == "TABLE" {
        let session = session.read().unwrap_or_else(|e| e.into_inner());
        table_update(&session)
    } else if let Some(expression) = text.strip_prefix("EVAL:") {
        let session = session.read().unwrap_or_else(|e| e.into_inner());
        match session.evaluate(expression) {
            Ok(value) => {
                let result = EvalResult {
                    expression: expression.to_string(),
                    value: value.to_string(),
                    coefficient: value.coefficient,
                    unit: value.unit_part(),
                    dimension: session
                        .dimension_of(expression)
                        .ok()
                        .map(|d| d.to_string()),
                };
                format!("EVAL_RESULT:{}", json!(result))
            }
            Err(e) => eval_error("EVAL_FAILED", &e),
        }
    } else if let Some(script) = text.strip_prefix("RUN:") {
        let mut session = session.write().unwrap_or_else(|e| e.into_inner());
        match session.run_script(script) {
            Ok(count) => {
                info!("Ran {} statements", count);
                table_update(&session)
            }
            Err(e) => {
                warn!("Script failed: {}", e);
                format_error("SCRIPT_FAILED", &e.to_string(), "error")
            }
        }
    } else if let Some(json_str) = text.strip_prefix("CHECK:") {
        let Ok(cmd) = serde_json::from_str::<CheckCmd>(json_str) else {
            warn!("Failed to parse CHECK command: {}", json_str);
            return format_error("BAD_COMMAND", "Expected {\"lhs\": ..., \"rhs\": ...}", "warning");
        };
        let session = session.read().unwrap_or_else(|e| e.into_inner());
        match session.check_consistent(&cmd.lhs, &cmd.rhs) {
            Ok(()) => format!(
                "CHECK_RESULT:{}",
                json!({ "lhs": cmd.lhs, "rhs": cmd.rhs, "consistent": true })
            ),
            Err(e @ EvalError::DimensionMismatch { .. }) => format!(
                "CHECK_RESULT:{}",
                json!({
                    "lhs": cmd.lhs,
                    "rhs": cmd.rhs,
                    "consistent": false,
                    "message": e.to_string()
                })
            ),
            Err(e) => eval_error("CHECK_FAILED", &e),
        }
    } else if let Some(json_str) = text.strip_prefix("EXPRESS:") {
        let Ok(cmd) = serde_json::from_str::<ExpressCmd>(json_str) else {
            warn!("Failed to parse EXPRESS command: {}", json_str);
            return format_error(
                "BAD_COMMAND",
                "Expected {\"expression\": ..., \"unit\": ...}",
                "warning",
            );
        };
        let session = session.read().unwrap_or_else(|e| e.into_inner());
        match session.express_in(&cmd.expression, &cmd.unit) {
            Ok(value) => format!(
                "EXPRESS_RESULT:{}",
                json!({ "expression": cmd.expression, "unit": cmd.unit, "value": value })
            ),
            Err(e) => eval_error("EXPRESS_FAILED", &e),
        }
    } else {
        format!("Echo: {}", text)
    }
}
