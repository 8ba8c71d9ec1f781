pub mod electromagnetism;
pub mod session;
pub mod symbols;
pub mod units;

pub use session::{ScriptError, Session};
