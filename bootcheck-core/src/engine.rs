//! Module execution engine capability
//!
//! The harness never looks inside compiled modules. It only needs to load
//! one into a fresh engine, bind an input stream, call an export, read the
//! accumulated output, and marshal the export's return value.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Failures reported by an engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("cannot instantiate engine: {0}")]
    Instantiate(String),

    #[error("module load failed: {0}")]
    Load(String),

    #[error("trap: {0}")]
    Trap(String),

    #[error("cannot marshal result: {0}")]
    Marshal(String),
}

impl EngineError {
    /// The diagnostic without the kind prefix
    pub fn diagnostic(&self) -> &str {
        match self {
            EngineError::Instantiate(msg)
            | EngineError::Load(msg)
            | EngineError::Trap(msg)
            | EngineError::Marshal(msg) => msg,
        }
    }
}

/// A host-native view of an export's return value.
///
/// Only `False` is a failing verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum HostValue {
    False,
    True,
    Integer(i64),
    /// Any other value, kept in its printed form
    Opaque(String),
}

impl HostValue {
    pub fn is_truthy(&self) -> bool {
        !matches!(self, HostValue::False)
    }
}

impl fmt::Display for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::False => f.write_str("false"),
            HostValue::True => f.write_str("true"),
            HostValue::Integer(n) => write!(f, "{}", n),
            HostValue::Opaque(text) => f.write_str(text),
        }
    }
}

/// One engine instance, owned by exactly one attempt
pub trait Engine {
    /// The engine-internal representation of a return value
    type Value;

    /// Bind the bytes read by the module's input stream
    fn bind_input(&mut self, input: &[u8]);

    fn clear_output(&mut self);

    /// Everything the module has written since the last clear
    fn output(&self) -> &[u8];

    fn load_module(&mut self, module: &[u8]) -> Result<(), EngineError>;

    /// Call an export of the loaded module
    fn invoke(&mut self, export: &str) -> Result<Self::Value, EngineError>;

    fn marshal(&self, value: Self::Value) -> Result<HostValue, EngineError>;
}

/// Produces fresh engine instances
pub trait EngineFactory {
    type Engine: Engine;

    fn instantiate(&self) -> Result<Self::Engine, EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!HostValue::False.is_truthy());
        assert!(HostValue::True.is_truthy());
        assert!(HostValue::Integer(0).is_truthy());
        assert!(HostValue::Opaque(String::new()).is_truthy());
        assert!(HostValue::Opaque("sym".to_string()).is_truthy());
    }

    #[test]
    fn test_engine_error_diagnostic() {
        let err = EngineError::Trap("assertion failed".to_string());
        assert_eq!(err.diagnostic(), "assertion failed");
        assert_eq!(err.to_string(), "trap: assertion failed");
    }
}
