//! Per-capability error kinds
//!
//! Each capability handler reports its own failures so the dispatcher can
//! surface them to the client as a `window/showMessage` instead of dropping
//! the connection. "No results" is never an error; these carry genuine
//! failures such as unparsable compiler output.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    Completion(String),
    Definition(String),
    Diagnostic(String),
    Hover(String),
    Reference(String),
    Rename(String),
}

impl fmt::Display for CapabilityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapabilityError::Completion(msg) => write!(f, "code completion error: {}", msg),
            CapabilityError::Definition(msg) => write!(f, "definition error: {}", msg),
            CapabilityError::Diagnostic(msg) => write!(f, "diagnostic error: {}", msg),
            CapabilityError::Hover(msg) => write!(f, "hover error: {}", msg),
            CapabilityError::Reference(msg) => write!(f, "symbol reference error: {}", msg),
            CapabilityError::Rename(msg) => write!(f, "rename error: {}", msg),
        }
    }
}

impl std::error::Error for CapabilityError {}
