//! Lowering errors

use crate::ast::Symbol;
use crate::ir::{IrType, Name};
use thiserror::Error;

/// Result type for lowering operations
pub type LowerResult<T> = Result<T, LowerError>;

/// Fatal error classes; both abort lowering of the compilation unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// An internal invariant was violated
    Unreachable,
    /// The input has a shape with no lowering
    UnsupportedConstruct,
}

/// Lowering errors
#[derive(Debug, Error)]
pub enum LowerError {
    #[error("unbound symbol `{name}` ({id})")]
    UnboundSymbol { name: String, id: u32 },

    #[error("unknown label `{name}` ({id})")]
    UnknownLabel { name: String, id: u32 },

    #[error("internal error: {message}")]
    Unreachable { message: String },

    #[error("unsupported construct: {construct}")]
    UnsupportedConstruct { construct: String },

    #[error("incompatible operand types {left} and {right}")]
    IncompatibleOperands { left: IrType, right: IrType },

    #[error("invalid graph: {}", .errors.join("; "))]
    InvalidGraph { errors: Vec<String> },

    #[error("in method {method}: {source}")]
    InMethod {
        method: Name,
        #[source]
        source: Box<LowerError>,
    },
}

impl LowerError {
    pub fn unbound(sym: &Symbol) -> Self {
        LowerError::UnboundSymbol {
            name: sym.name.clone(),
            id: sym.id.0,
        }
    }

    pub fn unknown_label(sym: &Symbol) -> Self {
        LowerError::UnknownLabel {
            name: sym.name.clone(),
            id: sym.id.0,
        }
    }

    pub fn unreachable(message: impl Into<String>) -> Self {
        LowerError::Unreachable {
            message: message.into(),
        }
    }

    pub fn unsupported(construct: impl Into<String>) -> Self {
        LowerError::UnsupportedConstruct {
            construct: construct.into(),
        }
    }

    /// Classify the error into one of the two fatal classes
    pub fn kind(&self) -> ErrorKind {
        match self {
            LowerError::UnboundSymbol { .. }
            | LowerError::UnknownLabel { .. }
            | LowerError::Unreachable { .. }
            | LowerError::InvalidGraph { .. } => ErrorKind::Unreachable,
            LowerError::UnsupportedConstruct { .. } | LowerError::IncompatibleOperands { .. } => {
                ErrorKind::UnsupportedConstruct
            }
            LowerError::InMethod { source, .. } => source.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        let sym = Symbol::label(3, "loop");
        assert_eq!(LowerError::unknown_label(&sym).kind(), ErrorKind::Unreachable);
        assert_eq!(
            LowerError::IncompatibleOperands {
                left: IrType::Bool,
                right: IrType::I32,
            }
            .kind(),
            ErrorKind::UnsupportedConstruct
        );
    }

    #[test]
    fn test_in_method_keeps_kind_and_message() {
        let err = LowerError::InMethod {
            method: Name::new("A::f"),
            source: Box::new(LowerError::unsupported("closure")),
        };
        assert_eq!(err.kind(), ErrorKind::UnsupportedConstruct);
        assert_eq!(err.to_string(), "in method A::f: unsupported construct: closure");
    }
}
