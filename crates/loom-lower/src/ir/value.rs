//! IR Values, Types and Names
//!
//! Defines the operands flowing along value edges and the fixed set of IR
//! type categories produced by type classification.

use super::node::NodeId;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

/// Class name used for the static type of string constants
pub const STRING_CLASS: &str = "String";

/// Class name used for the static type of caught exception values
pub const THROWABLE_CLASS: &str = "Throwable";

/// Canonical IR name of a class, field or method
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Name(pub String);

impl Name {
    /// Create a new name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of a member owned by this name, e.g. `Foo::bar`
    pub fn member(&self, member: &str) -> Name {
        Name(format!("{}::{}", self.0, member))
    }
}

impl Borrow<str> for Name {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// IR type categories
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IrType {
    Unit,
    Bool,
    I8,
    I16,
    /// Unsigned 16-bit character
    Char,
    I32,
    I64,
    F32,
    F64,
    /// Raw address: element pointers, slots, method and type-tag values
    Ptr,
    /// Type of the `null` literal
    Null,
    /// Bottom type of expressions that never produce a value
    Nothing,
    /// Reference to an instance of a class
    Class(Name),
    /// Reference to an array
    Array(Box<IrType>),
}

impl IrType {
    /// Integer kinds (characters included, booleans excluded)
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            IrType::I8 | IrType::I16 | IrType::Char | IrType::I32 | IrType::I64
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(self, IrType::F32 | IrType::F64)
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    /// Value types that are never heap references
    pub fn is_primitive(&self) -> bool {
        self.is_numeric() || matches!(self, IrType::Bool | IrType::Unit)
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, IrType::Class(_) | IrType::Array(_) | IrType::Null)
    }

    /// `null` and `nothing` defer to the other operand in binary typing
    pub fn is_bottom(&self) -> bool {
        matches!(self, IrType::Null | IrType::Nothing)
    }

    pub fn is_signed(&self) -> bool {
        matches!(self, IrType::I8 | IrType::I16 | IrType::I32 | IrType::I64)
    }

    /// Width in bits of primitive kinds
    pub fn width(&self) -> Option<u32> {
        match self {
            IrType::Bool => Some(1),
            IrType::I8 => Some(8),
            IrType::I16 | IrType::Char => Some(16),
            IrType::I32 | IrType::F32 => Some(32),
            IrType::I64 | IrType::F64 => Some(64),
            _ => None,
        }
    }

    /// Class name for class references
    pub fn class_name(&self) -> Option<&Name> {
        match self {
            IrType::Class(name) => Some(name),
            _ => None,
        }
    }
}

impl std::fmt::Display for IrType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IrType::Unit => write!(f, "unit"),
            IrType::Bool => write!(f, "bool"),
            IrType::I8 => write!(f, "i8"),
            IrType::I16 => write!(f, "i16"),
            IrType::Char => write!(f, "char"),
            IrType::I32 => write!(f, "i32"),
            IrType::I64 => write!(f, "i64"),
            IrType::F32 => write!(f, "f32"),
            IrType::F64 => write!(f, "f64"),
            IrType::Ptr => write!(f, "ptr"),
            IrType::Null => write!(f, "null"),
            IrType::Nothing => write!(f, "nothing"),
            IrType::Class(name) => write!(f, "class {}", name),
            IrType::Array(elem) => write!(f, "[{}]", elem),
        }
    }
}

/// Operand of a node: a constant or a reference to a value-producing node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Val {
    /// No value (control-only positions)
    None,
    Unit,
    Null,
    Bool(bool),
    I8(i8),
    I16(i16),
    Char(u16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(String),
    /// Runtime type tag of a class
    ClassOf(Name),
    /// Address of a global (method or constructor)
    Global(Name),
    /// Result of a node
    Node(NodeId),
}

impl Val {
    /// The node this value refers to, if any
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Val::Node(id) => Some(*id),
            _ => None,
        }
    }

    /// Zero of a numeric type
    pub fn zero(ty: &IrType) -> Option<Val> {
        match ty {
            IrType::I8 => Some(Val::I8(0)),
            IrType::I16 => Some(Val::I16(0)),
            IrType::Char => Some(Val::Char(0)),
            IrType::I32 => Some(Val::I32(0)),
            IrType::I64 => Some(Val::I64(0)),
            IrType::F32 => Some(Val::F32(0.0)),
            IrType::F64 => Some(Val::F64(0.0)),
            _ => None,
        }
    }

    /// All-ones pattern of an integer type
    pub fn minus_one(ty: &IrType) -> Option<Val> {
        match ty {
            IrType::I8 => Some(Val::I8(-1)),
            IrType::I16 => Some(Val::I16(-1)),
            IrType::Char => Some(Val::Char(u16::MAX)),
            IrType::I32 => Some(Val::I32(-1)),
            IrType::I64 => Some(Val::I64(-1)),
            _ => None,
        }
    }

    /// Static type of a constant; `None` for node references
    pub fn constant_type(&self) -> Option<IrType> {
        Some(match self {
            Val::None | Val::Unit => IrType::Unit,
            Val::Null => IrType::Null,
            Val::Bool(_) => IrType::Bool,
            Val::I8(_) => IrType::I8,
            Val::I16(_) => IrType::I16,
            Val::Char(_) => IrType::Char,
            Val::I32(_) => IrType::I32,
            Val::I64(_) => IrType::I64,
            Val::F32(_) => IrType::F32,
            Val::F64(_) => IrType::F64,
            Val::Str(_) => IrType::Class(Name::new(STRING_CLASS)),
            Val::ClassOf(_) | Val::Global(_) => IrType::Ptr,
            Val::Node(_) => return None,
        })
    }
}

impl std::fmt::Display for Val {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Val::None => write!(f, "none"),
            Val::Unit => write!(f, "unit"),
            Val::Null => write!(f, "null"),
            Val::Bool(b) => write!(f, "{}", b),
            Val::I8(v) => write!(f, "{}i8", v),
            Val::I16(v) => write!(f, "{}i16", v),
            Val::Char(v) => write!(f, "{}c", v),
            Val::I32(v) => write!(f, "{}", v),
            Val::I64(v) => write!(f, "{}L", v),
            Val::F32(v) => write!(f, "{}f", v),
            Val::F64(v) => write!(f, "{}d", v),
            Val::Str(s) => write!(f, "{:?}", s),
            Val::ClassOf(name) => write!(f, "classof {}", name),
            Val::Global(name) => write!(f, "@{}", name),
            Val::Node(id) => write!(f, "{}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_widths() {
        assert_eq!(IrType::I8.width(), Some(8));
        assert_eq!(IrType::Char.width(), IrType::I16.width());
        assert!(IrType::Char.is_integer());
        assert!(!IrType::Char.is_signed());
        assert!(!IrType::Bool.is_integer());
    }

    #[test]
    fn test_reference_kinds() {
        assert!(IrType::Class(Name::new("Foo")).is_reference());
        assert!(IrType::Array(Box::new(IrType::I32)).is_reference());
        assert!(IrType::Null.is_bottom());
        assert!(!IrType::Ptr.is_reference());
    }

    #[test]
    fn test_constant_types() {
        assert_eq!(Val::I64(3).constant_type(), Some(IrType::I64));
        assert_eq!(
            Val::Str("x".into()).constant_type(),
            Some(IrType::Class(Name::new(STRING_CLASS)))
        );
        assert_eq!(Val::Node(NodeId(2)).constant_type(), None);
    }

    #[test]
    fn test_unary_identities() {
        assert_eq!(Val::zero(&IrType::F64), Some(Val::F64(0.0)));
        assert_eq!(Val::minus_one(&IrType::I16), Some(Val::I16(-1)));
        assert_eq!(Val::minus_one(&IrType::F32), None);
    }

    #[test]
    fn test_member_name() {
        assert_eq!(Name::new("Foo").member("bar").as_str(), "Foo::bar");
        assert_eq!(format!("{}", Val::Global(Name::new("Foo::<init>"))), "@Foo::<init>");
    }
}
