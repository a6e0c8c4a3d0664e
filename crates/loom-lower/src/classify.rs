//! Collaborator interfaces: type classification and name encoding
//!
//! The lowering core only talks to the traits. The default implementations
//! are enough for standalone use and for tests.

use crate::ast::{Symbol, Type};
use crate::ir::{IrType, Name};

/// Maps a source type to its IR type category
pub trait TypeClassifier: Send + Sync {
    fn classify(&self, ty: &Type) -> IrType;
}

/// Turns a symbol into its canonical IR name
pub trait NameEncoder: Send + Sync {
    fn encode(&self, sym: &Symbol) -> Name;
}

/// One-to-one classification of primitive types; references keep their
/// qualified class name
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardClassifier;

impl TypeClassifier for StandardClassifier {
    fn classify(&self, ty: &Type) -> IrType {
        match ty {
            Type::Unit => IrType::Unit,
            Type::Boolean => IrType::Bool,
            Type::Byte => IrType::I8,
            Type::Short => IrType::I16,
            Type::Char => IrType::Char,
            Type::Int => IrType::I32,
            Type::Long => IrType::I64,
            Type::Float => IrType::F32,
            Type::Double => IrType::F64,
            Type::Null => IrType::Null,
            Type::Nothing => IrType::Nothing,
            Type::Ref(sym) => IrType::Class(qualified(sym)),
            Type::Array(elem) => IrType::Array(Box::new(self.classify(elem))),
        }
    }
}

/// Names members as `Owner::name`, top-level symbols by their own name
#[derive(Debug, Clone, Copy, Default)]
pub struct QualifiedNames;

impl NameEncoder for QualifiedNames {
    fn encode(&self, sym: &Symbol) -> Name {
        qualified(sym)
    }
}

fn qualified(sym: &Symbol) -> Name {
    match &sym.owner {
        Some(owner) => Name::new(owner.as_str()).member(&sym.name),
        None => Name::new(sym.name.as_str()),
    }
}
