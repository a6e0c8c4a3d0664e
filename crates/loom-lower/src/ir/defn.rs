//! IR Definitions
//!
//! Top-level output of lowering: classes, fields and methods keyed by their
//! canonical names.

use super::node::{Graph, NodeId};
use super::validate::validate_body;
use super::value::{IrType, Name};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Method signature; the receiver is the first parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub params: Vec<IrType>,
    pub ret: IrType,
}

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let params: Vec<String> = self.params.iter().map(|p| p.to_string()).collect();
        write!(f, "({}): {}", params.join(", "), self.ret)
    }
}

/// Lowered body of a method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodBody {
    /// Node arena; may contain nodes no end reaches
    pub graph: Graph,
    /// The `Start` node
    pub start: NodeId,
    /// Parameter nodes, receiver first
    pub params: Vec<NodeId>,
    /// Terminal nodes (Return, Throw, Undefined)
    pub ends: Vec<NodeId>,
}

impl MethodBody {
    /// Check if the body satisfies the graph invariants
    pub fn validate(&self) -> Result<(), Vec<String>> {
        validate_body(self)
    }
}

/// A top-level definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Defn {
    Class {
        name: Name,
        parent: Option<Name>,
        interfaces: Vec<Name>,
    },
    Interface {
        name: Name,
        interfaces: Vec<Name>,
    },
    Module {
        name: Name,
        parent: Option<Name>,
        interfaces: Vec<Name>,
    },
    Field {
        name: Name,
        ty: IrType,
        mutable: bool,
    },
    /// Method without a body (abstract, or filtered out)
    Declare { name: Name, sig: Signature },
    Define {
        name: Name,
        sig: Signature,
        body: MethodBody,
    },
}

impl Defn {
    pub fn name(&self) -> &Name {
        match self {
            Defn::Class { name, .. }
            | Defn::Interface { name, .. }
            | Defn::Module { name, .. }
            | Defn::Field { name, .. }
            | Defn::Declare { name, .. }
            | Defn::Define { name, .. } => name,
        }
    }

    pub fn body(&self) -> Option<&MethodBody> {
        match self {
            Defn::Define { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Definitions of a compilation unit in insertion order
#[derive(Debug, Clone, Default, Serialize)]
pub struct DefnTable {
    defns: Vec<Defn>,
    /// Definition lookup by name
    #[serde(skip)]
    index: FxHashMap<Name, usize>,
}

impl DefnTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition; a later definition with the same name replaces the earlier one
    pub fn insert(&mut self, defn: Defn) {
        match self.index.get(defn.name()) {
            Some(&at) => self.defns[at] = defn,
            None => {
                self.index.insert(defn.name().clone(), self.defns.len());
                self.defns.push(defn);
            }
        }
    }

    /// Get a definition by canonical name
    pub fn get(&self, name: &str) -> Option<&Defn> {
        self.index.get(name).map(|&at| &self.defns[at])
    }

    /// Get the lowered body of a method by canonical name
    pub fn body(&self, name: &str) -> Option<&MethodBody> {
        self.get(name).and_then(Defn::body)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Defn> {
        self.defns.iter()
    }

    pub fn len(&self) -> usize {
        self.defns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defns.is_empty()
    }

    /// Validate every method body
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        for defn in &self.defns {
            if let Defn::Define { name, body, .. } = defn {
                if let Err(errs) = body.validate() {
                    errors.extend(errs.into_iter().map(|e| format!("{}: {}", name, e)));
                }
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Extend<Defn> for DefnTable {
    fn extend<I: IntoIterator<Item = Defn>>(&mut self, iter: I) {
        for defn in iter {
            self.insert(defn);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, ty: IrType) -> Defn {
        Defn::Field {
            name: Name::new(name),
            ty,
            mutable: false,
        }
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut table = DefnTable::new();
        table.insert(field("A::x", IrType::I32));
        table.insert(field("A::y", IrType::I64));
        assert_eq!(table.len(), 2);
        assert!(matches!(table.get("A::y"), Some(Defn::Field { ty: IrType::I64, .. })));
        assert!(table.get("A::z").is_none());
    }

    #[test]
    fn test_redefinition_keeps_position() {
        let mut table = DefnTable::new();
        table.extend([field("A::x", IrType::I32), field("A::y", IrType::I32)]);
        table.insert(field("A::x", IrType::F64));
        let names: Vec<&str> = table.iter().map(|d| d.name().as_str()).collect();
        assert_eq!(names, vec!["A::x", "A::y"]);
        assert!(matches!(table.get("A::x"), Some(Defn::Field { ty: IrType::F64, .. })));
    }

    #[test]
    fn test_signature_display() {
        let sig = Signature {
            params: vec![IrType::Class(Name::new("A")), IrType::I32],
            ret: IrType::Bool,
        };
        assert_eq!(sig.to_string(), "(class A, i32): bool");
    }
}
