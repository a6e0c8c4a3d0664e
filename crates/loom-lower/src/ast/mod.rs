//! Typed input program
//!
//! The lowering pass consumes class definitions whose method bodies are
//! already resolved and typed by a front-end. Every tree carries its static
//! type and every name is a resolved symbol with a stable identity.

mod tree;

pub use tree::{CatchClause, Dispatch, Literal, Param, PrimOp, SwitchCase, Tree, TreeKind};

use serde::{Deserialize, Serialize};

/// Stable identity of a symbol within a compilation unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolId(pub u32);

impl std::fmt::Display for SymbolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    Class,
    Interface,
    Module,
    Field,
    Method,
    Constructor,
    Local,
    Param,
    Label,
}

/// Resolved symbol
///
/// Two symbols denote the same entity iff their ids are equal; the name and
/// owner are only used for name encoding and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: String,
    /// Full name of the enclosing class for members
    #[serde(default)]
    pub owner: Option<String>,
    pub kind: SymbolKind,
}

impl Symbol {
    pub fn new(id: u32, name: impl Into<String>, kind: SymbolKind) -> Self {
        Self {
            id: SymbolId(id),
            name: name.into(),
            owner: None,
            kind,
        }
    }

    pub fn local(id: u32, name: impl Into<String>) -> Self {
        Self::new(id, name, SymbolKind::Local)
    }

    pub fn param(id: u32, name: impl Into<String>) -> Self {
        Self::new(id, name, SymbolKind::Param)
    }

    pub fn label(id: u32, name: impl Into<String>) -> Self {
        Self::new(id, name, SymbolKind::Label)
    }

    pub fn class(id: u32, name: impl Into<String>) -> Self {
        Self::new(id, name, SymbolKind::Class)
    }

    /// Member symbol (field, method or constructor) of `owner`
    pub fn member(id: u32, owner: impl Into<String>, name: impl Into<String>, kind: SymbolKind) -> Self {
        Self {
            id: SymbolId(id),
            name: name.into(),
            owner: Some(owner.into()),
            kind,
        }
    }
}

/// Source-level static type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Unit,
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
    /// Type of the `null` literal
    Null,
    /// Type of expressions that never complete normally
    Nothing,
    /// Class, interface or module type
    Ref(Symbol),
    Array(Box<Type>),
}

impl Type {
    pub fn class(sym: &Symbol) -> Self {
        Type::Ref(sym.clone())
    }

    pub fn array(elem: Type) -> Self {
        Type::Array(Box::new(elem))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassKind {
    Class,
    Interface,
    Module,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub sym: Symbol,
    pub ty: Type,
    #[serde(default)]
    pub mutable: bool,
}

/// Method definition; the receiver is implicit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDef {
    pub sym: Symbol,
    pub params: Vec<Param>,
    pub ret: Type,
    /// `None` for abstract methods
    #[serde(default)]
    pub body: Option<Tree>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Member {
    Field(FieldDef),
    Method(MethodDef),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDef {
    pub sym: Symbol,
    pub kind: ClassKind,
    #[serde(default)]
    pub parent: Option<Symbol>,
    #[serde(default)]
    pub interfaces: Vec<Symbol>,
    #[serde(default)]
    pub members: Vec<Member>,
}

impl ClassDef {
    pub fn methods(&self) -> impl Iterator<Item = &MethodDef> {
        self.members.iter().filter_map(|m| match m {
            Member::Method(method) => Some(method),
            Member::Field(_) => None,
        })
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.members.iter().filter_map(|m| match m {
            Member::Field(field) => Some(field),
            Member::Method(_) => None,
        })
    }
}

/// Input of one lowering run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompilationUnit {
    pub classes: Vec<ClassDef>,
}
