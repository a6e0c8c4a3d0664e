//! Typed expression trees

use super::{Symbol, Type};
use serde::{Deserialize, Serialize};

/// A typed tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub kind: TreeKind,
    /// Static type of the expression
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Unit,
    Null,
    Bool(bool),
    Byte(i8),
    Short(i16),
    Char(u16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(String),
    /// Runtime class of a type
    ClassOf(Type),
}

/// Typed parameter of a method or a jump target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub sym: Symbol,
    pub ty: Type,
}

impl Param {
    pub fn new(sym: Symbol, ty: Type) -> Self {
        Self { sym, ty }
    }
}

/// How a call selects its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Dispatch {
    /// Lookup through the receiver's runtime class
    #[default]
    Virtual,
    /// Direct call of the named method (constructors, super and private calls)
    Static,
}

/// Switch arm; an empty `alts` list is the default arm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchCase {
    pub alts: Vec<Literal>,
    pub body: Tree,
}

/// Catch clause; a clause without an exception type catches everything
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatchClause {
    #[serde(default)]
    pub exception: Option<Type>,
    #[serde(default)]
    pub binder: Option<Symbol>,
    pub body: Tree,
}

/// Primitive operator codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimOp {
    // unary
    Pos,
    Neg,
    Not,
    ZNot,
    // arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    // bitwise
    Or,
    Xor,
    And,
    // shifts
    Lsl,
    Lsr,
    Asr,
    // comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// Reference identity
    Id,
    /// Reference non-identity
    Ni,
    // short-circuit
    ZAnd,
    ZOr,
}

impl PrimOp {
    pub fn is_unary(&self) -> bool {
        matches!(self, PrimOp::Pos | PrimOp::Neg | PrimOp::Not | PrimOp::ZNot)
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            PrimOp::Eq | PrimOp::Ne | PrimOp::Lt | PrimOp::Le | PrimOp::Gt | PrimOp::Ge
        )
    }

    pub fn is_short_circuit(&self) -> bool {
        matches!(self, PrimOp::ZAnd | PrimOp::ZOr)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeKind {
    Literal(Literal),

    /// Read of a local, parameter or label parameter
    Ident(Symbol),

    /// The method's receiver
    This,

    /// Access to a module instance
    Module(Symbol),

    /// Field read
    Select { qualifier: Box<Tree>, field: Symbol },

    /// Field or local write
    Assign { lhs: Box<Tree>, rhs: Box<Tree> },

    /// Local declaration
    ValDef {
        sym: Symbol,
        ty: Type,
        mutable: bool,
        rhs: Box<Tree>,
    },

    Block { stats: Vec<Tree>, expr: Box<Tree> },

    If {
        cond: Box<Tree>,
        then_branch: Box<Tree>,
        else_branch: Box<Tree>,
    },

    /// Jump target with parameters; `synthetic_case` marks pattern-match arms
    LabelDef {
        label: Symbol,
        params: Vec<Param>,
        body: Box<Tree>,
        #[serde(default)]
        synthetic_case: bool,
    },

    /// Jump to a label with one argument per label parameter
    Jump { label: Symbol, args: Vec<Tree> },

    Switch {
        selector: Box<Tree>,
        cases: Vec<SwitchCase>,
    },

    Try {
        block: Box<Tree>,
        catches: Vec<CatchClause>,
        #[serde(default)]
        finalizer: Option<Box<Tree>>,
    },

    Throw(Box<Tree>),

    Return(Box<Tree>),

    /// Array literal
    ArrayValue { elem: Type, elems: Vec<Tree> },

    NewArray { elem: Type, length: Box<Tree> },

    ArrayGet { array: Box<Tree>, index: Box<Tree> },

    ArraySet {
        array: Box<Tree>,
        index: Box<Tree>,
        value: Box<Tree>,
    },

    ArrayLength(Box<Tree>),

    Box { value: Box<Tree>, boxed: Symbol },

    Unbox { value: Box<Tree>, boxed: Symbol },

    IsInstanceOf { value: Box<Tree>, target: Type },

    AsInstanceOf { value: Box<Tree>, target: Type },

    /// Explicit numeric conversion
    Coerce { value: Box<Tree>, target: Type },

    /// Type ascription
    Typed(Box<Tree>),

    Prim { op: PrimOp, args: Vec<Tree> },

    Apply {
        receiver: Box<Tree>,
        method: Symbol,
        args: Vec<Tree>,
        #[serde(default)]
        dispatch: Dispatch,
    },

    /// Instance creation: allocation followed by a constructor call
    New {
        class: Symbol,
        ctor: Symbol,
        args: Vec<Tree>,
    },

    Synchronized { receiver: Box<Tree>, body: Box<Tree> },

    /// Function literal; has no lowering
    Closure { params: Vec<Param>, body: Box<Tree> },
}

impl Tree {
    pub fn new(kind: TreeKind, ty: Type) -> Self {
        Self { kind, ty }
    }

    pub fn literal(lit: Literal, ty: Type) -> Self {
        Tree::new(TreeKind::Literal(lit), ty)
    }

    pub fn unit() -> Self {
        Tree::literal(Literal::Unit, Type::Unit)
    }

    pub fn null() -> Self {
        Tree::literal(Literal::Null, Type::Null)
    }

    pub fn boolean(value: bool) -> Self {
        Tree::literal(Literal::Bool(value), Type::Boolean)
    }

    pub fn int(value: i32) -> Self {
        Tree::literal(Literal::Int(value), Type::Int)
    }

    pub fn ident(sym: &Symbol, ty: Type) -> Self {
        Tree::new(TreeKind::Ident(sym.clone()), ty)
    }

    pub fn this(ty: Type) -> Self {
        Tree::new(TreeKind::This, ty)
    }

    pub fn block(stats: Vec<Tree>, expr: Tree) -> Self {
        let ty = expr.ty.clone();
        Tree::new(
            TreeKind::Block {
                stats,
                expr: Box::new(expr),
            },
            ty,
        )
    }

    pub fn val_def(sym: &Symbol, ty: Type, rhs: Tree) -> Self {
        Tree::local_def(sym, ty, false, rhs)
    }

    pub fn var_def(sym: &Symbol, ty: Type, rhs: Tree) -> Self {
        Tree::local_def(sym, ty, true, rhs)
    }

    fn local_def(sym: &Symbol, ty: Type, mutable: bool, rhs: Tree) -> Self {
        Tree::new(
            TreeKind::ValDef {
                sym: sym.clone(),
                ty,
                mutable,
                rhs: Box::new(rhs),
            },
            Type::Unit,
        )
    }

    pub fn assign(lhs: Tree, rhs: Tree) -> Self {
        Tree::new(
            TreeKind::Assign {
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            Type::Unit,
        )
    }

    pub fn if_else(cond: Tree, then_branch: Tree, else_branch: Tree, ty: Type) -> Self {
        Tree::new(
            TreeKind::If {
                cond: Box::new(cond),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            },
            ty,
        )
    }

    pub fn ret(value: Tree) -> Self {
        Tree::new(TreeKind::Return(Box::new(value)), Type::Nothing)
    }

    pub fn throw(value: Tree) -> Self {
        Tree::new(TreeKind::Throw(Box::new(value)), Type::Nothing)
    }

    pub fn prim(op: PrimOp, args: Vec<Tree>, ty: Type) -> Self {
        Tree::new(TreeKind::Prim { op, args }, ty)
    }

    pub fn call(receiver: Tree, method: &Symbol, args: Vec<Tree>, ty: Type) -> Self {
        Tree::new(
            TreeKind::Apply {
                receiver: Box::new(receiver),
                method: method.clone(),
                args,
                dispatch: Dispatch::Virtual,
            },
            ty,
        )
    }

    pub fn select(qualifier: Tree, field: &Symbol, ty: Type) -> Self {
        Tree::new(
            TreeKind::Select {
                qualifier: Box::new(qualifier),
                field: field.clone(),
            },
            ty,
        )
    }

    pub fn label(label: &Symbol, params: Vec<Param>, body: Tree) -> Self {
        let ty = body.ty.clone();
        Tree::new(
            TreeKind::LabelDef {
                label: label.clone(),
                params,
                body: Box::new(body),
                synthetic_case: false,
            },
            ty,
        )
    }

    /// Pattern-match arm label
    pub fn case_label(label: &Symbol, params: Vec<Param>, body: Tree) -> Self {
        let ty = body.ty.clone();
        Tree::new(
            TreeKind::LabelDef {
                label: label.clone(),
                params,
                body: Box::new(body),
                synthetic_case: true,
            },
            ty,
        )
    }

    pub fn jump(label: &Symbol, args: Vec<Tree>) -> Self {
        Tree::new(
            TreeKind::Jump {
                label: label.clone(),
                args,
            },
            Type::Nothing,
        )
    }

    pub fn is_case_label(&self) -> bool {
        matches!(
            self.kind,
            TreeKind::LabelDef {
                synthetic_case: true,
                ..
            }
        )
    }

    /// Visit the direct subtrees in evaluation order
    pub fn for_each_child<'a>(&'a self, mut f: impl FnMut(&'a Tree)) {
        match &self.kind {
            TreeKind::Literal(_) | TreeKind::Ident(_) | TreeKind::This | TreeKind::Module(_) => {}
            TreeKind::Select { qualifier, .. } => f(qualifier),
            TreeKind::Assign { lhs, rhs } => {
                f(lhs);
                f(rhs);
            }
            TreeKind::ValDef { rhs, .. } => f(rhs),
            TreeKind::Block { stats, expr } => {
                stats.iter().for_each(&mut f);
                f(expr);
            }
            TreeKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                f(cond);
                f(then_branch);
                f(else_branch);
            }
            TreeKind::LabelDef { body, .. } => f(body),
            TreeKind::Jump { args, .. } => args.iter().for_each(&mut f),
            TreeKind::Switch { selector, cases } => {
                f(selector);
                cases.iter().for_each(|c| f(&c.body));
            }
            TreeKind::Try {
                block,
                catches,
                finalizer,
            } => {
                f(block);
                catches.iter().for_each(|c| f(&c.body));
                if let Some(finalizer) = finalizer {
                    f(finalizer);
                }
            }
            TreeKind::Throw(value)
            | TreeKind::Return(value)
            | TreeKind::ArrayLength(value)
            | TreeKind::Typed(value) => f(value),
            TreeKind::ArrayValue { elems, .. } => elems.iter().for_each(&mut f),
            TreeKind::NewArray { length, .. } => f(length),
            TreeKind::ArrayGet { array, index } => {
                f(array);
                f(index);
            }
            TreeKind::ArraySet {
                array,
                index,
                value,
            } => {
                f(array);
                f(index);
                f(value);
            }
            TreeKind::Box { value, .. }
            | TreeKind::Unbox { value, .. }
            | TreeKind::IsInstanceOf { value, .. }
            | TreeKind::AsInstanceOf { value, .. }
            | TreeKind::Coerce { value, .. } => f(value),
            TreeKind::Prim { args, .. } | TreeKind::New { args, .. } => {
                args.iter().for_each(&mut f)
            }
            TreeKind::Apply { receiver, args, .. } => {
                f(receiver);
                args.iter().for_each(&mut f);
            }
            TreeKind::Synchronized { receiver, body } => {
                f(receiver);
                f(body);
            }
            TreeKind::Closure { body, .. } => f(body),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_takes_result_type() {
        let block = Tree::block(vec![Tree::unit()], Tree::int(1));
        assert_eq!(block.ty, Type::Int);
    }

    #[test]
    fn test_children_in_evaluation_order() {
        let x = Symbol::local(1, "x");
        let tree = Tree::if_else(
            Tree::boolean(true),
            Tree::ident(&x, Type::Int),
            Tree::int(2),
            Type::Int,
        );
        let mut seen = Vec::new();
        tree.for_each_child(|child| seen.push(child.clone()));
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0], Tree::boolean(true));
        assert_eq!(seen[2], Tree::int(2));
    }

    #[test]
    fn test_deserialize_from_json() {
        let json = r#"{
            "kind": { "Prim": { "op": "Add", "args": [
                { "kind": { "Literal": { "Int": 1 } }, "ty": "Int" },
                { "kind": { "Literal": { "Int": 2 } }, "ty": "Int" }
            ] } },
            "ty": "Int"
        }"#;
        let tree: Tree = serde_json::from_str(json).unwrap();
        assert_eq!(
            tree,
            Tree::prim(PrimOp::Add, vec![Tree::int(1), Tree::int(2)], Type::Int)
        );
    }
}
