//! Tree to IR Lowering
//!
//! Translates typed method bodies into graphs with explicit control, effect
//! and value edges. Each expression is lowered from a `Focus` and produces
//! `Tails`; operands are merged to a single continuation before use.

/// Lower `$tree` from `$focus` and continue from the merged result
///
/// Closed paths are accumulated into `$closed`. When nothing falls through,
/// the enclosing lowering returns early with the closed paths seen so far.
macro_rules! operand {
    ($self:ident, $closed:ident, $tree:expr, $focus:expr) => {
        match $self.lower_expr($tree, $focus)?.merge(&mut $self.graph) {
            Ok((focus, tails)) => {
                $closed = $closed + tails;
                focus
            }
            Err($crate::lower::focus::NotMergeable { closed }) => return Ok($closed + closed),
        }
    };
}

mod control_flow;
pub mod env;
mod expr;
pub mod focus;
pub mod labels;
pub mod prim;
pub mod scan;
mod stmt;

pub use env::{Binding, Env};
pub use focus::{Focus, NotMergeable, Tails};
pub use labels::{Label, LabelTable};

use crate::ast::{MethodDef, Symbol, SymbolId, Type};
use crate::classify::{NameEncoder, TypeClassifier};
use crate::error::{LowerError, LowerResult};
use crate::ir::{Graph, IrType, MethodBody, Name, NodeId, Op, Val};
use rustc_hash::FxHashSet;

/// Lowers one method body
///
/// All state is scratch state of the method being lowered; a fresh lowerer
/// is created per method and consumed by `lower_method`.
pub struct Lowerer<'a> {
    /// Type classification collaborator
    classifier: &'a dyn TypeClassifier,
    /// Name encoding collaborator
    names: &'a dyn NameEncoder,
    /// Node arena of the method
    graph: Graph,
    /// Local and parameter bindings
    env: Env,
    /// Jump targets
    labels: LabelTable,
    /// Receiver parameter
    receiver: Option<Val>,
    /// Locals that live in heap slots
    slots: FxHashSet<SymbolId>,
}

impl<'a> Lowerer<'a> {
    pub fn new(classifier: &'a dyn TypeClassifier, names: &'a dyn NameEncoder) -> Self {
        Self {
            classifier,
            names,
            graph: Graph::new(),
            env: Env::new(),
            labels: LabelTable::new(),
            receiver: None,
            slots: FxHashSet::default(),
        }
    }

    /// Lower a method of a class whose instances have type `owner`
    pub fn lower_method(mut self, owner: &IrType, method: &MethodDef) -> LowerResult<MethodBody> {
        let body = method.body.as_ref().ok_or_else(|| {
            LowerError::unreachable(format!("method `{}` has no body", method.sym.name))
        })?;
        self.slots = scan::slot_locals(body);

        let start = self.graph.add(Op::Start, IrType::Unit);
        let mut params = Vec::with_capacity(method.params.len() + 1);

        let this = self.graph.add(Op::Param { index: 0 }, owner.clone());
        self.receiver = Some(Val::Node(this));
        params.push(this);

        for (i, param) in method.params.iter().enumerate() {
            let ty = self.classify(&param.ty);
            let node = self.graph.add(Op::Param { index: i as u32 + 1 }, ty);
            self.env.bind(&param.sym, Binding::Value(Val::Node(node)));
            params.push(node);
        }

        let tails = self.lower_expr(body, Focus::start(start))?;
        let ret = self.classify(&method.ret);
        let ends = self.close(tails, &ret);

        tracing::debug!(
            method = %method.sym.name,
            nodes = self.graph.len(),
            ends = ends.len(),
            "lowered method body"
        );

        Ok(MethodBody {
            graph: self.graph,
            start,
            params,
            ends,
        })
    }

    /// Terminate every open path with a return of its value
    fn close(&mut self, tails: Tails, ret: &IrType) -> Vec<NodeId> {
        let (open, mut ends) = tails.into_parts();
        for focus in open {
            let value = if *ret == IrType::Unit {
                Val::Unit
            } else {
                focus.value
            };
            ends.push(self.graph.add(
                Op::Return {
                    control: focus.control,
                    effect: focus.effect,
                    value,
                },
                IrType::Nothing,
            ));
        }
        ends
    }

    pub fn classify(&self, ty: &Type) -> IrType {
        self.classifier.classify(ty)
    }

    pub fn encode(&self, sym: &Symbol) -> Name {
        self.names.encode(sym)
    }

    fn add(&mut self, op: Op, ty: IrType) -> NodeId {
        self.graph.add(op, ty)
    }

    /// Terminate the path at `focus` as unreachable
    fn lower_undefined(&mut self, focus: Focus) -> Tails {
        let end = self.add(
            Op::Undefined {
                control: focus.control,
                effect: focus.effect,
            },
            IrType::Nothing,
        );
        Tails::closed(end)
    }
}
