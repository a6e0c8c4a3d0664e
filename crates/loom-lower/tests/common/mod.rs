//! Shared helpers for lowering tests
//!
//! Every test lowers a single method `A::m` of class `A` through the public
//! driver, with validation enabled.

#![allow(dead_code)]

use loom_lower::ast::{
    ClassDef, ClassKind, CompilationUnit, Member, MethodDef, Param, Symbol, SymbolKind, Tree, Type,
};
use loom_lower::ir::{MethodBody, NodeId, Op, Val};
use loom_lower::{lower_unit, LowerOptions, LowerResult};

pub fn class_a() -> Symbol {
    Symbol::class(1, "A")
}

pub fn a_ty() -> Type {
    Type::class(&class_a())
}

pub fn this() -> Tree {
    Tree::this(a_ty())
}

pub fn method_sym(id: u32, name: &str) -> Symbol {
    Symbol::member(id, "A", name, SymbolKind::Method)
}

/// `this.name()`
pub fn call(id: u32, name: &str, ty: Type) -> Tree {
    Tree::call(this(), &method_sym(id, name), vec![], ty)
}

pub fn param(id: u32, name: &str, ty: Type) -> (Symbol, Param) {
    let sym = Symbol::param(id, name);
    (sym.clone(), Param::new(sym, ty))
}

pub fn try_lower(params: Vec<Param>, ret: Type, body: Tree) -> LowerResult<MethodBody> {
    let unit = CompilationUnit {
        classes: vec![ClassDef {
            sym: class_a(),
            kind: ClassKind::Class,
            parent: None,
            interfaces: Vec::new(),
            members: vec![Member::Method(MethodDef {
                sym: method_sym(2, "m"),
                params,
                ret,
                body: Some(body),
            })],
        }],
    };
    let table = lower_unit(&unit, LowerOptions::default())?;
    Ok(table.body("A::m").cloned().expect("A::m is defined"))
}

pub fn lower(params: Vec<Param>, ret: Type, body: Tree) -> MethodBody {
    try_lower(params, ret, body).expect("lowering failed")
}

/// Nodes reachable from the ends that match `pred`, in creation order
pub fn live(body: &MethodBody, pred: impl FnMut(&Op) -> bool) -> Vec<NodeId> {
    let reachable = body.graph.reachable(&body.ends);
    body.graph
        .find(pred)
        .into_iter()
        .filter(|id| reachable.contains(id))
        .collect()
}

/// Name of the method a call node invokes
pub fn callee(body: &MethodBody, call: NodeId) -> String {
    match body.graph.op(call) {
        Op::Call {
            callee: Val::Global(name),
            ..
        } => name.to_string(),
        Op::Call {
            callee: Val::Node(elem),
            ..
        } => match body.graph.op(*elem) {
            Op::MethodElem { method, .. } => method.to_string(),
            other => panic!("callee is not a method: {:?}", other),
        },
        other => panic!("not a call: {:?}", other),
    }
}

/// Effect chain ending at the effect input of a terminal node
pub fn chain_before(body: &MethodBody, end: NodeId) -> Vec<NodeId> {
    let effect = match body.graph.op(end) {
        Op::Return { effect, .. } | Op::Throw { effect, .. } | Op::Undefined { effect, .. } => {
            *effect
        }
        other => panic!("not a terminal: {:?}", other),
    };
    body.graph.effect_chain(effect)
}

/// Names of the methods called along an effect chain
pub fn calls_on(body: &MethodBody, chain: &[NodeId]) -> Vec<String> {
    chain
        .iter()
        .filter(|id| matches!(body.graph.op(**id), Op::Call { .. }))
        .map(|id| callee(body, *id))
        .collect()
}
