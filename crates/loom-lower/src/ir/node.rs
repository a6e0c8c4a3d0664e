//! IR Nodes and the per-method node arena
//!
//! A method body is a graph of nodes connected by control, effect and value
//! edges. Nodes live in an append-only arena and reference each other by
//! `NodeId`; a node may be used by any number of other nodes.

use super::ops::{BinOp, CompOp, ConvOp};
use super::value::{IrType, Name, Val};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// Node identifier (index into the owning graph)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Create a new node ID
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// Node kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Op {
    // ===== Control =====
    /// Entry of the method; the first control and effect position
    Start,

    /// Two-way branch on a boolean
    If { control: NodeId, cond: Val },

    /// Multi-way branch on an integer or type tag
    Switch { control: NodeId, selector: Val },

    /// Entry of a protected region; its `CaseException` is the handler entry
    Try { control: NodeId },

    CaseTrue { branch: NodeId },

    CaseFalse { branch: NodeId },

    /// Edge taken when the switch selector equals `value`
    CaseConst { switch: NodeId, value: Val },

    /// Edge taken when no `CaseConst` of the switch matches
    CaseDefault { switch: NodeId },

    /// Handler entry of a try region
    CaseException { region: NodeId },

    /// Control merge point; phis attached to it are index-aligned with `preds`
    Merge { preds: Vec<NodeId> },

    Return {
        control: NodeId,
        effect: NodeId,
        value: Val,
    },

    Throw {
        control: NodeId,
        effect: NodeId,
        value: Val,
    },

    /// Unreachable or unlowerable code
    Undefined { control: NodeId, effect: NodeId },

    // ===== Meta =====
    /// Value phi, one incoming value per predecessor of `merge`
    Phi { merge: NodeId, incoming: Vec<Val> },

    /// Effect phi, one incoming effect per predecessor of `merge`
    EffectPhi { merge: NodeId, incoming: Vec<NodeId> },

    // ===== Pure values =====
    /// Method parameter; index 0 is the receiver
    Param { index: u32 },

    Bin { op: BinOp, left: Val, right: Val },

    Comp { op: CompOp, left: Val, right: Val },

    Conv { op: ConvOp, value: Val },

    /// Address of a field of an object
    FieldElem { object: Val, field: Name },

    /// Address of an array element
    ArrayElem { array: Val, index: Val },

    ArrayLength { array: Val },

    /// Virtual method lookup on a receiver
    MethodElem { receiver: Val, method: Name },

    IsInstanceOf { value: Val, target: IrType },

    /// Checked cast
    AsInstanceOf { value: Val, target: IrType },

    /// The exception caught at a handler entry
    ExceptionValue { handler: NodeId },

    /// Runtime type tag of a reference
    TypeTag { value: Val },

    // ===== Effectful =====
    Load { effect: NodeId, ptr: Val },

    Store {
        effect: NodeId,
        ptr: Val,
        value: Val,
    },

    Call {
        effect: NodeId,
        callee: Val,
        args: Vec<Val>,
    },

    /// Object allocation
    Alloc { effect: NodeId, class: Name },

    AllocArray {
        effect: NodeId,
        elem: IrType,
        length: Val,
    },

    /// Heap slot holding a mutable local
    Slot { effect: NodeId, elem: IrType },

    Box {
        effect: NodeId,
        boxed: Name,
        value: Val,
    },

    Unbox {
        effect: NodeId,
        boxed: Name,
        value: Val,
    },

    /// Access to a module (singleton) instance
    ModuleLoad { effect: NodeId, module: Name },
}

impl Op {
    /// Effect predecessor of an effectful node
    pub fn effect(&self) -> Option<NodeId> {
        match self {
            Op::Load { effect, .. }
            | Op::Store { effect, .. }
            | Op::Call { effect, .. }
            | Op::Alloc { effect, .. }
            | Op::AllocArray { effect, .. }
            | Op::Slot { effect, .. }
            | Op::Box { effect, .. }
            | Op::Unbox { effect, .. }
            | Op::ModuleLoad { effect, .. } => Some(*effect),
            _ => None,
        }
    }

    /// Check if this node carries an effect predecessor
    pub fn is_effectful(&self) -> bool {
        self.effect().is_some()
    }

    /// Nodes usable as an effect position
    pub fn produces_effect(&self) -> bool {
        self.is_effectful() || matches!(self, Op::Start | Op::EffectPhi { .. })
    }

    /// Nodes usable as a control position
    pub fn is_control(&self) -> bool {
        matches!(
            self,
            Op::Start
                | Op::Try { .. }
                | Op::CaseTrue { .. }
                | Op::CaseFalse { .. }
                | Op::CaseConst { .. }
                | Op::CaseDefault { .. }
                | Op::CaseException { .. }
                | Op::Merge { .. }
        )
    }

    /// Return, Throw and Undefined end a path
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Op::Return { .. } | Op::Throw { .. } | Op::Undefined { .. }
        )
    }

    /// Every node referenced by this node, over all edge kinds
    pub fn inputs(&self) -> Vec<NodeId> {
        fn val(out: &mut Vec<NodeId>, v: &Val) {
            if let Some(id) = v.node() {
                out.push(id);
            }
        }

        let mut out = Vec::new();
        match self {
            Op::Start | Op::Param { .. } => {}
            Op::If { control, cond } => {
                out.push(*control);
                val(&mut out, cond);
            }
            Op::Switch { control, selector } => {
                out.push(*control);
                val(&mut out, selector);
            }
            Op::Try { control } => out.push(*control),
            Op::CaseTrue { branch } | Op::CaseFalse { branch } => out.push(*branch),
            Op::CaseConst { switch, value } => {
                out.push(*switch);
                val(&mut out, value);
            }
            Op::CaseDefault { switch } => out.push(*switch),
            Op::CaseException { region } => out.push(*region),
            Op::Merge { preds } => out.extend(preds.iter().copied()),
            Op::Return {
                control,
                effect,
                value,
            }
            | Op::Throw {
                control,
                effect,
                value,
            } => {
                out.push(*control);
                out.push(*effect);
                val(&mut out, value);
            }
            Op::Undefined { control, effect } => {
                out.push(*control);
                out.push(*effect);
            }
            Op::Phi { merge, incoming } => {
                out.push(*merge);
                for v in incoming {
                    val(&mut out, v);
                }
            }
            Op::EffectPhi { merge, incoming } => {
                out.push(*merge);
                out.extend(incoming.iter().copied());
            }
            Op::Bin { left, right, .. } | Op::Comp { left, right, .. } => {
                val(&mut out, left);
                val(&mut out, right);
            }
            Op::Conv { value, .. }
            | Op::IsInstanceOf { value, .. }
            | Op::AsInstanceOf { value, .. }
            | Op::TypeTag { value } => val(&mut out, value),
            Op::FieldElem { object, .. } => val(&mut out, object),
            Op::ArrayElem { array, index } => {
                val(&mut out, array);
                val(&mut out, index);
            }
            Op::ArrayLength { array } => val(&mut out, array),
            Op::MethodElem { receiver, .. } => val(&mut out, receiver),
            Op::ExceptionValue { handler } => out.push(*handler),
            Op::Load { effect, ptr } => {
                out.push(*effect);
                val(&mut out, ptr);
            }
            Op::Store { effect, ptr, value } => {
                out.push(*effect);
                val(&mut out, ptr);
                val(&mut out, value);
            }
            Op::Call {
                effect,
                callee,
                args,
            } => {
                out.push(*effect);
                val(&mut out, callee);
                for arg in args {
                    val(&mut out, arg);
                }
            }
            Op::Alloc { effect, .. } | Op::Slot { effect, .. } | Op::ModuleLoad { effect, .. } => {
                out.push(*effect)
            }
            Op::AllocArray { effect, length, .. } => {
                out.push(*effect);
                val(&mut out, length);
            }
            Op::Box { effect, value, .. } | Op::Unbox { effect, value, .. } => {
                out.push(*effect);
                val(&mut out, value);
            }
        }
        out
    }
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn vals(vs: &[Val]) -> String {
            vs.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ")
        }
        fn ids(ns: &[NodeId]) -> String {
            ns.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(", ")
        }

        match self {
            Op::Start => write!(f, "start"),
            Op::If { control, cond } => write!(f, "if {} [{}]", cond, control),
            Op::Switch { control, selector } => write!(f, "switch {} [{}]", selector, control),
            Op::Try { control } => write!(f, "try [{}]", control),
            Op::CaseTrue { branch } => write!(f, "case true [{}]", branch),
            Op::CaseFalse { branch } => write!(f, "case false [{}]", branch),
            Op::CaseConst { switch, value } => write!(f, "case {} [{}]", value, switch),
            Op::CaseDefault { switch } => write!(f, "case default [{}]", switch),
            Op::CaseException { region } => write!(f, "case exception [{}]", region),
            Op::Merge { preds } => write!(f, "merge [{}]", ids(preds)),
            Op::Return {
                control,
                effect,
                value,
            } => write!(f, "return {} [{}] {{{}}}", value, control, effect),
            Op::Throw {
                control,
                effect,
                value,
            } => write!(f, "throw {} [{}] {{{}}}", value, control, effect),
            Op::Undefined { control, effect } => {
                write!(f, "undefined [{}] {{{}}}", control, effect)
            }
            Op::Phi { merge, incoming } => write!(f, "phi {} ({})", merge, vals(incoming)),
            Op::EffectPhi { merge, incoming } => {
                write!(f, "effect-phi {} ({})", merge, ids(incoming))
            }
            Op::Param { index } => write!(f, "param {}", index),
            Op::Bin { op, left, right } => write!(f, "{} {}, {}", op, left, right),
            Op::Comp { op, left, right } => write!(f, "{} {}, {}", op, left, right),
            Op::Conv { op, value } => write!(f, "{} {}", op, value),
            Op::FieldElem { object, field } => write!(f, "elem {}, {}", object, field),
            Op::ArrayElem { array, index } => write!(f, "elem {}[{}]", array, index),
            Op::ArrayLength { array } => write!(f, "arraylength {}", array),
            Op::MethodElem { receiver, method } => write!(f, "method {}, {}", receiver, method),
            Op::IsInstanceOf { value, target } => write!(f, "is-instance-of {}, {}", value, target),
            Op::AsInstanceOf { value, target } => write!(f, "as-instance-of {}, {}", value, target),
            Op::ExceptionValue { handler } => write!(f, "exception [{}]", handler),
            Op::TypeTag { value } => write!(f, "typetag {}", value),
            Op::Load { effect, ptr } => write!(f, "load {} {{{}}}", ptr, effect),
            Op::Store { effect, ptr, value } => {
                write!(f, "store {}, {} {{{}}}", ptr, value, effect)
            }
            Op::Call {
                effect,
                callee,
                args,
            } => write!(f, "call {}({}) {{{}}}", callee, vals(args), effect),
            Op::Alloc { effect, class } => write!(f, "alloc {} {{{}}}", class, effect),
            Op::AllocArray {
                effect,
                elem,
                length,
            } => write!(f, "alloc [{}] x {} {{{}}}", elem, length, effect),
            Op::Slot { effect, elem } => write!(f, "slot {} {{{}}}", elem, effect),
            Op::Box {
                effect,
                boxed,
                value,
            } => write!(f, "box {}, {} {{{}}}", boxed, value, effect),
            Op::Unbox {
                effect,
                boxed,
                value,
            } => write!(f, "unbox {}, {} {{{}}}", boxed, value, effect),
            Op::ModuleLoad { effect, module } => write!(f, "module {} {{{}}}", module, effect),
        }
    }
}

/// A node and the type of the value it produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub op: Op,
    pub ty: IrType,
}

/// Append-only node arena of one method body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    nodes: Vec<Node>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node and return its id
    pub fn add(&mut self, op: Op, ty: IrType) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node { op, ty });
        id
    }

    /// Get a node by id
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0 as usize)
    }

    /// Get the operation of a node
    ///
    /// Ids are only ever produced by this graph, so a miss is a bug in the caller.
    pub fn op(&self, id: NodeId) -> &Op {
        &self.nodes[id.0 as usize].op
    }

    pub fn ty(&self, id: NodeId) -> &IrType {
        &self.nodes[id.0 as usize].ty
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over nodes in creation order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId(i as u32), node))
    }

    /// Static type of an operand
    pub fn type_of(&self, val: &Val) -> IrType {
        match val {
            Val::Node(id) => self.ty(*id).clone(),
            other => other.constant_type().unwrap_or(IrType::Unit),
        }
    }

    /// Nodes reachable backwards from `roots` over control, effect and value edges
    pub fn reachable(&self, roots: &[NodeId]) -> FxHashSet<NodeId> {
        let mut seen = FxHashSet::default();
        let mut stack: Vec<NodeId> = roots.to_vec();
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            stack.extend(self.op(id).inputs());
        }
        seen
    }

    /// Effect chain ending at `from`, oldest first
    ///
    /// Walks effect predecessors until a node without one (start or effect phi).
    pub fn effect_chain(&self, from: NodeId) -> Vec<NodeId> {
        let mut chain = vec![from];
        let mut current = from;
        while let Some(prev) = self.op(current).effect() {
            chain.push(prev);
            current = prev;
        }
        chain.reverse();
        chain
    }

    /// Nodes matching a predicate, in creation order
    pub fn find(&self, mut pred: impl FnMut(&Op) -> bool) -> Vec<NodeId> {
        self.iter()
            .filter(|(_, node)| pred(&node.op))
            .map(|(id, _)| id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_chain() -> (Graph, NodeId, NodeId, NodeId) {
        let mut graph = Graph::new();
        let start = graph.add(Op::Start, IrType::Unit);
        let slot = graph.add(
            Op::Slot {
                effect: start,
                elem: IrType::I32,
            },
            IrType::Ptr,
        );
        let store = graph.add(
            Op::Store {
                effect: slot,
                ptr: Val::Node(slot),
                value: Val::I32(1),
            },
            IrType::Unit,
        );
        (graph, start, slot, store)
    }

    #[test]
    fn test_node_id_display() {
        assert_eq!(format!("{}", NodeId::new(7)), "%7");
        assert_eq!(NodeId::new(7).as_u32(), 7);
    }

    #[test]
    fn test_effect_chain_order() {
        let (graph, start, slot, store) = store_chain();
        assert_eq!(graph.effect_chain(store), vec![start, slot, store]);
    }

    #[test]
    fn test_reachable_skips_dead_nodes() {
        let (mut graph, start, _, store) = store_chain();
        let dead = graph.add(
            Op::Load {
                effect: start,
                ptr: Val::Null,
            },
            IrType::I32,
        );
        let ret = graph.add(
            Op::Return {
                control: start,
                effect: store,
                value: Val::Unit,
            },
            IrType::Unit,
        );
        let live = graph.reachable(&[ret]);
        assert_eq!(live.len(), 4);
        assert!(!live.contains(&dead));
    }

    #[test]
    fn test_op_classification() {
        let (graph, start, slot, store) = store_chain();
        assert!(graph.op(start).produces_effect());
        assert!(graph.op(start).is_control());
        assert!(graph.op(slot).is_effectful());
        assert_eq!(graph.op(store).effect(), Some(slot));
        assert_eq!(graph.type_of(&Val::Node(slot)), IrType::Ptr);
        assert_eq!(graph.type_of(&Val::Bool(true)), IrType::Bool);
    }

    #[test]
    fn test_op_display() {
        let op = Op::Call {
            effect: NodeId(3),
            callee: Val::Global(Name::new("A::f")),
            args: vec![Val::Node(NodeId(1)), Val::I32(2)],
        };
        assert_eq!(op.to_string(), "call @A::f(%1, 2) {%3}");
    }
}
