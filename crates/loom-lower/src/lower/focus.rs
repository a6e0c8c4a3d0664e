//! Focus and Tails
//!
//! A `Focus` is the position lowering continues from: the current control
//! node, the current effect node and the value of the last expression.
//! Lowering an expression yields `Tails`: the paths that fall through (open)
//! and the terminal nodes of the paths that ended (closed).

use crate::ir::{Graph, IrType, NodeId, Op, Val};
use std::ops::Add;

/// Current control, effect and value position
#[derive(Debug, Clone, PartialEq)]
pub struct Focus {
    pub control: NodeId,
    pub effect: NodeId,
    pub value: Val,
}

impl Focus {
    /// Focus at method entry
    pub fn start(start: NodeId) -> Self {
        Self {
            control: start,
            effect: start,
            value: Val::Unit,
        }
    }

    pub fn new(control: NodeId, effect: NodeId, value: Val) -> Self {
        Self {
            control,
            effect,
            value,
        }
    }

    pub fn with_effect(self, effect: NodeId) -> Self {
        Self { effect, ..self }
    }

    pub fn with_value(self, value: Val) -> Self {
        Self { value, ..self }
    }

    /// Advance past an effectful node that also produces the new value
    pub fn with_effectful(self, node: NodeId) -> Self {
        Self {
            effect: node,
            value: Val::Node(node),
            ..self
        }
    }
}

/// Open and closed paths produced by lowering an expression
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tails {
    open: Vec<Focus>,
    closed: Vec<NodeId>,
}

/// No path falls through; only the closed paths remain
#[derive(Debug, Clone, PartialEq)]
pub struct NotMergeable {
    pub closed: Tails,
}

impl Tails {
    pub fn empty() -> Self {
        Self::default()
    }

    /// A single path that falls through
    pub fn open(focus: Focus) -> Self {
        Self {
            open: vec![focus],
            closed: Vec::new(),
        }
    }

    /// A single terminated path
    pub fn closed(end: NodeId) -> Self {
        Self {
            open: Vec::new(),
            closed: vec![end],
        }
    }

    pub fn open_paths(&self) -> &[Focus] {
        &self.open
    }

    pub fn closed_paths(&self) -> &[NodeId] {
        &self.closed
    }

    pub fn into_parts(self) -> (Vec<Focus>, Vec<NodeId>) {
        (self.open, self.closed)
    }

    /// Check if some path falls through
    pub fn is_open(&self) -> bool {
        !self.open.is_empty()
    }

    /// Concatenate both open and closed sequences
    pub fn combine(mut self, other: Tails) -> Tails {
        self.open.extend(other.open);
        self.closed.extend(other.closed);
        self
    }

    /// Transform every open path
    pub fn map_open(self, f: impl FnMut(Focus) -> Focus) -> Tails {
        Tails {
            open: self.open.into_iter().map(f).collect(),
            closed: self.closed,
        }
    }

    /// Reduce the open paths to a single continuation
    ///
    /// One open path is returned as is. Several open paths get a fresh merge
    /// node, an effect phi and, unless every path carries the same constant, a
    /// value phi; all three list the paths in order. The closed paths are
    /// returned alongside the continuation.
    pub fn merge(self, graph: &mut Graph) -> Result<(Focus, Tails), NotMergeable> {
        let Tails { mut open, closed } = self;
        let closed = Tails {
            open: Vec::new(),
            closed,
        };

        match open.len() {
            0 => Err(NotMergeable { closed }),
            1 => Ok((open.remove(0), closed)),
            _ => {
                let preds: Vec<NodeId> = open.iter().map(|f| f.control).collect();
                let effects: Vec<NodeId> = open.iter().map(|f| f.effect).collect();
                let values: Vec<Val> = open.into_iter().map(|f| f.value).collect();

                let merge = graph.add(Op::Merge { preds }, IrType::Unit);
                let effect = graph.add(
                    Op::EffectPhi {
                        merge,
                        incoming: effects,
                    },
                    IrType::Unit,
                );

                let uniform = values[0].node().is_none() && values.iter().all(|v| *v == values[0]);
                let value = if uniform {
                    values[0].clone()
                } else {
                    let ty = phi_type(graph, &values);
                    let phi = graph.add(
                        Op::Phi {
                            merge,
                            incoming: values,
                        },
                        ty,
                    );
                    Val::Node(phi)
                };

                Ok((Focus::new(merge, effect, value), closed))
            }
        }
    }
}

/// First non-bottom incoming type
fn phi_type(graph: &Graph, values: &[Val]) -> IrType {
    let types: Vec<IrType> = values.iter().map(|v| graph.type_of(v)).collect();
    types
        .iter()
        .find(|ty| !ty.is_bottom())
        .or_else(|| types.first())
        .cloned()
        .unwrap_or(IrType::Unit)
}

impl Add for Tails {
    type Output = Tails;

    fn add(self, other: Tails) -> Tails {
        self.combine(other)
    }
}

impl FromIterator<Tails> for Tails {
    fn from_iter<I: IntoIterator<Item = Tails>>(iter: I) -> Self {
        iter.into_iter().fold(Tails::empty(), Tails::combine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn branches() -> (Graph, NodeId, NodeId, NodeId) {
        let mut graph = Graph::new();
        let start = graph.add(Op::Start, IrType::Unit);
        let branch = graph.add(
            Op::If {
                control: start,
                cond: Val::Bool(true),
            },
            IrType::Unit,
        );
        let t = graph.add(Op::CaseTrue { branch }, IrType::Unit);
        let f = graph.add(Op::CaseFalse { branch }, IrType::Unit);
        (graph, start, t, f)
    }

    #[test]
    fn test_merge_single_open_path() {
        let (mut graph, start, t, _) = branches();
        let focus = Focus::new(t, start, Val::I32(1));
        let nodes = graph.len();
        let (merged, closed) = Tails::open(focus.clone()).merge(&mut graph).unwrap();
        assert_eq!(merged, focus);
        assert!(closed.closed_paths().is_empty());
        assert_eq!(graph.len(), nodes);
    }

    #[test]
    fn test_merge_builds_phi() {
        let (mut graph, start, t, f) = branches();
        let tails = Tails::open(Focus::new(t, start, Val::I32(1)))
            + Tails::open(Focus::new(f, start, Val::I32(2)));
        let (merged, _) = tails.merge(&mut graph).unwrap();

        assert_eq!(graph.op(merged.control), &Op::Merge { preds: vec![t, f] });
        assert_eq!(
            graph.op(merged.effect),
            &Op::EffectPhi {
                merge: merged.control,
                incoming: vec![start, start],
            }
        );
        let phi = merged.value.node().unwrap();
        assert_eq!(
            graph.op(phi),
            &Op::Phi {
                merge: merged.control,
                incoming: vec![Val::I32(1), Val::I32(2)],
            }
        );
        assert_eq!(graph.ty(phi), &IrType::I32);
    }

    #[test]
    fn test_merge_unit_values_without_phi() {
        let (mut graph, start, t, f) = branches();
        let tails = Tails::open(Focus::new(t, start, Val::Unit))
            + Tails::open(Focus::new(f, start, Val::Unit));
        let (merged, _) = tails.merge(&mut graph).unwrap();
        assert_eq!(merged.value, Val::Unit);
        assert!(graph.find(|op| matches!(op, Op::Phi { .. })).is_empty());
    }

    #[test]
    fn test_merge_phi_type_skips_null() {
        let (mut graph, start, t, f) = branches();
        let obj = graph.add(
            Op::Alloc {
                effect: start,
                class: crate::ir::Name::new("A"),
            },
            IrType::Class(crate::ir::Name::new("A")),
        );
        let tails = Tails::open(Focus::new(t, start, Val::Null))
            + Tails::open(Focus::new(f, obj, Val::Node(obj)));
        let (merged, _) = tails.merge(&mut graph).unwrap();
        let phi = merged.value.node().unwrap();
        assert_eq!(graph.ty(phi), &IrType::Class(crate::ir::Name::new("A")));
    }

    #[test]
    fn test_not_mergeable_carries_closed() {
        let (mut graph, start, t, f) = branches();
        let r1 = graph.add(
            Op::Return {
                control: t,
                effect: start,
                value: Val::I32(1),
            },
            IrType::Unit,
        );
        let r2 = graph.add(
            Op::Return {
                control: f,
                effect: start,
                value: Val::I32(2),
            },
            IrType::Unit,
        );
        let err = (Tails::closed(r1) + Tails::closed(r2))
            .merge(&mut graph)
            .unwrap_err();
        assert_eq!(err.closed.closed_paths(), &[r1, r2]);
        assert!(!err.closed.is_open());
    }

    #[test]
    fn test_combine_is_concatenation() {
        let a = Tails::closed(NodeId(1)) + Tails::open(Focus::start(NodeId(0)));
        let b = Tails::closed(NodeId(2));
        let c: Tails = vec![a, b].into_iter().collect();
        assert_eq!(c.closed_paths(), &[NodeId(1), NodeId(2)]);
        assert_eq!(c.open_paths().len(), 1);
    }
}
