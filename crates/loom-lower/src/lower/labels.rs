//! Label/phi table
//!
//! A label is a jump target: a merge node with one value phi per parameter
//! and one effect phi. Jump sites append to all of them at once, so the
//! incoming lists stay index-aligned with the merge's predecessors.

use super::env::{Binding, Env};
use super::focus::Focus;
use crate::ast::{Symbol, SymbolId};
use crate::error::{LowerError, LowerResult};
use crate::ir::{Graph, IrType, NodeId, Op, Val};
use rustc_hash::FxHashMap;

/// A defined jump target
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub merge: NodeId,
    /// One phi per parameter, in parameter order
    pub params: Vec<NodeId>,
    pub effect_phi: NodeId,
}

/// Per-method label table
#[derive(Debug, Default)]
pub struct LabelTable {
    labels: FxHashMap<SymbolId, Label>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define (or redefine) a label and bind its parameters to fresh phis
    ///
    /// Returns the focus at label entry.
    pub fn define(
        &mut self,
        graph: &mut Graph,
        env: &mut Env,
        label: &Symbol,
        params: &[(Symbol, IrType)],
    ) -> Focus {
        self.labels.remove(&label.id);

        let merge = graph.add(Op::Merge { preds: Vec::new() }, IrType::Unit);
        let effect_phi = graph.add(
            Op::EffectPhi {
                merge,
                incoming: Vec::new(),
            },
            IrType::Unit,
        );
        let phis: Vec<NodeId> = params
            .iter()
            .map(|(sym, ty)| {
                let phi = graph.add(
                    Op::Phi {
                        merge,
                        incoming: Vec::new(),
                    },
                    ty.clone(),
                );
                env.bind(sym, Binding::Value(Val::Node(phi)));
                phi
            })
            .collect();

        tracing::trace!(label = %label.name, merge = %merge, params = phis.len(), "define label");
        self.labels.insert(
            label.id,
            Label {
                merge,
                params: phis,
                effect_phi,
            },
        );
        Focus::new(merge, effect_phi, Val::Unit)
    }

    /// Record a jump from `focus` with one argument per label parameter
    pub fn record_jump(
        &mut self,
        graph: &mut Graph,
        label: &Symbol,
        args: Vec<Val>,
        focus: &Focus,
    ) -> LowerResult<()> {
        let entry = self.lookup_label(label)?.clone();
        if entry.params.len() != args.len() {
            return Err(LowerError::unreachable(format!(
                "jump to `{}` with {} arguments, label has {} parameters",
                label.name,
                args.len(),
                entry.params.len()
            )));
        }

        match graph.get_mut(entry.merge).map(|n| &mut n.op) {
            Some(Op::Merge { preds }) => preds.push(focus.control),
            _ => return Err(LowerError::unreachable(format!("label `{}` lost its merge", label.name))),
        }
        match graph.get_mut(entry.effect_phi).map(|n| &mut n.op) {
            Some(Op::EffectPhi { incoming, .. }) => incoming.push(focus.effect),
            _ => {
                return Err(LowerError::unreachable(format!(
                    "label `{}` lost its effect phi",
                    label.name
                )))
            }
        }
        for (phi, arg) in entry.params.iter().zip(args) {
            match graph.get_mut(*phi).map(|n| &mut n.op) {
                Some(Op::Phi { incoming, .. }) => incoming.push(arg),
                _ => {
                    return Err(LowerError::unreachable(format!(
                        "label `{}` lost a parameter phi",
                        label.name
                    )))
                }
            }
        }

        tracing::trace!(label = %label.name, from = %focus.control, "record jump");
        Ok(())
    }

    pub fn lookup_label(&self, label: &Symbol) -> LowerResult<&Label> {
        self.labels
            .get(&label.id)
            .ok_or_else(|| LowerError::unknown_label(label))
    }

    pub fn lookup_params(&self, label: &Symbol) -> LowerResult<&[NodeId]> {
        Ok(&self.lookup_label(label)?.params)
    }

    pub fn lookup_effect_phi(&self, label: &Symbol) -> LowerResult<NodeId> {
        Ok(self.lookup_label(label)?.effect_phi)
    }
}
