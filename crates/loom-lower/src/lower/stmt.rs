//! Statement lowering: blocks, local declarations and assignments

use super::env::Binding;
use super::focus::{Focus, Tails};
use super::Lowerer;
use crate::ast::{Symbol, Tree, TreeKind, Type};
use crate::error::{LowerError, LowerResult};
use crate::ir::{IrType, Op, Val};

impl<'a> Lowerer<'a> {
    pub(super) fn lower_block(&mut self, stats: &[Tree], expr: &Tree, focus: Focus) -> LowerResult<Tails> {
        // A trailing case label makes the block a lowered pattern match
        if expr.is_case_label() {
            let first_case = stats
                .iter()
                .position(Tree::is_case_label)
                .unwrap_or(stats.len());
            let (prologue, cases) = stats.split_at(first_case);
            if let Some(stray) = cases.iter().find(|s| !s.is_case_label()) {
                return Err(LowerError::unsupported(format!(
                    "statement between match cases: {:?}",
                    stray.kind
                )));
            }
            let arms: Vec<&Tree> = cases.iter().chain(std::iter::once(expr)).collect();
            return self.lower_match(prologue, &arms, focus);
        }

        let mut closed = Tails::empty();
        let mut focus = focus;
        for stat in stats {
            // Don't lower code after a statement that never falls through
            focus = operand!(self, closed, stat, focus);
        }
        Ok(closed + self.lower_expr(expr, focus)?)
    }

    pub(super) fn lower_val_def(
        &mut self,
        sym: &Symbol,
        ty: &Type,
        rhs: &Tree,
        focus: Focus,
    ) -> LowerResult<Tails> {
        let mut closed = Tails::empty();
        let focus = operand!(self, closed, rhs, focus);

        if !self.slots.contains(&sym.id) {
            self.env.bind(sym, Binding::Value(focus.value.clone()));
            return Ok(closed + Tails::open(focus.with_value(Val::Unit)));
        }

        let ty = self.classify(ty);
        let slot = self.add(
            Op::Slot {
                effect: focus.effect,
                elem: ty.clone(),
            },
            IrType::Ptr,
        );
        let store = self.add(
            Op::Store {
                effect: slot,
                ptr: Val::Node(slot),
                value: focus.value.clone(),
            },
            IrType::Unit,
        );
        self.env.bind(sym, Binding::Slot { slot, ty });
        Ok(closed + Tails::open(focus.with_effect(store).with_value(Val::Unit)))
    }

    pub(super) fn lower_assign(&mut self, lhs: &Tree, rhs: &Tree, focus: Focus) -> LowerResult<Tails> {
        let mut closed = Tails::empty();
        match &lhs.kind {
            TreeKind::Select { qualifier, field } => {
                let focus = operand!(self, closed, qualifier, focus);
                let object = focus.value.clone();
                let focus = operand!(self, closed, rhs, focus);
                let field = self.encode(field);
                let ptr = self.add(Op::FieldElem { object, field }, IrType::Ptr);
                let store = self.add(
                    Op::Store {
                        effect: focus.effect,
                        ptr: Val::Node(ptr),
                        value: focus.value.clone(),
                    },
                    IrType::Unit,
                );
                Ok(closed + Tails::open(focus.with_effect(store).with_value(Val::Unit)))
            }
            TreeKind::Ident(sym) => {
                let focus = operand!(self, closed, rhs, focus);
                match self.env.resolve(sym)?.clone() {
                    Binding::Slot { slot, .. } => {
                        let store = self.add(
                            Op::Store {
                                effect: focus.effect,
                                ptr: Val::Node(slot),
                                value: focus.value.clone(),
                            },
                            IrType::Unit,
                        );
                        Ok(closed + Tails::open(focus.with_effect(store).with_value(Val::Unit)))
                    }
                    Binding::Value(_) => {
                        self.env.bind(sym, Binding::Value(focus.value.clone()));
                        Ok(closed + Tails::open(focus.with_value(Val::Unit)))
                    }
                }
            }
            other => Err(LowerError::unsupported(format!(
                "assignment to {:?}",
                other
            ))),
        }
    }
}
