//! Control flow lowering
//!
//! Conditionals, labels and jumps, pattern matches, switches, exception
//! handling and the terminals `return` and `throw`.

use super::env::Binding;
use super::focus::{Focus, NotMergeable, Tails};
use super::Lowerer;
use crate::ast::{CatchClause, Param, Symbol, SwitchCase, Tree, TreeKind};
use crate::error::{LowerError, LowerResult};
use crate::ir::{IrType, Name, NodeId, Op, Val, THROWABLE_CLASS};

impl<'a> Lowerer<'a> {
    /// Both arms stay open; the consumer decides where they merge
    pub(super) fn lower_if(
        &mut self,
        cond: &Tree,
        then_branch: &Tree,
        else_branch: &Tree,
        focus: Focus,
    ) -> LowerResult<Tails> {
        let mut closed = Tails::empty();
        let focus = operand!(self, closed, cond, focus);

        let branch = self.add(
            Op::If {
                control: focus.control,
                cond: focus.value.clone(),
            },
            IrType::Unit,
        );
        let case_true = self.add(Op::CaseTrue { branch }, IrType::Unit);
        let case_false = self.add(Op::CaseFalse { branch }, IrType::Unit);

        let then_tails = self.lower_expr(
            then_branch,
            Focus::new(case_true, focus.effect, Val::Unit),
        )?;
        let else_tails = self.lower_expr(
            else_branch,
            Focus::new(case_false, focus.effect, Val::Unit),
        )?;
        Ok(closed + then_tails + else_tails)
    }

    fn define_label(&mut self, label: &Symbol, params: &[Param]) -> Focus {
        let params: Vec<(Symbol, IrType)> = params
            .iter()
            .map(|p| (p.sym.clone(), self.classify(&p.ty)))
            .collect();
        self.labels
            .define(&mut self.graph, &mut self.env, label, &params)
    }

    /// Loop-style label: enter with the current values of its parameters
    pub(super) fn lower_label(
        &mut self,
        label: &Symbol,
        params: &[Param],
        body: &Tree,
        focus: Focus,
    ) -> LowerResult<Tails> {
        let mut focus = focus;
        let mut args = Vec::with_capacity(params.len());
        for param in params {
            focus = self.read_symbol(&param.sym, focus)?;
            args.push(focus.value.clone());
        }

        let entry = self.define_label(label, params);
        self.labels
            .record_jump(&mut self.graph, label, args, &focus)?;
        self.lower_expr(body, entry)
    }

    /// A jump ends the path; it continues inside the label body
    pub(super) fn lower_jump(&mut self, label: &Symbol, args: &[Tree], focus: Focus) -> LowerResult<Tails> {
        let mut closed = Tails::empty();
        let mut focus = focus;
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            focus = operand!(self, closed, arg, focus);
            values.push(focus.value.clone());
        }
        self.labels
            .record_jump(&mut self.graph, label, values, &focus)?;
        Ok(closed)
    }

    /// Pattern match: prologue, case labels and the trailing end label
    ///
    /// Every label is defined before any body is lowered, so cases can jump
    /// forward to later cases and to the end label.
    pub(super) fn lower_match(&mut self, prologue: &[Tree], arms: &[&Tree], focus: Focus) -> LowerResult<Tails> {
        let mut closed = Tails::empty();
        let mut focus = focus;
        for stat in prologue {
            focus = operand!(self, closed, stat, focus);
        }

        let mut entries = Vec::with_capacity(arms.len());
        for arm in arms {
            let TreeKind::LabelDef {
                label, params, body, ..
            } = &arm.kind
            else {
                return Err(LowerError::unreachable("match case is not a label"));
            };
            let entry = self.define_label(label, params);
            entries.push((label, body, entry));
        }

        let first = entries
            .first()
            .map(|(label, _, _)| *label)
            .ok_or_else(|| LowerError::unreachable("match without cases"))?;
        self.labels
            .record_jump(&mut self.graph, first, Vec::new(), &focus)?;

        let mut tails = closed;
        for (_, body, entry) in entries {
            tails = tails + self.lower_expr(body, entry)?;
        }
        Ok(tails)
    }

    pub(super) fn lower_switch(&mut self, selector: &Tree, cases: &[SwitchCase], focus: Focus) -> LowerResult<Tails> {
        let mut closed = Tails::empty();
        let focus = operand!(self, closed, selector, focus);
        let switch = self.add(
            Op::Switch {
                control: focus.control,
                selector: focus.value.clone(),
            },
            IrType::Unit,
        );

        let mut tails = closed;
        let mut has_default = false;
        for case in cases {
            let control = if case.alts.is_empty() {
                has_default = true;
                self.add(Op::CaseDefault { switch }, IrType::Unit)
            } else {
                let edges: Vec<NodeId> = case
                    .alts
                    .iter()
                    .map(|alt| {
                        let value = self.lower_literal(alt);
                        self.add(Op::CaseConst { switch, value }, IrType::Unit)
                    })
                    .collect();
                if edges.len() == 1 {
                    edges[0]
                } else {
                    self.add(Op::Merge { preds: edges }, IrType::Unit)
                }
            };
            tails = tails + self.lower_expr(&case.body, Focus::new(control, focus.effect, Val::Unit))?;
        }

        if !has_default {
            let default = self.add(Op::CaseDefault { switch }, IrType::Unit);
            tails = tails + self.lower_undefined(Focus::new(default, focus.effect, Val::Unit));
        }
        Ok(tails)
    }

    pub(super) fn lower_try(
        &mut self,
        block: &Tree,
        catches: &[CatchClause],
        finalizer: Option<&Tree>,
        focus: Focus,
    ) -> LowerResult<Tails> {
        let region = self.add(
            Op::Try {
                control: focus.control,
            },
            IrType::Unit,
        );
        let normal = self.lower_expr(block, Focus::new(region, focus.effect, Val::Unit))?;
        let handled = self.lower_handler(region, focus.effect, catches)?;
        let tails = normal + handled;

        match finalizer {
            Some(finalizer) => self.splice_finally(tails, finalizer),
            None => Ok(tails),
        }
    }

    /// Dispatch on the runtime class of the caught exception
    ///
    /// Clauses are tried in source order; an unmatched exception is rethrown.
    fn lower_handler(&mut self, region: NodeId, effect: NodeId, catches: &[CatchClause]) -> LowerResult<Tails> {
        let handler = self.add(Op::CaseException { region }, IrType::Unit);
        let exception = self.add(
            Op::ExceptionValue { handler },
            IrType::Class(Name::new(THROWABLE_CLASS)),
        );
        let tag = self.add(
            Op::TypeTag {
                value: Val::Node(exception),
            },
            IrType::Ptr,
        );
        let switch = self.add(
            Op::Switch {
                control: handler,
                selector: Val::Node(tag),
            },
            IrType::Unit,
        );

        let mut tails = Tails::empty();
        for clause in catches {
            let Some(ty) = &clause.exception else {
                // catch-all clause is the default; later clauses are dead
                let default = self.add(Op::CaseDefault { switch }, IrType::Unit);
                if let Some(binder) = &clause.binder {
                    self.env.bind(binder, Binding::Value(Val::Node(exception)));
                }
                let body = self.lower_expr(&clause.body, Focus::new(default, effect, Val::Unit))?;
                return Ok(tails + body);
            };

            let target = self.classify(ty);
            let class = target.class_name().cloned().ok_or_else(|| {
                LowerError::unsupported(format!("catch of non-class type {}", target))
            })?;
            let case = self.add(
                Op::CaseConst {
                    switch,
                    value: Val::ClassOf(class),
                },
                IrType::Unit,
            );
            if let Some(binder) = &clause.binder {
                let cast = self.add(
                    Op::AsInstanceOf {
                        value: Val::Node(exception),
                        target: target.clone(),
                    },
                    target,
                );
                self.env.bind(binder, Binding::Value(Val::Node(cast)));
            }
            tails = tails + self.lower_expr(&clause.body, Focus::new(case, effect, Val::Unit))?;
        }

        let default = self.add(Op::CaseDefault { switch }, IrType::Unit);
        let rethrow = self.add(
            Op::Throw {
                control: default,
                effect,
                value: Val::Node(exception),
            },
            IrType::Nothing,
        );
        Ok(tails + Tails::closed(rethrow))
    }

    /// Run `finalizer` on every path leaving a try
    ///
    /// Each terminal gets its own copy of the finalizer followed by a fresh
    /// terminal of the same kind and value. The fallthrough paths are merged
    /// and continue through one more copy, keeping their value.
    fn splice_finally(&mut self, tails: Tails, finalizer: &Tree) -> LowerResult<Tails> {
        let (open, closed) = tails.into_parts();
        let mut result = Tails::empty();

        for end in closed {
            let op = self.graph.op(end).clone();
            let ty = self.graph.ty(end).clone();
            let (control, effect) = terminal_position(&op)
                .ok_or_else(|| LowerError::unreachable(format!("{} is not a terminal", end)))?;

            let copy = self.lower_expr(finalizer, Focus::new(control, effect, Val::Unit))?;
            match copy.merge(&mut self.graph) {
                Ok((focus, inner)) => {
                    let relinked = relink_terminal(&op, focus.control, focus.effect).ok_or_else(
                        || LowerError::unreachable(format!("{} is not a terminal", end)),
                    )?;
                    let term = self.add(relinked, ty);
                    result = result + inner + Tails::closed(term);
                }
                Err(NotMergeable { closed }) => {
                    tracing::warn!(exit = %end, "finally block never completes, dropping the exit it guards");
                    result = result + closed;
                }
            }
        }

        if !open.is_empty() {
            let (focus, inner) = open
                .into_iter()
                .map(Tails::open)
                .collect::<Tails>()
                .merge(&mut self.graph)
                .map_err(|_| LowerError::unreachable("open paths did not merge"))?;
            let value = focus.value.clone();
            let after = self.lower_expr(finalizer, focus.with_value(Val::Unit))?;
            result = result + inner + after.map_open(|f| f.with_value(value.clone()));
        }

        Ok(result)
    }

    pub(super) fn lower_return(&mut self, value: &Tree, focus: Focus) -> LowerResult<Tails> {
        let mut closed = Tails::empty();
        let focus = operand!(self, closed, value, focus);
        let ret = self.add(
            Op::Return {
                control: focus.control,
                effect: focus.effect,
                value: focus.value,
            },
            IrType::Nothing,
        );
        Ok(closed + Tails::closed(ret))
    }

    pub(super) fn lower_throw(&mut self, value: &Tree, focus: Focus) -> LowerResult<Tails> {
        let mut closed = Tails::empty();
        let focus = operand!(self, closed, value, focus);
        let throw = self.add(
            Op::Throw {
                control: focus.control,
                effect: focus.effect,
                value: focus.value,
            },
            IrType::Nothing,
        );
        Ok(closed + Tails::closed(throw))
    }
}

/// Control and effect inputs of a terminal node
fn terminal_position(op: &Op) -> Option<(NodeId, NodeId)> {
    match op {
        Op::Return {
            control, effect, ..
        }
        | Op::Throw {
            control, effect, ..
        }
        | Op::Undefined { control, effect } => Some((*control, *effect)),
        _ => None,
    }
}

/// The same terminal moved to a new control and effect position
fn relink_terminal(op: &Op, control: NodeId, effect: NodeId) -> Option<Op> {
    match op {
        Op::Return { value, .. } => Some(Op::Return {
            control,
            effect,
            value: value.clone(),
        }),
        Op::Throw { value, .. } => Some(Op::Throw {
            control,
            effect,
            value: value.clone(),
        }),
        Op::Undefined { .. } => Some(Op::Undefined { control, effect }),
        _ => None,
    }
}
