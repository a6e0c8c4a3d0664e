//! Expression lowering

use super::env::Binding;
use super::focus::{Focus, Tails};
use super::prim::{self, Coercion};
use super::Lowerer;
use crate::ast::{Dispatch, Literal, PrimOp, Symbol, Tree, TreeKind, Type};
use crate::error::{LowerError, LowerResult};
use crate::ir::{BinOp, CompOp, IrType, Name, Op, Val};

/// Method called for `==` between references
const EQUALS_METHOD: &str = "equals";

impl<'a> Lowerer<'a> {
    /// Lower an expression from `focus`
    pub fn lower_expr(&mut self, tree: &Tree, focus: Focus) -> LowerResult<Tails> {
        match &tree.kind {
            TreeKind::Literal(lit) => {
                let value = self.lower_literal(lit);
                Ok(Tails::open(focus.with_value(value)))
            }
            TreeKind::Ident(sym) => Ok(Tails::open(self.read_symbol(sym, focus)?)),
            TreeKind::This => {
                let receiver = self
                    .receiver
                    .clone()
                    .ok_or_else(|| LowerError::unreachable("`this` outside of a method"))?;
                Ok(Tails::open(focus.with_value(receiver)))
            }
            TreeKind::Module(sym) => {
                let module = self.encode(sym);
                let load = self.add(
                    Op::ModuleLoad {
                        effect: focus.effect,
                        module: module.clone(),
                    },
                    IrType::Class(module),
                );
                Ok(Tails::open(focus.with_effectful(load)))
            }
            TreeKind::Select { qualifier, field } => {
                self.lower_select(qualifier, field, &tree.ty, focus)
            }
            TreeKind::Assign { lhs, rhs } => self.lower_assign(lhs, rhs, focus),
            TreeKind::ValDef { sym, ty, rhs, .. } => self.lower_val_def(sym, ty, rhs, focus),
            TreeKind::Block { stats, expr } => self.lower_block(stats, expr, focus),
            TreeKind::If {
                cond,
                then_branch,
                else_branch,
            } => self.lower_if(cond, then_branch, else_branch, focus),
            TreeKind::LabelDef {
                label,
                params,
                body,
                ..
            } => self.lower_label(label, params, body, focus),
            TreeKind::Jump { label, args } => self.lower_jump(label, args, focus),
            TreeKind::Switch { selector, cases } => self.lower_switch(selector, cases, focus),
            TreeKind::Try {
                block,
                catches,
                finalizer,
            } => self.lower_try(block, catches, finalizer.as_deref(), focus),
            TreeKind::Throw(value) => self.lower_throw(value, focus),
            TreeKind::Return(value) => self.lower_return(value, focus),
            TreeKind::ArrayValue { elem, elems } => self.lower_array_value(elem, elems, focus),
            TreeKind::NewArray { elem, length } => self.lower_new_array(elem, length, focus),
            TreeKind::ArrayGet { array, index } => {
                self.lower_array_get(array, index, &tree.ty, focus)
            }
            TreeKind::ArraySet {
                array,
                index,
                value,
            } => self.lower_array_set(array, index, value, focus),
            TreeKind::ArrayLength(array) => {
                let mut closed = Tails::empty();
                let focus = operand!(self, closed, array, focus);
                let length = self.add(
                    Op::ArrayLength {
                        array: focus.value.clone(),
                    },
                    IrType::I32,
                );
                Ok(closed + Tails::open(focus.with_value(Val::Node(length))))
            }
            TreeKind::Box { value, boxed } => self.lower_box(value, boxed, focus),
            TreeKind::Unbox { value, boxed } => self.lower_unbox(value, boxed, &tree.ty, focus),
            TreeKind::IsInstanceOf { value, target } => {
                let mut closed = Tails::empty();
                let focus = operand!(self, closed, value, focus);
                let target = self.classify(target);
                let test = self.add(
                    Op::IsInstanceOf {
                        value: focus.value.clone(),
                        target,
                    },
                    IrType::Bool,
                );
                Ok(closed + Tails::open(focus.with_value(Val::Node(test))))
            }
            TreeKind::AsInstanceOf { value, target } => {
                let mut closed = Tails::empty();
                let focus = operand!(self, closed, value, focus);
                let target = self.classify(target);
                let cast = self.add(
                    Op::AsInstanceOf {
                        value: focus.value.clone(),
                        target: target.clone(),
                    },
                    target,
                );
                Ok(closed + Tails::open(focus.with_value(Val::Node(cast))))
            }
            TreeKind::Coerce { value, target } => {
                let mut closed = Tails::empty();
                let focus = operand!(self, closed, value, focus);
                let from = self.classify(&value.ty);
                let to = self.classify(target);
                let coerced = self.coerce(focus.value.clone(), &from, &to)?;
                Ok(closed + Tails::open(focus.with_value(coerced)))
            }
            TreeKind::Typed(inner) => self.lower_expr(inner, focus),
            TreeKind::Prim { op, args } => self.lower_primitive(*op, args, &tree.ty, focus),
            TreeKind::Apply {
                receiver,
                method,
                args,
                dispatch,
            } => self.lower_apply(receiver, method, args, *dispatch, &tree.ty, focus),
            TreeKind::New { class, ctor, args } => self.lower_new(class, ctor, args, focus),
            TreeKind::Synchronized { receiver, body } => {
                let mut closed = Tails::empty();
                let focus = operand!(self, closed, receiver, focus);
                Ok(closed + self.lower_expr(body, focus.with_value(Val::Unit))?)
            }
            TreeKind::Closure { .. } => {
                tracing::debug!("function literal has no lowering, emitting undefined");
                Ok(self.lower_undefined(focus))
            }
        }
    }

    pub(super) fn lower_literal(&self, lit: &Literal) -> Val {
        match lit {
            Literal::Unit => Val::Unit,
            Literal::Null => Val::Null,
            Literal::Bool(b) => Val::Bool(*b),
            Literal::Byte(v) => Val::I8(*v),
            Literal::Short(v) => Val::I16(*v),
            Literal::Char(v) => Val::Char(*v),
            Literal::Int(v) => Val::I32(*v),
            Literal::Long(v) => Val::I64(*v),
            Literal::Float(v) => Val::F32(*v),
            Literal::Double(v) => Val::F64(*v),
            Literal::Str(s) => Val::Str(s.clone()),
            Literal::ClassOf(ty) => match self.classify(ty) {
                IrType::Class(name) => Val::ClassOf(name),
                other => Val::ClassOf(Name::new(other.to_string())),
            },
        }
    }

    /// Read a local or parameter
    pub(super) fn read_symbol(&mut self, sym: &Symbol, focus: Focus) -> LowerResult<Focus> {
        match self.env.resolve(sym)?.clone() {
            Binding::Value(value) => Ok(focus.with_value(value)),
            Binding::Slot { slot, ty } => {
                let load = self.add(
                    Op::Load {
                        effect: focus.effect,
                        ptr: Val::Node(slot),
                    },
                    ty,
                );
                Ok(focus.with_effectful(load))
            }
        }
    }

    /// Convert `value` from `from` to `to`
    pub(super) fn coerce(&mut self, value: Val, from: &IrType, to: &IrType) -> LowerResult<Val> {
        if from.is_bottom() {
            return Ok(value);
        }
        match prim::coercion(from, to) {
            Some(Coercion::Identity) => Ok(value),
            Some(Coercion::Convert(op)) => Ok(Val::Node(self.add(Op::Conv { op, value }, to.clone()))),
            None if from.is_reference() && to.is_reference() => Ok(value),
            None => Err(LowerError::IncompatibleOperands {
                left: from.clone(),
                right: to.clone(),
            }),
        }
    }

    fn lower_select(
        &mut self,
        qualifier: &Tree,
        field: &Symbol,
        ty: &Type,
        focus: Focus,
    ) -> LowerResult<Tails> {
        let mut closed = Tails::empty();
        let focus = operand!(self, closed, qualifier, focus);
        let field = self.encode(field);
        let ptr = self.add(
            Op::FieldElem {
                object: focus.value.clone(),
                field,
            },
            IrType::Ptr,
        );
        let ty = self.classify(ty);
        let load = self.add(
            Op::Load {
                effect: focus.effect,
                ptr: Val::Node(ptr),
            },
            ty,
        );
        Ok(closed + Tails::open(focus.with_effectful(load)))
    }

    fn lower_apply(
        &mut self,
        receiver: &Tree,
        method: &Symbol,
        args: &[Tree],
        dispatch: Dispatch,
        ty: &Type,
        focus: Focus,
    ) -> LowerResult<Tails> {
        let mut closed = Tails::empty();
        let mut focus = operand!(self, closed, receiver, focus);
        let mut values = Vec::with_capacity(args.len() + 1);
        values.push(focus.value.clone());
        for arg in args {
            focus = operand!(self, closed, arg, focus);
            values.push(focus.value.clone());
        }

        let method = self.encode(method);
        let callee = match dispatch {
            Dispatch::Virtual => {
                let elem = self.add(
                    Op::MethodElem {
                        receiver: values[0].clone(),
                        method,
                    },
                    IrType::Ptr,
                );
                Val::Node(elem)
            }
            Dispatch::Static => Val::Global(method),
        };
        let ret = self.classify(ty);
        let call = self.add(
            Op::Call {
                effect: focus.effect,
                callee,
                args: values,
            },
            ret,
        );
        Ok(closed + Tails::open(focus.with_effectful(call)))
    }

    fn lower_new(
        &mut self,
        class: &Symbol,
        ctor: &Symbol,
        args: &[Tree],
        focus: Focus,
    ) -> LowerResult<Tails> {
        let class = self.encode(class);
        let alloc = self.add(
            Op::Alloc {
                effect: focus.effect,
                class: class.clone(),
            },
            IrType::Class(class),
        );

        let mut closed = Tails::empty();
        let mut focus = focus.with_effectful(alloc);
        let mut values = vec![Val::Node(alloc)];
        for arg in args {
            focus = operand!(self, closed, arg, focus);
            values.push(focus.value.clone());
        }

        let ctor = self.encode(ctor);
        let call = self.add(
            Op::Call {
                effect: focus.effect,
                callee: Val::Global(ctor),
                args: values,
            },
            IrType::Unit,
        );
        Ok(closed + Tails::open(focus.with_effect(call).with_value(Val::Node(alloc))))
    }

    fn lower_array_value(&mut self, elem: &Type, elems: &[Tree], focus: Focus) -> LowerResult<Tails> {
        let elem = self.classify(elem);
        let alloc = self.add(
            Op::AllocArray {
                effect: focus.effect,
                elem: elem.clone(),
                length: Val::I32(elems.len() as i32),
            },
            IrType::Array(Box::new(elem)),
        );

        let mut closed = Tails::empty();
        let mut focus = focus.with_effectful(alloc);
        for (i, tree) in elems.iter().enumerate() {
            focus = operand!(self, closed, tree, focus);
            let ptr = self.add(
                Op::ArrayElem {
                    array: Val::Node(alloc),
                    index: Val::I32(i as i32),
                },
                IrType::Ptr,
            );
            let store = self.add(
                Op::Store {
                    effect: focus.effect,
                    ptr: Val::Node(ptr),
                    value: focus.value.clone(),
                },
                IrType::Unit,
            );
            focus = focus.with_effect(store);
        }
        Ok(closed + Tails::open(focus.with_value(Val::Node(alloc))))
    }

    fn lower_new_array(&mut self, elem: &Type, length: &Tree, focus: Focus) -> LowerResult<Tails> {
        let mut closed = Tails::empty();
        let focus = operand!(self, closed, length, focus);
        let length_ty = self.classify(&length.ty);
        let length = self.coerce(focus.value.clone(), &length_ty, &IrType::I32)?;
        let elem = self.classify(elem);
        let alloc = self.add(
            Op::AllocArray {
                effect: focus.effect,
                elem: elem.clone(),
                length,
            },
            IrType::Array(Box::new(elem)),
        );
        Ok(closed + Tails::open(focus.with_effectful(alloc)))
    }

    fn lower_array_get(
        &mut self,
        array: &Tree,
        index: &Tree,
        ty: &Type,
        focus: Focus,
    ) -> LowerResult<Tails> {
        let mut closed = Tails::empty();
        let focus = operand!(self, closed, array, focus);
        let array = focus.value.clone();
        let focus = operand!(self, closed, index, focus);
        let ptr = self.add(
            Op::ArrayElem {
                array,
                index: focus.value.clone(),
            },
            IrType::Ptr,
        );
        let ty = self.classify(ty);
        let load = self.add(
            Op::Load {
                effect: focus.effect,
                ptr: Val::Node(ptr),
            },
            ty,
        );
        Ok(closed + Tails::open(focus.with_effectful(load)))
    }

    fn lower_array_set(
        &mut self,
        array: &Tree,
        index: &Tree,
        value: &Tree,
        focus: Focus,
    ) -> LowerResult<Tails> {
        let mut closed = Tails::empty();
        let focus = operand!(self, closed, array, focus);
        let array = focus.value.clone();
        let focus = operand!(self, closed, index, focus);
        let index = focus.value.clone();
        let focus = operand!(self, closed, value, focus);
        let ptr = self.add(Op::ArrayElem { array, index }, IrType::Ptr);
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

    fn lower_box(&mut self, value: &Tree, boxed: &Symbol, focus: Focus) -> LowerResult<Tails> {
        let mut closed = Tails::empty();
        let focus = operand!(self, closed, value, focus);
        let boxed = self.encode(boxed);
        let node = self.add(
            Op::Box {
                effect: focus.effect,
                boxed: boxed.clone(),
                value: focus.value.clone(),
            },
            IrType::Class(boxed),
        );
        Ok(closed + Tails::open(focus.with_effectful(node)))
    }

    fn lower_unbox(
        &mut self,
        value: &Tree,
        boxed: &Symbol,
        ty: &Type,
        focus: Focus,
    ) -> LowerResult<Tails> {
        let mut closed = Tails::empty();
        let focus = operand!(self, closed, value, focus);
        let boxed = self.encode(boxed);
        let ty = self.classify(ty);
        let node = self.add(
            Op::Unbox {
                effect: focus.effect,
                boxed,
                value: focus.value.clone(),
            },
            ty,
        );
        Ok(closed + Tails::open(focus.with_effectful(node)))
    }

    fn lower_primitive(
        &mut self,
        op: PrimOp,
        args: &[Tree],
        ty: &Type,
        focus: Focus,
    ) -> LowerResult<Tails> {
        match args {
            [left, right] if op.is_short_circuit() => {
                // `a && b` is `if a then b else false`, `a || b` is `if a then true else b`
                let (then_branch, else_branch) = match op {
                    PrimOp::ZAnd => (right.clone(), Tree::boolean(false)),
                    _ => (Tree::boolean(true), right.clone()),
                };
                let desugared = Tree::if_else(left.clone(), then_branch, else_branch, Type::Boolean);
                self.lower_expr(&desugared, focus)
            }
            [arg] if op.is_unary() => self.lower_unary(op, arg, ty, focus),
            [left, right] if !op.is_unary() => self.lower_binary(op, left, right, focus),
            _ => Err(LowerError::unsupported(format!(
                "primitive {:?} with {} operands",
                op,
                args.len()
            ))),
        }
    }

    fn lower_unary(&mut self, op: PrimOp, arg: &Tree, ty: &Type, focus: Focus) -> LowerResult<Tails> {
        let mut closed = Tails::empty();
        let focus = operand!(self, closed, arg, focus);
        let result_ty = self.classify(ty);
        let arg_ty = self.classify(&arg.ty);
        let value = self.coerce(focus.value.clone(), &arg_ty, &result_ty)?;

        let node = match op {
            PrimOp::Pos => return Ok(closed + Tails::open(focus.with_value(value))),
            PrimOp::Neg => {
                let zero = Val::zero(&result_ty)
                    .ok_or_else(|| LowerError::unsupported(format!("negation of {}", result_ty)))?;
                let sub = if result_ty.is_float() {
                    BinOp::Fsub
                } else {
                    BinOp::Isub
                };
                Op::Bin {
                    op: sub,
                    left: zero,
                    right: value,
                }
            }
            PrimOp::Not => {
                let ones = Val::minus_one(&result_ty).ok_or_else(|| {
                    LowerError::unsupported(format!("bitwise not of {}", result_ty))
                })?;
                Op::Bin {
                    op: BinOp::Xor,
                    left: value,
                    right: ones,
                }
            }
            PrimOp::ZNot => Op::Bin {
                op: BinOp::Xor,
                left: value,
                right: Val::Bool(true),
            },
            other => {
                return Err(LowerError::unreachable(format!(
                    "{:?} is not a unary operator",
                    other
                )))
            }
        };
        let node = self.add(node, result_ty);
        Ok(closed + Tails::open(focus.with_value(Val::Node(node))))
    }

    fn lower_binary(
        &mut self,
        op: PrimOp,
        left: &Tree,
        right: &Tree,
        focus: Focus,
    ) -> LowerResult<Tails> {
        let mut closed = Tails::empty();
        let focus = operand!(self, closed, left, focus);
        let lhs = focus.value.clone();
        let focus = operand!(self, closed, right, focus);
        let rhs = focus.value.clone();
        let left_ty = self.classify(&left.ty);
        let right_ty = self.classify(&right.ty);

        match op {
            PrimOp::Id | PrimOp::Ni => {
                let comp = if op == PrimOp::Id {
                    CompOp::Ieq
                } else {
                    CompOp::Ine
                };
                let node = self.add(
                    Op::Comp {
                        op: comp,
                        left: lhs,
                        right: rhs,
                    },
                    IrType::Bool,
                );
                return Ok(closed + Tails::open(focus.with_value(Val::Node(node))));
            }
            PrimOp::Eq | PrimOp::Ne if !(left_ty.is_primitive() && right_ty.is_primitive()) => {
                let focus = self.lower_reference_equality(op, lhs, rhs, &left_ty, &right_ty, focus);
                return Ok(closed + Tails::open(focus));
            }
            _ => {}
        }

        let operand_ty = prim::binary_operation_type(&left_ty, &right_ty).ok_or_else(|| {
            LowerError::IncompatibleOperands {
                left: left_ty.clone(),
                right: right_ty.clone(),
            }
        })?;
        let lhs = self.coerce(lhs, &left_ty, &operand_ty)?;
        let rhs = self.coerce(rhs, &right_ty, &operand_ty)?;

        let node = if op.is_comparison() {
            let comp = prim::comparison_op(op, &operand_ty).ok_or_else(|| {
                LowerError::unsupported(format!("{:?} on {}", op, operand_ty))
            })?;
            self.add(
                Op::Comp {
                    op: comp,
                    left: lhs,
                    right: rhs,
                },
                IrType::Bool,
            )
        } else {
            let bin = prim::arithmetic_op(op, &operand_ty).ok_or_else(|| {
                LowerError::unsupported(format!("{:?} on {}", op, operand_ty))
            })?;
            self.add(
                Op::Bin {
                    op: bin,
                    left: lhs,
                    right: rhs,
                },
                operand_ty,
            )
        };
        Ok(closed + Tails::open(focus.with_value(Val::Node(node))))
    }

    /// `==` and `!=` where at least one side is a reference
    ///
    /// A statically null side compares addresses; otherwise the left side's
    /// `equals` is called through the effect chain.
    fn lower_reference_equality(
        &mut self,
        op: PrimOp,
        lhs: Val,
        rhs: Val,
        left_ty: &IrType,
        right_ty: &IrType,
        focus: Focus,
    ) -> Focus {
        let negate = op == PrimOp::Ne;
        let null_side = *left_ty == IrType::Null
            || *right_ty == IrType::Null
            || lhs == Val::Null
            || rhs == Val::Null;

        if null_side {
            let comp = if negate { CompOp::Ine } else { CompOp::Ieq };
            let node = self.add(
                Op::Comp {
                    op: comp,
                    left: lhs,
                    right: rhs,
                },
                IrType::Bool,
            );
            return focus.with_value(Val::Node(node));
        }

        let method = self.add(
            Op::MethodElem {
                receiver: lhs.clone(),
                method: Name::new(EQUALS_METHOD),
            },
            IrType::Ptr,
        );
        let call = self.add(
            Op::Call {
                effect: focus.effect,
                callee: Val::Node(method),
                args: vec![lhs, rhs],
            },
            IrType::Bool,
        );
        let focus = focus.with_effectful(call);
        if !negate {
            return focus;
        }
        let inverted = self.add(
            Op::Bin {
                op: BinOp::Xor,
                left: Val::Node(call),
                right: Val::Bool(true),
            },
            IrType::Bool,
        );
        focus.with_value(Val::Node(inverted))
    }
}
