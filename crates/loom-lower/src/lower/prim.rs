//! Primitive operator and numeric coercion tables
//!
//! Pure lookups; the lowering decides where to emit the nodes.

use crate::ast::PrimOp;
use crate::ir::{BinOp, CompOp, ConvOp, IrType};

/// How a value of one type becomes a value of another
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    /// Same representation, no node needed
    Identity,
    Convert(ConvOp),
}

/// (operator, signed integer, unsigned integer, float)
const ARITHMETIC: &[(PrimOp, BinOp, BinOp, Option<BinOp>)] = &[
    (PrimOp::Add, BinOp::Iadd, BinOp::Iadd, Some(BinOp::Fadd)),
    (PrimOp::Sub, BinOp::Isub, BinOp::Isub, Some(BinOp::Fsub)),
    (PrimOp::Mul, BinOp::Imul, BinOp::Imul, Some(BinOp::Fmul)),
    (PrimOp::Div, BinOp::Sdiv, BinOp::Udiv, Some(BinOp::Fdiv)),
    (PrimOp::Mod, BinOp::Srem, BinOp::Urem, Some(BinOp::Frem)),
    (PrimOp::Or, BinOp::Or, BinOp::Or, None),
    (PrimOp::Xor, BinOp::Xor, BinOp::Xor, None),
    (PrimOp::And, BinOp::And, BinOp::And, None),
    (PrimOp::Lsl, BinOp::Shl, BinOp::Shl, None),
    (PrimOp::Lsr, BinOp::Lshr, BinOp::Lshr, None),
    (PrimOp::Asr, BinOp::Ashr, BinOp::Ashr, None),
];

/// (operator, signed integer, unsigned integer, float)
const COMPARISON: &[(PrimOp, CompOp, CompOp, CompOp)] = &[
    (PrimOp::Eq, CompOp::Ieq, CompOp::Ieq, CompOp::Feq),
    (PrimOp::Ne, CompOp::Ine, CompOp::Ine, CompOp::Fne),
    (PrimOp::Lt, CompOp::Slt, CompOp::Ult, CompOp::Flt),
    (PrimOp::Le, CompOp::Sle, CompOp::Ule, CompOp::Fle),
    (PrimOp::Gt, CompOp::Sgt, CompOp::Ugt, CompOp::Fgt),
    (PrimOp::Ge, CompOp::Sge, CompOp::Uge, CompOp::Fge),
];

/// Arithmetic, bitwise or shift operator for operands of type `ty`
pub fn arithmetic_op(op: PrimOp, ty: &IrType) -> Option<BinOp> {
    let &(_, signed, unsigned, float) = ARITHMETIC.iter().find(|row| row.0 == op)?;
    match ty {
        IrType::Bool if signed.is_bitwise() => Some(signed),
        ty if ty.is_float() => float,
        ty if ty.is_signed() => Some(signed),
        ty if ty.is_integer() => Some(unsigned),
        _ => None,
    }
}

/// Comparison operator for operands of type `ty`
pub fn comparison_op(op: PrimOp, ty: &IrType) -> Option<CompOp> {
    let &(_, signed, unsigned, float) = COMPARISON.iter().find(|row| row.0 == op)?;
    match ty {
        IrType::Bool if matches!(op, PrimOp::Eq | PrimOp::Ne) => Some(signed),
        ty if ty.is_float() => Some(float),
        ty if ty.is_signed() => Some(signed),
        ty if ty.is_integer() => Some(unsigned),
        _ => None,
    }
}

/// Conversion between two types; `None` if they never convert
pub fn coercion(from: &IrType, to: &IrType) -> Option<Coercion> {
    if from == to {
        return Some(Coercion::Identity);
    }

    let integral = |ty: &IrType| ty.is_integer() || *ty == IrType::Bool;
    match (from, to) {
        (f, t) if integral(f) && integral(t) => {
            let (fw, tw) = (f.width()?, t.width()?);
            Some(if fw < tw {
                match f {
                    IrType::Char | IrType::Bool => Coercion::Convert(ConvOp::Zext),
                    _ => Coercion::Convert(ConvOp::Sext),
                }
            } else if fw > tw {
                Coercion::Convert(ConvOp::Trunc)
            } else {
                Coercion::Identity
            })
        }
        (f, t) if f.is_integer() && t.is_float() => Some(Coercion::Convert(ConvOp::Sitofp)),
        (f, t) if f.is_float() && t.is_integer() => Some(Coercion::Convert(ConvOp::Fptosi)),
        (IrType::F64, IrType::F32) => Some(Coercion::Convert(ConvOp::Fptrunc)),
        (IrType::F32, IrType::F64) => Some(Coercion::Convert(ConvOp::Fpext)),
        _ => None,
    }
}

/// Common operand type of a binary operation; `None` for incompatible operands
pub fn binary_operation_type(left: &IrType, right: &IrType) -> Option<IrType> {
    if left == right {
        return Some(left.clone());
    }
    if left.is_bottom() {
        return Some(right.clone());
    }
    if right.is_bottom() {
        return Some(left.clone());
    }

    match (left, right) {
        (l, r) if l.is_integer() && r.is_integer() => {
            let (lw, rw) = (l.width()?, r.width()?);
            Some(if lw > rw {
                l.clone()
            } else if rw > lw {
                r.clone()
            } else {
                IrType::I32
            })
        }
        (l, r) if l.is_integer() && r.is_float() => Some(r.clone()),
        (l, r) if l.is_float() && r.is_integer() => Some(l.clone()),
        (l, r) if l.is_float() && r.is_float() => {
            Some(if l.width() >= r.width() { l.clone() } else { r.clone() })
        }
        _ => None,
    }
}
