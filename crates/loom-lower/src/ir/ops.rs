//! IR operator codes
//!
//! Arithmetic, comparison and conversion operators carried by `Bin`, `Comp`
//! and `Conv` nodes.

use serde::{Deserialize, Serialize};

/// Binary arithmetic, bitwise and shift operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinOp {
    Iadd,
    Fadd,
    Isub,
    Fsub,
    Imul,
    Fmul,
    Sdiv,
    Udiv,
    Fdiv,
    Srem,
    Urem,
    Frem,
    Shl,
    Lshr,
    Ashr,
    And,
    Or,
    Xor,
}

impl BinOp {
    pub fn is_float(&self) -> bool {
        matches!(
            self,
            BinOp::Fadd | BinOp::Fsub | BinOp::Fmul | BinOp::Fdiv | BinOp::Frem
        )
    }

    pub fn is_shift(&self) -> bool {
        matches!(self, BinOp::Shl | BinOp::Lshr | BinOp::Ashr)
    }

    pub fn is_bitwise(&self) -> bool {
        matches!(self, BinOp::And | BinOp::Or | BinOp::Xor)
    }
}

impl std::fmt::Display for BinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BinOp::Iadd => "iadd",
            BinOp::Fadd => "fadd",
            BinOp::Isub => "isub",
            BinOp::Fsub => "fsub",
            BinOp::Imul => "imul",
            BinOp::Fmul => "fmul",
            BinOp::Sdiv => "sdiv",
            BinOp::Udiv => "udiv",
            BinOp::Fdiv => "fdiv",
            BinOp::Srem => "srem",
            BinOp::Urem => "urem",
            BinOp::Frem => "frem",
            BinOp::Shl => "shl",
            BinOp::Lshr => "lshr",
            BinOp::Ashr => "ashr",
            BinOp::And => "and",
            BinOp::Or => "or",
            BinOp::Xor => "xor",
        };
        f.write_str(s)
    }
}

/// Comparison operators; all produce `bool`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompOp {
    Ieq,
    Ine,
    Ugt,
    Uge,
    Ult,
    Ule,
    Sgt,
    Sge,
    Slt,
    Sle,
    Feq,
    Fne,
    Fgt,
    Fge,
    Flt,
    Fle,
}

impl std::fmt::Display for CompOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CompOp::Ieq => "ieq",
            CompOp::Ine => "ine",
            CompOp::Ugt => "ugt",
            CompOp::Uge => "uge",
            CompOp::Ult => "ult",
            CompOp::Ule => "ule",
            CompOp::Sgt => "sgt",
            CompOp::Sge => "sge",
            CompOp::Slt => "slt",
            CompOp::Sle => "sle",
            CompOp::Feq => "feq",
            CompOp::Fne => "fne",
            CompOp::Fgt => "fgt",
            CompOp::Fge => "fge",
            CompOp::Flt => "flt",
            CompOp::Fle => "fle",
        };
        f.write_str(s)
    }
}

/// Numeric conversion operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConvOp {
    Trunc,
    Zext,
    Sext,
    Fptrunc,
    Fpext,
    Fptosi,
    Sitofp,
}

impl std::fmt::Display for ConvOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConvOp::Trunc => "trunc",
            ConvOp::Zext => "zext",
            ConvOp::Sext => "sext",
            ConvOp::Fptrunc => "fptrunc",
            ConvOp::Fpext => "fpext",
            ConvOp::Fptosi => "fptosi",
            ConvOp::Sitofp => "sitofp",
        };
        f.write_str(s)
    }
}
