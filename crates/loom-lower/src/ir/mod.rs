//! Graph Intermediate Representation
//!
//! Method bodies are graphs of nodes with explicit control, effect and value
//! edges. Every side-effecting node names its effect predecessor, so each
//! execution path carries a singly-linked effect chain that fixes the order of
//! loads, stores, calls and allocations.

pub mod defn;
pub mod node;
pub mod ops;
pub mod pretty;
pub mod validate;
pub mod value;

pub use defn::{Defn, DefnTable, MethodBody, Signature};
pub use node::{Graph, Node, NodeId, Op};
pub use ops::{BinOp, CompOp, ConvOp};
pub use pretty::PrettyPrint;
pub use validate::validate_body;
pub use value::{IrType, Name, Val, STRING_CLASS, THROWABLE_CLASS};
