//! Loom - typed class trees to graph IR
//!
//! This crate lowers resolved, typed class definitions into a graph IR with
//! explicit control flow, explicit effect ordering and SSA value flow.
//!
//! ```no_run
//! use loom_lower::{lower_unit, CompilationUnit, LowerOptions, PrettyPrint};
//!
//! let unit: CompilationUnit = serde_json::from_str("{\"classes\": []}").unwrap();
//! let table = lower_unit(&unit, LowerOptions::default()).unwrap();
//! println!("{}", table.pretty_print());
//! ```

pub mod ast;
pub mod classify;
pub mod driver;
pub mod error;
pub mod ir;
pub mod lower;
pub mod options;

pub use ast::CompilationUnit;
pub use classify::{NameEncoder, QualifiedNames, StandardClassifier, TypeClassifier};
pub use driver::{lower_unit, Driver};
pub use error::{ErrorKind, LowerError, LowerResult};
pub use ir::{Defn, DefnTable, PrettyPrint};
pub use lower::Lowerer;
pub use options::LowerOptions;
