//! Symbol environment
//!
//! Maps the identity of a local, parameter or label parameter to what
//! lowering produced for it.

use crate::ast::{Symbol, SymbolId};
use crate::error::{LowerError, LowerResult};
use crate::ir::{IrType, NodeId, Val};
use rustc_hash::FxHashMap;

/// What a symbol is bound to
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// Direct SSA value
    Value(Val),
    /// Heap slot of a mutable local, accessed by load and store
    Slot { slot: NodeId, ty: IrType },
}

/// Per-method symbol environment
#[derive(Debug, Default)]
pub struct Env {
    bindings: FxHashMap<SymbolId, Binding>,
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a symbol; the last binding wins
    pub fn bind(&mut self, sym: &Symbol, binding: Binding) {
        self.bindings.insert(sym.id, binding);
    }

    pub fn resolve(&self, sym: &Symbol) -> LowerResult<&Binding> {
        self.bindings
            .get(&sym.id)
            .ok_or_else(|| LowerError::unbound(sym))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_last_binding_wins() {
        let mut env = Env::new();
        let x = Symbol::local(1, "x");
        env.bind(&x, Binding::Value(Val::I32(1)));
        env.bind(&x, Binding::Value(Val::I32(2)));
        assert_eq!(env.resolve(&x).unwrap(), &Binding::Value(Val::I32(2)));
    }

    #[test]
    fn test_identity_not_name() {
        let mut env = Env::new();
        env.bind(&Symbol::local(1, "x"), Binding::Value(Val::Bool(true)));
        let shadow = Symbol::local(2, "x");
        let err = env.resolve(&shadow).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unreachable);
        assert!(err.to_string().contains("`x`"));
    }
}
