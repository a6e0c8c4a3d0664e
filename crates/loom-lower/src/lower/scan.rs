//! Pre-pass deciding which locals live in heap slots
//!
//! A local gets a slot if it is ever reassigned, or if it is a `var` that is
//! read or written inside a label body nested deeper than its declaration.
//! Everything else is bound directly to its SSA value.

use crate::ast::{SymbolId, Tree, TreeKind};
use rustc_hash::{FxHashMap, FxHashSet};

/// Locals of `body` that need a slot
pub fn slot_locals(body: &Tree) -> FxHashSet<SymbolId> {
    let mut scan = Scan::default();
    scan.visit(body, 0);

    let mut slots: FxHashSet<SymbolId> = scan
        .assigned
        .iter()
        .filter(|id| scan.declared.contains_key(id))
        .copied()
        .collect();
    for (id, depth) in scan.uses {
        if let Some(&(decl_depth, true)) = scan.declared.get(&id) {
            if depth > decl_depth {
                slots.insert(id);
            }
        }
    }
    slots
}

#[derive(Default)]
struct Scan {
    /// Local declarations: label depth and mutability
    declared: FxHashMap<SymbolId, (u32, bool)>,
    assigned: FxHashSet<SymbolId>,
    /// Reads and writes with the label depth they occur at
    uses: Vec<(SymbolId, u32)>,
}

impl Scan {
    fn visit(&mut self, tree: &Tree, depth: u32) {
        match &tree.kind {
            TreeKind::ValDef {
                sym, mutable, rhs, ..
            } => {
                self.visit(rhs, depth);
                self.declared.insert(sym.id, (depth, *mutable));
            }
            TreeKind::Ident(sym) => self.uses.push((sym.id, depth)),
            TreeKind::Assign { lhs, rhs } => {
                if let TreeKind::Ident(sym) = &lhs.kind {
                    self.assigned.insert(sym.id);
                }
                self.visit(lhs, depth);
                self.visit(rhs, depth);
            }
            TreeKind::LabelDef { body, .. } => self.visit(body, depth + 1),
            _ => tree.for_each_child(|child| self.visit(child, depth)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Param, Symbol, Type};

    #[test]
    fn test_immutable_local_has_no_slot() {
        let x = Symbol::local(1, "x");
        let body = Tree::block(
            vec![Tree::val_def(&x, Type::Int, Tree::int(1))],
            Tree::ident(&x, Type::Int),
        );
        assert!(slot_locals(&body).is_empty());
    }

    #[test]
    fn test_reassigned_local_has_slot() {
        let x = Symbol::local(1, "x");
        let body = Tree::block(
            vec![
                Tree::var_def(&x, Type::Int, Tree::int(1)),
                Tree::assign(Tree::ident(&x, Type::Int), Tree::int(2)),
            ],
            Tree::ident(&x, Type::Int),
        );
        assert!(slot_locals(&body).contains(&x.id));
    }

    #[test]
    fn test_var_used_in_nested_label_has_slot() {
        let x = Symbol::local(1, "x");
        let l = Symbol::label(2, "loop");
        let body = Tree::block(
            vec![Tree::var_def(&x, Type::Int, Tree::int(1))],
            Tree::label(&l, Vec::<Param>::new(), Tree::ident(&x, Type::Int)),
        );
        assert!(slot_locals(&body).contains(&x.id));
    }

    #[test]
    fn test_params_never_get_slots() {
        let p = Symbol::param(1, "p");
        let body = Tree::assign(Tree::ident(&p, Type::Int), Tree::int(2));
        assert!(slot_locals(&body).is_empty());
    }
}
