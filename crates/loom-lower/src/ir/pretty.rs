//! Pretty-printing for IR
//!
//! Provides human-readable output for debugging lowered definitions.

use super::defn::{Defn, DefnTable, MethodBody};
use super::value::Name;
use std::fmt::Write;

/// Trait for pretty-printing IR constructs
pub trait PrettyPrint {
    fn pretty_print(&self) -> String;
}

impl PrettyPrint for DefnTable {
    fn pretty_print(&self) -> String {
        let mut output = String::new();
        for defn in self.iter() {
            output.push_str(&defn.pretty_print());
        }
        output
    }
}

impl PrettyPrint for Defn {
    fn pretty_print(&self) -> String {
        let mut output = String::new();
        match self {
            Defn::Class {
                name,
                parent,
                interfaces,
            } => {
                write!(output, "class {}", name).unwrap();
                write_supers(&mut output, parent.as_ref(), interfaces);
                writeln!(output).unwrap();
            }
            Defn::Interface { name, interfaces } => {
                write!(output, "interface {}", name).unwrap();
                write_supers(&mut output, None, interfaces);
                writeln!(output).unwrap();
            }
            Defn::Module {
                name,
                parent,
                interfaces,
            } => {
                write!(output, "module {}", name).unwrap();
                write_supers(&mut output, parent.as_ref(), interfaces);
                writeln!(output).unwrap();
            }
            Defn::Field { name, ty, mutable } => {
                let kw = if *mutable { "var" } else { "val" };
                writeln!(output, "{} {}: {}", kw, name, ty).unwrap();
            }
            Defn::Declare { name, sig } => {
                writeln!(output, "declare {}{}", name, sig).unwrap();
            }
            Defn::Define { name, sig, body } => {
                writeln!(output, "define {}{} {{", name, sig).unwrap();
                output.push_str(&body.pretty_print());
                writeln!(output, "}}").unwrap();
            }
        }
        output
    }
}

impl PrettyPrint for MethodBody {
    /// Prints live nodes in creation order, followed by the end list
    fn pretty_print(&self) -> String {
        let mut output = String::new();

        let mut roots = self.ends.clone();
        roots.push(self.start);
        roots.extend(self.params.iter().copied());
        let live = self.graph.reachable(&roots);

        for (id, node) in self.graph.iter() {
            if !live.contains(&id) {
                continue;
            }
            writeln!(output, "  {} = {} : {}", id, node.op, node.ty).unwrap();
        }

        let ends: Vec<String> = self.ends.iter().map(|e| e.to_string()).collect();
        writeln!(output, "  ; ends: {}", ends.join(", ")).unwrap();
        output
    }
}

fn write_supers(output: &mut String, parent: Option<&Name>, interfaces: &[Name]) {
    let supers: Vec<&str> = parent
        .into_iter()
        .chain(interfaces.iter())
        .map(Name::as_str)
        .collect();
    if !supers.is_empty() {
        write!(output, " : {}", supers.join(", ")).unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Graph, IrType, Op, Signature, Val};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_print_define() {
        let mut graph = Graph::new();
        let start = graph.add(Op::Start, IrType::Unit);
        let this = graph.add(Op::Param { index: 0 }, IrType::Class(Name::new("A")));
        let ret = graph.add(
            Op::Return {
                control: start,
                effect: start,
                value: Val::I32(42),
            },
            IrType::Unit,
        );
        let defn = Defn::Define {
            name: Name::new("A::answer"),
            sig: Signature {
                params: vec![IrType::Class(Name::new("A"))],
                ret: IrType::I32,
            },
            body: MethodBody {
                graph,
                start,
                params: vec![this],
                ends: vec![ret],
            },
        };

        let expected = "\
define A::answer(class A): i32 {
  %0 = start : unit
  %1 = param 0 : class A
  %2 = return 42 [%0] {%0} : unit
  ; ends: %2
}
";
        assert_eq!(defn.pretty_print(), expected);
    }

    #[test]
    fn test_print_class_header() {
        let defn = Defn::Class {
            name: Name::new("B"),
            parent: Some(Name::new("A")),
            interfaces: vec![Name::new("I")],
        };
        assert_eq!(defn.pretty_print(), "class B : A, I\n");
    }
}
