//! Structural checks on lowered method bodies
//!
//! Only nodes reachable from the ends are checked; stale nodes left behind by
//! label redefinition are ignored.

use super::defn::MethodBody;
use super::node::{NodeId, Op};

/// Validate a method body, collecting every violation
pub fn validate_body(body: &MethodBody) -> Result<(), Vec<String>> {
    let graph = &body.graph;
    let mut errors = Vec::new();

    if !matches!(graph.get(body.start).map(|n| &n.op), Some(Op::Start)) {
        errors.push(format!("{} is not a start node", body.start));
        return Err(errors);
    }

    for &end in &body.ends {
        if !graph.op(end).is_terminal() {
            errors.push(format!("end {} is not a terminal node", end));
        }
    }

    let mut live: Vec<NodeId> = graph.reachable(&body.ends).into_iter().collect();
    live.sort();

    for id in live {
        match graph.op(id) {
            Op::Phi { merge, incoming } => {
                check_arity(graph, id, *merge, incoming.len(), &mut errors);
            }
            Op::EffectPhi { merge, incoming } => {
                check_arity(graph, id, *merge, incoming.len(), &mut errors);
                for &effect in incoming {
                    if !graph.op(effect).produces_effect() {
                        errors.push(format!("{}: incoming {} is not an effect", id, effect));
                    }
                }
            }
            op => {
                if let Some(effect) = op.effect() {
                    if !graph.op(effect).produces_effect() {
                        errors.push(format!("{}: effect input {} is not an effect", id, effect));
                    }
                }
                if op.is_terminal() {
                    if let Op::Return { effect, .. }
                    | Op::Throw { effect, .. }
                    | Op::Undefined { effect, .. } = op
                    {
                        if !graph.op(*effect).produces_effect() {
                            errors.push(format!("{}: effect input {} is not an effect", id, effect));
                        }
                    }
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_arity(
    graph: &super::node::Graph,
    phi: NodeId,
    merge: NodeId,
    incoming: usize,
    errors: &mut Vec<String>,
) {
    match graph.op(merge) {
        Op::Merge { preds } if preds.len() == incoming => {}
        Op::Merge { preds } => errors.push(format!(
            "{}: {} incoming values but merge {} has {} predecessors",
            phi,
            incoming,
            merge,
            preds.len()
        )),
        _ => errors.push(format!("{}: {} is not a merge", phi, merge)),
    }
}
