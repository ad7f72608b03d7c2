//! DOT rendering of the dependency graph for visualization.

use crate::{Graph, Producer};
use std::fmt::Write;

/// Generates a DOT format rendering of a graph: operation instances as
/// boxes, value instances as ellipses, data edges solid, effect-ordering
/// edges dashed.
#[must_use]
pub fn graph_to_dot(graph: &Graph) -> String {
    let mut dot = String::new();

    writeln!(dot, "digraph deps {{").unwrap();
    writeln!(dot, "    node [fontname=\"Courier\", fontsize=10];").unwrap();
    writeln!(dot, "    edge [fontname=\"Courier\", fontsize=9];").unwrap();
    writeln!(dot).unwrap();

    for (id, value) in graph.values() {
        let idx = id.index();
        let label = match (&value.name, &value.producer) {
            (Some(name), _) => format!("v{idx}: {name}"),
            (None, Producer::Literal(lit)) => format!("v{idx} = {lit}"),
            (None, _) => format!("v{idx}"),
        };
        let style = if graph.is_output(id) { ", peripheries=2" } else { "" };
        writeln!(dot, "    v{idx} [shape=ellipse, label=\"{label}\"{style}];").unwrap();
    }
    writeln!(dot).unwrap();

    for (id, op) in graph.ops() {
        let idx = id.index();
        writeln!(dot, "    op{idx} [shape=box, label=\"op{idx}: {}\"];", op.name).unwrap();
        for (arg, &input) in op.inputs().iter().enumerate() {
            writeln!(dot, "    v{} -> op{idx} [label=\"{arg}\"];", input.index()).unwrap();
        }
        for &output in op.outputs() {
            writeln!(dot, "    op{idx} -> v{};", output.index()).unwrap();
        }
        for &succ in op.succs() {
            writeln!(dot, "    op{idx} -> op{} [style=dashed, color=gray];", succ.index())
                .unwrap();
        }
    }

    writeln!(dot, "}}").unwrap();
    dot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Graph;
    use stax_ir::{Expr, Layout, OpSpec, Stmt, evm};

    #[test]
    fn dot_mentions_every_instance() {
        let main = OpSpec::new(
            Layout::stack_only(["x"]),
            Layout::stack_only(["z"]),
            std::iter::empty::<&str>(),
            std::iter::empty::<&str>(),
        );
        let body = vec![
            Stmt::Expr(stax_ir::Call::new("sstore", [Expr::var("x"), Expr::lit(1)])),
            Stmt::assign("z", Expr::call("sload", [Expr::var("x")])),
        ];
        let graph = Graph::build(&evm::evm_program(main, body)).unwrap();
        let dot = graph_to_dot(&graph);

        for id in graph.op_ids() {
            assert!(dot.contains(&format!("op{}", id.index())));
        }
        for id in graph.value_ids() {
            assert!(dot.contains(&format!("v{}", id.index())));
        }
        // The load is ordered after the store.
        assert!(dot.contains("style=dashed"));
    }
}
