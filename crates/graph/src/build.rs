//! The single-pass graph construction and effect-hazard analysis.

use crate::{Graph, GraphError, OpId, OpNode, Producer, ValueId, ValueNode};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use stax_ir::{Call, Expr, OpSpec, Program, Stmt};
use tracing::{debug, trace};

pub(crate) fn run(program: &Program) -> Result<Graph, GraphError> {
    let mut builder = Builder::new(program);
    builder.seed_inputs();
    for stmt in &program.body {
        builder.stmt(stmt)?;
    }
    builder.finish()
}

struct Builder<'a> {
    program: &'a Program,
    specs: FxHashMap<&'a str, &'a OpSpec>,
    /// Bound names, rebinding (shadowing) allowed.
    env: FxHashMap<String, ValueId>,
    /// Most recent writer per effect category.
    last_affects: FxHashMap<&'a str, OpId>,
    /// Readers since the last writer, per effect category.
    last_deps: FxHashMap<&'a str, Vec<OpId>>,
    graph: Graph,
}

impl<'a> Builder<'a> {
    fn new(program: &'a Program) -> Self {
        let specs =
            program.defs.iter().map(|def| (def.name.as_str(), &def.spec)).collect();
        Self {
            program,
            specs,
            env: FxHashMap::default(),
            last_affects: FxHashMap::default(),
            last_deps: FxHashMap::default(),
            graph: Graph::empty(program.main.clone()),
        }
    }

    fn seed_inputs(&mut self) {
        for name in self.program.main.inputs.names() {
            let value = self
                .graph
                .values
                .push(ValueNode::new(Some(name.to_string()), Producer::Input));
            self.graph.inputs.insert(name.to_string(), value);
            self.env.insert(name.to_string(), value);
        }
    }

    fn stmt(&mut self, stmt: &Stmt) -> Result<(), GraphError> {
        match stmt {
            Stmt::Expr(call) => {
                let outs = self.call(call)?;
                if !outs.is_empty() {
                    return Err(GraphError::OutputCountMismatch {
                        name: call.name.clone(),
                        expected: 0,
                        found: outs.len(),
                    });
                }
            }
            Stmt::Assign { name, expr } => {
                let value = self.expr_single(expr)?;
                self.env.insert(name.clone(), value);
            }
            Stmt::MultiAssign { names, call } => {
                let outs = self.call(call)?;
                if outs.len() != names.len() {
                    return Err(GraphError::OutputCountMismatch {
                        name: call.name.clone(),
                        expected: names.len(),
                        found: outs.len(),
                    });
                }
                for (name, value) in names.iter().zip(outs) {
                    self.env.insert(name.clone(), value);
                }
            }
        }
        Ok(())
    }

    /// Resolves an expression that must yield exactly one value instance.
    fn expr_single(&mut self, expr: &Expr) -> Result<ValueId, GraphError> {
        match expr {
            Expr::Lit(value) => {
                Ok(self.graph.values.push(ValueNode::new(None, Producer::Literal(*value))))
            }
            Expr::Var(name) => self
                .env
                .get(name)
                .copied()
                .ok_or_else(|| GraphError::UndefinedVariable { name: name.clone() }),
            Expr::Call(call) => {
                let outs = self.call(call)?;
                if outs.len() != 1 {
                    return Err(GraphError::MultiValueInSingleSlot {
                        name: call.name.clone(),
                        found: outs.len(),
                    });
                }
                Ok(outs[0])
            }
        }
    }

    /// Creates one operation instance for a call site and wires its data
    /// and effect-ordering edges.
    fn call(&mut self, call: &Call) -> Result<SmallVec<[ValueId; 2]>, GraphError> {
        let Some(&spec) = self.specs.get(call.name.as_str()) else {
            return Err(GraphError::UnknownOperation { name: call.name.clone() });
        };
        if spec.arity() != call.args.len() {
            return Err(GraphError::ArityMismatch {
                name: call.name.clone(),
                expected: spec.arity(),
                found: call.args.len(),
            });
        }

        let inputs = call
            .args
            .iter()
            .map(|arg| self.expr_single(arg))
            .collect::<Result<SmallVec<[ValueId; 4]>, _>>()?;

        let op = self.graph.ops.push(OpNode::new(call.name.clone(), inputs.clone()));
        for &input in &inputs {
            self.graph.values[input].add_consumer(op);
        }

        let mut outputs = SmallVec::new();
        for index in 0..spec.outputs.size() {
            let value = self
                .graph
                .values
                .push(ValueNode::new(None, Producer::Op { op, index: index as u32 }));
            self.graph.ops[op].push_output(value);
            outputs.push(value);
        }

        self.hazards(op, spec);
        Ok(outputs)
    }

    /// The read/write hazard rule, generalized from one shared memory to
    /// named effect categories:
    /// - same-category writers are totally ordered in program order;
    /// - a reader follows the most recent writer of what it reads;
    /// - a writer follows every reader not yet superseded by a later
    ///   writer.
    fn hazards(&mut self, op: OpId, spec: &'a OpSpec) {
        for category in &spec.affects {
            let category = category.as_str();
            let readers =
                self.last_deps.get_mut(category).map(std::mem::take).unwrap_or_default();
            for reader in readers {
                self.ordering_edge(reader, op);
            }
            if let Some(&writer) = self.last_affects.get(category) {
                self.ordering_edge(writer, op);
            }
            self.last_affects.insert(category, op);
        }
        for category in &spec.deps {
            let category = category.as_str();
            if let Some(&writer) = self.last_affects.get(category) {
                self.ordering_edge(writer, op);
            }
            self.last_deps.entry(category).or_default().push(op);
        }
    }

    fn ordering_edge(&mut self, pred: OpId, succ: OpId) {
        debug_assert_ne!(pred, succ);
        if self.graph.ops[succ].push_pred(pred) {
            self.graph.ops[pred].push_succ(succ);
            trace!(pred = pred.index(), succ = succ.index(), "ordering edge");
        }
    }

    fn finish(mut self) -> Result<Graph, GraphError> {
        for name in self.program.main.outputs.names() {
            let Some(&value) = self.env.get(name) else {
                return Err(GraphError::UnboundOutput { name: name.to_string() });
            };
            self.graph.outputs.push((name.to_string(), value));
        }
        debug!(
            ops = self.graph.ops.len(),
            values = self.graph.values.len(),
            "built dependency graph"
        );
        Ok(self.graph)
    }
}
