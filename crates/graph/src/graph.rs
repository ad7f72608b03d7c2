//! The dependency graph.

use crate::{GraphError, OpId, OpNode, ValueId, ValueNode};
use index_vec::IndexVec;
use rustc_hash::FxHashMap;
use stax_ir::{OpSpec, Program};

/// The dependency graph of one program: every operation instance, every
/// value instance, the data edges between them, and the effect-ordering
/// edges from hazard analysis.
///
/// Acyclic by construction: statements are processed once in program order
/// and every name must be bound before use. Immutable after [`build`];
/// safe to share read-only across any number of scheduling branches.
///
/// [`build`]: Graph::build
#[derive(Clone, Debug)]
pub struct Graph {
    pub(crate) ops: IndexVec<OpId, OpNode>,
    pub(crate) values: IndexVec<ValueId, ValueNode>,
    pub(crate) inputs: FxHashMap<String, ValueId>,
    pub(crate) outputs: Vec<(String, ValueId)>,
    pub(crate) main: OpSpec,
}

impl Graph {
    /// Builds the dependency graph for `program`.
    ///
    /// Validates the program first, then runs the single construction
    /// pass. Fails without producing a usable partial result.
    pub fn build(program: &Program) -> Result<Self, GraphError> {
        program.validate()?;
        crate::build::run(program)
    }

    pub(crate) fn empty(main: OpSpec) -> Self {
        Self {
            ops: IndexVec::new(),
            values: IndexVec::new(),
            inputs: FxHashMap::default(),
            outputs: Vec::new(),
            main,
        }
    }

    /// The program's main signature: its input layout seeded the initial
    /// machine state, its output layout names the bindings live at the
    /// end.
    #[must_use]
    pub fn main(&self) -> &OpSpec {
        &self.main
    }

    /// Returns the operation instance with the given id.
    #[must_use]
    pub fn op(&self, id: OpId) -> &OpNode {
        &self.ops[id]
    }

    /// Returns the value instance with the given id.
    #[must_use]
    pub fn value(&self, id: ValueId) -> &ValueNode {
        &self.values[id]
    }

    /// Number of operation instances.
    #[must_use]
    pub fn op_count(&self) -> usize {
        self.ops.len()
    }

    /// Number of value instances.
    #[must_use]
    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    /// Iterates all operation instance ids in creation order.
    pub fn op_ids(&self) -> impl ExactSizeIterator<Item = OpId> + Clone {
        (0..self.ops.len()).map(OpId::from_usize)
    }

    /// Iterates all value instance ids in creation order.
    pub fn value_ids(&self) -> impl ExactSizeIterator<Item = ValueId> + Clone {
        (0..self.values.len()).map(ValueId::from_usize)
    }

    /// Iterates `(id, node)` for all operation instances.
    pub fn ops(&self) -> impl Iterator<Item = (OpId, &OpNode)> {
        self.ops.iter_enumerated()
    }

    /// Iterates `(id, node)` for all value instances.
    pub fn values(&self) -> impl Iterator<Item = (ValueId, &ValueNode)> {
        self.values.iter_enumerated()
    }

    /// The name → value table of the program's declared inputs.
    #[must_use]
    pub fn inputs(&self) -> &FxHashMap<String, ValueId> {
        &self.inputs
    }

    /// Resolves a declared input by name.
    #[must_use]
    pub fn input(&self, name: &str) -> Option<ValueId> {
        self.inputs.get(name).copied()
    }

    /// The declared main outputs, resolved to their final bindings, in
    /// output-layout order (stack names first, then locals).
    #[must_use]
    pub fn outputs(&self) -> &[(String, ValueId)] {
        &self.outputs
    }

    /// Resolves a declared output by name.
    #[must_use]
    pub fn output(&self, name: &str) -> Option<ValueId> {
        self.outputs.iter().find(|(out, _)| out == name).map(|(_, value)| *value)
    }

    /// Returns true if `value` is bound to one of the declared main
    /// output names.
    #[must_use]
    pub fn is_output(&self, value: ValueId) -> bool {
        self.outputs.iter().any(|(_, bound)| *bound == value)
    }
}
