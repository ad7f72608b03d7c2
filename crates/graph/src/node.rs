//! Graph nodes: operation instances and value instances.

use crate::{OpId, ValueId};
use smallvec::SmallVec;
use stax_ir::U256;

/// What brought a value instance into existence.
///
/// Exactly one producer per value; values are immutable once created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Producer {
    /// A declared input of the main signature.
    Input,
    /// A materialized integer literal.
    Literal(U256),
    /// One output slot of one operation instance.
    Op {
        /// The producing instance.
        op: OpId,
        /// Which of its output slots, zero-based.
        index: u32,
    },
}

impl Producer {
    /// Returns the producing operation instance, if any.
    #[must_use]
    pub fn op(&self) -> Option<OpId> {
        match self {
            Self::Op { op, .. } => Some(*op),
            Self::Input | Self::Literal(_) => None,
        }
    }
}

/// One produced value: a main input, a literal, or an operation output.
#[derive(Clone, Debug)]
pub struct ValueNode {
    /// The source-level name, where one exists (main inputs).
    pub name: Option<String>,
    /// The value's sole producer.
    pub producer: Producer,
    consumers: Vec<OpId>,
}

impl ValueNode {
    pub(crate) fn new(name: Option<String>, producer: Producer) -> Self {
        Self { name, producer, consumers: Vec::new() }
    }

    /// The operation instances consuming this value as an input. Set
    /// semantics: an instance reading the value twice appears once.
    #[must_use]
    pub fn consumers(&self) -> &[OpId] {
        &self.consumers
    }

    pub(crate) fn add_consumer(&mut self, op: OpId) {
        if !self.consumers.contains(&op) {
            self.consumers.push(op);
        }
    }
}

/// One call-site evaluation of a declared operation.
#[derive(Clone, Debug)]
pub struct OpNode {
    /// The resolved signature name.
    pub name: String,
    inputs: SmallVec<[ValueId; 4]>,
    outputs: SmallVec<[ValueId; 2]>,
    preds: Vec<OpId>,
    succs: Vec<OpId>,
}

impl OpNode {
    pub(crate) fn new(name: String, inputs: SmallVec<[ValueId; 4]>) -> Self {
        Self { name, inputs, outputs: SmallVec::new(), preds: Vec::new(), succs: Vec::new() }
    }

    /// Input value instances, in declared input order.
    #[must_use]
    pub fn inputs(&self) -> &[ValueId] {
        &self.inputs
    }

    /// Output value instances, in declared output order.
    #[must_use]
    pub fn outputs(&self) -> &[ValueId] {
        &self.outputs
    }

    /// Instances that must be scheduled before this one (effect-ordering
    /// edges from hazard analysis).
    #[must_use]
    pub fn preds(&self) -> &[OpId] {
        &self.preds
    }

    /// Instances that must be scheduled after this one.
    #[must_use]
    pub fn succs(&self) -> &[OpId] {
        &self.succs
    }

    pub(crate) fn push_output(&mut self, value: ValueId) {
        self.outputs.push(value);
    }

    pub(crate) fn push_pred(&mut self, pred: OpId) -> bool {
        if self.preds.contains(&pred) {
            return false;
        }
        self.preds.push(pred);
        true
    }

    pub(crate) fn push_succ(&mut self, succ: OpId) {
        self.succs.push(succ);
    }
}
