//! The branchable scheduling state.

use crate::{MachineConfig, StackMachine};
use index_vec::IndexVec;
use smallvec::SmallVec;
use stax_graph::{Graph, OpId, ValueId};
use std::hash::{Hash, Hasher};
use tracing::trace;

/// One branch of a schedule exploration: a symbolic machine plus the
/// readiness and liveness counters derived from the dependency graph.
///
/// The state never decides which ready operation to pick nor how to route
/// values through dup/swap/store/load; that policy is supplied externally
/// and only consumes the contract here. Cloning is the unit of branching:
/// the machine and both counter arrays are deep-copied, so siblings never
/// observe each other's mutations.
///
/// Equality and hashing cover the machine, the counters, and the
/// scheduled set, the dedup key for visited states.
#[derive(Clone, Debug)]
pub struct SchedState {
    machine: StackMachine,
    pending_preds: IndexVec<OpId, u32>,
    remaining_uses: IndexVec<ValueId, u32>,
    scheduled: IndexVec<OpId, bool>,
    unscheduled: usize,
}

impl SchedState {
    /// Builds the initial state for `graph`: a fresh machine seeded with
    /// the main signature's inputs (stack inputs pushed in layout order,
    /// local inputs stored at their slots), every operation's pending
    /// predecessor count, and every value's remaining use count
    /// (consumers plus one if the value is bound to a declared output).
    #[must_use]
    pub fn from_graph(graph: &Graph, config: MachineConfig) -> Self {
        let mut machine = StackMachine::new(config);
        let main = graph.main();
        for name in &main.inputs.stack {
            machine.push(declared_input(graph, name));
        }
        for (name, slot) in &main.inputs.locals {
            machine.set_local(*slot, declared_input(graph, name));
        }

        let pending_preds: IndexVec<OpId, u32> =
            graph.op_ids().map(|op| graph.op(op).preds().len() as u32).collect();
        let remaining_uses: IndexVec<ValueId, u32> = graph
            .value_ids()
            .map(|value| {
                graph.value(value).consumers().len() as u32 + u32::from(graph.is_output(value))
            })
            .collect();

        let unscheduled = graph.op_count();
        Self {
            machine,
            pending_preds,
            remaining_uses,
            scheduled: IndexVec::from_vec(vec![false; unscheduled]),
            unscheduled,
        }
    }

    /// The symbolic machine of this branch.
    #[must_use]
    pub fn machine(&self) -> &StackMachine {
        &self.machine
    }

    /// Mutable access to the machine, for the external routing policy.
    pub fn machine_mut(&mut self) -> &mut StackMachine {
        &mut self.machine
    }

    /// Not-yet-scheduled predecessors of `op`.
    #[must_use]
    pub fn pending_preds(&self, op: OpId) -> u32 {
        self.pending_preds[op]
    }

    /// Not-yet-consumed future reads of `value`, the program's declared
    /// outputs included.
    #[must_use]
    pub fn remaining_uses(&self, value: ValueId) -> u32 {
        self.remaining_uses[value]
    }

    /// Returns true if `op` has already been scheduled on this branch.
    #[must_use]
    pub fn is_scheduled(&self, op: OpId) -> bool {
        self.scheduled[op]
    }

    /// Number of operations not yet scheduled.
    #[must_use]
    pub fn unscheduled(&self) -> usize {
        self.unscheduled
    }

    /// An operation may be scheduled once every predecessor has been.
    #[must_use]
    pub fn ready(&self, op: OpId) -> bool {
        !self.scheduled[op] && self.pending_preds[op] == 0
    }

    /// Iterates the operations currently ready to schedule.
    pub fn ready_ops(&self) -> impl Iterator<Item = OpId> + '_ {
        (0..self.pending_preds.len()).map(OpId::from_usize).filter(|&op| self.ready(op))
    }

    /// Marks `op` scheduled and decrements every successor's pending
    /// count, returning the successors that just became ready.
    ///
    /// `op` must be ready; scheduling a non-ready operation is a policy
    /// bug, not a recoverable condition.
    pub fn schedule(&mut self, graph: &Graph, op: OpId) -> SmallVec<[OpId; 4]> {
        debug_assert!(self.ready(op), "scheduling non-ready {op:?}");
        self.scheduled[op] = true;
        self.unscheduled -= 1;

        let mut newly_ready = SmallVec::new();
        for &succ in graph.op(op).succs() {
            let pending = &mut self.pending_preds[succ];
            debug_assert!(*pending > 0);
            *pending -= 1;
            if *pending == 0 {
                newly_ready.push(succ);
            }
        }
        trace!(op = op.index(), newly_ready = newly_ready.len(), "scheduled");
        newly_ready
    }

    /// Records one consumption of `value`, returning true when the value
    /// just died. Whether and when a dead value is evicted from the
    /// machine is the caller's policy.
    pub fn consume(&mut self, value: ValueId) -> bool {
        let uses = &mut self.remaining_uses[value];
        debug_assert!(*uses > 0, "consuming dead {value:?}");
        *uses -= 1;
        *uses == 0
    }

    /// Returns true if `value` has no remaining uses.
    #[must_use]
    pub fn is_dead(&self, value: ValueId) -> bool {
        self.remaining_uses[value] == 0
    }

    /// The terminal check: every operation scheduled, every use consumed,
    /// and the machine's stack and locals holding exactly the declared
    /// main outputs (stack outputs in layout order, local outputs at
    /// their slots).
    #[must_use]
    pub fn is_terminal(&self, graph: &Graph) -> bool {
        if self.unscheduled != 0 {
            return false;
        }
        if self.remaining_uses.iter().any(|&uses| uses != 0) {
            return false;
        }

        let outputs = &graph.main().outputs;
        if self.machine.depth() != outputs.stack.len() {
            return false;
        }
        for (position, name) in outputs.stack.iter().enumerate() {
            if graph.output(name) != Some(self.machine.stack()[position]) {
                return false;
            }
        }
        for (name, slot) in &outputs.locals {
            if graph.output(name) != self.machine.local(*slot) {
                return false;
            }
        }
        true
    }
}

fn declared_input(graph: &Graph, name: &str) -> ValueId {
    match graph.input(name) {
        Some(value) => value,
        // The graph seeds one value per declared input name.
        None => unreachable!("declared input `{name}` missing from graph"),
    }
}

impl PartialEq for SchedState {
    fn eq(&self, other: &Self) -> bool {
        self.machine == other.machine
            && self.pending_preds.raw == other.pending_preds.raw
            && self.remaining_uses.raw == other.remaining_uses.raw
            && self.scheduled.raw == other.scheduled.raw
    }
}

impl Eq for SchedState {}

impl Hash for SchedState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.machine.hash(state);
        self.pending_preds.raw.hash(state);
        self.remaining_uses.raw.hash(state);
        self.scheduled.raw.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stax_ir::{Call, Expr, Layout, OpDef, OpSpec, Program, Stmt};

    fn defs() -> Vec<OpDef> {
        vec![
            OpDef::new(
                "sload",
                OpSpec::new(
                    Layout::stack_only(["key"]),
                    Layout::stack_only(["value"]),
                    ["storage"],
                    std::iter::empty::<&str>(),
                ),
            ),
            OpDef::new(
                "sstore",
                OpSpec::new(
                    Layout::stack_only(["key", "value"]),
                    Layout::default(),
                    std::iter::empty::<&str>(),
                    ["storage"],
                ),
            ),
            OpDef::new(
                "add",
                OpSpec::new(
                    Layout::stack_only(["a", "b"]),
                    Layout::stack_only(["c"]),
                    std::iter::empty::<&str>(),
                    std::iter::empty::<&str>(),
                ),
            ),
            OpDef::new(
                "calldataload",
                OpSpec::new(
                    Layout::stack_only(["i"]),
                    Layout::stack_only(["data"]),
                    std::iter::empty::<&str>(),
                    std::iter::empty::<&str>(),
                ),
            ),
        ]
    }

    fn program(main: OpSpec, body: Vec<Stmt>) -> Program {
        Program { defs: defs(), sub_groups: Vec::new(), main, body }
    }

    fn state(main: OpSpec, body: Vec<Stmt>) -> (Graph, SchedState) {
        let graph = Graph::build(&program(main, body)).unwrap();
        let state = SchedState::from_graph(&graph, MachineConfig::evm());
        (graph, state)
    }

    #[test]
    fn initial_machine_seeding() {
        let main = OpSpec::new(
            Layout::new(["x", "y"], [("s", 2)]),
            Layout::default(),
            std::iter::empty::<&str>(),
            std::iter::empty::<&str>(),
        );
        let (graph, state) = state(main, Vec::new());

        let x = graph.input("x").unwrap();
        let y = graph.input("y").unwrap();
        let s = graph.input("s").unwrap();
        assert_eq!(state.machine().stack(), [x, y]);
        assert_eq!(state.machine().local(2), Some(s));
    }

    #[test]
    fn output_counts_one_extra_use() {
        // z = calldataload(4) with out: [z]: zero consumers, one output.
        let mut main = OpSpec::default();
        main.outputs = Layout::stack_only(["z"]);
        let body = vec![Stmt::assign("z", Expr::call("calldataload", [Expr::lit(4)]))];
        let (graph, state) = state(main, body);

        let (_, z) = &graph.outputs()[0];
        assert_eq!(state.remaining_uses(*z), 1);
        // The literal argument is consumed once and is no output.
        let lit = graph.op(OpId::from_usize(0)).inputs()[0];
        assert_eq!(state.remaining_uses(lit), 1);
    }

    #[test]
    fn pending_matches_pred_counts() {
        let body = vec![
            Stmt::assign("v", Expr::call("sload", [Expr::lit(0)])),
            Stmt::Expr(Call::new("sstore", [Expr::lit(0), Expr::var("v")])),
        ];
        let (graph, state) = state(OpSpec::default(), body);

        for op in graph.op_ids() {
            let preds = graph.op(op).preds().len();
            assert_eq!(state.pending_preds(op), preds as u32);
            assert_eq!(state.ready(op), preds == 0);
        }
        assert_eq!(state.ready_ops().count(), 1);
    }

    #[test]
    fn schedule_propagates_readiness() {
        let body = vec![
            Stmt::Expr(Call::new("sstore", [Expr::lit(0), Expr::lit(1)])),
            Stmt::Expr(Call::new("sstore", [Expr::lit(0), Expr::lit(2)])),
        ];
        let (graph, mut state) = state(OpSpec::default(), body);

        let first = OpId::from_usize(0);
        let second = OpId::from_usize(1);
        assert!(state.ready(first));
        assert!(!state.ready(second));

        let newly = state.schedule(&graph, first);
        assert_eq!(newly.as_slice(), [second]);
        assert!(state.is_scheduled(first));
        assert!(state.ready(second));
        assert_eq!(state.unscheduled(), 1);
    }

    #[test]
    fn consume_kills_values() {
        let mut main = OpSpec::default();
        main.inputs = Layout::stack_only(["x"]);
        let body = vec![
            Stmt::Expr(Call::new("sstore", [Expr::var("x"), Expr::var("x")])),
            Stmt::assign("v", Expr::call("sload", [Expr::var("x")])),
            Stmt::Expr(Call::new("sstore", [Expr::var("x"), Expr::var("v")])),
        ];
        let (graph, mut state) = state(main, body);

        // Three distinct consuming instances; reading twice in one call
        // counts once.
        let x = graph.input("x").unwrap();
        assert_eq!(state.remaining_uses(x), 3);
        assert!(!state.consume(x));
        assert!(!state.consume(x));
        assert!(state.consume(x));
        assert!(state.is_dead(x));
    }

    #[test]
    fn clone_isolation() {
        let mut main = OpSpec::default();
        main.inputs = Layout::stack_only(["x"]);
        let body = vec![Stmt::Expr(Call::new("sstore", [Expr::var("x"), Expr::lit(1)]))];
        let (graph, state) = state(main, body);

        let mut branch = state.clone();
        assert_eq!(branch, state);

        let op = OpId::from_usize(0);
        branch.schedule(&graph, op);
        let x = graph.input("x").unwrap();
        branch.consume(x);
        branch.machine_mut().pop().unwrap();

        assert_ne!(branch, state);
        assert!(!state.is_scheduled(op));
        assert_eq!(state.remaining_uses(x), 1);
        assert_eq!(state.machine().stack(), [x]);
    }

    #[test]
    fn end_to_end_schedule() {
        // v = sload(x); sstore(x, add(v, 1)); z = sload(x)
        let main = OpSpec::new(
            Layout::stack_only(["x"]),
            Layout::stack_only(["z"]),
            std::iter::empty::<&str>(),
            std::iter::empty::<&str>(),
        );
        let body = vec![
            Stmt::assign("v", Expr::call("sload", [Expr::var("x")])),
            Stmt::Expr(Call::new(
                "sstore",
                [Expr::var("x"), Expr::call("add", [Expr::var("v"), Expr::lit(1)])],
            )),
            Stmt::assign("z", Expr::call("sload", [Expr::var("x")])),
        ];
        let (graph, mut state) = state(main, body);
        assert!(!state.is_terminal(&graph));

        let load0 = OpId::from_usize(0);
        let add = OpId::from_usize(1);
        let store = OpId::from_usize(2);
        let load1 = OpId::from_usize(3);
        assert_eq!(graph.op(store).preds(), [load0]);
        assert_eq!(graph.op(load1).preds(), [store]);

        let x = graph.input("x").unwrap();
        let v = graph.op(load0).outputs()[0];
        let one = graph.op(add).inputs()[1];
        let sum = graph.op(add).outputs()[0];
        let z = graph.op(load1).outputs()[0];

        // sload(x): duplicate x, consume the copy, produce v.
        let m = state.machine_mut();
        m.dup(1).unwrap();
        m.pop().unwrap();
        m.push(v);
        state.consume(x);
        assert_eq!(state.schedule(&graph, load0).as_slice(), [store]);

        // add(v, 1): materialize the literal, consume both, produce sum.
        let m = state.machine_mut();
        m.push(one);
        m.pop().unwrap();
        m.pop().unwrap();
        m.push(sum);
        state.consume(v);
        state.consume(one);
        assert!(state.schedule(&graph, add).is_empty());

        // sstore(x, sum): route x above sum, consume both.
        let m = state.machine_mut();
        m.dup(2).unwrap();
        m.swap(1).unwrap();
        m.pop().unwrap();
        m.pop().unwrap();
        state.consume(x);
        state.consume(sum);
        assert_eq!(state.schedule(&graph, store).as_slice(), [load1]);

        // z = sload(x): the final read of x.
        let m = state.machine_mut();
        m.pop().unwrap();
        m.push(z);
        state.consume(x);
        assert!(state.is_dead(x));
        assert!(state.schedule(&graph, load1).is_empty());

        // The declared output is materialized on the stack.
        assert!(!state.is_terminal(&graph));
        state.consume(z);
        assert_eq!(state.unscheduled(), 0);
        assert!(state.is_terminal(&graph));
        assert_eq!(state.machine().stack(), [z]);
    }

    #[test]
    fn terminal_requires_matching_locals() {
        let main = OpSpec::new(
            Layout::stack_only(["x"]),
            Layout::new(Vec::<String>::new(), [("x", 5)]),
            std::iter::empty::<&str>(),
            std::iter::empty::<&str>(),
        );
        let (graph, mut state) = state(main, Vec::new());

        let x = graph.input("x").unwrap();
        state.consume(x);
        assert!(!state.is_terminal(&graph));

        state.machine_mut().store(5).unwrap();
        assert!(state.is_terminal(&graph));
    }
}
