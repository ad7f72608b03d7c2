//! Builtin EVM operation catalog.
//!
//! The full table of EVM external operations with their effect categories,
//! plus the standard commutativity groups. Callers compose these with their
//! own main signature and body to form a schedulable [`Program`].

use crate::{Layout, OpDef, OpSpec, Program, Stmt, SubGroup, Substitution};

/// Effect category names used by the catalog.
pub mod category {
    /// Sequencing of jumps, returns, and everything pinned to program order.
    pub const CONTROL_FLOW: &str = "control_flow";
    /// Contract storage.
    pub const STORAGE: &str = "storage";
    /// Linear memory.
    pub const MEMORY: &str = "memory";
    /// Account balances.
    pub const BALANCE: &str = "balance";
    /// Own code.
    pub const CODE: &str = "code";
    /// Other accounts' code.
    pub const EXTCODE: &str = "extcode";
    /// The return data buffer.
    pub const RETURNDATA: &str = "returndata";
    /// The log journal.
    pub const LOGS: &str = "logs";
}

use category::*;

fn ext(
    name: &str,
    deps: &[&str],
    affects: &[&str],
    inputs: &[&str],
    outputs: &[&str],
) -> OpDef {
    OpDef::new(
        name,
        OpSpec::new(
            Layout::stack_only(inputs.iter().copied()),
            Layout::stack_only(outputs.iter().copied()),
            deps.iter().copied(),
            affects.iter().copied(),
        ),
    )
}

/// The writer-sensitive effects of the external call family.
const CALL_AFFECTS: &[&str] = &[MEMORY, RETURNDATA, LOGS, BALANCE, STORAGE, EXTCODE];

/// Returns the full EVM operation table.
///
/// Every opcode that only observes machine state declares
/// `deps(control_flow)` so that jumps, `return`, and `revert` (which write
/// `control_flow`) fence it in program order.
pub fn evm_ops() -> Vec<OpDef> {
    let cf = &[CONTROL_FLOW][..];
    vec![
        // Stop and arithmetic.
        ext("stop", cf, &[], &[], &[]),
        ext("add", cf, &[], &["a", "b"], &["c"]),
        ext("mul", cf, &[], &["a", "b"], &["c"]),
        ext("sub", cf, &[], &["a", "b"], &["c"]),
        ext("div", cf, &[], &["a", "b"], &["c"]),
        ext("sdiv", cf, &[], &["a", "b"], &["c"]),
        ext("mod", cf, &[], &["a", "b"], &["c"]),
        ext("smod", cf, &[], &["a", "b"], &["c"]),
        ext("addmod", cf, &[], &["a", "b", "n"], &["c"]),
        ext("mulmod", cf, &[], &["a", "b", "n"], &["c"]),
        ext("exp", cf, &[], &["base", "exponent"], &["result"]),
        // Comparison and bitwise logic.
        ext("lt", cf, &[], &["a", "b"], &["result"]),
        ext("gt", cf, &[], &["a", "b"], &["result"]),
        ext("slt", cf, &[], &["a", "b"], &["result"]),
        ext("sgt", cf, &[], &["a", "b"], &["result"]),
        ext("eq", cf, &[], &["a", "b"], &["result"]),
        ext("iszero", cf, &[], &["a"], &["result"]),
        ext("and", cf, &[], &["a", "b"], &["c"]),
        ext("or", cf, &[], &["a", "b"], &["c"]),
        ext("xor", cf, &[], &["a", "b"], &["c"]),
        ext("not", cf, &[], &["a"], &["b"]),
        ext("byte", cf, &[], &["i", "x"], &["y"]),
        ext("shl", cf, &[], &["shift", "value"], &["result"]),
        ext("shr", cf, &[], &["shift", "value"], &["result"]),
        ext("sar", cf, &[], &["shift", "value"], &["result"]),
        // Keccak.
        ext("sha3", &[CONTROL_FLOW, MEMORY], &[], &["offset", "size"], &["hash"]),
        // Environmental information.
        ext("address", cf, &[], &[], &["addr"]),
        ext("balance", &[CONTROL_FLOW, BALANCE], &[], &["addr"], &["bal"]),
        ext("origin", cf, &[], &[], &["addr"]),
        ext("caller", cf, &[], &[], &["addr"]),
        ext("callvalue", cf, &[], &[], &["val"]),
        ext("calldataload", cf, &[], &["i"], &["data"]),
        ext("calldatasize", cf, &[], &[], &["size"]),
        ext("calldatacopy", cf, &[MEMORY], &["destOffset", "offset", "size"], &[]),
        ext("codesize", &[CONTROL_FLOW, CODE], &[], &[], &["size"]),
        ext("codecopy", cf, &[MEMORY], &["destOffset", "offset", "size"], &[]),
        ext("gasprice", cf, &[], &[], &["price"]),
        ext("extcodesize", &[CONTROL_FLOW, EXTCODE], &[], &["addr"], &["size"]),
        ext(
            "extcodecopy",
            &[CONTROL_FLOW, EXTCODE],
            &[MEMORY],
            &["addr", "destOffset", "offset", "size"],
            &[],
        ),
        ext("returndatasize", &[CONTROL_FLOW, RETURNDATA], &[], &[], &["size"]),
        ext(
            "returndatacopy",
            &[CONTROL_FLOW, RETURNDATA],
            &[MEMORY],
            &["destOffset", "offset", "size"],
            &[],
        ),
        ext("extcodehash", &[CONTROL_FLOW, CODE], &[], &["addr"], &["hash"]),
        // Block information.
        ext("blockhash", cf, &[], &["number"], &["hash"]),
        ext("coinbase", cf, &[], &[], &["addr"]),
        ext("timestamp", cf, &[], &[], &["time"]),
        ext("number", cf, &[], &[], &["num"]),
        ext("difficulty", cf, &[], &[], &["diff"]),
        ext("gaslimit", cf, &[], &[], &["limit"]),
        // Stack, memory, storage and flow.
        ext("pop", cf, &[], &["a"], &[]),
        ext("mload", &[CONTROL_FLOW, MEMORY], &[], &["offset"], &["value"]),
        ext("mstore", cf, &[MEMORY], &["offset", "value"], &[]),
        ext("mstore8", cf, &[MEMORY], &["offset", "value"], &[]),
        ext("mcopy", cf, &[MEMORY], &["dest", "src", "len"], &[]),
        ext("sload", &[CONTROL_FLOW, STORAGE], &[], &["key"], &["value"]),
        ext("sstore", cf, &[STORAGE], &["key", "value"], &[]),
        ext("jump", &[], &[CONTROL_FLOW], &["dest"], &[]),
        ext("jumpi", &[], &[CONTROL_FLOW], &["dest", "condition"], &[]),
        ext("gas", cf, &[], &[], &["remaining"]),
        ext("jumpdest", &[], &[CONTROL_FLOW], &[], &[]),
        // Logging.
        ext("log0", &[CONTROL_FLOW, MEMORY], &[LOGS], &["offset", "size"], &[]),
        ext("log1", &[CONTROL_FLOW, MEMORY], &[LOGS], &["offset", "size", "topic1"], &[]),
        ext(
            "log2",
            &[CONTROL_FLOW, MEMORY],
            &[LOGS],
            &["offset", "size", "topic1", "topic2"],
            &[],
        ),
        ext(
            "log3",
            &[CONTROL_FLOW, MEMORY],
            &[LOGS],
            &["offset", "size", "topic1", "topic2", "topic3"],
            &[],
        ),
        ext(
            "log4",
            &[CONTROL_FLOW, MEMORY],
            &[LOGS],
            &["offset", "size", "topic1", "topic2", "topic3", "topic4"],
            &[],
        ),
        // System operations.
        ext("create", cf, CALL_AFFECTS, &["value", "offset", "size"], &["addr"]),
        ext("create2", cf, CALL_AFFECTS, &["value", "offset", "size", "salt"], &["addr"]),
        ext(
            "call",
            cf,
            CALL_AFFECTS,
            &["gas", "addr", "value", "argsOffset", "argsSize", "retOffset", "retSize"],
            &["success"],
        ),
        ext(
            "callcode",
            cf,
            CALL_AFFECTS,
            &["gas", "addr", "value", "argsOffset", "argsSize", "retOffset", "retSize"],
            &["success"],
        ),
        ext(
            "delegatecall",
            cf,
            CALL_AFFECTS,
            &["gas", "addr", "argsOffset", "argsSize", "retOffset", "retSize"],
            &["success"],
        ),
        ext(
            "staticcall",
            &[CONTROL_FLOW, STORAGE, BALANCE],
            &[MEMORY, RETURNDATA],
            &["gas", "addr", "argsOffset", "argsSize", "retOffset", "retSize"],
            &["success"],
        ),
        ext("selfdestruct", &[], &[CONTROL_FLOW], &["addr"], &[]),
        ext("revert", &[MEMORY], &[CONTROL_FLOW], &["offset", "size"], &[]),
        ext("invalid", &[], &[CONTROL_FLOW], &[], &[]),
        ext("return", &[MEMORY], &[CONTROL_FLOW], &["offset", "size"], &[]),
    ]
}

fn comm2(name: &str) -> SubGroup {
    SubGroup::new([Substitution::new(name, [0, 1]), Substitution::new(name, [1, 0])])
}

/// Returns the standard EVM commutativity groups: the commutative
/// arithmetic and bitwise operations, plus the comparison symmetries
/// `lt(a, b) ≡ gt(b, a)` and `sgt(a, b) ≡ slt(b, a)`.
pub fn evm_sub_groups() -> Vec<SubGroup> {
    vec![
        comm2("add"),
        comm2("mul"),
        SubGroup::new([
            Substitution::new("addmod", [0, 1, 2]),
            Substitution::new("addmod", [1, 0, 2]),
        ]),
        SubGroup::new([
            Substitution::new("mulmod", [0, 1, 2]),
            Substitution::new("mulmod", [1, 0, 2]),
        ]),
        comm2("and"),
        comm2("or"),
        comm2("xor"),
        comm2("eq"),
        SubGroup::new([Substitution::new("lt", [0, 1]), Substitution::new("gt", [1, 0])]),
        SubGroup::new([Substitution::new("sgt", [0, 1]), Substitution::new("slt", [1, 0])]),
    ]
}

/// Assembles a program over the EVM catalog from a main signature and body.
#[must_use]
pub fn evm_program(main: OpSpec, body: Vec<Stmt>) -> Program {
    Program { defs: evm_ops(), sub_groups: evm_sub_groups(), main, body }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_validates() {
        let program = evm_program(OpSpec::default(), Vec::new());
        assert_eq!(program.validate(), Ok(()));
    }

    #[test]
    fn catalog_shape() {
        let program = evm_program(OpSpec::default(), Vec::new());
        let sstore = program.spec("sstore").unwrap();
        assert_eq!(sstore.arity(), 2);
        assert_eq!(sstore.affects, ["storage"]);
        let sload = program.spec("sload").unwrap();
        assert_eq!(sload.deps, ["control_flow", "storage"]);
        assert!(sload.affects.is_empty());
    }

    #[test]
    fn comparison_symmetry_is_cross_op() {
        let program = evm_program(OpSpec::default(), Vec::new());
        let group = program.subs_for("lt").next().unwrap();
        assert!(group.mentions("gt"));
    }
}
