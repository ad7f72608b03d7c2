//! Symbolic model of the target machine's addressable state.

use smallvec::SmallVec;
use stax_graph::ValueId;
use std::{
    collections::BTreeMap,
    hash::{Hash, Hasher},
};
use thiserror::Error;

/// Reach bounds of the target's stack-reordering instructions.
///
/// `max_dup_depth` and `max_swap_depth` are the deepest stack positions a
/// duplicate-from-depth or swap-with-depth instruction may address. The
/// EVM's DUP16/SWAP16 correspond to `MachineConfig::evm()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MachineConfig {
    /// Deepest position `dup` may reach (1 = top of stack).
    pub max_dup_depth: usize,
    /// Deepest position `swap` may exchange the top with.
    pub max_swap_depth: usize,
}

impl MachineConfig {
    /// The EVM bounds: DUP1..=DUP16, SWAP1..=SWAP16.
    #[must_use]
    pub const fn evm() -> Self {
        Self { max_dup_depth: 16, max_swap_depth: 16 }
    }
}

/// A failed machine operation.
///
/// These are expected, recoverable conditions for a search-based
/// scheduler: the branch that hit one is invalid and should be abandoned,
/// nothing more. Each variant carries enough context to diagnose without
/// re-deriving machine state.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MachineError {
    /// `pop` on an empty stack.
    #[error("cannot pop from empty stack")]
    EmptyStack,

    /// A dup/swap depth outside the configured bound.
    #[error("{instr}{depth} invalid, configured bound: {max}")]
    DepthExceeded {
        /// Which instruction, `"dup"` or `"swap"`.
        instr: &'static str,
        /// The requested depth.
        depth: usize,
        /// The configured bound.
        max: usize,
    },

    /// A dup/swap reaching below the current stack.
    #[error("stack has {depth} element(s), operation needs {needed}")]
    StackTooShallow {
        /// Elements the operation needs on the stack.
        needed: usize,
        /// Current stack depth.
        depth: usize,
    },

    /// `load` from a slot that was never written.
    #[error("no local bound at slot {slot}")]
    MissingLocal {
        /// The unbound slot.
        slot: u32,
    },
}

/// Symbolic state of the target machine: the operand stack (last element
/// is the top) and the sparse local slot bindings.
///
/// Cloning produces an independent snapshot: value ids are shared (value
/// instances are immutable), the positional containers are not, so
/// mutating a clone never affects the original.
///
/// Equality and hashing cover the stack (element-wise, by value-instance
/// identity) and the local map, not the configured bounds; they are the
/// dedup key for states visited by an external search.
#[derive(Clone, Debug)]
pub struct StackMachine {
    stack: SmallVec<[ValueId; 16]>,
    locals: BTreeMap<u32, ValueId>,
    config: MachineConfig,
}

impl StackMachine {
    /// Creates an empty machine with the given reach bounds.
    #[must_use]
    pub fn new(config: MachineConfig) -> Self {
        Self { stack: SmallVec::new(), locals: BTreeMap::new(), config }
    }

    /// The configured reach bounds.
    #[must_use]
    pub const fn config(&self) -> MachineConfig {
        self.config
    }

    /// Current stack depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Returns true if the operand stack is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// The stack contents, bottom to top.
    #[must_use]
    pub fn stack(&self) -> &[ValueId] {
        &self.stack
    }

    /// The local slot bindings.
    #[must_use]
    pub fn locals(&self) -> &BTreeMap<u32, ValueId> {
        &self.locals
    }

    /// Pushes a value as the new top. Always succeeds.
    pub fn push(&mut self, value: ValueId) {
        self.stack.push(value);
    }

    /// Removes and returns the top value.
    pub fn pop(&mut self) -> Result<ValueId, MachineError> {
        self.stack.pop().ok_or(MachineError::EmptyStack)
    }

    /// The value `depth` positions from the top (1 = top), if the stack
    /// reaches that deep. Unlike [`dup`](Self::dup), unbounded.
    #[must_use]
    pub fn peek(&self, depth: usize) -> Option<ValueId> {
        if depth == 0 {
            return None;
        }
        self.stack.len().checked_sub(depth).map(|i| self.stack[i])
    }

    /// The current top value.
    #[must_use]
    pub fn top(&self) -> Option<ValueId> {
        self.stack.last().copied()
    }

    /// The depth of the shallowest occurrence of `value` (1 = top).
    #[must_use]
    pub fn find(&self, value: ValueId) -> Option<usize> {
        self.stack.iter().rev().position(|&v| v == value).map(|i| i + 1)
    }

    /// Returns true if `value` is anywhere on the stack.
    #[must_use]
    pub fn contains(&self, value: ValueId) -> bool {
        self.stack.contains(&value)
    }

    /// Exchanges the top with the element `depth` positions below it.
    pub fn swap(&mut self, depth: usize) -> Result<(), MachineError> {
        if depth < 1 || depth > self.config.max_swap_depth {
            return Err(MachineError::DepthExceeded {
                instr: "swap",
                depth,
                max: self.config.max_swap_depth,
            });
        }
        let len = self.stack.len();
        if len < depth + 1 {
            return Err(MachineError::StackTooShallow { needed: depth + 1, depth: len });
        }
        self.stack.swap(len - 1, len - 1 - depth);
        Ok(())
    }

    /// Pushes a copy of the element `depth` positions from the top
    /// (depth 1 duplicates the current top).
    pub fn dup(&mut self, depth: usize) -> Result<(), MachineError> {
        if depth < 1 || depth > self.config.max_dup_depth {
            return Err(MachineError::DepthExceeded {
                instr: "dup",
                depth,
                max: self.config.max_dup_depth,
            });
        }
        let len = self.stack.len();
        if len < depth {
            return Err(MachineError::StackTooShallow { needed: depth, depth: len });
        }
        self.stack.push(self.stack[len - depth]);
        Ok(())
    }

    /// Pops the top value and binds it to `slot`, overwriting any
    /// previous binding.
    pub fn store(&mut self, slot: u32) -> Result<(), MachineError> {
        let value = self.pop()?;
        self.locals.insert(slot, value);
        Ok(())
    }

    /// Pushes the value bound to `slot`.
    pub fn load(&mut self, slot: u32) -> Result<(), MachineError> {
        let value =
            self.locals.get(&slot).copied().ok_or(MachineError::MissingLocal { slot })?;
        self.stack.push(value);
        Ok(())
    }

    /// The value bound to `slot`, if any. Does not touch the stack.
    #[must_use]
    pub fn local(&self, slot: u32) -> Option<ValueId> {
        self.locals.get(&slot).copied()
    }

    pub(crate) fn set_local(&mut self, slot: u32, value: ValueId) {
        self.locals.insert(slot, value);
    }
}

impl PartialEq for StackMachine {
    fn eq(&self, other: &Self) -> bool {
        self.stack == other.stack && self.locals == other.locals
    }
}

impl Eq for StackMachine {}

impl Hash for StackMachine {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.stack.hash(state);
        self.locals.hash(state);
    }
}
