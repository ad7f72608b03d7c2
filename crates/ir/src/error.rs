//! Structural validation errors.

use thiserror::Error;

/// A structural defect in a program.
///
/// These are detected by [`Program::validate`](crate::Program::validate)
/// before any graph construction; a program that fails validation is
/// rejected whole.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ProgramError {
    /// Two operation definitions share a name.
    #[error("duplicate operation `{name}`")]
    DuplicateOp {
        /// The name declared twice.
        name: String,
    },

    /// Two local bindings within one layout claim the same slot.
    #[error("local `{name}` conflicts with `{existing}` for slot {slot}")]
    SlotConflict {
        /// The later binding.
        name: String,
        /// The binding that already holds the slot.
        existing: String,
        /// The contested slot index.
        slot: u32,
    },

    /// An effect category appears in both `deps` and `affects` of one
    /// signature.
    #[error("category `{category}` appears in both deps and affects of `{op}`")]
    EffectOverlap {
        /// The offending operation.
        op: String,
        /// The overlapping category.
        category: String,
    },

    /// An effect category is declared twice within one list.
    #[error("category `{category}` declared twice on `{op}`")]
    DuplicateCategory {
        /// The offending operation.
        op: String,
        /// The repeated category.
        category: String,
    },

    /// A substitution group has fewer than two members.
    #[error("substitution group for `{name}` has {len} member(s), need at least 2")]
    SubGroupTooSmall {
        /// Name of the group's first member.
        name: String,
        /// Actual member count.
        len: usize,
    },

    /// A substitution group mixes argument tuples of different arity.
    #[error("substitution group member `{name}` has arity {found}, group has arity {expected}")]
    SubGroupArityMismatch {
        /// The member with the odd arity.
        name: String,
        /// Arity of the group's first member.
        expected: usize,
        /// Arity of the offending member.
        found: usize,
    },
}
