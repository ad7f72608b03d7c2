//! Graph construction errors.

use stax_ir::ProgramError;
use thiserror::Error;

/// A reference error found while building the dependency graph.
///
/// Construction aborts on the first error; a partially built graph is
/// never returned.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GraphError {
    /// The program failed structural validation.
    #[error(transparent)]
    Program(#[from] ProgramError),

    /// A name was referenced before being bound.
    #[error("variable `{name}` is not defined")]
    UndefinedVariable {
        /// The unresolved name.
        name: String,
    },

    /// A call names an operation absent from the signature table.
    #[error("unknown operation `{name}`")]
    UnknownOperation {
        /// The unresolved operation name.
        name: String,
    },

    /// A call passes the wrong number of arguments.
    #[error("`{name}` called with {found} argument(s), expected {expected}")]
    ArityMismatch {
        /// The called operation.
        name: String,
        /// Declared input count.
        expected: usize,
        /// Argument count at the call site.
        found: usize,
    },

    /// A nested call used where a single value is required yields a
    /// different number of values.
    #[error("call to `{name}` yields {found} value(s) where exactly 1 is required")]
    MultiValueInSingleSlot {
        /// The nested call's operation.
        name: String,
        /// How many values it actually yields.
        found: usize,
    },

    /// A statement binds a different number of names than the call yields.
    #[error("`{name}` yields {found} value(s), statement binds {expected}")]
    OutputCountMismatch {
        /// The called operation.
        name: String,
        /// Names bound by the statement.
        expected: usize,
        /// Values the call yields.
        found: usize,
    },

    /// A declared main output name was never assigned.
    #[error("declared output `{name}` is never assigned")]
    UnboundOutput {
        /// The unbound output name.
        name: String,
    },
}
