#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod error;
pub use error::ProgramError;

mod layout;
pub use layout::Layout;

mod spec;
pub use spec::{OpDef, OpSpec, SubGroup, Substitution};

mod stmt;
pub use stmt::{Call, Expr, Stmt};

mod program;
pub use program::Program;

pub mod evm;

/// Convenient re-export of the literal word type.
pub use alloy_primitives::U256;
