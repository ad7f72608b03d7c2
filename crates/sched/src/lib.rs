#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod machine;
pub use machine::{MachineConfig, MachineError, StackMachine};

mod state;
pub use state::SchedState;
