#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

use index_vec::define_index_type;

mod error;
pub use error::GraphError;

mod node;
pub use node::{OpNode, Producer, ValueNode};

mod graph;
pub use graph::Graph;

mod build;

mod dot;
pub use dot::graph_to_dot;

define_index_type! {
    /// Dense, zero-based id of an operation instance, assigned in creation
    /// order. Usable as a direct array index for per-operation counters.
    pub struct OpId = u32;
    DEBUG_FORMAT = "op{}";
}

define_index_type! {
    /// Dense, zero-based id of a value instance, assigned in creation
    /// order. Usable as a direct array index for per-value counters.
    pub struct ValueId = u32;
    DEBUG_FORMAT = "v{}";
}
