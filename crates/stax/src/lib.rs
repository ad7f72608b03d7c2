#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![allow(unused_crate_dependencies)]

#[doc(inline)]
pub use stax_graph as graph;
#[doc(inline)]
pub use stax_ir as ir;
#[doc(inline)]
pub use stax_sched as sched;
