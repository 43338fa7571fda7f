//! Building blocks shared by the `osr` crate: the unit registry, the projection
//! method catalog and the node tree definitions are parsed into.
pub mod catalog;
pub mod config;
pub mod names;
pub mod node;
pub mod number;
pub mod result;
pub mod units;

pub use catalog::{parameter_info, parameter_list, projection_methods, ParameterInfo, ValueType};
pub use config::Strictness;
pub use node::{Node, NodeKind, OpaqueNode, SrsNode, Value};
pub use result::{Error, ErrorKind, Result, TextPosition};
pub use units::{unit_factor, UnitKind, UnitRegistry};
