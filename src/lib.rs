//! Facade over the `osr` crate.
#[doc(inline)]
pub use osr::*;
