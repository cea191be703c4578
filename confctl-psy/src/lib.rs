//! Path-structured YAML (C2): a flat `path -> scalar` view over a YAML
//! document that preserves native scalar types through get/set, plus the
//! path-granular patch semantics the rest of the engine builds on.

#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;

mod document;
mod error;
mod path;
mod scalar;

pub use document::{patch, Document};
pub use error::{Error, ErrorKind, Result, ResultExt};
pub use path::{Path, Segment};
pub use scalar::Scalar;
