//! CLI library: wires the configuration materialization engine's crates
//! together into `generate`/`lint`/`reconcile` commands (§1 OVERVIEW).

#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;

pub mod error;
pub mod generate;
pub mod lint;
pub mod reconcile;

pub use error::{Error, ErrorKind, Result, ResultExt};
pub use confctl_generator::load_include_library;
