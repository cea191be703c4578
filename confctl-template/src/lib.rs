//! Template Renderer (C3): `tera` plus a Sprig-equivalent helper library, a
//! frozen include registry, and an `include(name, ctx)` function that can
//! recurse into itself (§4.2, §9).

#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;

mod error;
mod functions;
mod refs;
mod renderer;

pub use error::{Error, ErrorKind, Result, ResultExt};
pub use refs::referenced_paths;
pub use renderer::{build_include_library, IncludeLibrary, Renderer};
pub use tera::Context;
