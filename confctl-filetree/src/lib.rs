#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;

mod error;
mod tree;

pub use error::{Error, ErrorKind, Result, ResultExt};
pub use tree::FileTree;
