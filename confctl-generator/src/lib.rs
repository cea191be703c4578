#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;

mod artifact;
mod error;
mod pipeline;

pub use artifact::{build_artifact_pair, ArtifactPair, ConfigObject};
pub use error::{Error, ErrorKind, Result, ResultExt};
pub use pipeline::{generate, load_include_library, RawArtifacts};
