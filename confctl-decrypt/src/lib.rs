#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;

mod error;
mod traverse;
mod vault;

pub use error::{Error, ErrorKind, Result, ResultExt};
pub use traverse::{decrypt_traverse, Decrypter, NullDecrypter};
pub use vault::{is_ciphertext, VaultDecrypter, CIPHERTEXT_PREFIX};
