use serde_yaml::Value;

use crate::error::{Error, ErrorKind, Result};
use crate::vault::is_ciphertext;

/// Pluggable decryption backend (§4.3). The default implementation
/// (`VaultDecrypter`) calls out to Vault; tests and `lint` (which never
/// needs real plaintext) use a mock.
pub trait Decrypter {
    fn decrypt(&self, ciphertext: &str) -> Result<String>;
}

/// A decrypter that never leaves the process, for `lint` and tests
/// (§4.7 rule 10 only needs to know whether a leaf *looks* encrypted, not
/// its plaintext).
pub struct NullDecrypter;

impl Decrypter for NullDecrypter {
    fn decrypt(&self, _ciphertext: &str) -> Result<String> {
        Ok(String::new())
    }
}

/// Depth-first, left-to-right walk of a parsed YAML tree, decrypting every
/// string scalar that matches the ciphertext prefix and passing everything
/// else through untouched (§4.3). Decrypt failures are fatal and tagged
/// with the originating dotted path (§7 `decrypt-failed`).
pub fn decrypt_traverse(v: &Value, decrypter: &dyn Decrypter) -> Result<Value> {
    traverse_at(v, "", decrypter)
}

fn traverse_at(v: &Value, path: &str, decrypter: &dyn Decrypter) -> Result<Value> {
    match v {
        Value::Mapping(m) => {
            let mut out = serde_yaml::Mapping::new();
            for (k, child) in m.iter() {
                let key_name = match k {
                    Value::String(s) => s.clone(),
                    other => format!("{:?}", other),
                };
                let child_path = if path.is_empty() { key_name.clone() } else { format!("{}.{}", path, key_name) };
                out.insert(k.clone(), traverse_at(child, &child_path, decrypter)?);
            }
            Ok(Value::Mapping(out))
        }
        Value::Sequence(xs) => {
            let mut out = Vec::with_capacity(xs.len());
            for (i, child) in xs.iter().enumerate() {
                let child_path = if path.is_empty() { i.to_string() } else { format!("{}.{}", path, i) };
                out.push(traverse_at(child, &child_path, decrypter)?);
            }
            Ok(Value::Sequence(out))
        }
        Value::String(s) if is_ciphertext(s) => {
            let plain = decrypter
                .decrypt(s)
                .map_err(|e| Error::from(ErrorKind::DecryptFailed(path.to_string(), e.to_string())))?;
            Ok(Value::String(plain))
        }
        other => Ok(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoDecrypter;
    impl Decrypter for EchoDecrypter {
        fn decrypt(&self, ciphertext: &str) -> Result<String> {
            Ok(format!("decrypted:{}", ciphertext))
        }
    }

    #[test]
    fn decrypts_matching_leaves_only() {
        let doc: Value = serde_yaml::from_str("key: vault:v1:AABB\nplain: hello\nnum: 3\n").unwrap();
        let out = decrypt_traverse(&doc, &EchoDecrypter).unwrap();
        assert_eq!(out["key"], Value::String("decrypted:vault:v1:AABB".into()));
        assert_eq!(out["plain"], Value::String("hello".into()));
        assert_eq!(out["num"], Value::Number(3.into()));
    }

    struct FailingDecrypter;
    impl Decrypter for FailingDecrypter {
        fn decrypt(&self, _ciphertext: &str) -> Result<String> {
            Err(ErrorKind::UnexpectedHttpStatus(500).into())
        }
    }

    #[test]
    fn decrypt_failure_is_tagged_with_path() {
        let doc: Value = serde_yaml::from_str("a:\n  b: vault:v1:AABB\n").unwrap();
        let err = decrypt_traverse(&doc, &FailingDecrypter).unwrap_err();
        assert!(err.to_string().contains("a.b"));
    }
}
