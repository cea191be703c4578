use serde_yaml::Value;

use crate::error::{Error, ErrorKind, Result};
use crate::path::{Path, Segment};
use crate::scalar::Scalar;

/// A parsed YAML document addressable by dotted path.
///
/// Construction parses once; `all()`/`get()`/`set()` all operate on the
/// in-memory tree, `bytes()` re-serializes it. Nothing here touches disk —
/// callers own reading the bytes in (§4.1).
#[derive(Debug, Clone)]
pub struct Document {
    root: Value,
}

impl Document {
    pub fn new(bytes: &[u8]) -> Result<Document> {
        let root: Value = serde_yaml::from_slice(bytes)?;
        trace!("parsed document with {} bytes", bytes.len());
        Ok(Document { root })
    }

    pub fn empty() -> Document {
        Document { root: Value::Mapping(Default::default()) }
    }

    /// Every leaf path in the document, in document order (depth first,
    /// insertion order of mappings preserved since `serde_yaml::Mapping`
    /// keeps an ordered backing map).
    pub fn all(&self) -> Vec<Path> {
        let mut out = Vec::new();
        collect_leaves(&self.root, &Path(vec![]), &mut out);
        out
    }

    pub fn get(&self, path: &Path) -> Result<Scalar> {
        let v = navigate(&self.root, path.segments())
            .ok_or_else(|| Error::from(ErrorKind::PathNotFound(path.to_string())))?;
        Scalar::from_value(&path.to_string(), v)
    }

    /// Set the leaf at `path` to `value`. The path must already resolve to
    /// a leaf in this document — patches may only override, never extend
    /// (§4.1: "patches may only override, not extend").
    pub fn set(&mut self, path: &Path, value: Scalar) -> Result<()> {
        let slot = navigate_mut(&mut self.root, path.segments())
            .ok_or_else(|| Error::from(ErrorKind::PatchPathMissing(path.to_string())))?;
        if matches!(slot, Value::Mapping(_) | Value::Sequence(_)) {
            return Err(ErrorKind::WrongType(path.to_string()).into());
        }
        *slot = value.into_value();
        Ok(())
    }

    pub fn bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_yaml::to_vec(&self.root)?)
    }

    pub fn into_value(self) -> Value {
        self.root
    }

    pub fn value(&self) -> &Value {
        &self.root
    }
}

fn collect_leaves(v: &Value, prefix: &Path, out: &mut Vec<Path>) {
    match v {
        Value::Mapping(m) => {
            for (k, child) in m.iter() {
                if let Value::String(key) = k {
                    collect_leaves(child, &prefix.push_key(key), out);
                }
            }
        }
        Value::Sequence(xs) => {
            for (i, child) in xs.iter().enumerate() {
                collect_leaves(child, &prefix.push_index(i), out);
            }
        }
        _ => {
            if !prefix.is_empty() {
                out.push(prefix.clone());
            }
        }
    }
}

fn navigate<'a>(root: &'a Value, segs: &[Segment]) -> Option<&'a Value> {
    let mut cur = root;
    for seg in segs {
        cur = match (cur, seg) {
            (Value::Mapping(m), Segment::Key(k)) => m.get(&Value::String(k.clone()))?,
            (Value::Sequence(xs), Segment::Index(i)) => xs.get(*i)?,
            _ => return None,
        };
    }
    Some(cur)
}

fn navigate_mut<'a>(root: &'a mut Value, segs: &[Segment]) -> Option<&'a mut Value> {
    let mut cur = root;
    for seg in segs {
        cur = match (cur, seg) {
            (Value::Mapping(m), Segment::Key(k)) => m.get_mut(&Value::String(k.clone()))?,
            (Value::Sequence(xs), Segment::Index(i)) => xs.get_mut(*i)?,
            _ => return None,
        };
    }
    Some(cur)
}

/// Apply every path in `patch` onto a clone of `base` (§4.1 patch semantics).
///
/// Paths in `base` that `patch` does not mention are left untouched. Fails
/// with `patch-path-missing` (via `Document::set`) the first time a patch
/// path does not already exist in `base`.
pub fn patch(base: &Document, overlay: &Document) -> Result<Document> {
    let mut out = base.clone();
    for path in overlay.all() {
        let v = overlay.get(&path)?;
        out.set(&path, v)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_value_override() {
        let base = Document::new(b"universalValue: 42\nprovider:\n  kind: gcp\n  region: eu-west-1\n").unwrap();
        let overlay = Document::new(b"provider:\n  kind: aws\n  region: us-east-1\n").unwrap();
        let merged = patch(&base, &overlay).unwrap();
        assert_eq!(merged.get(&Path::parse("universalValue")).unwrap(), Scalar::Int(42));
        assert_eq!(merged.get(&Path::parse("provider.kind")).unwrap(), Scalar::String("aws".into()));
        assert_eq!(merged.get(&Path::parse("provider.region")).unwrap(), Scalar::String("us-east-1".into()));
    }

    #[test]
    fn typed_patch_preserves_number_types() {
        let base = Document::new(b"exampleFloat: 1.0\nexampleInt: 1\n").unwrap();
        let overlay = Document::new(b"exampleFloat: 13.2\nexampleInt: 33\n").unwrap();
        let merged = patch(&base, &overlay).unwrap();
        assert_eq!(merged.get(&Path::parse("exampleFloat")).unwrap(), Scalar::Float(13.2));
        assert_eq!(merged.get(&Path::parse("exampleInt")).unwrap(), Scalar::Int(33));
        let out = String::from_utf8(merged.bytes().unwrap()).unwrap();
        assert!(out.contains("exampleInt: 33"));
        assert!(!out.contains("exampleInt: '33'"));
    }

    #[test]
    fn patch_cannot_introduce_new_paths() {
        let base = Document::new(b"a: 1\n").unwrap();
        let overlay = Document::new(b"b: 2\n").unwrap();
        let err = patch(&base, &overlay).unwrap_err();
        assert!(err.to_string().contains("missing in base"));
    }

    #[test]
    fn missing_patch_is_identity() {
        let base = Document::new(b"a: 1\nb:\n  c: 2\n").unwrap();
        let overlay = Document::empty();
        let merged = patch(&base, &overlay).unwrap();
        assert_eq!(merged.get(&Path::parse("a")).unwrap(), Scalar::Int(1));
        assert_eq!(merged.get(&Path::parse("b.c")).unwrap(), Scalar::Int(2));
    }

    #[test]
    fn all_paths_roundtrip_get() {
        let doc = Document::new(b"a:\n  - x: 1\n  - x: 2\nb: hello\n").unwrap();
        let paths = doc.all();
        assert_eq!(paths.len(), 3);
        for p in &paths {
            doc.get(p).unwrap();
        }
    }
}
