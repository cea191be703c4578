use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::{Error, ErrorKind, Result};

/// A read-only, addressable tree of files under a logical root (§2 C1).
/// Git transport itself is out of scope (§1) — a `FileTree` is just the
/// handoff shape a repository-acquisition collaborator (C6) returns, and
/// what the generator and linter (C5, C7) walk from there.
#[derive(Debug, Clone, Default)]
pub struct FileTree {
    files: BTreeMap<String, Vec<u8>>,
}

impl FileTree {
    pub fn new() -> FileTree {
        FileTree { files: BTreeMap::new() }
    }

    /// Build a tree from an iterator of (logical path, contents) pairs,
    /// e.g. the scratch checkout a repository assembler has just merged.
    pub fn from_files<I, P, C>(files: I) -> FileTree
    where
        I: IntoIterator<Item = (P, C)>,
        P: Into<String>,
        C: Into<Vec<u8>>,
    {
        let mut tree = FileTree::new();
        for (path, contents) in files {
            tree.insert(path, contents);
        }
        tree
    }

    /// Walk a real directory on disk into a tree, logical paths relative to
    /// `root` with forward slashes regardless of platform. Grounded on
    /// `shipcat_filebacked::load`'s `WalkDir`-based service directory walk.
    pub fn from_dir<P: AsRef<Path>>(root: P) -> Result<FileTree> {
        let root = root.as_ref();
        let mut tree = FileTree::new();
        for entry in WalkDir::new(root).into_iter() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(root)
                .unwrap_or(entry.path())
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            let contents = fs::read(entry.path())?;
            tree.insert(rel, contents);
        }
        Ok(tree)
    }

    pub fn insert<P: Into<String>, C: Into<Vec<u8>>>(&mut self, path: P, contents: C) {
        self.files.insert(normalize(&path.into()), contents.into());
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(&normalize(path))
    }

    pub fn read(&self, path: &str) -> Result<&[u8]> {
        self.files
            .get(&normalize(path))
            .map(Vec::as_slice)
            .ok_or_else(|| ErrorKind::NotFound(path.to_string()).into())
    }

    pub fn read_to_string(&self, path: &str) -> Result<String> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| Error::from(ErrorKind::NotUtf8(path.to_string())))
    }

    /// All logical paths in the tree, sorted (the `BTreeMap` ordering gives
    /// this for free, which doubles as the deterministic listing order
    /// discovery (C7) relies on).
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Direct children of `prefix` (files and sub-directories one level
    /// down), deduplicated — used by discovery to enumerate installations
    /// and apps without hardcoding a layout depth.
    pub fn children(&self, prefix: &str) -> Vec<String> {
        let prefix = normalize(prefix);
        let base = if prefix.is_empty() { String::new() } else { format!("{}/", prefix) };
        let mut seen = Vec::new();
        for path in self.files.keys() {
            if let Some(rest) = path.strip_prefix(&base as &str) {
                if rest.is_empty() {
                    continue;
                }
                let child = rest.split('/').next().unwrap_or(rest).to_string();
                if !seen.contains(&child) {
                    seen.push(child);
                }
            }
        }
        seen.sort();
        seen
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn normalize(path: &str) -> String {
    path.trim_start_matches("./").trim_matches('/').replace('\\', "/")
}
