use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use confctl_filetree::FileTree;
use uuid::Uuid;

use crate::error::{ErrorKind, Result};
use crate::git::clone_shallow;
use crate::source::{CacheKey, Layout, RepoRef};

struct CacheEntry {
    tree: FileTree,
    fetched_at: Instant,
}

/// Acquires the logical tree consumed by discovery and the generator from
/// one or two git-backed sources, caching assembled trees by
/// `(owner, name, ref[, sharedName, sharedRef])` for a bounded TTL (§4.5).
pub struct Assembler {
    host: String,
    scratch_root: PathBuf,
    ttl: Duration,
    cache: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl Assembler {
    pub fn new(host: impl Into<String>, scratch_root: impl Into<PathBuf>, ttl: Duration) -> Assembler {
        Assembler {
            host: host.into(),
            scratch_root: scratch_root.into(),
            ttl,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn assemble(&self, layout: &Layout) -> Result<FileTree> {
        let key = layout.cache_key();
        {
            let cache = self.cache.lock().expect("cache lock poisoned");
            if let Some(entry) = cache.get(&key) {
                if entry.fetched_at.elapsed() < self.ttl {
                    debug!("reusing cached tree for {:?}", key);
                    return Ok(entry.tree.clone());
                }
            }
        }

        let tree = match layout {
            Layout::Monolithic(repo) => self.assemble_monolithic(repo)?,
            Layout::Split { customer, shared } => self.assemble_split(customer, shared)?,
        };

        let mut cache = self.cache.lock().expect("cache lock poisoned");
        cache.insert(
            key,
            CacheEntry {
                tree: tree.clone(),
                fetched_at: Instant::now(),
            },
        );
        Ok(tree)
    }

    fn scratch_dir(&self) -> PathBuf {
        self.scratch_root.join(Uuid::new_v4().to_string())
    }

    fn assemble_monolithic(&self, repo: &RepoRef) -> Result<FileTree> {
        let dest = self.scratch_dir();
        clone_shallow(&repo.clone_url(&self.host), &repo.reference, &dest)?;
        let tree = FileTree::from_dir(&dest)?;
        fs::remove_dir_all(&dest)?;
        Ok(tree)
    }

    /// Clone customer to root, shared into a scratch subdirectory, move
    /// `scratch/default` -> `default` and `scratch/include` -> `include`
    /// at root (only when absent on the customer side), then delete the
    /// scratch subtree (§4.5).
    fn assemble_split(&self, customer: &RepoRef, shared: &RepoRef) -> Result<FileTree> {
        let root = self.scratch_dir();
        clone_shallow(&customer.clone_url(&self.host), &customer.reference, &root)?;

        let scratch = root.join(".scratch-shared");
        clone_shallow(&shared.clone_url(&self.host), &shared.reference, &scratch)?;

        for overlay in ["default", "include"] {
            let src = scratch.join(overlay);
            let dst = root.join(overlay);
            if !src.exists() {
                continue;
            }
            if dst.exists() {
                return Err(ErrorKind::OverlayCollision(overlay.to_string()).into());
            }
            move_dir(&src, &dst)?;
        }

        fs::remove_dir_all(&scratch)?;
        let tree = FileTree::from_dir(&root)?;
        fs::remove_dir_all(&root)?;
        Ok(tree)
    }
}

fn move_dir(src: &Path, dst: &Path) -> Result<()> {
    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(_) => {
            copy_dir_recursive(src, dst)?;
            fs::remove_dir_all(src)?;
            Ok(())
        }
    }
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
