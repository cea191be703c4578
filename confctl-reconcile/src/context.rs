//! Shared reconciler state, threaded through every `reconcile()` call the
//! way `clairs.rs`'s controller threads its own `Context` (§4.8).

use std::sync::Arc;

use confctl_decrypt::Decrypter;
use confctl_repo::{Assembler, Layout};

use crate::metrics::Metrics;

pub struct Context {
    pub client: kube::Client,
    pub assembler: Assembler,
    pub layout: Layout,
    pub decrypter: Arc<dyn Decrypter + Send + Sync>,
    pub hash_annotation_key: String,
    pub metrics: Metrics,
}
