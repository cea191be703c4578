//! `confctl reconcile`: runs the watch-based controller loop against a
//! live cluster, materializing every `MaterializationRequest` from a
//! single git-backed source (§4.5, §4.8).

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use confctl_decrypt::{Decrypter, NullDecrypter, VaultDecrypter};
use confctl_reconcile::Context;
use confctl_repo::{Assembler, Auth, Layout, RepoRef};

use crate::error::{Error, Result};

pub struct ReconcileOptions {
    pub host: String,
    pub owner: String,
    pub name: String,
    pub reference: String,
    pub shared_owner: Option<String>,
    pub shared_name: Option<String>,
    pub shared_reference: Option<String>,
    pub token_env: Option<String>,
    pub ssh_key_env: Option<String>,
    pub scratch_dir: PathBuf,
    pub cache_ttl_secs: u64,
    pub vault_transit_key: Option<String>,
    pub hash_annotation_key: String,
}

fn auth_from_env(opts: &ReconcileOptions) -> Result<Auth> {
    if let Some(key_env) = &opts.ssh_key_env {
        let key = env::var(key_env).map_err(|_| Error::from(format!("{} is not set", key_env)))?;
        return Ok(Auth::Ssh { key, password: None });
    }
    let token_env = opts.token_env.as_deref().unwrap_or("CONFCTL_REPO_TOKEN");
    let token = env::var(token_env).map_err(|_| Error::from(format!("{} is not set", token_env)))?;
    Ok(Auth::Token(token))
}

fn layout_from_opts(opts: &ReconcileOptions) -> Result<Layout> {
    let auth = auth_from_env(opts)?;
    let customer = RepoRef::new(opts.owner.as_str(), opts.name.as_str(), opts.reference.as_str(), auth.clone());

    match (&opts.shared_owner, &opts.shared_name, &opts.shared_reference) {
        (Some(owner), Some(name), Some(reference)) => {
            let shared = RepoRef::new(owner.as_str(), name.as_str(), reference.as_str(), auth);
            Ok(Layout::Split { customer, shared })
        }
        _ => Ok(Layout::Monolithic(customer)),
    }
}

pub async fn run(opts: ReconcileOptions) -> Result<()> {
    let client = kube::Client::try_default().await.map_err(confctl_reconcile::Error::Kube)?;
    let layout = layout_from_opts(&opts)?;
    let assembler = Assembler::new(opts.host.clone(), opts.scratch_dir.clone(), Duration::from_secs(opts.cache_ttl_secs));

    let decrypter: Arc<dyn Decrypter + Send + Sync> = match &opts.vault_transit_key {
        Some(key) => Arc::new(VaultDecrypter::from_env(key)?),
        None => Arc::new(NullDecrypter),
    };

    let ctx = Arc::new(Context {
        client: client.clone(),
        assembler,
        layout,
        decrypter,
        hash_annotation_key: opts.hash_annotation_key,
        metrics: confctl_reconcile::Metrics::new(),
    });

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
        info!("received shutdown signal, draining in-flight reconciles");
    };

    confctl_reconcile::run(client, ctx, shutdown).await;
    Ok(())
}
