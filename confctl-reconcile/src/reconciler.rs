//! Reconciler (C8): the state machine driving a materialization request
//! from `ACQUIRE_TREE` through `DONE`, grounded on the same
//! `Controller`/`finalizer`/`Action` shape used elsewhere in the fleet for
//! watch-based reconcilers (§4.8).

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::api::Api;
use kube::runtime::controller::Action;
use kube::runtime::{finalizer, Controller};
use kube::ResourceExt;

use crate::adapter;
use crate::api::{
    previous_config_annotation, ConfigRefPair, MaterializationRequest, MaterializationRequestStatus,
    ObjectRef,
};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::naming::destination_name;

const FINALIZER_NAME: &str = "confctl.example.com/materialization";
const ORPHAN_CLEANUP_MAX_ITERATIONS: usize = 4;
const REQUEUE_INTERVAL_SECS: u64 = 300;

fn status_config_refs(req: &MaterializationRequest) -> Option<ConfigRefPair> {
    req.status.as_ref().and_then(MaterializationRequestStatus::config_refs)
}

/// Which halves of `prev` no longer match `cur` and so are orphaned —
/// a pure function of the two ref pairs, factored out of `delete_differing`
/// so the fixpoint's deletion decision is testable without a live `Api`
/// (§9 "Fixpoint cleanup loop": "each iteration must be a pure function of
/// server state").
#[derive(Debug, Default, PartialEq, Eq)]
struct Orphaned {
    config_map: bool,
    secret: bool,
}

fn orphaned_refs(prev: &ConfigRefPair, cur: &ConfigRefPair) -> Orphaned {
    Orphaned { config_map: prev.config_map != cur.config_map, secret: prev.secret != cur.secret }
}

async fn delete_differing(ctx: &Context, prev: &ConfigRefPair, cur: &ConfigRefPair) -> Result<()> {
    let orphaned = orphaned_refs(prev, cur);
    if orphaned.config_map {
        let api: Api<ConfigMap> = Api::namespaced(ctx.client.clone(), &prev.config_map.namespace);
        adapter::ensure_deleted(&api, &prev.config_map.name).await?;
    }
    if orphaned.secret {
        let api: Api<Secret> = Api::namespaced(ctx.client.clone(), &prev.secret.namespace);
        adapter::ensure_deleted(&api, &prev.secret.name).await?;
    }
    Ok(())
}

async fn delete_config_refs(ctx: &Context, refs: &ConfigRefPair) -> Result<()> {
    let cm_api: Api<ConfigMap> = Api::namespaced(ctx.client.clone(), &refs.config_map.namespace);
    adapter::ensure_deleted(&cm_api, &refs.config_map.name).await?;
    let sec_api: Api<Secret> = Api::namespaced(ctx.client.clone(), &refs.secret.namespace);
    adapter::ensure_deleted(&sec_api, &refs.secret.name).await?;
    Ok(())
}

/// `CLEANUP_ORPHANS_2`: reload the record, and while its `previousConfig`
/// annotation still disagrees with `status.config`, delete whatever it
/// references that the new status doesn't, then advance the annotation —
/// bounded so a permanently wedged record can't spin the controller
/// forever (§4.8 "Orphan cleanup").
async fn fixpoint_cleanup(ctx: &Context, api: &Api<MaterializationRequest>, name: &str) -> Result<()> {
    for _ in 0..ORPHAN_CLEANUP_MAX_ITERATIONS {
        let current = api.get(name).await.map_err(Error::Kube)?;
        let previous = previous_config_annotation(&current);
        let status = match status_config_refs(&current) {
            Some(s) => s,
            None => return Ok(()),
        };

        match previous {
            Some(prev) if prev == status => return Ok(()),
            Some(prev) => {
                delete_differing(ctx, &prev, &status).await?;
                adapter::set_previous_config_annotation(api, name, &status).await?;
            }
            None => {
                adapter::set_previous_config_annotation(api, name, &status).await?;
            }
        }
    }
    Ok(())
}

async fn apply(req: Arc<MaterializationRequest>, ctx: Arc<Context>) -> Result<Action> {
    let name = req.name_any();
    let namespace = req
        .namespace()
        .ok_or_else(|| Error::MissingNamespace(name.clone()))?;
    let api: Api<MaterializationRequest> = Api::namespaced(ctx.client.clone(), &namespace);

    // The assembler does blocking git/filesystem I/O and the default
    // decrypter (`VaultDecrypter`) calls out over `reqwest::blocking`, so
    // the whole synchronous pipeline runs on a blocking-pool thread
    // rather than stalling a tokio worker (§5 "suspension points").
    let pipeline_ctx = ctx.clone();
    let spec = req.spec.clone();
    let raw = tokio::task::spawn_blocking(move || -> Result<confctl_generator::RawArtifacts> {
        let tree = pipeline_ctx.assembler.assemble(&pipeline_ctx.layout).map_err(Error::Assemble)?;
        let library = confctl_generator::load_include_library(&tree).map_err(Error::Generate)?;
        confctl_generator::generate(
            &tree,
            &spec.installation,
            &spec.app,
            pipeline_ctx.decrypter.as_ref(),
            &library,
        )
        .map_err(Error::Generate)
    })
    .await
    .map_err(|e| Error::Blocking(e.to_string()))??;

    let app_spec_identity = format!("{}/{}", req.spec.installation, req.spec.app);
    let dest_name = destination_name(&name, &app_spec_identity);

    let pair = confctl_generator::build_artifact_pair(
        &raw,
        &dest_name,
        &req.spec.namespace,
        &req.spec.extra_labels,
        &req.spec.extra_annotations,
        &ctx.hash_annotation_key,
    );

    let cm_api: Api<ConfigMap> = Api::namespaced(ctx.client.clone(), &req.spec.namespace);
    let sec_api: Api<Secret> = Api::namespaced(ctx.client.clone(), &req.spec.namespace);

    adapter::ensure_created(&cm_api, adapter::to_configmap(&pair.values)).await?;
    adapter::ensure_created(&sec_api, adapter::to_secret(&pair.secrets)).await?;

    let new_config = ConfigRefPair {
        config_map: ObjectRef { name: dest_name.clone(), namespace: req.spec.namespace.clone() },
        secret: ObjectRef { name: dest_name.clone(), namespace: req.spec.namespace.clone() },
    };

    // CLEANUP_ORPHANS_1: drop whatever the stale annotation pointed at
    // that the freshly-created objects have already superseded.
    if let Some(prev) = previous_config_annotation(&req) {
        delete_differing(&ctx, &prev, &new_config).await?;
    }

    // UPDATE_STATUS
    adapter::modify_status(&api, &name, |status| {
        status.config_map_ref = Some(new_config.config_map.clone());
        status.secret_ref = Some(new_config.secret.clone());
        status.version = Some(dest_name.clone());
    })
    .await?;

    // CLEANUP_ORPHANS_2
    fixpoint_cleanup(&ctx, &api, &name).await?;

    Ok(Action::requeue(Duration::from_secs(REQUEUE_INTERVAL_SECS)))
}

async fn cleanup(req: Arc<MaterializationRequest>, ctx: Arc<Context>) -> Result<Action> {
    if let Some(current) = status_config_refs(&req) {
        delete_config_refs(&ctx, &current).await?;
    }
    if let Some(prev) = previous_config_annotation(&req) {
        if Some(&prev) != status_config_refs(&req).as_ref() {
            delete_config_refs(&ctx, &prev).await?;
        }
    }
    Ok(Action::await_change())
}

async fn reconcile(req: Arc<MaterializationRequest>, ctx: Arc<Context>) -> Result<Action> {
    let namespace = req.namespace().ok_or_else(|| Error::MissingNamespace(req.name_any()))?;
    let api: Api<MaterializationRequest> = Api::namespaced(ctx.client.clone(), &namespace);
    let started = std::time::Instant::now();

    let result = finalizer::finalizer(&api, FINALIZER_NAME, req, {
        let ctx = ctx.clone();
        move |event| {
            let ctx = ctx.clone();
            async move {
                match event {
                    finalizer::Event::Apply(r) => apply(r, ctx).await,
                    finalizer::Event::Cleanup(r) => cleanup(r, ctx).await,
                }
            }
        }
    })
    .await
    .map_err(|e| Error::Finalizer(Box::new(e)));

    ctx.metrics.record(if result.is_ok() { "success" } else { "failure" }, started.elapsed().as_secs_f64());
    result
}

fn error_policy(_req: Arc<MaterializationRequest>, err: &Error, _ctx: Arc<Context>) -> Action {
    tracing::warn!(error = %err, "reconciliation failed, requeuing");
    Action::requeue(Duration::from_secs(5))
}

/// Runs the controller loop to completion (or until `shutdown` resolves),
/// draining results as they complete the way `clairs.rs`'s controller does
/// (§4.8).
pub async fn run(client: kube::Client, ctx: Arc<Context>, shutdown: impl std::future::Future<Output = ()>) {
    let requests: Api<MaterializationRequest> = Api::all(client);

    Controller::new(requests, Default::default())
        .graceful_shutdown_on(shutdown)
        .run(reconcile, error_policy, ctx)
        .for_each(|result| async move {
            match result {
                Ok((obj, action)) => tracing::debug!(?obj, ?action, "reconciled"),
                Err(err) => tracing::warn!(error = %err, "reconcile stream error"),
            }
        })
        .await;
}
