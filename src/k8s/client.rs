use crate::config::ResourceTarget;
use crate::k8s::error::classify;
use crate::k8s::status::StatusError;
use crate::k8s::transport::{config_error, transport_error};
use anyhow::{Context, Result};
use k8s_openapi::api::core::v1::Namespace;
use kube::{
    api::{Api, ApiResource, DynamicObject, GroupVersionKind, ListParams},
    config::{KubeConfigOptions, Kubeconfig},
    Client, Config,
};
use tracing::debug;

/// Wrapper around Kubernetes client whose failures come back classified
pub struct KubeClient {
    client: Client,
}

impl KubeClient {
    /// Create a new Kubernetes client using the specified context or default
    pub async fn new(context: Option<&str>) -> Result<Self> {
        let config = if let Some(ctx) = context {
            // Load kubeconfig with specific context
            let kubeconfig = Kubeconfig::read()
                .map_err(|e| classify(config_error(e)))
                .context("Failed to read kubeconfig")?;
            let options = KubeConfigOptions {
                context: Some(ctx.to_string()),
                ..Default::default()
            };
            Config::from_custom_kubeconfig(kubeconfig, &options)
                .await
                .map_err(|e| classify(config_error(e)))
                .with_context(|| format!("Failed to create config for context: {}", ctx))?
        } else {
            // Use default config (in-cluster or default context)
            Config::infer()
                .await
                .map_err(|e| classify(config_error(e)))
                .context("Failed to infer Kubernetes config")?
        };
        debug!(cluster_url = %config.cluster_url, "using cluster");

        let client = Client::try_from(config)
            .map_err(|e| classify(e.into()))
            .context("Failed to create Kubernetes client")?;

        Ok(Self { client })
    }

    /// List at most one object of the given resource, returning how many came back
    pub async fn probe(&self, target: &ResourceTarget, namespace: Option<&str>) -> Result<usize> {
        let gvk = GroupVersionKind::gvk(&target.group, &target.version, &target.kind);
        let resource = ApiResource::from_gvk_with_plural(&gvk, &target.plural);
        let api: Api<DynamicObject> = match namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, &resource),
            None => Api::all_with(self.client.clone(), &resource),
        };

        debug!(resource = %target, namespace = ?namespace, "probing");
        let list = api
            .list(&ListParams::default().limit(1))
            .await
            .map_err(|e| classify(request_error(e, &target.group)))
            .with_context(|| format!("Failed to list {}", target.plural))?;

        Ok(list.items.len())
    }

    /// Check if namespace exists
    pub async fn namespace_exists(&self, namespace: &str) -> Result<bool> {
        let namespaces: Api<Namespace> = Api::all(self.client.clone());
        match namespaces.get(namespace).await {
            Ok(_) => Ok(true),
            Err(kube::Error::Api(err)) if err.code == 404 => Ok(false),
            Err(e) => Err(classify(request_error(e, ""))).context("Failed to check namespace"),
        }
    }
}

/// Attach the requested API group to a failed response so an unknown
/// resource kind can be reported against it. Requests that never got a
/// response are restated as transport failures.
pub fn request_error(err: kube::Error, group: &str) -> anyhow::Error {
    match err {
        kube::Error::Api(resp) => StatusError::from_response(&resp, Some(group)).into(),
        other => transport_error(other),
    }
}
