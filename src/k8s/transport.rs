//! Failures raised before the API server could answer with a status.
//!
//! kube-rs reports these as Rust I/O and config errors, which do not carry the
//! wording the classification rules look for. The wrappers here restate them
//! in that wording and keep the original error as their source.

use kube::config::KubeconfigError;
use std::error::Error as StdError;
use std::io;
use thiserror::Error;

/// Neither a kubeconfig nor an in-cluster environment could be found.
#[derive(Debug, Error)]
#[error("invalid configuration: no configuration has been provided")]
pub struct MissingConfigError(#[source] Box<dyn StdError + Send + Sync>);

/// The cluster endpoint could not be reached.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("dial tcp: connect: no route to host")]
    NoRouteToHost(#[source] kube::Error),

    #[error("dial tcp: i/o timeout")]
    Timeout(#[source] kube::Error),
}

fn sources<'a>(
    err: &'a (dyn StdError + 'static),
) -> impl Iterator<Item = &'a (dyn StdError + 'static)> {
    std::iter::successors(Some(err), |&e| e.source())
}

fn is_missing_kubeconfig(err: &(dyn StdError + 'static)) -> bool {
    match err.downcast_ref::<KubeconfigError>() {
        Some(KubeconfigError::FindPath) => true,
        Some(KubeconfigError::ReadConfig(source, _)) => source.kind() == io::ErrorKind::NotFound,
        _ => false,
    }
}

/// Wrap a config loading failure, marking it when no kubeconfig file exists.
pub fn config_error<E>(err: E) -> anyhow::Error
where
    E: StdError + Send + Sync + 'static,
{
    if sources(&err).any(is_missing_kubeconfig) {
        MissingConfigError(Box::new(err)).into()
    } else {
        err.into()
    }
}

/// Wrap a request failure that never reached the API server.
pub fn transport_error(err: kube::Error) -> anyhow::Error {
    let kind = sources(&err)
        .find_map(|e| e.downcast_ref::<io::Error>())
        .map(io::Error::kind);

    match kind {
        Some(io::ErrorKind::HostUnreachable) => TransportError::NoRouteToHost(err).into(),
        Some(io::ErrorKind::TimedOut) => TransportError::Timeout(err).into(),
        _ => err.into(),
    }
}
