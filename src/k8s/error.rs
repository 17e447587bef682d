use anyhow::{Error, Result};
use http::StatusCode;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Status;
use thiserror::Error as ThisError;

use crate::k8s::status::{find_status, CAUSE_UNEXPECTED_SERVER_RESPONSE};

/// Errors a user can act on, recognised from raw cluster failures.
#[derive(Debug, ThisError)]
pub enum KnError {
    /// The server does not know the requested resource kind.
    #[error("{}", invalid_crd_message(.group))]
    InvalidCrd { group: String, status: Box<Status> },

    #[error("no kubeconfig has been provided, please use a valid configuration to connect to the cluster")]
    NoKubeConfig { message: String },

    #[error("{}", .message.replacen("dial tcp", "error connecting to the cluster", 1))]
    NoRouteToHost { message: String },
}

impl KnError {
    pub fn invalid_crd(group: impl Into<String>, status: Status) -> Self {
        KnError::InvalidCrd {
            group: group.into(),
            status: Box::new(status),
        }
    }

    pub fn no_kube_config(message: impl Into<String>) -> Self {
        KnError::NoKubeConfig {
            message: message.into(),
        }
    }

    pub fn no_route_to_host(message: impl Into<String>) -> Self {
        KnError::NoRouteToHost {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            KnError::InvalidCrd { .. } => "InvalidCRD",
            KnError::NoKubeConfig { .. } => "NoKubeConfig",
            KnError::NoRouteToHost { .. } => "NoRouteToHost",
        }
    }

    /// API group of an unrecognised resource kind.
    pub fn group(&self) -> Option<&str> {
        match self {
            KnError::InvalidCrd { group, .. } => Some(group.as_str()),
            _ => None,
        }
    }

    /// The status the server answered with, kept for later inspection.
    pub fn status(&self) -> Option<&Status> {
        match self {
            KnError::InvalidCrd { status, .. } => Some(&**status),
            _ => None,
        }
    }

    /// Text of the failure this error was recognised from.
    pub fn original_message(&self) -> Option<&str> {
        match self {
            KnError::InvalidCrd { status, .. } => status.message.as_deref(),
            KnError::NoKubeConfig { message } | KnError::NoRouteToHost { message } => {
                Some(message.as_str())
            }
        }
    }
}

fn invalid_crd_message(group: &str) -> String {
    let name = group.split('.').next().unwrap_or_default();
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => format!(
            "no Knative {}{} API found on the backend, please verify the installation",
            first.to_uppercase(),
            chars.as_str()
        ),
        None => "no Knative API found on the backend, please verify the installation".to_string(),
    }
}

/// Outcome of classifying an error.
#[derive(Debug)]
pub enum Diagnosis {
    Known(KnError),
    /// No rule matched; the original error, untouched.
    Unclassified(Error),
}

impl Diagnosis {
    pub fn kind(&self) -> &'static str {
        match self {
            Diagnosis::Known(e) => e.kind(),
            Diagnosis::Unclassified(_) => "Unclassified",
        }
    }

    pub fn into_error(self) -> Error {
        match self {
            Diagnosis::Known(e) => e.into(),
            Diagnosis::Unclassified(e) => e,
        }
    }
}

/// Replace a raw cluster error with a `KnError` when one applies, otherwise
/// return it unchanged.
///
/// A `KnError` no longer exposes a structured status, so classifying a
/// classified error is not guaranteed to be a no-op.
pub fn classify(err: Error) -> Error {
    diagnose(err).into_error()
}

/// `classify` lifted over a result. `Ok` values pass through.
pub fn classify_result<T>(res: Result<T>) -> Result<T> {
    res.map_err(classify)
}

/// Run the classification rules in order; the first match decides.
///
/// An error carrying a structured status is only ever checked against the
/// status rule, even when that rule does not produce a `KnError`.
pub fn diagnose(err: Error) -> Diagnosis {
    if let Some(status) = find_status(&err) {
        return diagnose_status(err, status);
    }

    let text = format!("{:#}", err);
    if is_empty_config_error(&text) {
        return Diagnosis::Known(KnError::no_kube_config(text));
    }
    if is_no_route_to_host_error(&text) {
        return Diagnosis::Known(KnError::no_route_to_host(text));
    }
    Diagnosis::Unclassified(err)
}

fn diagnose_status(err: Error, status: Status) -> Diagnosis {
    let Some(details) = status.details.as_ref() else {
        return Diagnosis::Unclassified(err);
    };
    if !is_crd_error(&status) {
        return Diagnosis::Unclassified(err);
    }
    let group = details.group.clone().unwrap_or_default();
    Diagnosis::Known(KnError::invalid_crd(group, status))
}

/// True if any cause says the server answered 404 outside the API machinery,
/// which is what an unknown resource kind looks like.
pub fn is_crd_error(status: &Status) -> bool {
    status
        .details
        .as_ref()
        .and_then(|d| d.causes.as_deref())
        .unwrap_or_default()
        .iter()
        .any(|cause| {
            cause.message.as_deref().is_some_and(|m| m.starts_with("404"))
                && cause.reason.as_deref() == Some(CAUSE_UNEXPECTED_SERVER_RESPONSE)
        })
}

pub fn is_empty_config_error(text: &str) -> bool {
    text.contains("no configuration has been provided")
}

pub fn is_no_route_to_host_error(text: &str) -> bool {
    text.contains("no route to host") || text.contains("i/o timeout")
}

/// True if the error carries a structured status with code 403.
pub fn is_forbidden(err: &Error) -> bool {
    find_status(err).and_then(|s| s.code) == Some(i32::from(StatusCode::FORBIDDEN.as_u16()))
}
