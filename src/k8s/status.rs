use k8s_openapi::apimachinery::pkg::apis::meta::v1::{Status, StatusCause, StatusDetails};
use kube::core::ErrorResponse;
use std::error::Error as StdError;
use thiserror::Error;

/// Cause type attached to a status when the API server answered with something
/// other than a Status document.
pub const CAUSE_UNEXPECTED_SERVER_RESPONSE: &str = "UnexpectedServerResponse";

/// Reason kube-rs puts on an `ErrorResponse` it had to rebuild from a raw body.
pub const UNPARSED_RESPONSE_REASON: &str = "Failed to parse error data";

/// Errors that can expose a structured API status.
pub trait ApiStatus {
    fn api_status(&self) -> Option<Status>;
}

/// An API failure described by a structured status.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}", status_message(.status))]
pub struct StatusError {
    status: Status,
}

impl StatusError {
    pub fn new(status: Status) -> Self {
        Self { status }
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Build a status error from a kube-rs response, tagging it with the API
    /// group the request targeted.
    pub fn from_response(resp: &ErrorResponse, group: Option<&str>) -> Self {
        Self::new(status_from_response(resp, group))
    }
}

impl ApiStatus for StatusError {
    fn api_status(&self) -> Option<Status> {
        Some(self.status.clone())
    }
}

impl ApiStatus for ErrorResponse {
    fn api_status(&self) -> Option<Status> {
        Some(status_from_response(self, None))
    }
}

impl ApiStatus for kube::Error {
    fn api_status(&self) -> Option<Status> {
        match self {
            kube::Error::Api(resp) => resp.api_status(),
            _ => None,
        }
    }
}

/// Find the first structured status exposed anywhere in the error chain.
pub fn find_status(err: &anyhow::Error) -> Option<Status> {
    err.chain().find_map(status_of)
}

fn status_of(err: &(dyn StdError + 'static)) -> Option<Status> {
    if let Some(e) = err.downcast_ref::<StatusError>() {
        return e.api_status();
    }
    if let Some(e) = err.downcast_ref::<kube::Error>() {
        return e.api_status();
    }
    err.downcast_ref::<ErrorResponse>()
        .and_then(<ErrorResponse as ApiStatus>::api_status)
}

fn status_message(status: &Status) -> &str {
    status
        .message
        .as_deref()
        .filter(|m| !m.is_empty())
        .or(status.reason.as_deref())
        .unwrap_or("unknown API status")
}

// A parsed response carries no details. An unparsed body only tells us the
// server did not know what we asked for, so record it as a single cause.
fn status_from_response(resp: &ErrorResponse, group: Option<&str>) -> Status {
    if resp.reason != UNPARSED_RESPONSE_REASON {
        return Status {
            code: Some(i32::from(resp.code)),
            message: Some(resp.message.clone()),
            reason: Some(resp.reason.clone()),
            status: Some("Failure".to_string()),
            ..Default::default()
        };
    }

    // kube-rs stores the raw body Debug-quoted
    let body = serde_json::from_str::<String>(&resp.message)
        .unwrap_or_else(|_| resp.message.clone())
        .trim()
        .to_string();
    let code = resp.code.to_string();
    let cause_message = if body.starts_with(&code) {
        body.clone()
    } else {
        format!("{} {}", code, body)
    };

    Status {
        code: Some(i32::from(resp.code)),
        message: Some(body),
        reason: Some(resp.reason.clone()),
        status: Some("Failure".to_string()),
        details: Some(StatusDetails {
            group: group.map(str::to_string),
            causes: Some(vec![StatusCause {
                reason: Some(CAUSE_UNEXPECTED_SERVER_RESPONSE.to_string()),
                message: Some(cause_message),
                field: None,
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Context};

    fn unparsed(code: u16, body: &str) -> ErrorResponse {
        ErrorResponse {
            status: format!("{} Not Found", code),
            code,
            message: format!("{:?}", body),
            reason: UNPARSED_RESPONSE_REASON.to_string(),
        }
    }

    #[test]
    fn unparsed_body_becomes_unexpected_response_cause() {
        let status = StatusError::from_response(
            &unparsed(404, "404 page not found\n"),
            Some("serving.knative.dev"),
        )
        .status()
        .clone();

        let details = status.details.expect("details");
        assert_eq!(details.group.as_deref(), Some("serving.knative.dev"));
        let causes = details.causes.expect("causes");
        assert_eq!(causes.len(), 1);
        assert_eq!(
            causes[0].reason.as_deref(),
            Some(CAUSE_UNEXPECTED_SERVER_RESPONSE)
        );
        assert_eq!(causes[0].message.as_deref(), Some("404 page not found"));
        assert_eq!(status.code, Some(404));
    }

    #[test]
    fn unparsed_body_without_code_gets_prefixed() {
        let status = status_from_response(&unparsed(404, "not here"), None);
        let causes = status.details.and_then(|d| d.causes).expect("causes");
        assert_eq!(causes[0].message.as_deref(), Some("404 not here"));
    }

    #[test]
    fn parsed_response_has_no_details() {
        let resp = ErrorResponse {
            status: "Failure".to_string(),
            code: 403,
            message: "services is forbidden".to_string(),
            reason: "Forbidden".to_string(),
        };
        let status = resp.api_status().expect("status");
        assert_eq!(status.code, Some(403));
        assert!(status.details.is_none());
    }

    #[test]
    fn finds_status_behind_context() {
        let err = anyhow::Error::new(StatusError::new(Status {
            code: Some(500),
            ..Default::default()
        }))
        .context("Failed to list services");

        assert_eq!(find_status(&err).and_then(|s| s.code), Some(500));
    }

    #[test]
    fn finds_status_in_kube_error() {
        let err: anyhow::Error = kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            code: 404,
            message: "brokers.eventing.knative.dev \"default\" not found".to_string(),
            reason: "NotFound".to_string(),
        })
        .into();

        assert_eq!(find_status(&err).and_then(|s| s.code), Some(404));
    }

    #[test]
    fn plain_errors_have_no_status() {
        let err = Err::<(), _>(anyhow!("connection refused"))
            .context("Failed to reach cluster")
            .unwrap_err();
        assert!(find_status(&err).is_none());
    }

    #[test]
    fn display_falls_back_to_reason() {
        let err = StatusError::new(Status {
            reason: Some("Forbidden".to_string()),
            message: Some(String::new()),
            ..Default::default()
        });
        assert_eq!(err.to_string(), "Forbidden");
    }
}
