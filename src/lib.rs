//! Turn raw Kubernetes and Knative API failures into errors a user can act on.
//!
//! The rules live in [`k8s::error`]; [`k8s::KubeClient`] routes every API
//! failure through them.

pub mod config;
pub mod k8s;
