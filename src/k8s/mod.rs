pub mod client;
pub mod error;
pub mod status;
pub mod transport;

pub use client::KubeClient;
pub use error::{classify, classify_result, diagnose, is_forbidden, Diagnosis, KnError};
pub use status::{find_status, ApiStatus, StatusError};
