pub mod config;
pub mod error;
pub mod protocol;

pub use config::{duration_from_millis, keys, Method, RequestConfig};
pub use error::{FailureKind, FailureReport, TransportError};
pub use protocol::Response;
