//! Request lifecycle controller.
//!
//! A [`RequestController`] owns one state slot: invocation counters, a loading
//! flag, mutually exclusive success/error flags with transient messages, and
//! the last decoded payload. `invoke` merges a per-call [`Override`] into the
//! base [`RequestConfig`], hands the result to a [`Transport`] on the tokio
//! runtime and returns immediately; settlement updates the slot and notifies
//! subscribers.

pub mod controller;
pub mod error;
pub mod merge;
pub mod options;
pub mod scheduler;
pub mod state;
pub mod transport;

pub use controller::RequestController;
pub use error::ControllerError;
pub use merge::{merge_config, Override};
pub use options::{ControllerOptions, ErrorHook, SuccessHook};
pub use scheduler::{ClearPolicy, MessageScheduler, MessageSlot};
pub use shared::{
    config::keys, duration_from_millis, FailureKind, FailureReport, Method, RequestConfig,
    Response, TransportError,
};
pub use state::{Phase, StateSnapshot};
pub use transport::{MissingTransport, ReqwestTransport, Transport};
