use std::{fmt, sync::Arc, time::Duration};

use shared::{RequestConfig, Response, TransportError};

use crate::scheduler::ClearPolicy;

/// Called with the decoded response. A non-empty return replaces the default
/// success message.
pub type SuccessHook<T> = Arc<dyn Fn(&Response<T>) -> Option<String> + Send + Sync>;
/// Called with the failure exactly as the transport produced it.
pub type ErrorHook = Arc<dyn Fn(&TransportError) -> Option<String> + Send + Sync>;

/// Everything a controller captures at construction.
pub struct ControllerOptions<T> {
    pub(crate) config: RequestConfig,
    pub(crate) on_success: Option<SuccessHook<T>>,
    pub(crate) on_error: Option<ErrorHook>,
    pub(crate) initial_data: Option<T>,
    pub(crate) invoke_immediately: bool,
    pub(crate) default_success_message: Option<String>,
    pub(crate) default_error_message: Option<String>,
    pub(crate) success_message_duration: Option<Duration>,
    pub(crate) error_message_duration: Option<Duration>,
    pub(crate) clear_policy: ClearPolicy,
}

impl<T> ControllerOptions<T> {
    pub fn new(config: RequestConfig) -> Self {
        Self {
            config,
            on_success: None,
            on_error: None,
            initial_data: None,
            invoke_immediately: false,
            default_success_message: None,
            default_error_message: None,
            success_message_duration: None,
            error_message_duration: None,
            clear_policy: ClearPolicy::default(),
        }
    }

    /// The hook runs before the settlement is committed, so a snapshot taken
    /// inside it still shows `loading` and the previous `success` flag. A
    /// panicking hook turns the settlement into the error sequence.
    pub fn on_success<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Response<T>) -> Option<String> + Send + Sync + 'static,
    {
        self.on_success = Some(Arc::new(hook));
        self
    }

    /// Runs before the error state is committed. If it panics the default
    /// error message is used.
    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&TransportError) -> Option<String> + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(hook));
        self
    }

    pub fn initial_data(mut self, data: T) -> Self {
        self.initial_data = Some(data);
        self
    }

    pub fn invoke_immediately(mut self, enabled: bool) -> Self {
        self.invoke_immediately = enabled;
        self
    }

    pub fn default_success_message(mut self, message: impl Into<String>) -> Self {
        self.default_success_message = non_empty(message.into());
        self
    }

    pub fn default_error_message(mut self, message: impl Into<String>) -> Self {
        self.default_error_message = non_empty(message.into());
        self
    }

    /// `None` disables the auto-clear.
    pub fn success_message_duration(mut self, duration: Option<Duration>) -> Self {
        self.success_message_duration = duration;
        self
    }

    /// `None` disables the auto-clear.
    pub fn error_message_duration(mut self, duration: Option<Duration>) -> Self {
        self.error_message_duration = duration;
        self
    }

    pub fn clear_policy(mut self, policy: ClearPolicy) -> Self {
        self.clear_policy = policy;
        self
    }
}

impl<T> Default for ControllerOptions<T> {
    fn default() -> Self {
        Self::new(RequestConfig::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for ControllerOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerOptions")
            .field("config", &self.config)
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("initial_data", &self.initial_data)
            .field("invoke_immediately", &self.invoke_immediately)
            .field("default_success_message", &self.default_success_message)
            .field("default_error_message", &self.default_error_message)
            .field("success_message_duration", &self.success_message_duration)
            .field("error_message_duration", &self.error_message_duration)
            .field("clear_policy", &self.clear_policy)
            .finish()
    }
}

pub(crate) fn non_empty(message: String) -> Option<String> {
    (!message.is_empty()).then_some(message)
}
