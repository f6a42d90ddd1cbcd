use std::{
    any::Any,
    panic::{catch_unwind, AssertUnwindSafe},
    sync::{Arc, Weak},
    time::Duration,
};

use serde::de::DeserializeOwned;
use shared::{RequestConfig, Response, TransportError};
use tokio::{runtime::Handle, sync::watch};
use tracing::{debug, warn};

use crate::{
    error::ControllerError,
    merge::{merge_config, Override},
    options::{non_empty, ControllerOptions, ErrorHook, SuccessHook},
    scheduler::{MessageScheduler, MessageSlot},
    state::StateSnapshot,
    transport::Transport,
};

/// Drives requests for one call site and owns its state slot.
///
/// Clones share the same slot. `invoke` never blocks: it records the call,
/// spawns the transport request on the captured runtime and returns. Failures
/// never escape; they land in the slot as `error` plus `error_message`. That
/// includes a panicking transport or hook: every invocation settles.
pub struct RequestController<T> {
    inner: Arc<ControllerInner<T>>,
}

impl<T> Clone for RequestController<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct ControllerInner<T> {
    base: RequestConfig,
    on_success: Option<SuccessHook<T>>,
    on_error: Option<ErrorHook>,
    default_success_message: Option<String>,
    default_error_message: Option<String>,
    success_message_duration: Option<Duration>,
    error_message_duration: Option<Duration>,
    transport: Arc<dyn Transport>,
    state: watch::Sender<StateSnapshot<T>>,
    scheduler: MessageScheduler,
    runtime: Handle,
}

impl<T> RequestController<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Uses the runtime of the calling context.
    pub fn new(
        options: ControllerOptions<T>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ControllerError> {
        let runtime = Handle::try_current().map_err(|_| ControllerError::NoRuntime)?;
        Ok(Self::with_runtime(options, transport, runtime))
    }

    /// Requests and scheduled clears run on `runtime`, so `invoke` may be
    /// called from threads that are not part of it.
    pub fn with_runtime(
        options: ControllerOptions<T>,
        transport: Arc<dyn Transport>,
        runtime: Handle,
    ) -> Self {
        let ControllerOptions {
            config,
            on_success,
            on_error,
            initial_data,
            invoke_immediately,
            default_success_message,
            default_error_message,
            success_message_duration,
            error_message_duration,
            clear_policy,
        } = options;

        let (state, _) = watch::channel(StateSnapshot::new(initial_data));
        let controller = Self {
            inner: Arc::new(ControllerInner {
                base: config,
                on_success,
                on_error,
                default_success_message,
                default_error_message,
                success_message_duration,
                error_message_duration,
                transport,
                state,
                scheduler: MessageScheduler::new(runtime.clone(), clear_policy),
                runtime,
            }),
        };

        if invoke_immediately {
            controller.invoke();
        }
        controller
    }

    pub fn base_config(&self) -> &RequestConfig {
        &self.inner.base
    }

    /// Invokes with the base configuration unchanged.
    pub fn invoke(&self) {
        self.invoke_with(Override::default(), true);
    }

    pub fn invoke_with(&self, over: impl Into<Override>, merge: bool) {
        let effective = merge_config(&self.inner.base, over.into(), merge);

        let mut call = 0;
        self.inner
            .state
            .send_modify(|state| call = state.begin_call());
        debug!(
            "request: dispatched call={call} endpoint={}",
            effective.endpoint().unwrap_or("<none>")
        );

        let inner = Arc::clone(&self.inner);
        self.inner.runtime.spawn(async move {
            let transport = Arc::clone(&inner.transport);
            let request = inner
                .runtime
                .spawn(async move { transport.request(effective).await });
            let outcome = match request.await {
                Ok(Ok(response)) => response.decode::<T>(),
                Ok(Err(err)) => Err(err),
                Err(join) if join.is_panic() => Err(TransportError::Panicked(panic_message(
                    join.into_panic().as_ref(),
                ))),
                Err(join) => Err(TransportError::Network(format!(
                    "request task stopped: {join}"
                ))),
            };
            match outcome {
                Ok(response) => inner.handle_success(call, response),
                Err(err) => inner.handle_error(call, err),
            }
        });
    }

    pub fn snapshot(&self) -> StateSnapshot<T> {
        self.inner.state.borrow().clone()
    }

    /// Observes every change of the state slot.
    pub fn subscribe(&self) -> watch::Receiver<StateSnapshot<T>> {
        self.inner.state.subscribe()
    }

    pub fn clear_calls(&self) {
        self.inner.state.send_modify(StateSnapshot::clear_calls);
    }

    pub fn clear_success_calls(&self) {
        self.inner
            .state
            .send_modify(StateSnapshot::clear_success_calls);
    }

    pub fn clear_error_calls(&self) {
        self.inner.state.send_modify(StateSnapshot::clear_error_calls);
    }

    pub fn clear_success(&self) {
        self.inner.state.send_modify(StateSnapshot::clear_success);
    }

    pub fn clear_error(&self) {
        self.inner.state.send_modify(StateSnapshot::clear_error);
    }
}

impl<T> ControllerInner<T>
where
    T: Send + Sync + 'static,
{
    fn handle_success(self: &Arc<Self>, call: u64, response: Response<T>) {
        // Hooks run before the slot is borrowed so they may read it freely.
        let hooked = match &self.on_success {
            Some(hook) => catch_unwind(AssertUnwindSafe(|| hook(&response))),
            None => Ok(None),
        };
        let message = match hooked {
            Ok(message) => message
                .and_then(non_empty)
                .or_else(|| self.default_success_message.clone()),
            Err(payload) => {
                let err = TransportError::Panicked(panic_message(payload.as_ref()));
                return self.handle_error(call, err);
            }
        };
        debug!(
            "request: succeeded call={call} status={}",
            response.status
        );

        self.state
            .send_modify(|state| state.settle_success(response.data, message));

        if let Some(delay) = self.success_message_duration {
            self.schedule_clear(MessageSlot::Success, delay);
        }
    }

    fn handle_error(self: &Arc<Self>, call: u64, err: TransportError) {
        let hooked = match &self.on_error {
            Some(hook) => catch_unwind(AssertUnwindSafe(|| hook(&err))),
            None => Ok(None),
        };
        let message = hooked
            .unwrap_or_else(|payload| {
                warn!(
                    "request: error hook panicked call={call}: {}",
                    panic_message(payload.as_ref())
                );
                None
            })
            .and_then(non_empty)
            .or_else(|| self.default_error_message.clone());
        warn!("request: failed call={call}: {err}");

        self.state.send_modify(|state| state.settle_error(message));

        if let Some(delay) = self.error_message_duration {
            self.schedule_clear(MessageSlot::Error, delay);
        }
    }

    fn schedule_clear(self: &Arc<Self>, slot: MessageSlot, delay: Duration) {
        let weak: Weak<Self> = Arc::downgrade(self);
        self.scheduler.schedule(slot, delay, move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            match slot {
                MessageSlot::Success => inner.state.send_modify(StateSnapshot::clear_success),
                MessageSlot::Error => inner.state.send_modify(StateSnapshot::clear_error),
            }
            debug!("request: message cleared slot={}", slot.as_str());
        });
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
