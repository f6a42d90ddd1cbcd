use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
    time::Duration,
};

use tokio::{runtime::Handle, task::JoinHandle};
use tracing::debug;

/// What happens to a pending clear when a newer one targets the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClearPolicy {
    /// Every scheduled clear fires, even if a newer message replaced the one it
    /// was scheduled for.
    #[default]
    FireRegardless,
    /// A newer clear aborts the pending one for the same slot.
    ReplaceOnReschedule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageSlot {
    Success,
    Error,
}

impl MessageSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageSlot::Success => "success",
            MessageSlot::Error => "error",
        }
    }
}

/// Runs deferred message clears on a tokio runtime.
pub struct MessageScheduler {
    runtime: Handle,
    policy: ClearPolicy,
    pending: Mutex<HashMap<MessageSlot, JoinHandle<()>>>,
}

impl MessageScheduler {
    pub fn new(runtime: Handle, policy: ClearPolicy) -> Self {
        Self {
            runtime,
            policy,
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub fn schedule<F>(&self, slot: MessageSlot, delay: Duration, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        debug!(
            "scheduler: clear scheduled slot={} delay_ms={}",
            slot.as_str(),
            delay.as_millis()
        );
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            action();
        });

        if self.policy == ClearPolicy::ReplaceOnReschedule {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(previous) = pending.insert(slot, task) {
                if !previous.is_finished() {
                    debug!("scheduler: superseded pending clear slot={}", slot.as_str());
                }
                previous.abort();
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/scheduler_tests.rs"]
mod tests;
