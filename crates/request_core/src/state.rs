use serde::Serialize;

/// Coarse lifecycle position derived from a [`StateSnapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Loading,
    Succeeded,
    Failed,
}

/// The controller's state slot as seen by a presentation layer.
///
/// `success` and `error` are never both true. `fetched` only ever goes from
/// false to true. Counters reset only through the matching clear operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateSnapshot<T> {
    pub calls: u64,
    pub success_calls: u64,
    pub error_calls: u64,
    pub loading: bool,
    pub fetched: bool,
    pub success: bool,
    pub error: bool,
    pub success_message: String,
    pub error_message: String,
    pub data: Option<T>,
}

impl<T> StateSnapshot<T> {
    pub fn new(initial: Option<T>) -> Self {
        Self {
            calls: 0,
            success_calls: 0,
            error_calls: 0,
            loading: false,
            fetched: false,
            success: false,
            error: false,
            success_message: String::new(),
            error_message: String::new(),
            data: initial,
        }
    }

    pub fn phase(&self) -> Phase {
        if self.loading {
            Phase::Loading
        } else if self.success {
            Phase::Succeeded
        } else if self.error {
            Phase::Failed
        } else {
            Phase::Idle
        }
    }

    /// Total number of settled calls since the counters were last cleared.
    pub fn settled_calls(&self) -> u64 {
        self.success_calls + self.error_calls
    }

    /// Returns the new call number.
    pub(crate) fn begin_call(&mut self) -> u64 {
        self.fetched = true;
        self.calls += 1;
        self.loading = true;
        self.calls
    }

    pub(crate) fn settle_success(&mut self, data: T, message: Option<String>) {
        self.success = true;
        self.clear_error();
        if let Some(message) = message {
            self.success_message = message;
        }
        self.data = Some(data);
        self.success_calls += 1;
        self.loading = false;
    }

    pub(crate) fn settle_error(&mut self, message: Option<String>) {
        self.error = true;
        self.clear_success();
        if let Some(message) = message {
            self.error_message = message;
        }
        self.error_calls += 1;
        self.loading = false;
    }

    pub(crate) fn clear_calls(&mut self) {
        self.calls = 0;
    }

    pub(crate) fn clear_success_calls(&mut self) {
        self.success_calls = 0;
    }

    pub(crate) fn clear_error_calls(&mut self) {
        self.error_calls = 0;
    }

    pub(crate) fn clear_success(&mut self) {
        self.success = false;
        self.success_message.clear();
    }

    pub(crate) fn clear_error(&mut self) {
        self.error = false;
        self.error_message.clear();
    }
}

impl<T> Default for StateSnapshot<T> {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod tests;
