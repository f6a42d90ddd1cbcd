use std::fmt;

use shared::RequestConfig;

pub type DeriveFn = Box<dyn FnOnce(&RequestConfig) -> RequestConfig + Send>;

/// Per-call adjustment of the base configuration.
pub enum Override {
    /// Partial config. Under merge its keys replace the base's.
    Partial(RequestConfig),
    /// Function of the base config. Under merge the base's keys replace the
    /// derived ones, so only keys the base lacks survive from the result.
    Derive(DeriveFn),
}

impl Override {
    pub fn derive<F>(derive: F) -> Self
    where
        F: FnOnce(&RequestConfig) -> RequestConfig + Send + 'static,
    {
        Self::Derive(Box::new(derive))
    }
}

impl Default for Override {
    fn default() -> Self {
        Self::Partial(RequestConfig::default())
    }
}

impl From<RequestConfig> for Override {
    fn from(value: RequestConfig) -> Self {
        Self::Partial(value)
    }
}

impl fmt::Debug for Override {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Override::Partial(config) => f.debug_tuple("Partial").field(config).finish(),
            Override::Derive(_) => f.write_str("Derive(..)"),
        }
    }
}

/// Computes the effective configuration for one call.
///
/// `merge = false` discards the base entirely. A panicking derive function is
/// not caught; it unwinds into the caller before any state is touched.
pub fn merge_config(base: &RequestConfig, over: Override, merge: bool) -> RequestConfig {
    match over {
        Override::Derive(derive) => {
            let mut result = derive(base);
            if merge {
                result.overlay(base);
            }
            result
        }
        Override::Partial(partial) => {
            if !merge {
                return partial;
            }
            let mut effective = base.clone();
            effective.overlay(&partial);
            effective
        }
    }
}

#[cfg(test)]
#[path = "tests/merge_tests.rs"]
mod tests;
