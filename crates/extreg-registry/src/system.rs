//! Process-wide "fully initialized" marker shared between the host and modules.

use std::sync::atomic::{AtomicBool, Ordering};

/// Runtime-wide initialization marker.
///
/// The host marks the runtime initialized once its own bootstrap is done.
/// While the registry runs module init hooks the marker reads as not
/// initialized, so work a hook triggers sees the runtime as mid-bootstrap.
#[derive(Debug, Default)]
pub struct SystemState {
    initialized: AtomicBool,
}

impl SystemState {
    /// Creates a marker in the not-initialized state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the runtime reports itself fully initialized.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Sets the marker.
    pub fn set_initialized(&self, value: bool) {
        self.initialized.store(value, Ordering::Release);
    }

    /// Clears the marker until the returned guard is dropped, which restores
    /// the previous value on every exit path.
    pub(crate) fn enter_bootstrap(&self) -> BootstrapGuard<'_> {
        let previous = self.initialized.swap(false, Ordering::AcqRel);
        BootstrapGuard {
            state: self,
            previous,
        }
    }
}

/// Restores the marker when dropped.
#[derive(Debug)]
pub(crate) struct BootstrapGuard<'a> {
    state: &'a SystemState,
    previous: bool,
}

impl Drop for BootstrapGuard<'_> {
    fn drop(&mut self) {
        self.state.set_initialized(self.previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_restores_previous_value() {
        let state = SystemState::new();
        state.set_initialized(true);
        {
            let _guard = state.enter_bootstrap();
            assert!(!state.is_initialized());
        }
        assert!(state.is_initialized());
    }

    #[test]
    fn test_guard_restores_false() {
        let state = SystemState::new();
        {
            let _guard = state.enter_bootstrap();
            state.set_initialized(true);
        }
        assert!(!state.is_initialized());
    }
}
