//! Request counter module.
//!
//! Counts completed requests across all worker threads and persists the
//! total as its profile payload, so a restarted process keeps counting from
//! where the previous one stopped.

use std::sync::atomic::{AtomicU64, Ordering};

use extreg_sdk::prelude::*;
use extreg_sdk::tracing::{debug, info};

/// Module name.
pub const NAME: &str = "request_counter";

/// Counts completed requests.
#[derive(Debug, Default)]
pub struct RequestCounter {
    requests: AtomicU64,
    in_flight: AtomicU64,
    active_threads: AtomicU64,
}

impl RequestCounter {
    /// Creates a counter starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Completed requests so far.
    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// Worker threads currently started.
    pub fn active_threads(&self) -> u64 {
        self.active_threads.load(Ordering::Relaxed)
    }
}

impl Module for RequestCounter {
    fn name(&self) -> &str {
        NAME
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn on_load(&self, settings: &Value) -> RegistryResult<()> {
        let start = extreg_sdk::setting!(settings, "start", as_u64, 0);
        if start > 0 {
            self.requests.fetch_max(start, Ordering::Relaxed);
        }
        debug!(start, "request_counter loaded");
        Ok(())
    }

    fn on_shutdown(&self) {
        info!(requests = self.requests(), "request_counter shutting down");
    }

    fn on_thread_start(&self) {
        self.active_threads.fetch_add(1, Ordering::Relaxed);
    }

    fn on_thread_stop(&self) {
        self.active_threads.fetch_sub(1, Ordering::Relaxed);
    }

    fn on_request_start(&self) {
        self.in_flight.fetch_add(1, Ordering::Relaxed);
    }

    fn on_request_stop(&self) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    fn serialize_profile(&self) -> Vec<u8> {
        match self.requests() {
            0 => Vec::new(),
            n => n.to_le_bytes().to_vec(),
        }
    }

    fn deserialize_profile(&self, payload: Vec<u8>) -> RegistryResult<()> {
        let bytes: [u8; 8] = payload.as_slice().try_into().map_err(|_| {
            RegistryError::serialization(format!(
                "request_counter profile must be 8 bytes, got {}",
                payload.len()
            ))
        })?;
        self.requests.store(u64::from_le_bytes(bytes), Ordering::Relaxed);
        Ok(())
    }
}

extreg_sdk::declare_module!(RequestCounter::new());

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_completed_requests() {
        let counter = RequestCounter::new();
        counter.on_thread_start();
        for _ in 0..3 {
            counter.on_request_start();
            counter.on_request_stop();
        }
        assert_eq!(counter.requests(), 3);
        assert_eq!(counter.active_threads(), 1);
        counter.on_thread_stop();
        assert_eq!(counter.active_threads(), 0);
    }

    #[test]
    fn test_profile_round_trip() {
        let counter = RequestCounter::new();
        assert!(counter.serialize_profile().is_empty());

        counter.on_request_start();
        counter.on_request_stop();
        let payload = counter.serialize_profile();

        let restored = RequestCounter::new();
        restored.deserialize_profile(payload).unwrap();
        assert_eq!(restored.requests(), 1);
    }

    #[test]
    fn test_rejects_malformed_profile() {
        let err = RequestCounter::new()
            .deserialize_profile(vec![1, 2, 3])
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Serialization);
    }

    #[test]
    fn test_start_setting() {
        let counter = RequestCounter::new();
        counter
            .on_load(&serde_json_value(r#"{"start": 40}"#))
            .unwrap();
        assert_eq!(counter.requests(), 40);
    }

    fn serde_json_value(text: &str) -> Value {
        text.parse().unwrap()
    }
}
