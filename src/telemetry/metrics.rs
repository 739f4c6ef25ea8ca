//! Metrics collection for decode statistics.
//!
//! Provides thread-safe counters for tracking how many datagrams were
//! decoded, how many failed checksum verification, and how many were
//! rejected outright.

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counter for thread-safe increment operations.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    /// Creates a new counter initialized to zero.
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// Increments the counter by 1.
    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    /// Adds a value to the counter.
    pub fn add(&self, val: u64) {
        self.0.fetch_add(val, Ordering::Relaxed);
    }

    /// Gets the current value of the counter.
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Running totals for a batch of decoded datagrams.
#[derive(Debug, Default)]
pub struct DecodeStats {
    /// Number of datagrams decoded successfully.
    pub decoded: Counter,
    /// Number of payload bytes across all decoded datagrams.
    pub payload_bytes: Counter,
    /// Number of decoded datagrams whose checksum did not verify.
    pub checksum_failures: Counter,
    /// Number of buffers rejected before a header could be extracted.
    pub decode_errors: Counter,
}

impl DecodeStats {
    /// Creates new decode statistics initialized to zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successfully decoded datagram.
    pub fn record_decoded(&self, payload_len: usize, checksum_valid: bool) {
        self.decoded.inc();
        self.payload_bytes.add(payload_len as u64);
        if !checksum_valid {
            self.checksum_failures.inc();
        }
    }

    /// Records a buffer that could not be decoded.
    pub fn record_error(&self) {
        self.decode_errors.inc();
    }

    /// Exports all counters as key-value pairs.
    ///
    /// This format is designed to be easily convertible to Prometheus format
    /// in the future.
    pub fn export(&self) -> Vec<(String, u64)> {
        vec![
            ("datagrams_decoded".into(), self.decoded.get()),
            ("payload_bytes".into(), self.payload_bytes.get()),
            ("checksum_failures".into(), self.checksum_failures.get()),
            ("decode_errors".into(), self.decode_errors.get()),
        ]
    }
}
