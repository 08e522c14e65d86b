//! Validation Diagnostics
//! Mission: Make every rejection observable without leaking it to the caller

use crate::auth::models::DenyReason;
use parking_lot::Mutex;
use tracing::{debug, warn};

/// Sink for validation diagnostics, injected into the validator
pub trait Diagnostics: Send + Sync {
    /// A validation step rejected the token.
    fn denied(&self, reason: &DenyReason);

    /// Durations measured by the time-window policy, in seconds.
    fn time_window(&self, iat_duration: i64, exp_duration: i64) {
        let _ = (iat_duration, exp_duration);
    }
}

/// Default sink: structured `tracing` events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn denied(&self, reason: &DenyReason) {
        warn!(reason = reason.kind(), detail = %reason, "🚫 Token rejected");
    }

    fn time_window(&self, iat_duration: i64, exp_duration: i64) {
        debug!(iat_duration, exp_duration, "Token time window measured");
    }
}

/// Sink that keeps everything in memory, for assertions
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    denials: Mutex<Vec<DenyReason>>,
    windows: Mutex<Vec<(i64, i64)>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn denials(&self) -> Vec<DenyReason> {
        self.denials.lock().clone()
    }

    pub fn windows(&self) -> Vec<(i64, i64)> {
        self.windows.lock().clone()
    }

    pub fn last_denial(&self) -> Option<DenyReason> {
        self.denials.lock().last().cloned()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn denied(&self, reason: &DenyReason) {
        self.denials.lock().push(reason.clone());
    }

    fn time_window(&self, iat_duration: i64, exp_duration: i64) {
        self.windows.lock().push((iat_duration, exp_duration));
    }
}
