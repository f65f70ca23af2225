// app/src/services/alerts.rs

//! Security alerts raised by reconciliation.

use parking_lot::Mutex;
use tracing::warn;

pub const SECURITY_TARGET: &str = "sealcart::security";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecurityAlert {
  /// The digest re-derived from stored values differs from the stored digest.
  DigestMismatch {
    order_id: i64,
    invoice: String,
    stored_digest: String,
    recomputed_digest: String,
  },
}

pub trait AlertSink: Send + Sync {
  fn raise(&self, alert: SecurityAlert);
}

/// Emits alerts as WARN events under the `sealcart::security` target.
#[derive(Debug, Default)]
pub struct TracingAlertSink;

impl AlertSink for TracingAlertSink {
  fn raise(&self, alert: SecurityAlert) {
    match alert {
      SecurityAlert::DigestMismatch {
        order_id,
        invoice,
        stored_digest,
        recomputed_digest,
      } => warn!(
        target: SECURITY_TARGET,
        order_id,
        %invoice,
        %stored_digest,
        %recomputed_digest,
        "Order digest mismatch; stored order may have been tampered with."
      ),
    }
  }
}

/// Keeps alerts in memory and forwards them to tracing.
#[derive(Debug, Default)]
pub struct RecordingAlertSink {
  alerts: Mutex<Vec<SecurityAlert>>,
}

impl RecordingAlertSink {
  pub fn alerts(&self) -> Vec<SecurityAlert> {
    self.alerts.lock().clone()
  }
}

impl AlertSink for RecordingAlertSink {
  fn raise(&self, alert: SecurityAlert) {
    TracingAlertSink.raise(alert.clone());
    self.alerts.lock().push(alert);
  }
}
