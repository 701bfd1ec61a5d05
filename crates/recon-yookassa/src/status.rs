//! # Provider Status Mapping
//!
//! The single place status-interpretation policy lives. Every provider
//! status string passes through `map_status`; the rest of the engine only
//! sees `ResultKind` and the action-required flag.
//!
//! `requires_payment_method` is ambiguous upstream: before a capture attempt
//! it means "awaiting a payment method", after one it means "failed". The
//! caller supplies a `CapturePhase` hint; the mapper never guesses.

use recon_core::{CapturePhase, ResultKind, StatusMapping};
use tracing::warn;

/// Statuses that need further customer interaction (pre-capture)
pub const ACTION_REQUIRED_STATUSES: &[&str] = &[
    "requires_payment_method",
    "requires_confirmation",
    "requires_action",
];

/// Statuses that read as a failed charge (post-capture)
pub const FAILED_STATUSES: &[&str] = &["requires_payment_method", "canceled"];

pub const SUCCESS_STATUS: &str = "succeeded";
pub const PROCESSING_STATUS: &str = "processing";

/// Translate a provider status string into a transaction result.
///
/// Total over all strings: an unrecognized status maps to
/// `ResultKind::Unknown` with a warning and never panics. Callers must treat
/// `Unknown` conservatively (no state advance, flag for delayed retry).
pub fn map_status(provider_status: &str, phase: CapturePhase) -> StatusMapping {
    if phase == CapturePhase::PostCapture && FAILED_STATUSES.contains(&provider_status) {
        return StatusMapping {
            kind: ResultKind::Failed,
            action_required: false,
        };
    }

    if ACTION_REQUIRED_STATUSES.contains(&provider_status) {
        return StatusMapping {
            kind: ResultKind::Pending,
            action_required: true,
        };
    }

    match provider_status {
        SUCCESS_STATUS => StatusMapping {
            kind: ResultKind::Success,
            action_required: false,
        },
        PROCESSING_STATUS => StatusMapping {
            kind: ResultKind::Processing,
            action_required: false,
        },
        "canceled" => StatusMapping {
            kind: ResultKind::Failed,
            action_required: false,
        },
        other => {
            warn!(status = other, "Unrecognized provider status");
            StatusMapping {
                kind: ResultKind::Unknown,
                action_required: false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Table-driven mapping over all six documented statuses, both phases
    #[test]
    fn test_mapping_is_total_over_documented_statuses() {
        let cases = [
            (
                "requires_payment_method",
                CapturePhase::PreCapture,
                ResultKind::Pending,
                true,
            ),
            (
                "requires_payment_method",
                CapturePhase::PostCapture,
                ResultKind::Failed,
                false,
            ),
            (
                "requires_confirmation",
                CapturePhase::PreCapture,
                ResultKind::Pending,
                true,
            ),
            (
                "requires_confirmation",
                CapturePhase::PostCapture,
                ResultKind::Pending,
                true,
            ),
            (
                "requires_action",
                CapturePhase::PreCapture,
                ResultKind::Pending,
                true,
            ),
            (
                "requires_action",
                CapturePhase::PostCapture,
                ResultKind::Pending,
                true,
            ),
            (
                "canceled",
                CapturePhase::PreCapture,
                ResultKind::Failed,
                false,
            ),
            (
                "canceled",
                CapturePhase::PostCapture,
                ResultKind::Failed,
                false,
            ),
            (
                "succeeded",
                CapturePhase::PreCapture,
                ResultKind::Success,
                false,
            ),
            (
                "succeeded",
                CapturePhase::PostCapture,
                ResultKind::Success,
                false,
            ),
            (
                "processing",
                CapturePhase::PreCapture,
                ResultKind::Processing,
                false,
            ),
            (
                "processing",
                CapturePhase::PostCapture,
                ResultKind::Processing,
                false,
            ),
        ];

        for (status, phase, kind, action_required) in cases {
            let mapping = map_status(status, phase);
            assert_eq!(mapping.kind, kind, "status={} phase={:?}", status, phase);
            assert_eq!(
                mapping.action_required, action_required,
                "status={} phase={:?}",
                status, phase
            );
        }
    }

    #[test]
    fn test_unrecognized_status_maps_to_unknown() {
        for status in ["", "waiting_for_capture", "SUCCEEDED", "🎉"] {
            let mapping = map_status(status, CapturePhase::PreCapture);
            assert_eq!(mapping.kind, ResultKind::Unknown);
            assert!(!mapping.action_required);
        }
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let first = map_status("requires_action", CapturePhase::PreCapture);
        let second = map_status("requires_action", CapturePhase::PreCapture);
        assert_eq!(first, second);
    }
}
