//! Error types for the admission core.
//!
//! The taxonomy separates caller input errors (rejected operations) from
//! store failures (uncommitted administrator writes). Degraded inputs --
//! missing weather or sensor data -- are not errors at all: they resolve
//! to neutral factors and are surfaced through `CapacityResult`.

use trailgate_types::SensitivityTier;

use crate::store::StoreError;

/// Errors from the capacity engine.
///
/// The engine is total over degraded inputs; the only failure is a
/// structurally invalid destination snapshot.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The caller supplied a structurally invalid destination snapshot.
    #[error("invalid destination snapshot: {reason}")]
    InvalidSnapshot {
        /// What made the snapshot invalid.
        reason: String,
    },
}

/// Errors from the admission controller.
#[derive(Debug, thiserror::Error)]
pub enum AdmissionError {
    /// The requested group size is not a positive count. This is a caller
    /// input error, distinct from a capacity denial.
    #[error("group size must be at least 1, got {group_size}")]
    InvalidGroupSize {
        /// The rejected group size.
        group_size: u32,
    },

    /// The underlying capacity computation rejected its input.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Errors from an administrator policy update.
#[derive(Debug, thiserror::Error)]
pub enum PolicyUpdateError {
    /// The merged multiplier would leave the `(0, 1]` range.
    #[error("capacity multiplier must be in (0, 1], got {value}")]
    InvalidMultiplier {
        /// The rejected multiplier.
        value: f64,
    },

    /// The merged policy would strip the critical tier's restriction
    /// message, which must always be present.
    #[error("the {tier} tier requires a booking restriction message")]
    MissingRestrictionMessage {
        /// The tier whose invariant would be violated.
        tier: SensitivityTier,
    },

    /// Persisting the update failed; the update is not committed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from an administrator override write.
#[derive(Debug, thiserror::Error)]
pub enum OverrideUpdateError {
    /// The override multiplier is not a positive finite number.
    #[error("override multiplier must be a positive finite number, got {value}")]
    InvalidMultiplier {
        /// The rejected multiplier.
        value: f64,
    },

    /// Persisting the override failed; the write is not committed.
    #[error(transparent)]
    Store(#[from] StoreError),
}
