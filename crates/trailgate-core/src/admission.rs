//! Booking admission decisions.
//!
//! The controller sits on top of the capacity engine and answers one
//! question per booking request: may this group enter right now. The
//! critical tier is an absolute policy gate evaluated before any capacity
//! math; every other tier is a straight comparison of the group size
//! against the computed available spots.

use chrono::{DateTime, Utc};
use trailgate_types::{
    AdmissionDecision, DestinationSnapshot, EcologicalIndicators, SensitivityTier,
    WeatherSnapshot,
};
use tracing::debug;

use crate::engine::DynamicCapacityEngine;
use crate::error::AdmissionError;

/// Fallback denial text when the critical policy somehow lacks a message.
const CRITICAL_FALLBACK_MESSAGE: &str =
    "This destination is closed to bookings due to critical ecological sensitivity";

/// Accepts or rejects booking requests against current capacity and
/// policy.
#[derive(Debug)]
pub struct AdmissionController {
    engine: DynamicCapacityEngine,
}

impl AdmissionController {
    /// Create a controller over a capacity engine.
    pub const fn new(engine: DynamicCapacityEngine) -> Self {
        Self { engine }
    }

    /// Borrow the underlying capacity engine.
    pub const fn engine(&self) -> &DynamicCapacityEngine {
        &self.engine
    }

    /// Decide whether a booking of `group_size` visitors may proceed.
    ///
    /// Critical-tier destinations are denied regardless of computed
    /// capacity, with the tier's configured restriction message as the
    /// reason. For every other tier the group is admitted iff it fits in
    /// the available spots.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::InvalidGroupSize`] for a zero group size
    /// (a caller input error, distinct from a capacity denial) and
    /// propagates [`AdmissionError::Engine`] for a structurally invalid
    /// destination snapshot.
    pub fn is_booking_allowed(
        &self,
        destination: &DestinationSnapshot,
        group_size: u32,
        weather: Option<&WeatherSnapshot>,
        indicators: Option<&EcologicalIndicators>,
        now: DateTime<Utc>,
    ) -> Result<AdmissionDecision, AdmissionError> {
        if group_size == 0 {
            return Err(AdmissionError::InvalidGroupSize { group_size });
        }

        if destination.sensitivity_tier == SensitivityTier::Critical {
            let policy = self.engine.policy_for(SensitivityTier::Critical);
            let reason = policy
                .booking_restriction_message
                .unwrap_or_else(|| CRITICAL_FALLBACK_MESSAGE.to_owned());
            debug!(
                destination_id = %destination.id,
                "booking denied by the critical-tier policy gate"
            );
            return Ok(AdmissionDecision {
                allowed: false,
                reason: Some(reason),
            });
        }

        let capacity = self
            .engine
            .compute_capacity(destination, weather, indicators, now)?;

        if group_size > capacity.available_spots {
            return Ok(AdmissionDecision {
                allowed: false,
                reason: Some(format!(
                    "only {} spots available at this {}-sensitivity destination",
                    capacity.available_spots, destination.sensitivity_tier
                )),
            });
        }

        Ok(AdmissionDecision {
            allowed: true,
            reason: None,
        })
    }
}
