//! Boundary structs for the Trailgate admission engine.
//!
//! Inbound snapshots (`DestinationSnapshot`, `WeatherSnapshot`,
//! `EcologicalIndicators`) are supplied by the caller per invocation and
//! are read-only to the core. Outbound values (`CapacityResult`,
//! `AdmissionDecision`, `AlertDraft`) are produced fresh on every call and
//! never cached. Policy and override records additionally round-trip
//! through the durable store as JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{AlertLevel, SensitivityTier, StrainBand, WeatherCondition};
use crate::ids::DestinationId;

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

/// Admission policy for one sensitivity tier.
///
/// One policy exists per [`SensitivityTier`]. Policies are seeded with
/// defaults at process start, mutated only via an explicit administrator
/// update, persisted on every mutation, and reloaded on startup and on
/// receipt of a change notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Policy {
    /// Base capacity discount in `(0, 1]`. Applied to remaining physical
    /// capacity before any other factor.
    pub capacity_multiplier: f64,

    /// Whether visitors need an advance permit.
    pub requires_permit: bool,

    /// Whether visitors must complete an ecological briefing.
    pub requires_eco_briefing: bool,

    /// Severity of the standing advisory derived from this tier.
    pub alert_severity: AlertLevel,

    /// Message shown when a booking is restricted. Always present for the
    /// critical tier, whose admission decision ignores available capacity.
    pub booking_restriction_message: Option<String>,
}

impl Policy {
    /// Return a copy of this policy with the patch's set fields applied.
    #[must_use]
    pub fn merged(&self, patch: &PolicyPatch) -> Self {
        Self {
            capacity_multiplier: patch
                .capacity_multiplier
                .unwrap_or(self.capacity_multiplier),
            requires_permit: patch.requires_permit.unwrap_or(self.requires_permit),
            requires_eco_briefing: patch
                .requires_eco_briefing
                .unwrap_or(self.requires_eco_briefing),
            alert_severity: patch.alert_severity.unwrap_or(self.alert_severity),
            booking_restriction_message: patch
                .booking_restriction_message
                .clone()
                .unwrap_or_else(|| self.booking_restriction_message.clone()),
        }
    }
}

/// Partial policy update submitted by an administrator.
///
/// Unset fields keep their current value. The restriction message is
/// double-optional: `Some(None)` clears the message, `None` leaves it
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PolicyPatch {
    /// New capacity multiplier, if changing.
    pub capacity_multiplier: Option<f64>,
    /// New permit requirement, if changing.
    pub requires_permit: Option<bool>,
    /// New briefing requirement, if changing.
    pub requires_eco_briefing: Option<bool>,
    /// New advisory severity, if changing.
    pub alert_severity: Option<AlertLevel>,
    /// New restriction message; `Some(None)` clears it.
    pub booking_restriction_message: Option<Option<String>>,
}

impl PolicyPatch {
    /// True when no field is set (applying it is a no-op).
    pub const fn is_empty(&self) -> bool {
        self.capacity_multiplier.is_none()
            && self.requires_permit.is_none()
            && self.requires_eco_briefing.is_none()
            && self.alert_severity.is_none()
            && self.booking_restriction_message.is_none()
    }
}

// ---------------------------------------------------------------------------
// Capacity overrides
// ---------------------------------------------------------------------------

/// Administrator-supplied manual capacity multiplier for one destination.
///
/// At most one override is effective per destination at a time (last write
/// wins). An override with `active == false` or with `expires_at` in the
/// past is treated as absent without requiring an explicit clear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CapacityOverride {
    /// Destination this override applies to.
    pub destination_id: DestinationId,
    /// Multiplier composed with all other capacity factors.
    pub multiplier: f64,
    /// Administrator-facing justification.
    pub reason: String,
    /// Whether the override is switched on.
    pub active: bool,
    /// Expiry instant; `None` means no expiry.
    pub expires_at: Option<DateTime<Utc>>,
}

impl CapacityOverride {
    /// Whether this override should be applied at `now`.
    pub fn is_effective(&self, now: DateTime<Utc>) -> bool {
        self.active && self.expires_at.is_none_or(|expiry| expiry > now)
    }
}

// ---------------------------------------------------------------------------
// Caller-supplied snapshots
// ---------------------------------------------------------------------------

/// Point-in-time state of a destination, owned by the caller.
///
/// `current_occupancy` may legitimately exceed a previously computed
/// adjusted capacity -- occupancy changes independently of policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DestinationSnapshot {
    /// Destination identifier.
    pub id: DestinationId,
    /// Physical visitor capacity; must be at least 1.
    pub max_capacity: u32,
    /// Visitors currently on site.
    pub current_occupancy: u32,
    /// Ecological fragility classification.
    pub sensitivity_tier: SensitivityTier,
}

impl DestinationSnapshot {
    /// Physical spots left before any policy discount (never negative).
    pub const fn remaining_physical(&self) -> u32 {
        self.max_capacity.saturating_sub(self.current_occupancy)
    }
}

/// Point-in-time weather snapshot from the weather provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WeatherSnapshot {
    /// Air temperature in degrees Celsius.
    pub temperature: f64,
    /// Relative humidity in percent.
    pub humidity: f64,
    /// Wind speed in meters per second.
    pub wind_speed: f64,
    /// Precipitation probability in `[0, 1]`.
    pub precipitation_probability: f64,
    /// Visibility in meters.
    pub visibility: f64,
    /// Categorical condition.
    pub weather_main: WeatherCondition,
    /// Provider-issued alert level; `None` when the provider sent none.
    pub alert_level: Option<AlertLevel>,
}

/// Four ecological-strain sensor readings, each conceptually 0-100.
///
/// Readings outside the range are clamped by the strain evaluator rather
/// than rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EcologicalIndicators {
    /// Soil compaction along trails and camps.
    pub soil_compaction: f64,
    /// Vegetation trampling and loss.
    pub vegetation_disturbance: f64,
    /// Wildlife displacement and stress.
    pub wildlife_disturbance: f64,
    /// Contamination and depletion of water sources.
    pub water_source_impact: f64,
}

// ---------------------------------------------------------------------------
// Calculator outputs
// ---------------------------------------------------------------------------

/// Result of evaluating the four strain indicators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StrainReading {
    /// Capacity multiplier derived from the strain band.
    pub factor: f64,
    /// Which band the normalized strain fell into.
    pub band: StrainBand,
    /// True when indicator data was absent and the evaluator degraded to
    /// the neutral low-strain factor.
    pub degraded: bool,
}

/// Hazard alert recommendation derived from a weather snapshot.
///
/// This drives standing advisories and is deliberately separate from the
/// weather capacity factor -- the two signals must not be conflated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct HazardAssessment {
    /// Whether an advisory should be raised.
    pub should_alert: bool,
    /// Severity of the recommended advisory.
    pub severity: Option<AlertLevel>,
    /// Human-readable explanation of the triggering condition.
    pub reason: Option<String>,
}

impl HazardAssessment {
    /// The no-hazard assessment.
    pub const fn clear() -> Self {
        Self {
            should_alert: false,
            severity: None,
            reason: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Engine output
// ---------------------------------------------------------------------------

/// Which capacity factors moved the combined multiplier away from 1.0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FactorFlags {
    /// Sensitivity-tier discount is active.
    pub sensitivity: bool,
    /// Weather alert discount is active.
    pub weather: bool,
    /// High-season discount is active.
    pub season: bool,
    /// Ecological strain discount is active.
    pub ecological: bool,
    /// Manual administrator override is active.
    pub manual_override: bool,
}

/// Adjusted capacity with an explainable factor breakdown.
///
/// Produced fresh on every engine call and never cached across policy or
/// override mutations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CapacityResult {
    /// Occupancy plus the discounted remaining physical capacity.
    pub adjusted_capacity: u32,
    /// Spots available right now; never negative.
    pub available_spots: u32,
    /// Product of all capacity factors.
    pub combined_multiplier: f64,
    /// Human-readable labels of the factors that moved the multiplier.
    pub active_factors: Vec<String>,
    /// Per-factor activation flags for operator dashboards.
    pub factor_flags: FactorFlags,
    /// Inputs that were absent and degraded to neutral factors. Empty in
    /// a genuinely hazard-free computation, which keeps the two states
    /// distinguishable for telemetry.
    pub degraded_inputs: Vec<String>,
}

// ---------------------------------------------------------------------------
// Admission and advisories
// ---------------------------------------------------------------------------

/// Accept/deny outcome for a specific booking request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AdmissionDecision {
    /// Whether the booking may proceed.
    pub allowed: bool,
    /// Denial reason; `None` when allowed.
    pub reason: Option<String>,
}

/// Draft of a standing advisory alert for a destination.
///
/// The core only drafts advisories; persisting and dispatching them is the
/// durable store's responsibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AlertDraft {
    /// Destination the advisory concerns.
    pub destination_id: DestinationId,
    /// Advisory severity taken from the tier policy.
    pub severity: AlertLevel,
    /// Advisory message.
    pub message: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn base_policy() -> Policy {
        Policy {
            capacity_multiplier: 0.8,
            requires_permit: false,
            requires_eco_briefing: true,
            alert_severity: AlertLevel::Low,
            booking_restriction_message: None,
        }
    }

    #[test]
    fn empty_patch_is_a_no_op() {
        let policy = base_policy();
        let patch = PolicyPatch::default();
        assert!(patch.is_empty());
        assert_eq!(policy.merged(&patch), policy);
    }

    #[test]
    fn patch_merges_only_set_fields() {
        let policy = base_policy();
        let patch = PolicyPatch {
            capacity_multiplier: Some(0.5),
            requires_permit: Some(true),
            ..PolicyPatch::default()
        };
        let merged = policy.merged(&patch);
        assert!((merged.capacity_multiplier - 0.5).abs() < f64::EPSILON);
        assert!(merged.requires_permit);
        // Untouched fields keep their values.
        assert!(merged.requires_eco_briefing);
        assert_eq!(merged.alert_severity, AlertLevel::Low);
    }

    #[test]
    fn patch_can_clear_restriction_message() {
        let mut policy = base_policy();
        policy.booking_restriction_message = Some("restricted".to_owned());
        let patch = PolicyPatch {
            booking_restriction_message: Some(None),
            ..PolicyPatch::default()
        };
        assert_eq!(policy.merged(&patch).booking_restriction_message, None);
    }

    #[test]
    fn override_inactive_is_not_effective() {
        let now = Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap();
        let ovr = CapacityOverride {
            destination_id: DestinationId::new(),
            multiplier: 0.5,
            reason: "trail maintenance".to_owned(),
            active: false,
            expires_at: None,
        };
        assert!(!ovr.is_effective(now));
    }

    #[test]
    fn override_expired_is_not_effective() {
        let now = Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap();
        let ovr = CapacityOverride {
            destination_id: DestinationId::new(),
            multiplier: 0.5,
            reason: "storm damage".to_owned(),
            active: true,
            expires_at: Some(now - chrono::Duration::hours(1)),
        };
        assert!(!ovr.is_effective(now));
    }

    #[test]
    fn override_without_expiry_is_effective_while_active() {
        let now = Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap();
        let ovr = CapacityOverride {
            destination_id: DestinationId::new(),
            multiplier: 0.5,
            reason: "restoration".to_owned(),
            active: true,
            expires_at: None,
        };
        assert!(ovr.is_effective(now));
    }

    #[test]
    fn remaining_physical_saturates_at_zero() {
        let snapshot = DestinationSnapshot {
            id: DestinationId::new(),
            max_capacity: 100,
            current_occupancy: 130,
            sensitivity_tier: SensitivityTier::Medium,
        };
        assert_eq!(snapshot.remaining_physical(), 0);
    }

    #[test]
    fn policy_roundtrip_serde() {
        let policy = base_policy();
        let json = serde_json::to_string(&policy).unwrap();
        let restored: Policy = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, policy);
    }
}
