//! Dynamic capacity computation.
//!
//! The engine folds the tier policy, weather alert level, season, strain
//! reading, and any manual override into one combined multiplier and
//! applies it to the destination's remaining physical capacity:
//!
//! ```text
//! remaining  = max(0, max_capacity - current_occupancy)
//! combined   = tier * weather * season * strain * override
//! adjusted   = current_occupancy + floor(remaining * combined)
//! available  = adjusted - current_occupancy
//! ```
//!
//! The computation is total over degraded inputs: absent weather or
//! ecological data resolves to neutral factors and is reported through
//! `degraded_inputs`, never as an error. Policy and override lookups each
//! read one immutable snapshot for the duration of the call, so a
//! concurrent administrator write is either fully visible or not at all.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use trailgate_types::{
    CapacityResult, DestinationSnapshot, EcologicalIndicators, FactorFlags, Policy,
    SensitivityTier, WeatherSnapshot,
};
use tracing::debug;

use crate::config::{FactorTuningConfig, WeatherFactorConfig};
use crate::error::EngineError;
use crate::overrides::CapacityOverrideRegistry;
use crate::policy::PolicyStore;
use crate::season::season_factor;
use crate::strain::strain_reading;

/// Orchestrates the capacity factors into an adjusted capacity with an
/// explainable breakdown.
#[derive(Debug)]
pub struct DynamicCapacityEngine {
    policies: Arc<PolicyStore>,
    overrides: Arc<CapacityOverrideRegistry>,
    tuning: FactorTuningConfig,
}

impl DynamicCapacityEngine {
    /// Create an engine over the given policy and override stores.
    pub const fn new(
        policies: Arc<PolicyStore>,
        overrides: Arc<CapacityOverrideRegistry>,
        tuning: FactorTuningConfig,
    ) -> Self {
        Self {
            policies,
            overrides,
            tuning,
        }
    }

    /// Current policy for a tier (fail-open, see [`PolicyStore::get`]).
    pub fn policy_for(&self, tier: SensitivityTier) -> Policy {
        self.policies.get(tier)
    }

    /// Compute the adjusted capacity for a destination right now.
    ///
    /// `weather` and `indicators` are optional; their absence degrades to
    /// neutral factors and is surfaced in
    /// [`CapacityResult::degraded_inputs`].
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidSnapshot`] if `max_capacity` is zero.
    /// No other input combination fails.
    pub fn compute_capacity(
        &self,
        destination: &DestinationSnapshot,
        weather: Option<&WeatherSnapshot>,
        indicators: Option<&EcologicalIndicators>,
        now: DateTime<Utc>,
    ) -> Result<CapacityResult, EngineError> {
        if destination.max_capacity == 0 {
            return Err(EngineError::InvalidSnapshot {
                reason: "max_capacity must be at least 1".to_owned(),
            });
        }

        let mut degraded_inputs = Vec::new();

        let policy = self.policies.get(destination.sensitivity_tier);
        let sensitivity_multiplier = policy.capacity_multiplier;

        let weather_multiplier = weather.map_or_else(
            || {
                degraded_inputs.push("weather snapshot missing".to_owned());
                WeatherFactorConfig::NEUTRAL
            },
            |snapshot| self.tuning.weather.factor_for(snapshot.alert_level),
        );

        let season_multiplier = season_factor(now);

        let strain = strain_reading(indicators);
        if strain.degraded {
            degraded_inputs.push("ecological indicators missing".to_owned());
        }

        let manual_override = self.overrides.effective(destination.id, now);
        let override_multiplier = manual_override
            .as_ref()
            .map_or(1.0, |record| record.multiplier);

        let combined_multiplier = sensitivity_multiplier
            * weather_multiplier
            * season_multiplier
            * strain.factor
            * override_multiplier;

        let remaining = destination.remaining_physical();
        let available_spots = discounted_spots(remaining, combined_multiplier);
        let adjusted_capacity = destination
            .current_occupancy
            .saturating_add(available_spots);

        let mut active_factors = Vec::new();
        let mut factor_flags = FactorFlags::default();
        if self.is_active(sensitivity_multiplier) {
            factor_flags.sensitivity = true;
            active_factors.push(format!(
                "sensitivity tier ({})",
                destination.sensitivity_tier
            ));
        }
        if self.is_active(weather_multiplier) {
            factor_flags.weather = true;
            let level = weather
                .and_then(|snapshot| snapshot.alert_level)
                .map_or_else(|| "unknown".to_owned(), |level| level.to_string());
            active_factors.push(format!("weather alert ({level})"));
        }
        if self.is_active(season_multiplier) {
            factor_flags.season = true;
            active_factors.push("high season".to_owned());
        }
        if self.is_active(strain.factor) {
            factor_flags.ecological = true;
            active_factors.push(format!("ecological strain ({})", strain.band));
        }
        if self.is_active(override_multiplier) {
            factor_flags.manual_override = true;
            let reason = manual_override
                .as_ref()
                .map_or("", |record| record.reason.as_str());
            active_factors.push(format!("manual override ({reason})"));
        }

        if !degraded_inputs.is_empty() {
            debug!(
                destination_id = %destination.id,
                degraded = ?degraded_inputs,
                "capacity computed with degraded inputs"
            );
        }

        Ok(CapacityResult {
            adjusted_capacity,
            available_spots,
            combined_multiplier,
            active_factors,
            factor_flags,
            degraded_inputs,
        })
    }

    /// Whether a factor moved far enough from neutral to count as active.
    const fn is_active(&self, multiplier: f64) -> bool {
        (multiplier - 1.0).abs() > self.tuning.activation_epsilon
    }
}

/// Apply a multiplier to a spot count, flooring to whole visitors.
///
/// Total over any multiplier value: non-finite or negative products
/// collapse to zero and oversized products saturate.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn discounted_spots(remaining: u32, multiplier: f64) -> u32 {
    let scaled = (f64::from(remaining) * multiplier).floor();
    if !scaled.is_finite() || scaled <= 0.0 {
        0
    } else if scaled >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        scaled as u32
    }
}
