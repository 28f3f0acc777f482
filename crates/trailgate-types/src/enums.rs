//! Enumeration types for the Trailgate admission engine.
//!
//! These enums cross every boundary of the system: they appear in the
//! durable store, in capacity computations, and in the dashboard bindings
//! exported via `ts-rs`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Sensitivity tiers
// ---------------------------------------------------------------------------

/// Ecological fragility classification attached to a destination.
///
/// The tier drives the base capacity discount via the per-tier [`Policy`]
/// table and never changes at runtime. Ordering reflects increasing
/// fragility: `Low < Medium < High < Critical`.
///
/// [`Policy`]: crate::Policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "lowercase")]
pub enum SensitivityTier {
    /// Resilient terrain, no meaningful capacity discount.
    Low,
    /// Moderately fragile, discounted capacity.
    Medium,
    /// Fragile, heavily discounted capacity, permits required.
    High,
    /// Closed to general bookings regardless of computed capacity.
    Critical,
}

impl SensitivityTier {
    /// All tiers in ascending fragility order.
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    /// Stable lowercase name used in the durable store and log fields.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Parse a stored tier name. Returns `None` for unrecognized names
    /// so the caller can apply the fail-open fallback.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl core::fmt::Display for SensitivityTier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Alert levels
// ---------------------------------------------------------------------------

/// Severity scale shared by weather alerts and standing advisories.
///
/// Ordering matters: the weather capacity factor must be monotonically
/// non-increasing in this severity, which the derived `Ord` makes testable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    /// No alert.
    None,
    /// Minor conditions worth noting.
    Low,
    /// Conditions that warrant reduced admissions.
    Medium,
    /// Hazardous conditions.
    High,
    /// Dangerous conditions, admissions cut to the minimum.
    Critical,
}

impl AlertLevel {
    /// All levels in ascending severity order.
    pub const ALL: [Self; 5] = [
        Self::None,
        Self::Low,
        Self::Medium,
        Self::High,
        Self::Critical,
    ];

    /// Stable lowercase name used in log fields and bindings.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Parse a stored level name. Returns `None` for unrecognized names.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "none" => Some(Self::None),
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl core::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Weather conditions
// ---------------------------------------------------------------------------

/// Categorical weather condition reported by the weather provider.
///
/// Mirrors the provider's condition groups; the hazard classifier only
/// distinguishes [`Thunderstorm`](Self::Thunderstorm) from the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "lowercase")]
pub enum WeatherCondition {
    /// Clear sky.
    Clear,
    /// Cloud cover.
    Clouds,
    /// Rain.
    Rain,
    /// Light rain.
    Drizzle,
    /// Thunderstorm activity.
    Thunderstorm,
    /// Snowfall.
    Snow,
    /// Mist.
    Mist,
    /// Fog.
    Fog,
}

// ---------------------------------------------------------------------------
// Ecological strain bands
// ---------------------------------------------------------------------------

/// Aggregated ecological strain band derived from sensor readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "lowercase")]
pub enum StrainBand {
    /// Normalized strain at or below 0.4 -- no capacity discount.
    Low,
    /// Normalized strain above 0.4 up to 0.7.
    Medium,
    /// Normalized strain above 0.7.
    High,
}

impl StrainBand {
    /// Stable lowercase name used in factor labels and log fields.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl core::fmt::Display for StrainBand {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
