//! Ecological strain factor derived from sensor readings.
//!
//! The ecological-sensor feed reports four 0-100 strain indicators per
//! destination. Their normalized sum maps to one of three bands:
//!
//! | Normalized strain | Band   | Factor |
//! |-------------------|--------|--------|
//! | `<= 0.4`          | low    | 1.0    |
//! | `0.4 < s <= 0.7`  | medium | 0.9    |
//! | `> 0.7`           | high   | 0.8    |
//!
//! Missing indicator data never aborts the computation: an absent
//! indicator set degrades to the low-strain factor with the `degraded`
//! flag set, so the caller can tell a quiet sensor feed apart from a
//! genuinely low-strain reading.

use trailgate_types::{EcologicalIndicators, StrainBand, StrainReading};

/// Factor for the low-strain band (neutral).
pub const LOW_STRAIN_FACTOR: f64 = 1.0;

/// Factor for the medium-strain band.
pub const MEDIUM_STRAIN_FACTOR: f64 = 0.9;

/// Factor for the high-strain band.
pub const HIGH_STRAIN_FACTOR: f64 = 0.8;

/// Upper bound (inclusive) of the low-strain band.
const LOW_BAND_CEILING: f64 = 0.4;

/// Upper bound (inclusive) of the medium-strain band.
const MEDIUM_BAND_CEILING: f64 = 0.7;

/// Sum of the maxima of the four indicator readings.
const INDICATOR_SCALE: f64 = 400.0;

/// Clamp a single sensor reading into the conceptual 0-100 range.
///
/// Non-finite readings count as zero; out-of-range readings saturate.
const fn clamp_reading(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Evaluate the strain indicators into a factor, band, and degraded flag.
///
/// `None` indicators degrade to the low-strain band with `degraded` set.
/// Total: no input aborts the computation.
pub const fn strain_reading(indicators: Option<&EcologicalIndicators>) -> StrainReading {
    let Some(readings) = indicators else {
        return StrainReading {
            factor: LOW_STRAIN_FACTOR,
            band: StrainBand::Low,
            degraded: true,
        };
    };

    let total = clamp_reading(readings.soil_compaction)
        + clamp_reading(readings.vegetation_disturbance)
        + clamp_reading(readings.wildlife_disturbance)
        + clamp_reading(readings.water_source_impact);
    let normalized = total / INDICATOR_SCALE;

    let (band, factor) = if normalized <= LOW_BAND_CEILING {
        (StrainBand::Low, LOW_STRAIN_FACTOR)
    } else if normalized <= MEDIUM_BAND_CEILING {
        (StrainBand::Medium, MEDIUM_STRAIN_FACTOR)
    } else {
        (StrainBand::High, HIGH_STRAIN_FACTOR)
    };

    StrainReading {
        factor,
        band,
        degraded: false,
    }
}

/// Convenience wrapper returning only the capacity factor.
pub const fn strain_factor(indicators: Option<&EcologicalIndicators>) -> f64 {
    strain_reading(indicators).factor
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    fn uniform(value: f64) -> EcologicalIndicators {
        EcologicalIndicators {
            soil_compaction: value,
            vegetation_disturbance: value,
            wildlife_disturbance: value,
            water_source_impact: value,
        }
    }

    #[test]
    fn low_strain_yields_neutral_factor() {
        let reading = strain_reading(Some(&uniform(10.0)));
        assert_eq!(reading.factor, 1.0);
        assert_eq!(reading.band, StrainBand::Low);
        assert!(!reading.degraded);
    }

    #[test]
    fn medium_strain_yields_point_nine() {
        let reading = strain_reading(Some(&uniform(50.0)));
        assert_eq!(reading.factor, 0.9);
        assert_eq!(reading.band, StrainBand::Medium);
    }

    #[test]
    fn high_strain_yields_point_eight() {
        let reading = strain_reading(Some(&uniform(80.0)));
        assert_eq!(reading.factor, 0.8);
        assert_eq!(reading.band, StrainBand::High);
    }

    #[test]
    fn band_boundaries_are_inclusive_below() {
        // normalized == 0.4 exactly -> still low band.
        assert_eq!(strain_factor(Some(&uniform(40.0))), 1.0);
        // normalized == 0.7 exactly -> still medium band.
        assert_eq!(strain_factor(Some(&uniform(70.0))), 0.9);
        // Just above the medium ceiling -> high band.
        assert_eq!(strain_factor(Some(&uniform(70.4))), 0.8);
    }

    #[test]
    fn absent_indicators_degrade_to_low_strain() {
        let reading = strain_reading(None);
        assert_eq!(reading.factor, 1.0);
        assert_eq!(reading.band, StrainBand::Low);
        assert!(reading.degraded);
    }

    #[test]
    fn out_of_range_readings_are_clamped() {
        let indicators = EcologicalIndicators {
            soil_compaction: 250.0,
            vegetation_disturbance: -40.0,
            wildlife_disturbance: 100.0,
            water_source_impact: 100.0,
        };
        // Clamped sum is 300 -> normalized 0.75 -> high band.
        assert_eq!(strain_factor(Some(&indicators)), 0.8);
    }

    #[test]
    fn non_finite_readings_count_as_zero() {
        let indicators = EcologicalIndicators {
            soil_compaction: f64::NAN,
            vegetation_disturbance: f64::INFINITY,
            wildlife_disturbance: 0.0,
            water_source_impact: 0.0,
        };
        let reading = strain_reading(Some(&indicators));
        assert_eq!(reading.factor, 1.0);
        assert_eq!(reading.band, StrainBand::Low);
    }
}
