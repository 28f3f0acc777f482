//! Weather hazard classification for standing advisories.
//!
//! The classifier turns a weather snapshot into an alert recommendation.
//! It is independent of the capacity engine: its severity drives operator
//! advisories, while the capacity discount for weather comes from the
//! provider's alert level via the weather factor table. The two signals
//! must not be conflated.
//!
//! Rules are evaluated in priority order and the first match wins.

use trailgate_types::{AlertLevel, HazardAssessment, WeatherCondition, WeatherSnapshot};

/// Temperature (degrees Celsius) at or above which extreme heat is flagged.
pub const EXTREME_HEAT_CELSIUS: f64 = 40.0;

/// Precipitation probability at or above which a thunderstorm is hazardous.
pub const STORM_PRECIPITATION_PROBABILITY: f64 = 0.7;

/// Visibility (meters) below which a thunderstorm is hazardous.
pub const STORM_LOW_VISIBILITY_METERS: f64 = 1000.0;

/// Classify a weather snapshot into a hazard alert recommendation.
///
/// Rules, first match wins:
///
/// 1. Temperature at or above [`EXTREME_HEAT_CELSIUS`] -> high severity,
///    extreme heat.
/// 2. Thunderstorm conditions combined with high precipitation
///    probability or low visibility -> high severity, thunderstorm.
/// 3. Otherwise no alert.
pub fn classify(weather: &WeatherSnapshot) -> HazardAssessment {
    if weather.temperature >= EXTREME_HEAT_CELSIUS {
        return HazardAssessment {
            should_alert: true,
            severity: Some(AlertLevel::High),
            reason: Some(format!(
                "extreme heat: temperature at {:.1}\u{b0}C",
                weather.temperature
            )),
        };
    }

    if weather.weather_main == WeatherCondition::Thunderstorm
        && (weather.precipitation_probability >= STORM_PRECIPITATION_PROBABILITY
            || weather.visibility < STORM_LOW_VISIBILITY_METERS)
    {
        return HazardAssessment {
            should_alert: true,
            severity: Some(AlertLevel::High),
            reason: Some(format!(
                "thunderstorm with {:.0}% precipitation probability and {:.0}m visibility",
                weather.precipitation_probability * 100.0,
                weather.visibility
            )),
        };
    }

    HazardAssessment::clear()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(condition: WeatherCondition) -> WeatherSnapshot {
        WeatherSnapshot {
            temperature: 22.0,
            humidity: 55.0,
            wind_speed: 3.0,
            precipitation_probability: 0.1,
            visibility: 10_000.0,
            weather_main: condition,
            alert_level: None,
        }
    }

    #[test]
    fn mild_weather_produces_no_alert() {
        let assessment = classify(&snapshot(WeatherCondition::Clear));
        assert!(!assessment.should_alert);
        assert_eq!(assessment.severity, None);
        assert_eq!(assessment.reason, None);
    }

    #[test]
    fn extreme_heat_triggers_high_alert() {
        let mut weather = snapshot(WeatherCondition::Clear);
        weather.temperature = 41.5;
        let assessment = classify(&weather);
        assert!(assessment.should_alert);
        assert_eq!(assessment.severity, Some(AlertLevel::High));
        assert!(
            assessment
                .reason
                .as_deref()
                .is_some_and(|r| r.contains("extreme heat"))
        );
    }

    #[test]
    fn heat_threshold_is_inclusive() {
        let mut weather = snapshot(WeatherCondition::Clear);
        weather.temperature = EXTREME_HEAT_CELSIUS;
        assert!(classify(&weather).should_alert);
    }

    #[test]
    fn thunderstorm_with_high_precipitation_triggers_alert() {
        let mut weather = snapshot(WeatherCondition::Thunderstorm);
        weather.precipitation_probability = 0.85;
        let assessment = classify(&weather);
        assert!(assessment.should_alert);
        assert_eq!(assessment.severity, Some(AlertLevel::High));
        assert!(
            assessment
                .reason
                .as_deref()
                .is_some_and(|r| r.contains("thunderstorm"))
        );
    }

    #[test]
    fn thunderstorm_with_low_visibility_triggers_alert() {
        let mut weather = snapshot(WeatherCondition::Thunderstorm);
        weather.visibility = 400.0;
        assert!(classify(&weather).should_alert);
    }

    #[test]
    fn calm_thunderstorm_does_not_alert() {
        // Thunderstorm category without high precipitation or low
        // visibility stays below the advisory bar.
        let weather = snapshot(WeatherCondition::Thunderstorm);
        assert!(!classify(&weather).should_alert);
    }

    #[test]
    fn heat_rule_wins_over_storm_rule() {
        let mut weather = snapshot(WeatherCondition::Thunderstorm);
        weather.temperature = 45.0;
        weather.precipitation_probability = 0.9;
        let assessment = classify(&weather);
        assert!(
            assessment
                .reason
                .as_deref()
                .is_some_and(|r| r.contains("extreme heat"))
        );
    }

    #[test]
    fn heavy_rain_without_storm_category_does_not_alert() {
        let mut weather = snapshot(WeatherCondition::Rain);
        weather.precipitation_probability = 0.95;
        assert!(!classify(&weather).should_alert);
    }
}
