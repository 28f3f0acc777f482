//! Seasonal capacity factor derived from the calendar date.
//!
//! Destinations see the bulk of their visitor pressure between May and
//! October. During that window the engine discounts remaining capacity by
//! a fixed factor; the rest of the year is neutral.
//!
//! The calculation is based on the UTC calendar month of the supplied
//! instant. Callers that care about a destination's local season should
//! convert before calling -- the function itself is deterministic for a
//! given instant regardless of the host time zone.

use chrono::{DateTime, Datelike, Utc};

/// Capacity factor applied during the May-October high season.
pub const HIGH_SEASON_FACTOR: f64 = 0.8;

/// Neutral factor outside the high season.
pub const OFF_SEASON_FACTOR: f64 = 1.0;

/// First month (inclusive) of the high season.
const HIGH_SEASON_START_MONTH: u32 = 5;

/// Last month (inclusive) of the high season.
const HIGH_SEASON_END_MONTH: u32 = 10;

/// Whether the given 1-based calendar month falls in the high season.
pub const fn is_high_season(month: u32) -> bool {
    month >= HIGH_SEASON_START_MONTH && month <= HIGH_SEASON_END_MONTH
}

/// Return the seasonal capacity factor for the given instant.
///
/// Months May through October (UTC) yield [`HIGH_SEASON_FACTOR`]; all
/// other months yield [`OFF_SEASON_FACTOR`]. Pure and total.
pub fn season_factor(date: DateTime<Utc>) -> f64 {
    if is_high_season(date.month()) {
        HIGH_SEASON_FACTOR
    } else {
        OFF_SEASON_FACTOR
    }
}
