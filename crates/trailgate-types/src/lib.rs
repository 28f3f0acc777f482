//! Shared type definitions for the Trailgate admission engine.
//!
//! This crate is the single source of truth for the types that cross the
//! admission-engine boundary. Types defined here flow downstream to
//! `TypeScript` via `ts-rs` for the operator dashboard.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for entity identifiers
//! - [`enums`] -- Enumeration types (tiers, alert levels, weather, strain)
//! - [`structs`] -- Boundary structs (policies, overrides, snapshots, results)

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{AlertLevel, SensitivityTier, StrainBand, WeatherCondition};
pub use ids::{AlertId, DestinationId};
pub use structs::{
    AdmissionDecision, AlertDraft, CapacityOverride, CapacityResult, DestinationSnapshot,
    EcologicalIndicators, FactorFlags, HazardAssessment, Policy, PolicyPatch, StrainReading,
    WeatherSnapshot,
};

#[cfg(test)]
mod tests {
    //! Integration tests for type exports and `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // ts-rs generates TypeScript bindings when types with
        // #[ts(export)] are used. Importing them here triggers generation.
        // The actual files are written to the `bindings/` directory
        // relative to the crate root.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::DestinationId::export_all();
        let _ = crate::ids::AlertId::export_all();

        // Enums
        let _ = crate::enums::SensitivityTier::export_all();
        let _ = crate::enums::AlertLevel::export_all();
        let _ = crate::enums::WeatherCondition::export_all();
        let _ = crate::enums::StrainBand::export_all();

        // Structs
        let _ = crate::structs::Policy::export_all();
        let _ = crate::structs::PolicyPatch::export_all();
        let _ = crate::structs::CapacityOverride::export_all();
        let _ = crate::structs::DestinationSnapshot::export_all();
        let _ = crate::structs::WeatherSnapshot::export_all();
        let _ = crate::structs::EcologicalIndicators::export_all();
        let _ = crate::structs::StrainReading::export_all();
        let _ = crate::structs::HazardAssessment::export_all();
        let _ = crate::structs::FactorFlags::export_all();
        let _ = crate::structs::CapacityResult::export_all();
        let _ = crate::structs::AdmissionDecision::export_all();
        let _ = crate::structs::AlertDraft::export_all();
    }
}
