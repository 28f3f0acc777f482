//! Capacity computation and admission decisions for the Trailgate engine.
//!
//! This crate owns the decision logic: pure capacity factor calculators,
//! the mutable policy and override tables, the capacity engine that folds
//! them into an adjusted visitor capacity, and the admission controller
//! that accepts or rejects individual booking requests.
//!
//! # Modules
//!
//! - [`admission`] -- [`AdmissionController`], the booking accept/deny
//!   decision.
//! - [`alert`] -- [`EcologicalAlertGenerator`] for standing advisories.
//! - [`config`] -- Configuration loading from `trailgate.yaml` into
//!   strongly-typed structs.
//! - [`engine`] -- [`DynamicCapacityEngine`], the factor orchestration.
//! - [`error`] -- Error taxonomy for the core.
//! - [`hazard`] -- Weather hazard classification.
//! - [`overrides`] -- [`CapacityOverrideRegistry`], per-destination
//!   manual capacity clamps.
//! - [`policy`] -- [`PolicyStore`], the per-tier policy table.
//! - [`season`] -- Seasonal capacity factor.
//! - [`store`] -- [`ConfigStore`] and [`ChangeNotifier`] trait seams plus
//!   in-memory stubs.
//! - [`strain`] -- Ecological strain factor from sensor readings.
//!
//! [`AdmissionController`]: admission::AdmissionController
//! [`EcologicalAlertGenerator`]: alert::EcologicalAlertGenerator
//! [`DynamicCapacityEngine`]: engine::DynamicCapacityEngine
//! [`CapacityOverrideRegistry`]: overrides::CapacityOverrideRegistry
//! [`PolicyStore`]: policy::PolicyStore
//! [`ConfigStore`]: store::ConfigStore
//! [`ChangeNotifier`]: store::ChangeNotifier

pub mod admission;
pub mod alert;
pub mod config;
pub mod engine;
pub mod error;
pub mod hazard;
pub mod overrides;
pub mod policy;
pub mod season;
pub mod store;
pub mod strain;
