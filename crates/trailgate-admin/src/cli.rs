//! Command-line argument definitions for the administrator CLI.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use trailgate_types::{AlertLevel, SensitivityTier};
use uuid::Uuid;

/// Administer Trailgate tier policies and capacity overrides.
///
/// Every mutating command persists to `PostgreSQL` first and then
/// broadcasts a change notification over NATS so running instances
/// refresh their in-memory tables.
#[derive(Debug, Parser)]
#[command(name = "trailgate-admin", version, about)]
pub struct Cli {
    /// Path to the YAML configuration file.
    #[arg(long, default_value = "trailgate.yaml")]
    pub config: PathBuf,

    /// What to administer.
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level command groups.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Inspect or update per-tier admission policies.
    #[command(subcommand)]
    Policy(PolicyAction),

    /// Manage per-destination capacity overrides.
    #[command(subcommand)]
    Override(OverrideAction),
}

/// Policy subcommands.
#[derive(Debug, Subcommand)]
pub enum PolicyAction {
    /// Print the full per-tier policy table.
    List,

    /// Patch one tier's policy. Unset flags keep their current values.
    Set {
        /// Tier to update (low, medium, high, critical).
        #[arg(value_parser = parse_tier)]
        tier: SensitivityTier,

        /// New capacity multiplier in (0, 1].
        #[arg(long)]
        multiplier: Option<f64>,

        /// Whether visitors need an advance permit.
        #[arg(long)]
        requires_permit: Option<bool>,

        /// Whether visitors must complete an ecological briefing.
        #[arg(long)]
        requires_briefing: Option<bool>,

        /// Advisory severity (none, low, medium, high, critical).
        #[arg(long, value_parser = parse_alert_level)]
        alert_severity: Option<AlertLevel>,

        /// New booking restriction message.
        #[arg(long, conflicts_with = "clear_message")]
        message: Option<String>,

        /// Remove the booking restriction message.
        #[arg(long)]
        clear_message: bool,
    },
}

/// Override subcommands.
#[derive(Debug, Subcommand)]
pub enum OverrideAction {
    /// Install or replace the override for a destination.
    Set {
        /// Destination UUID.
        destination_id: Uuid,

        /// Capacity multiplier composed with all other factors.
        #[arg(long)]
        multiplier: f64,

        /// Justification shown to operators.
        #[arg(long)]
        reason: String,

        /// Expire the override this many hours from now.
        #[arg(long)]
        expires_in_hours: Option<i64>,

        /// Store the override switched off.
        #[arg(long)]
        inactive: bool,
    },

    /// Remove the override for a destination.
    Clear {
        /// Destination UUID.
        destination_id: Uuid,
    },

    /// Delete every expired override record.
    Prune,
}

/// Parse a sensitivity tier name for clap.
fn parse_tier(name: &str) -> Result<SensitivityTier, String> {
    SensitivityTier::from_name(name)
        .ok_or_else(|| format!("unknown tier '{name}' (expected low, medium, high, critical)"))
}

/// Parse an alert level name for clap.
fn parse_alert_level(name: &str) -> Result<AlertLevel, String> {
    AlertLevel::from_name(name).ok_or_else(|| {
        format!("unknown alert level '{name}' (expected none, low, medium, high, critical)")
    })
}
