//! Administrator CLI entry point for Trailgate.
//!
//! Connects to the durable configuration store, applies the requested
//! policy or override mutation through the same code path the engine
//! uses (persist, swap, notify), and prints the result.
//!
//! ```text
//! trailgate-admin policy list
//! trailgate-admin policy set medium --multiplier 0.7
//! trailgate-admin override set <destination-id> --multiplier 0.5 --reason "trail washout"
//! ```

mod cli;

use std::sync::Arc;

use chrono::{Duration, Utc};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use trailgate_core::config::EngineConfig;
use trailgate_core::overrides::CapacityOverrideRegistry;
use trailgate_core::policy::PolicyStore;
use trailgate_core::store::{ChangeNotifier, ConfigStore};
use trailgate_db::{NatsNotifier, PgConfigStore, PostgresPool};
use trailgate_types::{CapacityOverride, DestinationId, PolicyPatch};

use crate::cli::{Cli, Command, OverrideAction, PolicyAction};

/// Application entry point.
///
/// Initializes logging, loads configuration, connects to `PostgreSQL` and
/// NATS, then executes the requested command.
///
/// # Errors
///
/// Returns an error if initialization or the command fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();

    // Configuration is optional for the CLI; fall back to defaults (plus
    // env overrides) when the file is absent.
    let config = if args.config.exists() {
        EngineConfig::from_file(&args.config)?
    } else {
        EngineConfig::parse("")?
    };

    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone())),
        )
        .with_target(true)
        .init();

    info!("trailgate-admin starting");

    let pool = PostgresPool::connect_url(&config.infrastructure.postgres_url).await?;
    pool.run_migrations().await?;

    let store: Arc<dyn ConfigStore> = Arc::new(PgConfigStore::new(&pool));
    let notifier: Arc<dyn ChangeNotifier> =
        Arc::new(NatsNotifier::connect(&config.infrastructure.nats_url).await?);

    match args.command {
        Command::Policy(action) => {
            let policies = PolicyStore::load(store, notifier).await;
            run_policy_action(&policies, action).await?;
        }
        Command::Override(action) => {
            let overrides = CapacityOverrideRegistry::load(store, notifier).await;
            run_override_action(&overrides, action).await?;
        }
    }

    pool.close().await;
    Ok(())
}

/// Execute a policy subcommand against the loaded store.
async fn run_policy_action(
    policies: &PolicyStore,
    action: PolicyAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        PolicyAction::List => {
            for (tier, policy) in policies.list_all() {
                println!(
                    "{tier}: multiplier={} permit={} briefing={} severity={} message={}",
                    policy.capacity_multiplier,
                    policy.requires_permit,
                    policy.requires_eco_briefing,
                    policy.alert_severity,
                    policy
                        .booking_restriction_message
                        .as_deref()
                        .unwrap_or("(none)"),
                );
            }
        }
        PolicyAction::Set {
            tier,
            multiplier,
            requires_permit,
            requires_briefing,
            alert_severity,
            message,
            clear_message,
        } => {
            let booking_restriction_message = if clear_message {
                Some(None)
            } else {
                message.map(Some)
            };
            let patch = PolicyPatch {
                capacity_multiplier: multiplier,
                requires_permit,
                requires_eco_briefing: requires_briefing,
                alert_severity,
                booking_restriction_message,
            };
            if patch.is_empty() {
                println!("nothing to change for tier {tier}");
                return Ok(());
            }
            let updated = policies.update(tier, &patch).await?;
            println!(
                "{tier}: multiplier={} permit={} briefing={} severity={}",
                updated.capacity_multiplier,
                updated.requires_permit,
                updated.requires_eco_briefing,
                updated.alert_severity,
            );
        }
    }
    Ok(())
}

/// Execute an override subcommand against the loaded registry.
async fn run_override_action(
    overrides: &CapacityOverrideRegistry,
    action: OverrideAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        OverrideAction::Set {
            destination_id,
            multiplier,
            reason,
            expires_in_hours,
            inactive,
        } => {
            let destination_id = DestinationId::from(destination_id);
            let expires_at = expires_in_hours
                .map(|hours| {
                    Utc::now()
                        .checked_add_signed(Duration::hours(hours))
                        .ok_or("expiry timestamp out of range")
                })
                .transpose()?;
            overrides
                .set(CapacityOverride {
                    destination_id,
                    multiplier,
                    reason,
                    active: !inactive,
                    expires_at,
                })
                .await?;
            println!("override installed for {destination_id}");
        }
        OverrideAction::Clear { destination_id } => {
            let destination_id = DestinationId::from(destination_id);
            overrides.clear(destination_id).await?;
            println!("override cleared for {destination_id}");
        }
        OverrideAction::Prune => {
            let pruned = overrides.prune_expired(Utc::now()).await;
            println!("{pruned} expired override(s) removed");
        }
    }
    Ok(())
}
