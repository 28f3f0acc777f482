//! Per-destination manual capacity overrides.
//!
//! Operators can clamp a destination's capacity below what the automatic
//! factors produce, typically for trail damage or wildlife activity. An
//! override composes multiplicatively with the tier policy multiplier and
//! carries an optional expiry after which it silently stops applying.
//!
//! Like the policy table, the registry is a copy-on-write snapshot:
//! readers clone an `Arc`, writers replace the map atomically after a
//! successful persist.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use trailgate_types::{CapacityOverride, DestinationId};
use tracing::{debug, warn};

use crate::error::OverrideUpdateError;
use crate::store::{ChangeNotifier, ChangeTopic, ConfigStore};

/// Registry of manual capacity overrides, keyed by destination.
pub struct CapacityOverrideRegistry {
    /// Current override table, replaced wholesale on every mutation.
    table: RwLock<Arc<BTreeMap<DestinationId, CapacityOverride>>>,
    /// Durable persistence backend.
    store: Arc<dyn ConfigStore>,
    /// Change-notification channel to other instances.
    notifier: Arc<dyn ChangeNotifier>,
    /// Serializes operator writes.
    write_serial: tokio::sync::Mutex<()>,
}

impl CapacityOverrideRegistry {
    /// Create an empty registry without touching the durable store.
    pub fn empty(store: Arc<dyn ConfigStore>, notifier: Arc<dyn ChangeNotifier>) -> Self {
        Self {
            table: RwLock::new(Arc::new(BTreeMap::new())),
            store,
            notifier,
            write_serial: tokio::sync::Mutex::new(()),
        }
    }

    /// Create a registry and load persisted overrides.
    ///
    /// On load failure the registry starts empty (warn log only) -- an
    /// unreachable store must never block admissions.
    pub async fn load(store: Arc<dyn ConfigStore>, notifier: Arc<dyn ChangeNotifier>) -> Self {
        let table = match store.load_overrides().await {
            Ok(loaded) => {
                debug!(count = loaded.len(), "loaded persisted capacity overrides");
                loaded
            }
            Err(error) => {
                warn!(%error, "failed to load persisted overrides, starting empty");
                BTreeMap::new()
            }
        };
        Self {
            table: RwLock::new(Arc::new(table)),
            store,
            notifier,
            write_serial: tokio::sync::Mutex::new(()),
        }
    }

    /// Return a snapshot of the current override table.
    pub fn snapshot(&self) -> Arc<BTreeMap<DestinationId, CapacityOverride>> {
        Arc::clone(&self.table.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Return the override that currently applies to a destination, if
    /// any.
    ///
    /// A record is returned only when it is active and unexpired as of
    /// `now`. Expired records stay in the table until pruned but never
    /// influence a computation.
    pub fn effective(
        &self,
        destination_id: DestinationId,
        now: DateTime<Utc>,
    ) -> Option<CapacityOverride> {
        self.snapshot()
            .get(&destination_id)
            .filter(|record| record.is_effective(now))
            .cloned()
    }

    /// Install or replace the override for a destination.
    ///
    /// Last write wins for the same destination. The record is persisted
    /// before the snapshot is replaced; a persist failure aborts the
    /// write.
    ///
    /// # Errors
    ///
    /// Returns [`OverrideUpdateError::InvalidMultiplier`] unless the
    /// multiplier is a positive finite number, or
    /// [`OverrideUpdateError::Store`] if persistence fails.
    pub async fn set(&self, record: CapacityOverride) -> Result<(), OverrideUpdateError> {
        if !(record.multiplier.is_finite() && record.multiplier > 0.0) {
            return Err(OverrideUpdateError::InvalidMultiplier {
                value: record.multiplier,
            });
        }

        let _guard = self.write_serial.lock().await;

        self.store.save_override(&record).await?;

        let mut next = (*self.snapshot()).clone();
        next.insert(record.destination_id, record.clone());
        self.replace(next);

        if let Err(error) = self.notifier.publish(ChangeTopic::Overrides).await {
            warn!(%error, "override committed but notification failed");
        }
        debug!(
            destination_id = %record.destination_id,
            multiplier = record.multiplier,
            "capacity override installed"
        );
        Ok(())
    }

    /// Remove the override for a destination, if one exists.
    ///
    /// Clearing a destination with no override is a no-op, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`OverrideUpdateError::Store`] if the durable delete fails.
    pub async fn clear(
        &self,
        destination_id: DestinationId,
    ) -> Result<(), OverrideUpdateError> {
        let _guard = self.write_serial.lock().await;

        self.store.clear_override(destination_id).await?;

        let mut next = (*self.snapshot()).clone();
        let removed = next.remove(&destination_id).is_some();
        self.replace(next);

        if removed {
            if let Err(error) = self.notifier.publish(ChangeTopic::Overrides).await {
                warn!(%error, "override removal committed but notification failed");
            }
            debug!(destination_id = %destination_id, "capacity override cleared");
        }
        Ok(())
    }

    /// Drop every record that is expired as of `now` and return how many
    /// were removed.
    ///
    /// Pruning is housekeeping over the in-memory snapshot; durable rows
    /// are removed individually (a failed delete leaves the row for the
    /// next sweep).
    pub async fn prune_expired(&self, now: DateTime<Utc>) -> usize {
        let _guard = self.write_serial.lock().await;

        let current = self.snapshot();
        let expired: Vec<DestinationId> = current
            .iter()
            .filter(|(_, record)| !record.is_effective(now))
            .map(|(id, _)| *id)
            .collect();
        if expired.is_empty() {
            return 0;
        }

        let mut next = (*current).clone();
        let mut pruned = 0_usize;
        for destination_id in expired {
            if let Err(error) = self.store.clear_override(destination_id).await {
                warn!(
                    destination_id = %destination_id,
                    %error,
                    "failed to delete expired override, leaving for the next sweep"
                );
                continue;
            }
            next.remove(&destination_id);
            pruned = pruned.saturating_add(1);
        }
        self.replace(next);

        if pruned > 0 {
            debug!(pruned, "expired capacity overrides removed");
            if let Err(error) = self.notifier.publish(ChangeTopic::Overrides).await {
                warn!(%error, "override prune committed but notification failed");
            }
        }
        pruned
    }

    /// Refresh the snapshot from the durable store.
    ///
    /// On store failure the last known snapshot is kept.
    pub async fn reload(&self) {
        match self.store.load_overrides().await {
            Ok(loaded) => {
                self.replace(loaded);
                debug!("override table refreshed from the durable store");
            }
            Err(error) => {
                warn!(%error, "override reload failed, keeping last known snapshot");
            }
        }
    }

    /// Replace the current snapshot atomically.
    fn replace(&self, next: BTreeMap<DestinationId, CapacityOverride>) {
        *self.table.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(next);
    }
}

impl core::fmt::Debug for CapacityOverrideRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CapacityOverrideRegistry")
            .field("records", &self.snapshot().len())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use chrono::Duration;

    use crate::store::{NoopNotifier, StubConfigStore};

    use super::*;

    fn registry() -> (Arc<StubConfigStore>, CapacityOverrideRegistry) {
        let backing = Arc::new(StubConfigStore::new());
        let registry = CapacityOverrideRegistry::empty(
            Arc::clone(&backing) as Arc<dyn ConfigStore>,
            Arc::new(NoopNotifier::new()),
        );
        (backing, registry)
    }

    fn record(destination_id: DestinationId, multiplier: f64) -> CapacityOverride {
        CapacityOverride {
            destination_id,
            multiplier,
            reason: "trail washout".to_owned(),
            active: true,
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn set_then_effective_round_trips() {
        let (backing, registry) = registry();
        let destination = DestinationId::new();
        registry.set(record(destination, 0.5)).await.unwrap();

        let now = Utc::now();
        let effective = registry.effective(destination, now).unwrap();
        assert!((effective.multiplier - 0.5).abs() < f64::EPSILON);

        // Persisted too.
        let persisted = backing.load_overrides().await.unwrap();
        assert!(persisted.contains_key(&destination));
    }

    #[tokio::test]
    async fn set_rejects_non_positive_multiplier() {
        let (_, registry) = registry();
        let destination = DestinationId::new();
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let result = registry.set(record(destination, bad)).await;
            assert!(matches!(
                result,
                Err(OverrideUpdateError::InvalidMultiplier { .. })
            ));
        }
        assert!(registry.effective(destination, Utc::now()).is_none());
    }

    #[tokio::test]
    async fn last_write_wins_per_destination() {
        let (_, registry) = registry();
        let destination = DestinationId::new();
        registry.set(record(destination, 0.5)).await.unwrap();
        registry.set(record(destination, 0.3)).await.unwrap();

        let effective = registry.effective(destination, Utc::now()).unwrap();
        assert!((effective.multiplier - 0.3).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn expired_override_is_not_effective() {
        let (_, registry) = registry();
        let destination = DestinationId::new();
        let now = Utc::now();

        let mut expiring = record(destination, 0.5);
        expiring.expires_at = Some(now + Duration::hours(1));
        registry.set(expiring).await.unwrap();

        assert!(registry.effective(destination, now).is_some());
        assert!(
            registry
                .effective(destination, now + Duration::hours(2))
                .is_none()
        );
    }

    #[tokio::test]
    async fn inactive_override_is_not_effective() {
        let (_, registry) = registry();
        let destination = DestinationId::new();
        let mut disabled = record(destination, 0.5);
        disabled.active = false;
        registry.set(disabled).await.unwrap();
        assert!(registry.effective(destination, Utc::now()).is_none());
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let (backing, registry) = registry();
        let destination = DestinationId::new();
        registry.set(record(destination, 0.5)).await.unwrap();

        registry.clear(destination).await.unwrap();
        assert!(registry.effective(destination, Utc::now()).is_none());
        assert!(backing.load_overrides().await.unwrap().is_empty());

        // Clearing again is a no-op.
        registry.clear(destination).await.unwrap();
    }

    #[tokio::test]
    async fn prune_removes_only_expired_records() {
        let (backing, registry) = registry();
        let now = Utc::now();

        let keep = DestinationId::new();
        registry.set(record(keep, 0.6)).await.unwrap();

        let stale = DestinationId::new();
        let mut expiring = record(stale, 0.4);
        expiring.expires_at = Some(now - Duration::minutes(5));
        registry.set(expiring).await.unwrap();

        let pruned = registry.prune_expired(now).await;
        assert_eq!(pruned, 1);
        assert!(registry.effective(keep, now).is_some());
        assert!(registry.snapshot().get(&stale).is_none());
        assert!(!backing.load_overrides().await.unwrap().contains_key(&stale));
    }

    #[tokio::test]
    async fn prune_of_empty_registry_is_zero() {
        let (_, registry) = registry();
        assert_eq!(registry.prune_expired(Utc::now()).await, 0);
    }

    #[tokio::test]
    async fn reload_picks_up_external_changes() {
        let (backing, registry) = registry();
        let destination = DestinationId::new();

        // Another instance persists a record directly.
        backing.save_override(&record(destination, 0.7)).await.unwrap();
        assert!(registry.effective(destination, Utc::now()).is_none());

        registry.reload().await;
        assert!(registry.effective(destination, Utc::now()).is_some());
    }
}
