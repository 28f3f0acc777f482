//! Per-tier admission policy table.
//!
//! The [`PolicyStore`] holds one [`Policy`] per [`SensitivityTier`] behind
//! a copy-on-write snapshot: readers clone an `Arc` to the current table
//! and writers replace the whole table atomically, so a concurrent reader
//! always observes either the pre- or post-update policy, never a mixed
//! object. Administrator updates persist to the durable store before the
//! snapshot is replaced, then broadcast a change notification so other
//! instances refresh.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use trailgate_types::{AlertLevel, Policy, PolicyPatch, SensitivityTier};
use tracing::{debug, warn};

use crate::error::PolicyUpdateError;
use crate::store::{ChangeNotifier, ChangeTopic, ConfigStore};

/// Built-in default policy for a tier.
///
/// These seed the table at process start and backstop the fail-open
/// lookup when a persisted table is incomplete.
pub fn default_policy_for(tier: SensitivityTier) -> Policy {
    match tier {
        SensitivityTier::Low => Policy {
            capacity_multiplier: 1.0,
            requires_permit: false,
            requires_eco_briefing: false,
            alert_severity: AlertLevel::None,
            booking_restriction_message: None,
        },
        SensitivityTier::Medium => Policy {
            capacity_multiplier: 0.8,
            requires_permit: false,
            requires_eco_briefing: true,
            alert_severity: AlertLevel::Low,
            booking_restriction_message: None,
        },
        SensitivityTier::High => Policy {
            capacity_multiplier: 0.6,
            requires_permit: true,
            requires_eco_briefing: true,
            alert_severity: AlertLevel::High,
            booking_restriction_message: Some(
                "High-sensitivity area: advance permits and guided access only".to_owned(),
            ),
        },
        SensitivityTier::Critical => Policy {
            capacity_multiplier: 0.25,
            requires_permit: true,
            requires_eco_briefing: true,
            alert_severity: AlertLevel::Critical,
            booking_restriction_message: Some(
                "This destination is closed to general bookings due to critical ecological \
                 sensitivity"
                    .to_owned(),
            ),
        },
    }
}

/// The complete built-in default policy table.
pub fn default_policies() -> BTreeMap<SensitivityTier, Policy> {
    SensitivityTier::ALL
        .into_iter()
        .map(|tier| (tier, default_policy_for(tier)))
        .collect()
}

/// Overlay a persisted table on top of the built-in defaults so every
/// tier has an entry even when the persisted table is partial.
fn overlay_defaults(loaded: BTreeMap<SensitivityTier, Policy>) -> BTreeMap<SensitivityTier, Policy> {
    let mut table = default_policies();
    table.extend(loaded);
    table
}

/// Mutable table of per-tier admission policies.
///
/// Read by the capacity engine and alert generator on every call;
/// written only by administrators via [`update`](Self::update).
pub struct PolicyStore {
    /// Current table snapshot, replaced wholesale on every mutation.
    table: RwLock<Arc<BTreeMap<SensitivityTier, Policy>>>,
    /// Durable persistence backend.
    store: Arc<dyn ConfigStore>,
    /// Change-notification channel to other instances.
    notifier: Arc<dyn ChangeNotifier>,
    /// Serializes administrator writes so concurrent updates cannot
    /// leapfrog each other's snapshots.
    write_serial: tokio::sync::Mutex<()>,
}

impl PolicyStore {
    /// Create a store seeded with the built-in defaults, without touching
    /// the durable store.
    pub fn with_defaults(store: Arc<dyn ConfigStore>, notifier: Arc<dyn ChangeNotifier>) -> Self {
        Self {
            table: RwLock::new(Arc::new(default_policies())),
            store,
            notifier,
            write_serial: tokio::sync::Mutex::new(()),
        }
    }

    /// Create a store and load any persisted policies over the defaults.
    ///
    /// On load failure the built-in defaults are used silently (warn log
    /// only) -- store unavailability must never block admissions.
    pub async fn load(store: Arc<dyn ConfigStore>, notifier: Arc<dyn ChangeNotifier>) -> Self {
        let table = match store.load_policies().await {
            Ok(loaded) => {
                debug!(persisted = loaded.len(), "loaded persisted tier policies");
                overlay_defaults(loaded)
            }
            Err(error) => {
                warn!(%error, "failed to load persisted policies, using built-in defaults");
                default_policies()
            }
        };
        Self {
            table: RwLock::new(Arc::new(table)),
            store,
            notifier,
            write_serial: tokio::sync::Mutex::new(()),
        }
    }

    /// Return a snapshot of the current table (cheap `Arc` clone).
    ///
    /// All reads within one capacity computation should go through a
    /// single snapshot so the call sees a consistent table.
    pub fn snapshot(&self) -> Arc<BTreeMap<SensitivityTier, Policy>> {
        Arc::clone(&self.table.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Return the policy for a tier.
    ///
    /// Fail-open: a missing entry falls back to the `Low` tier's policy
    /// (logged as a configuration anomaly), and if even that is missing
    /// the built-in default for the requested tier is used. Never fails.
    pub fn get(&self, tier: SensitivityTier) -> Policy {
        let snapshot = self.snapshot();
        if let Some(policy) = snapshot.get(&tier) {
            return policy.clone();
        }
        warn!(tier = %tier, "no policy entry for tier, falling back to the low tier");
        snapshot
            .get(&SensitivityTier::Low)
            .cloned()
            .unwrap_or_else(|| default_policy_for(tier))
    }

    /// Return the full table by value.
    pub fn list_all(&self) -> BTreeMap<SensitivityTier, Policy> {
        (*self.snapshot()).clone()
    }

    /// Apply an administrator patch to one tier's policy.
    ///
    /// The merged policy is validated, persisted synchronously (a persist
    /// failure aborts the commit), swapped into the snapshot, and then
    /// announced on the change channel. A publish failure is logged but
    /// never un-commits the update.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyUpdateError`] if validation or persistence fails.
    pub async fn update(
        &self,
        tier: SensitivityTier,
        patch: &PolicyPatch,
    ) -> Result<Policy, PolicyUpdateError> {
        let _guard = self.write_serial.lock().await;

        let current = self.snapshot();
        let base = current
            .get(&tier)
            .cloned()
            .unwrap_or_else(|| default_policy_for(tier));
        let merged = base.merged(patch);
        validate_policy(tier, &merged)?;

        let mut next = (*current).clone();
        next.insert(tier, merged.clone());

        // Persist before committing the in-memory snapshot.
        self.store.save_policies(&next).await?;
        self.replace(next);

        if let Err(error) = self.notifier.publish(ChangeTopic::Policies).await {
            warn!(%error, "policy change committed but notification failed");
        }
        debug!(tier = %tier, "tier policy updated");
        Ok(merged)
    }

    /// Refresh the snapshot from the durable store.
    ///
    /// Called on receipt of an external change notification. On store
    /// failure the last known snapshot is kept (fail-safe, not
    /// fail-closed).
    pub async fn reload(&self) {
        match self.store.load_policies().await {
            Ok(loaded) => {
                self.replace(overlay_defaults(loaded));
                debug!("policy table refreshed from the durable store");
            }
            Err(error) => {
                warn!(%error, "policy reload failed, keeping last known snapshot");
            }
        }
    }

    /// Replace the current snapshot atomically.
    fn replace(&self, next: BTreeMap<SensitivityTier, Policy>) {
        *self.table.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(next);
    }
}

impl core::fmt::Debug for PolicyStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PolicyStore")
            .field("tiers", &self.snapshot().len())
            .finish()
    }
}

/// Validate the invariants a merged policy must uphold.
fn validate_policy(tier: SensitivityTier, policy: &Policy) -> Result<(), PolicyUpdateError> {
    let multiplier = policy.capacity_multiplier;
    if !(multiplier.is_finite() && multiplier > 0.0 && multiplier <= 1.0) {
        return Err(PolicyUpdateError::InvalidMultiplier { value: multiplier });
    }
    if tier == SensitivityTier::Critical && policy.booking_restriction_message.is_none() {
        return Err(PolicyUpdateError::MissingRestrictionMessage { tier });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use async_trait::async_trait;

    use crate::store::{NoopNotifier, StoreError, StubConfigStore};

    use super::*;

    fn store_with_defaults() -> PolicyStore {
        PolicyStore::with_defaults(Arc::new(StubConfigStore::new()), Arc::new(NoopNotifier::new()))
    }

    #[test]
    fn defaults_cover_every_tier() {
        let table = default_policies();
        for tier in SensitivityTier::ALL {
            assert!(table.contains_key(&tier), "missing default for {tier}");
        }
    }

    #[test]
    fn critical_default_carries_restriction_message() {
        let policy = default_policy_for(SensitivityTier::Critical);
        assert!(policy.booking_restriction_message.is_some());
        assert_eq!(policy.alert_severity, AlertLevel::Critical);
    }

    #[test]
    fn default_multipliers_are_in_range() {
        for tier in SensitivityTier::ALL {
            let policy = default_policy_for(tier);
            assert!(policy.capacity_multiplier > 0.0);
            assert!(policy.capacity_multiplier <= 1.0);
        }
    }

    #[test]
    fn medium_tier_multiplier_is_pinned() {
        assert_eq!(
            default_policy_for(SensitivityTier::Medium).capacity_multiplier,
            0.8
        );
    }

    #[tokio::test]
    async fn update_merges_and_persists() {
        let backing = Arc::new(StubConfigStore::new());
        let store = PolicyStore::with_defaults(
            Arc::clone(&backing) as Arc<dyn ConfigStore>,
            Arc::new(NoopNotifier::new()),
        );

        let patch = PolicyPatch {
            capacity_multiplier: Some(0.7),
            ..PolicyPatch::default()
        };
        let updated = store.update(SensitivityTier::Medium, &patch).await.unwrap();
        assert_eq!(updated.capacity_multiplier, 0.7);
        assert_eq!(store.get(SensitivityTier::Medium).capacity_multiplier, 0.7);

        // The full table was persisted.
        let persisted = backing.load_policies().await.unwrap();
        assert_eq!(
            persisted.get(&SensitivityTier::Medium).unwrap().capacity_multiplier,
            0.7
        );
    }

    #[tokio::test]
    async fn update_rejects_out_of_range_multiplier() {
        let store = store_with_defaults();
        for bad in [0.0, -0.5, 1.5, f64::NAN] {
            let patch = PolicyPatch {
                capacity_multiplier: Some(bad),
                ..PolicyPatch::default()
            };
            let result = store.update(SensitivityTier::Low, &patch).await;
            assert!(matches!(
                result,
                Err(PolicyUpdateError::InvalidMultiplier { .. })
            ));
        }
        // The table is untouched.
        assert_eq!(store.get(SensitivityTier::Low).capacity_multiplier, 1.0);
    }

    #[tokio::test]
    async fn update_rejects_clearing_critical_message() {
        let store = store_with_defaults();
        let patch = PolicyPatch {
            booking_restriction_message: Some(None),
            ..PolicyPatch::default()
        };
        let result = store.update(SensitivityTier::Critical, &patch).await;
        assert!(matches!(
            result,
            Err(PolicyUpdateError::MissingRestrictionMessage { .. })
        ));
        assert!(
            store
                .get(SensitivityTier::Critical)
                .booking_restriction_message
                .is_some()
        );
    }

    /// A store whose writes always fail, for testing the abort path.
    #[derive(Debug, Default)]
    struct FailingStore;

    #[async_trait]
    impl ConfigStore for FailingStore {
        async fn load_policies(
            &self,
        ) -> Result<BTreeMap<SensitivityTier, Policy>, StoreError> {
            Err(StoreError::Backend {
                message: "unreachable".to_owned(),
            })
        }

        async fn save_policies(
            &self,
            _policies: &BTreeMap<SensitivityTier, Policy>,
        ) -> Result<(), StoreError> {
            Err(StoreError::Backend {
                message: "unreachable".to_owned(),
            })
        }

        async fn load_overrides(
            &self,
        ) -> Result<
            BTreeMap<trailgate_types::DestinationId, trailgate_types::CapacityOverride>,
            StoreError,
        > {
            Err(StoreError::Backend {
                message: "unreachable".to_owned(),
            })
        }

        async fn save_override(
            &self,
            _record: &trailgate_types::CapacityOverride,
        ) -> Result<(), StoreError> {
            Err(StoreError::Backend {
                message: "unreachable".to_owned(),
            })
        }

        async fn clear_override(
            &self,
            _destination_id: trailgate_types::DestinationId,
        ) -> Result<(), StoreError> {
            Err(StoreError::Backend {
                message: "unreachable".to_owned(),
            })
        }
    }

    #[tokio::test]
    async fn persist_failure_aborts_the_commit() {
        let store = PolicyStore::with_defaults(
            Arc::new(FailingStore),
            Arc::new(NoopNotifier::new()),
        );
        let patch = PolicyPatch {
            capacity_multiplier: Some(0.5),
            ..PolicyPatch::default()
        };
        let result = store.update(SensitivityTier::Medium, &patch).await;
        assert!(matches!(result, Err(PolicyUpdateError::Store(_))));
        // The in-memory snapshot still holds the pre-update value.
        assert_eq!(store.get(SensitivityTier::Medium).capacity_multiplier, 0.8);
    }

    #[tokio::test]
    async fn load_falls_back_to_defaults_on_store_failure() {
        let store =
            PolicyStore::load(Arc::new(FailingStore), Arc::new(NoopNotifier::new())).await;
        assert_eq!(store.get(SensitivityTier::Medium).capacity_multiplier, 0.8);
    }

    #[tokio::test]
    async fn load_overlays_persisted_entries_on_defaults() {
        let mut persisted = BTreeMap::new();
        persisted.insert(
            SensitivityTier::Medium,
            Policy {
                capacity_multiplier: 0.75,
                requires_permit: false,
                requires_eco_briefing: true,
                alert_severity: AlertLevel::Medium,
                booking_restriction_message: None,
            },
        );
        let backing = Arc::new(StubConfigStore::with_policies(persisted));
        let store = PolicyStore::load(backing, Arc::new(NoopNotifier::new())).await;

        assert_eq!(store.get(SensitivityTier::Medium).capacity_multiplier, 0.75);
        // Tiers absent from the persisted table keep their defaults.
        assert_eq!(store.get(SensitivityTier::High).capacity_multiplier, 0.6);
    }

    #[tokio::test]
    async fn reload_picks_up_external_changes() {
        let backing = Arc::new(StubConfigStore::new());
        let store = PolicyStore::with_defaults(
            Arc::clone(&backing) as Arc<dyn ConfigStore>,
            Arc::new(NoopNotifier::new()),
        );

        // Another instance persists a changed table.
        let mut changed = default_policies();
        if let Some(policy) = changed.get_mut(&SensitivityTier::Low) {
            policy.capacity_multiplier = 0.9;
        }
        backing.save_policies(&changed).await.unwrap();

        store.reload().await;
        assert_eq!(store.get(SensitivityTier::Low).capacity_multiplier, 0.9);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_reads_never_observe_a_torn_update() {
        let store = Arc::new(store_with_defaults());
        let before = store.get(SensitivityTier::High);
        let after = Policy {
            capacity_multiplier: 0.5,
            requires_permit: false,
            requires_eco_briefing: false,
            alert_severity: AlertLevel::Medium,
            booking_restriction_message: Some("reduced access".to_owned()),
        };

        let patch = PolicyPatch {
            capacity_multiplier: Some(after.capacity_multiplier),
            requires_permit: Some(after.requires_permit),
            requires_eco_briefing: Some(after.requires_eco_briefing),
            alert_severity: Some(after.alert_severity),
            booking_restriction_message: Some(after.booking_restriction_message.clone()),
        };

        let mut readers = Vec::new();
        for _ in 0..4 {
            let store = Arc::clone(&store);
            let before = before.clone();
            let after = after.clone();
            readers.push(tokio::spawn(async move {
                for _ in 0..1000 {
                    let seen = store.get(SensitivityTier::High);
                    assert!(
                        seen == before || seen == after,
                        "observed a mixed policy: {seen:?}"
                    );
                }
            }));
        }

        store.update(SensitivityTier::High, &patch).await.unwrap();

        for reader in readers {
            reader.await.unwrap();
        }
        assert_eq!(store.get(SensitivityTier::High), after);
    }
}
