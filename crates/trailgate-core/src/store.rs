//! Durable-store and change-notification trait seams.
//!
//! The policy table and override registry persist through a durable
//! configuration store and announce mutations on a change-notification
//! channel so other running instances can refresh their in-memory
//! snapshots. The [`ConfigStore`] and [`ChangeNotifier`] traits abstract
//! those collaborators -- production wires in `PostgreSQL` and NATS from
//! the data layer, tests use the in-memory [`StubConfigStore`] and
//! [`NoopNotifier`].
//!
//! Propagation between instances is eventually consistent with no hard
//! bound on convergence time; readers never block an admission decision
//! waiting for it.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use trailgate_types::{CapacityOverride, DestinationId, Policy, SensitivityTier};

/// Errors that can occur at the durable-store boundary.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing store rejected or failed the operation.
    #[error("store backend error: {message}")]
    Backend {
        /// Description of the failure.
        message: String,
    },
}

/// The store key a change notification refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChangeTopic {
    /// The per-tier policy table changed.
    Policies,
    /// The per-destination override table changed.
    Overrides,
}

impl ChangeTopic {
    /// Stable channel key used on the notification channel.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Policies => "policies",
            Self::Overrides => "overrides",
        }
    }

    /// Parse a channel key back into a topic.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "policies" => Some(Self::Policies),
            "overrides" => Some(Self::Overrides),
            _ => None,
        }
    }
}

impl core::fmt::Display for ChangeTopic {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.key())
    }
}

/// Durable persistence for policy tables and override records.
///
/// Writes must be durable before they return `Ok` -- the in-memory
/// snapshot is only replaced after a successful persist.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Load the persisted per-tier policy table.
    ///
    /// An empty map means nothing has been persisted yet; the caller
    /// seeds built-in defaults.
    async fn load_policies(&self) -> Result<BTreeMap<SensitivityTier, Policy>, StoreError>;

    /// Persist the full per-tier policy table.
    async fn save_policies(
        &self,
        policies: &BTreeMap<SensitivityTier, Policy>,
    ) -> Result<(), StoreError>;

    /// Load all persisted capacity overrides.
    async fn load_overrides(
        &self,
    ) -> Result<BTreeMap<DestinationId, CapacityOverride>, StoreError>;

    /// Persist one capacity override (replacing any previous record for
    /// the same destination -- last write wins).
    async fn save_override(&self, record: &CapacityOverride) -> Result<(), StoreError>;

    /// Remove the persisted override for a destination, if any.
    async fn clear_override(&self, destination_id: DestinationId) -> Result<(), StoreError>;
}

/// Change-notification channel between running instances.
#[async_trait]
pub trait ChangeNotifier: Send + Sync {
    /// Announce that the table behind `topic` changed.
    ///
    /// Failures here never un-commit a persisted write; callers log and
    /// carry on.
    async fn publish(&self, topic: ChangeTopic) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// In-memory stub implementations
// ---------------------------------------------------------------------------

/// In-memory [`ConfigStore`] for unit tests and single-process embedding.
#[derive(Debug, Default)]
pub struct StubConfigStore {
    policies: Mutex<BTreeMap<SensitivityTier, Policy>>,
    overrides: Mutex<BTreeMap<DestinationId, CapacityOverride>>,
}

impl StubConfigStore {
    /// Create an empty stub store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a stub store pre-seeded with a policy table.
    pub const fn with_policies(policies: BTreeMap<SensitivityTier, Policy>) -> Self {
        Self {
            policies: Mutex::new(policies),
            overrides: Mutex::new(BTreeMap::new()),
        }
    }
}

#[async_trait]
impl ConfigStore for StubConfigStore {
    async fn load_policies(&self) -> Result<BTreeMap<SensitivityTier, Policy>, StoreError> {
        Ok(self
            .policies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    async fn save_policies(
        &self,
        policies: &BTreeMap<SensitivityTier, Policy>,
    ) -> Result<(), StoreError> {
        *self
            .policies
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = policies.clone();
        Ok(())
    }

    async fn load_overrides(
        &self,
    ) -> Result<BTreeMap<DestinationId, CapacityOverride>, StoreError> {
        Ok(self
            .overrides
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    async fn save_override(&self, record: &CapacityOverride) -> Result<(), StoreError> {
        self.overrides
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(record.destination_id, record.clone());
        Ok(())
    }

    async fn clear_override(&self, destination_id: DestinationId) -> Result<(), StoreError> {
        self.overrides
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&destination_id);
        Ok(())
    }
}

/// A [`ChangeNotifier`] that drops every notification.
///
/// Used in tests and in single-instance deployments where there is no
/// other process to notify.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl NoopNotifier {
    /// Create a new no-op notifier.
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ChangeNotifier for NoopNotifier {
    async fn publish(&self, _topic: ChangeTopic) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use trailgate_types::AlertLevel;

    use super::*;

    #[test]
    fn topic_key_round_trip() {
        for topic in [ChangeTopic::Policies, ChangeTopic::Overrides] {
            assert_eq!(ChangeTopic::from_key(topic.key()), Some(topic));
        }
    }

    #[test]
    fn unknown_topic_key_is_none() {
        assert_eq!(ChangeTopic::from_key("destinations"), None);
        assert_eq!(ChangeTopic::from_key(""), None);
    }

    #[tokio::test]
    async fn stub_store_round_trips_policies() {
        let store = StubConfigStore::new();
        assert!(store.load_policies().await.unwrap().is_empty());

        let mut table = BTreeMap::new();
        table.insert(
            SensitivityTier::High,
            Policy {
                capacity_multiplier: 0.6,
                requires_permit: true,
                requires_eco_briefing: true,
                alert_severity: AlertLevel::High,
                booking_restriction_message: Some("permit required".to_owned()),
            },
        );
        store.save_policies(&table).await.unwrap();

        let loaded = store.load_policies().await.unwrap();
        assert_eq!(loaded, table);
    }

    #[tokio::test]
    async fn stub_store_round_trips_overrides() {
        let store = StubConfigStore::new();
        let destination = DestinationId::new();
        let record = CapacityOverride {
            destination_id: destination,
            multiplier: 0.5,
            reason: "trail washout".to_owned(),
            active: true,
            expires_at: None,
        };

        store.save_override(&record).await.unwrap();
        let loaded = store.load_overrides().await.unwrap();
        assert_eq!(loaded.get(&destination), Some(&record));

        store.clear_override(destination).await.unwrap();
        assert!(store.load_overrides().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn noop_notifier_accepts_publishes() {
        let notifier = NoopNotifier::new();
        assert!(notifier.publish(ChangeTopic::Policies).await.is_ok());
    }
}
