//! NATS change notifications between running instances.
//!
//! A committed administrator write publishes on
//! `trailgate.config.changed.{policies|overrides}`. Every instance
//! subscribes to `trailgate.config.changed.*` and refreshes the matching
//! in-memory table on receipt. Propagation is eventually consistent;
//! admission decisions never wait for it.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use trailgate_core::overrides::CapacityOverrideRegistry;
use trailgate_core::policy::PolicyStore;
use trailgate_core::store::{ChangeNotifier, ChangeTopic, StoreError};
use tracing::{debug, info, warn};

use crate::error::DbError;

/// Subject prefix for config change notifications.
pub const CHANGE_SUBJECT_PREFIX: &str = "trailgate.config.changed";

/// NATS-backed implementation of the core's `ChangeNotifier` seam.
pub struct NatsNotifier {
    client: async_nats::Client,
}

impl NatsNotifier {
    /// Connect to a NATS server.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Nats`] if the connection cannot be established.
    pub async fn connect(url: &str) -> Result<Self, DbError> {
        info!(url = url, "connecting to NATS server");
        let client = async_nats::connect(url)
            .await
            .map_err(|e| DbError::Nats(format!("failed to connect to {url}: {e}")))?;
        info!("NATS connection established");
        Ok(Self { client })
    }

    /// The subject a change to `topic` is published on.
    pub fn subject_for(topic: ChangeTopic) -> String {
        format!("{CHANGE_SUBJECT_PREFIX}.{}", topic.key())
    }

    /// Extract the change topic from a notification subject.
    ///
    /// Returns `None` if the trailing segment is not a known store key.
    pub fn topic_from_subject(subject: &str) -> Option<ChangeTopic> {
        subject
            .strip_prefix(CHANGE_SUBJECT_PREFIX)?
            .strip_prefix('.')
            .and_then(ChangeTopic::from_key)
    }

    /// Subscribe to all config change subjects.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Nats`] if the subscription fails.
    pub async fn subscribe_changes(&self) -> Result<async_nats::Subscriber, DbError> {
        let subject = format!("{CHANGE_SUBJECT_PREFIX}.*");
        debug!(subject = subject, "subscribing to config change subjects");
        let subscriber = self
            .client
            .subscribe(subject.clone())
            .await
            .map_err(|e| DbError::Nats(format!("failed to subscribe to {subject}: {e}")))?;
        info!("subscribed to config change subjects");
        Ok(subscriber)
    }

    /// Spawn a background task that refreshes the in-memory tables on
    /// every change notification.
    ///
    /// The task runs until the subscription closes. Unknown subjects are
    /// logged and skipped.
    pub fn spawn_refresh_task(
        mut subscriber: async_nats::Subscriber,
        policies: Arc<PolicyStore>,
        overrides: Arc<CapacityOverrideRegistry>,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(message) = subscriber.next().await {
                match Self::topic_from_subject(&message.subject) {
                    Some(ChangeTopic::Policies) => {
                        debug!("policy change notification received");
                        policies.reload().await;
                    }
                    Some(ChangeTopic::Overrides) => {
                        debug!("override change notification received");
                        overrides.reload().await;
                    }
                    None => {
                        warn!(
                            subject = %message.subject,
                            "ignoring notification on unknown subject"
                        );
                    }
                }
            }
            info!("config change subscription closed");
        })
    }
}

#[async_trait]
impl ChangeNotifier for NatsNotifier {
    async fn publish(&self, topic: ChangeTopic) -> Result<(), StoreError> {
        let subject = Self::subject_for(topic);
        self.client
            .publish(subject.clone(), topic.key().into())
            .await
            .map_err(|e| DbError::Nats(format!("failed to publish to {subject}: {e}")))?;
        debug!(subject = subject, "published config change notification");
        Ok(())
    }
}

impl std::fmt::Debug for NatsNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NatsNotifier")
            .field("connected", &true)
            .finish()
    }
}
