//! Standing ecological advisories.
//!
//! Advisories are derived from a destination's tier policy alone, not
//! from any individual booking. The generator only drafts the advisory;
//! persisting and dispatching it belongs to the durable store.

use std::sync::Arc;

use trailgate_types::{AlertDraft, AlertLevel, DestinationSnapshot};

use crate::policy::PolicyStore;

/// Derives standing advisory drafts from tier policy state.
#[derive(Debug)]
pub struct EcologicalAlertGenerator {
    policies: Arc<PolicyStore>,
}

impl EcologicalAlertGenerator {
    /// Create a generator over the shared policy store.
    pub const fn new(policies: Arc<PolicyStore>) -> Self {
        Self { policies }
    }

    /// Draft a standing advisory for a destination, if its tier warrants
    /// one.
    ///
    /// Returns `None` when the tier policy's advisory severity is
    /// [`AlertLevel::None`]. Otherwise the draft carries the policy
    /// severity and the policy's restriction message, falling back to a
    /// generic tier-sensitivity message.
    pub fn generate_alert(&self, destination: &DestinationSnapshot) -> Option<AlertDraft> {
        let policy = self.policies.get(destination.sensitivity_tier);
        if policy.alert_severity == AlertLevel::None {
            return None;
        }

        let message = policy.booking_restriction_message.unwrap_or_else(|| {
            format!(
                "This destination is classified as {}-sensitivity; visitor access is managed \
                 to limit ecological impact",
                destination.sensitivity_tier
            )
        });

        Some(AlertDraft {
            destination_id: destination.id,
            severity: policy.alert_severity,
            message,
        })
    }
}
