//! `PostgreSQL`-backed implementation of the core's `ConfigStore` seam.
//!
//! Policies are stored one row per tier with the policy body as JSONB;
//! overrides are stored one row per destination. Rows with a tier name
//! this build does not recognize are skipped with a warning rather than
//! failing the whole load -- a newer instance may have written them.

use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::PgPool;
use trailgate_core::store::{ConfigStore, StoreError};
use trailgate_types::{CapacityOverride, DestinationId, Policy, SensitivityTier};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::DbError;
use crate::postgres::PostgresPool;

/// Operations on the `tier_policies` and `capacity_overrides` tables.
#[derive(Debug, Clone)]
pub struct PgConfigStore {
    pool: PgPool,
}

impl PgConfigStore {
    /// Create a store bound to a connection pool.
    pub fn new(pool: &PostgresPool) -> Self {
        Self {
            pool: pool.pool().clone(),
        }
    }

    async fn load_policies_inner(
        &self,
    ) -> Result<BTreeMap<SensitivityTier, Policy>, DbError> {
        let rows = sqlx::query_as::<_, PolicyRow>(
            r"SELECT tier, policy FROM tier_policies ORDER BY tier",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut table = BTreeMap::new();
        for row in rows {
            let Some(tier) = SensitivityTier::from_name(&row.tier) else {
                warn!(tier = row.tier, "skipping policy row with unknown tier");
                continue;
            };
            let policy: Policy = serde_json::from_value(row.policy)?;
            table.insert(tier, policy);
        }
        debug!(count = table.len(), "loaded tier policies");
        Ok(table)
    }

    async fn save_policies_inner(
        &self,
        policies: &BTreeMap<SensitivityTier, Policy>,
    ) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;

        for (tier, policy) in policies {
            let body = serde_json::to_value(policy)?;
            sqlx::query(
                r"INSERT INTO tier_policies (tier, policy, updated_at)
                  VALUES ($1, $2, now())
                  ON CONFLICT (tier) DO UPDATE SET
                    policy = EXCLUDED.policy,
                    updated_at = now()",
            )
            .bind(tier.as_str())
            .bind(body)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!(count = policies.len(), "persisted tier policies");
        Ok(())
    }

    async fn load_overrides_inner(
        &self,
    ) -> Result<BTreeMap<DestinationId, CapacityOverride>, DbError> {
        let rows = sqlx::query_as::<_, OverrideRow>(
            r"SELECT destination_id, multiplier, reason, active, expires_at
              FROM capacity_overrides",
        )
        .fetch_all(&self.pool)
        .await?;

        let table = rows
            .into_iter()
            .map(|row| {
                let destination_id = DestinationId::from(row.destination_id);
                (
                    destination_id,
                    CapacityOverride {
                        destination_id,
                        multiplier: row.multiplier,
                        reason: row.reason,
                        active: row.active,
                        expires_at: row.expires_at,
                    },
                )
            })
            .collect::<BTreeMap<_, _>>();
        debug!(count = table.len(), "loaded capacity overrides");
        Ok(table)
    }

    async fn save_override_inner(&self, record: &CapacityOverride) -> Result<(), DbError> {
        sqlx::query(
            r"INSERT INTO capacity_overrides
              (destination_id, multiplier, reason, active, expires_at, updated_at)
              VALUES ($1, $2, $3, $4, $5, now())
              ON CONFLICT (destination_id) DO UPDATE SET
                multiplier = EXCLUDED.multiplier,
                reason = EXCLUDED.reason,
                active = EXCLUDED.active,
                expires_at = EXCLUDED.expires_at,
                updated_at = now()",
        )
        .bind(record.destination_id.into_inner())
        .bind(record.multiplier)
        .bind(&record.reason)
        .bind(record.active)
        .bind(record.expires_at)
        .execute(&self.pool)
        .await?;

        debug!(destination_id = %record.destination_id, "persisted capacity override");
        Ok(())
    }

    async fn clear_override_inner(&self, destination_id: DestinationId) -> Result<(), DbError> {
        sqlx::query(r"DELETE FROM capacity_overrides WHERE destination_id = $1")
            .bind(destination_id.into_inner())
            .execute(&self.pool)
            .await?;

        debug!(%destination_id, "deleted capacity override");
        Ok(())
    }
}

#[async_trait]
impl ConfigStore for PgConfigStore {
    async fn load_policies(&self) -> Result<BTreeMap<SensitivityTier, Policy>, StoreError> {
        Ok(self.load_policies_inner().await?)
    }

    async fn save_policies(
        &self,
        policies: &BTreeMap<SensitivityTier, Policy>,
    ) -> Result<(), StoreError> {
        Ok(self.save_policies_inner(policies).await?)
    }

    async fn load_overrides(
        &self,
    ) -> Result<BTreeMap<DestinationId, CapacityOverride>, StoreError> {
        Ok(self.load_overrides_inner().await?)
    }

    async fn save_override(&self, record: &CapacityOverride) -> Result<(), StoreError> {
        Ok(self.save_override_inner(record).await?)
    }

    async fn clear_override(&self, destination_id: DestinationId) -> Result<(), StoreError> {
        Ok(self.clear_override_inner(destination_id).await?)
    }
}

/// A row from the `tier_policies` table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct PolicyRow {
    /// Tier name as stored (`low`, `medium`, `high`, `critical`).
    tier: String,
    /// Policy body as JSONB.
    policy: serde_json::Value,
}

/// A row from the `capacity_overrides` table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct OverrideRow {
    /// Destination the override applies to.
    destination_id: Uuid,
    /// Capacity multiplier.
    multiplier: f64,
    /// Administrator-facing justification.
    reason: String,
    /// Whether the override is switched on.
    active: bool,
    /// Expiry instant, if any.
    expires_at: Option<chrono::DateTime<chrono::Utc>>,
}
