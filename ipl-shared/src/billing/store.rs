//! Storage seam for billing generation and the occupant report
//!
//! The service only talks to a [`BillingStore`]. Production uses
//! [`PgBillingStore`]; tests use [`InMemoryBillingStore`](super::memory::InMemoryBillingStore).

use crate::models::billing::{Billing, BillingSetting, GeneratedBilling, OccupantBillingRow};
use crate::models::user::{ProfileLink, User};
use async_trait::async_trait;
use sqlx::PgPool;

/// Data access required by the billing service
#[async_trait]
pub trait BillingStore: Send + Sync {
    /// IDs of every user holding a role of the given type, without duplicates
    async fn find_user_ids_by_role_type(&self, role_type: &str) -> Result<Vec<i32>, sqlx::Error>;

    /// Active, published settings of the given cadence
    async fn find_active_settings(&self, cadence: &str)
        -> Result<Vec<BillingSetting>, sqlx::Error>;

    /// Profile links of the given users; users without a profile are omitted
    async fn find_profile_links(&self, user_ids: &[i32]) -> Result<Vec<ProfileLink>, sqlx::Error>;

    /// Stores one batch of billings with their profile links, all or nothing
    ///
    /// Returns the number of billings stored.
    async fn insert_batch(&self, batch: &[GeneratedBilling]) -> Result<u64, sqlx::Error>;

    /// Billing rows of every user holding a role of the given type
    async fn find_occupant_billing_rows(
        &self,
        role_type: &str,
    ) -> Result<Vec<OccupantBillingRow>, sqlx::Error>;
}

/// PostgreSQL-backed billing store
#[derive(Debug, Clone)]
pub struct PgBillingStore {
    pool: PgPool,
}

impl PgBillingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl BillingStore for PgBillingStore {
    async fn find_user_ids_by_role_type(&self, role_type: &str) -> Result<Vec<i32>, sqlx::Error> {
        let users = User::find_by_role_type(&self.pool, role_type).await?;
        Ok(users.into_iter().map(|user| user.id).collect())
    }

    async fn find_active_settings(
        &self,
        cadence: &str,
    ) -> Result<Vec<BillingSetting>, sqlx::Error> {
        BillingSetting::list_active(&self.pool, cadence).await
    }

    async fn find_profile_links(&self, user_ids: &[i32]) -> Result<Vec<ProfileLink>, sqlx::Error> {
        ProfileLink::find_by_user_ids(&self.pool, user_ids).await
    }

    async fn insert_batch(&self, batch: &[GeneratedBilling]) -> Result<u64, sqlx::Error> {
        Billing::insert_batch(&self.pool, batch).await
    }

    async fn find_occupant_billing_rows(
        &self,
        role_type: &str,
    ) -> Result<Vec<OccupantBillingRow>, sqlx::Error> {
        Billing::list_for_role_type(&self.pool, role_type).await
    }
}
