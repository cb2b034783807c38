//! In-memory billing store for tests and local demos
//!
//! Mirrors what [`PgBillingStore`](super::store::PgBillingStore) does against
//! PostgreSQL: role and profile lookups, active-setting filtering, atomic
//! batches and the occupant report join. It also counts calls and can be told
//! to fail, so service behavior around storage errors is testable without a
//! database.
//!
//! # Example
//!
//! ```
//! use ipl_shared::billing::memory::InMemoryBillingStore;
//!
//! # async fn example() {
//! let store = InMemoryBillingStore::new();
//! store.add_occupant(1, 101).await;
//! store.add_monthly_setting(10, Some(150_000)).await;
//! store.fail_on_batch(2).await;
//! # }
//! ```

use crate::billing::policy::{MONTHLY_CADENCE, OCCUPANT_ROLE_TYPE};
use crate::billing::store::BillingStore;
use crate::models::billing::{BillingSetting, GeneratedBilling, OccupantBillingRow};
use crate::models::user::ProfileLink;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use tokio::sync::Mutex;

/// Role ID used for occupants added through [`InMemoryBillingStore::add_occupant`]
pub const OCCUPANT_ROLE_ID: i32 = 3;

/// A role held by a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRole {
    pub id: i32,
    pub name: String,
    pub role_type: String,
}

/// A profile linked to a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredProfile {
    pub id: i32,
    pub occupant_name: Option<String>,
    pub email: Option<String>,
}

/// A billing as it would sit in `billings` + `billings_profile_id_lnk`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBilling {
    pub id: i32,
    pub document_id: String,
    pub profile_id: i32,
    pub month: i32,
    pub year: i32,
    pub nominal: i64,
    pub created_at: DateTime<Utc>,
    pub status: Option<String>,
}

#[derive(Debug, Default)]
struct State {
    roles: BTreeMap<i32, Vec<StoredRole>>,
    profiles: BTreeMap<i32, StoredProfile>,
    settings: Vec<BillingSetting>,
    billings: Vec<StoredBilling>,
    next_billing_id: i32,

    user_lookups: usize,
    settings_loads: usize,
    profile_lookups: usize,
    report_loads: usize,
    batch_sizes: Vec<usize>,

    fail_on_batch: Option<usize>,
    fail_user_lookup: bool,
    fail_settings: bool,
    fail_report: bool,
}

/// Billing store backed by process memory
#[derive(Debug, Default)]
pub struct InMemoryBillingStore {
    state: Mutex<State>,
}

fn injected(operation: &str) -> sqlx::Error {
    sqlx::Error::Protocol(format!("injected failure: {}", operation))
}

impl InMemoryBillingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gives a user a role
    pub async fn add_role(&self, user_id: i32, role: StoredRole) {
        let mut state = self.state.lock().await;
        state.roles.entry(user_id).or_default().push(role);
    }

    /// Links a profile to a user, replacing any previous link
    pub async fn link_profile(&self, user_id: i32, profile: StoredProfile) {
        let mut state = self.state.lock().await;
        state.profiles.insert(user_id, profile);
    }

    /// Adds a user holding the occupant role with a linked profile
    pub async fn add_occupant(&self, user_id: i32, profile_id: i32) {
        self.add_role(
            user_id,
            StoredRole {
                id: OCCUPANT_ROLE_ID,
                name: "Penghuni".to_string(),
                role_type: OCCUPANT_ROLE_TYPE.to_string(),
            },
        )
        .await;
        self.link_profile(
            user_id,
            StoredProfile {
                id: profile_id,
                occupant_name: Some(format!("Penghuni {}", user_id)),
                email: Some(format!("user{}@example.com", user_id)),
            },
        )
        .await;
    }

    pub async fn add_setting(&self, setting: BillingSetting) {
        self.state.lock().await.settings.push(setting);
    }

    /// Adds an active, published monthly setting
    pub async fn add_monthly_setting(&self, id: i32, nominal: Option<i64>) {
        self.add_setting(BillingSetting {
            id,
            document_id: None,
            name: Some(format!("Iuran {}", id)),
            cadence: Some(MONTHLY_CADENCE.to_string()),
            nominal,
            is_active: true,
            published_at: Some(Utc::now()),
        })
        .await;
    }

    /// Stores a billing directly, bypassing generation
    pub async fn seed_billing(
        &self,
        profile_id: i32,
        month: i32,
        year: i32,
        nominal: i64,
        created_at: DateTime<Utc>,
        status: Option<&str>,
    ) -> i32 {
        let mut state = self.state.lock().await;
        state.next_billing_id += 1;
        let id = state.next_billing_id;
        state.billings.push(StoredBilling {
            id,
            document_id: format!("seed-{}", id),
            profile_id,
            month,
            year,
            nominal,
            created_at,
            status: status.map(str::to_string),
        });
        id
    }

    /// Makes the `n`-th call to `insert_batch` (1-based) fail without storing
    pub async fn fail_on_batch(&self, n: usize) {
        self.state.lock().await.fail_on_batch = Some(n);
    }

    pub async fn fail_user_lookup(&self) {
        self.state.lock().await.fail_user_lookup = true;
    }

    pub async fn fail_settings(&self) {
        self.state.lock().await.fail_settings = true;
    }

    pub async fn fail_report(&self) {
        self.state.lock().await.fail_report = true;
    }

    pub async fn user_lookups(&self) -> usize {
        self.state.lock().await.user_lookups
    }

    pub async fn settings_loads(&self) -> usize {
        self.state.lock().await.settings_loads
    }

    pub async fn profile_lookups(&self) -> usize {
        self.state.lock().await.profile_lookups
    }

    pub async fn report_loads(&self) -> usize {
        self.state.lock().await.report_loads
    }

    /// Sizes of every attempted batch, including a failed one
    pub async fn batch_sizes(&self) -> Vec<usize> {
        self.state.lock().await.batch_sizes.clone()
    }

    pub async fn billing_count(&self) -> usize {
        self.state.lock().await.billings.len()
    }

    pub async fn billings(&self) -> Vec<StoredBilling> {
        self.state.lock().await.billings.clone()
    }
}

#[async_trait]
impl BillingStore for InMemoryBillingStore {
    async fn find_user_ids_by_role_type(&self, role_type: &str) -> Result<Vec<i32>, sqlx::Error> {
        let mut state = self.state.lock().await;
        state.user_lookups += 1;
        if state.fail_user_lookup {
            return Err(injected("user lookup"));
        }

        Ok(state
            .roles
            .iter()
            .filter(|(_, roles)| roles.iter().any(|role| role.role_type == role_type))
            .map(|(&user_id, _)| user_id)
            .collect())
    }

    async fn find_active_settings(
        &self,
        cadence: &str,
    ) -> Result<Vec<BillingSetting>, sqlx::Error> {
        let mut state = self.state.lock().await;
        state.settings_loads += 1;
        if state.fail_settings {
            return Err(injected("settings load"));
        }

        let mut settings: Vec<BillingSetting> = state
            .settings
            .iter()
            .filter(|s| {
                s.cadence.as_deref() == Some(cadence) && s.is_active && s.published_at.is_some()
            })
            .cloned()
            .collect();
        settings.sort_by_key(|s| s.id);

        Ok(settings)
    }

    async fn find_profile_links(&self, user_ids: &[i32]) -> Result<Vec<ProfileLink>, sqlx::Error> {
        let mut state = self.state.lock().await;
        state.profile_lookups += 1;

        let wanted: HashSet<i32> = user_ids.iter().copied().collect();
        Ok(state
            .profiles
            .iter()
            .filter(|(user_id, _)| wanted.contains(user_id))
            .map(|(&user_id, profile)| ProfileLink {
                user_id,
                profile_id: profile.id,
            })
            .collect())
    }

    async fn insert_batch(&self, batch: &[GeneratedBilling]) -> Result<u64, sqlx::Error> {
        let mut state = self.state.lock().await;
        state.batch_sizes.push(batch.len());
        if state.fail_on_batch == Some(state.batch_sizes.len()) {
            return Err(injected("insert batch"));
        }

        for generated in batch {
            state.next_billing_id += 1;
            let id = state.next_billing_id;
            state.billings.push(StoredBilling {
                id,
                document_id: generated.billing.document_id.clone(),
                profile_id: generated.link.profile_id,
                month: generated.billing.month,
                year: generated.billing.year,
                nominal: generated.billing.nominal,
                created_at: generated.billing.created_at,
                status: None,
            });
        }

        Ok(batch.len() as u64)
    }

    async fn find_occupant_billing_rows(
        &self,
        role_type: &str,
    ) -> Result<Vec<OccupantBillingRow>, sqlx::Error> {
        let mut state = self.state.lock().await;
        state.report_loads += 1;
        if state.fail_report {
            return Err(injected("occupant report"));
        }

        let mut rows = Vec::new();
        for (&user_id, roles) in &state.roles {
            let Some(role) = roles
                .iter()
                .filter(|role| role.role_type == role_type)
                .min_by_key(|role| role.id)
            else {
                continue;
            };
            let Some(profile) = state.profiles.get(&user_id) else {
                continue;
            };

            let mut billings: Vec<&StoredBilling> = state
                .billings
                .iter()
                .filter(|b| b.profile_id == profile.id)
                .collect();
            billings.sort_by_key(|b| (b.year, b.month, b.id));

            for billing in billings {
                rows.push(OccupantBillingRow {
                    user_id,
                    profile_id: profile.id,
                    occupant_name: profile.occupant_name.clone(),
                    mobile_phone: None,
                    phone: None,
                    email: profile.email.clone(),
                    role_id: role.id,
                    role_name: Some(role.name.clone()),
                    role_type: Some(role.role_type.clone()),
                    billing_id: billing.id,
                    month: billing.month,
                    year: billing.year,
                    nominal: billing.nominal,
                    billing_created_at: billing.created_at,
                    status: billing.status.clone(),
                });
            }
        }

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_role_lookup_is_distinct() {
        let store = InMemoryBillingStore::new();
        store.add_occupant(1, 101).await;
        store
            .add_role(
                1,
                StoredRole {
                    id: 9,
                    name: "Penghuni Lama".to_string(),
                    role_type: OCCUPANT_ROLE_TYPE.to_string(),
                },
            )
            .await;
        store
            .add_role(
                2,
                StoredRole {
                    id: 1,
                    name: "Admin".to_string(),
                    role_type: "admin".to_string(),
                },
            )
            .await;

        let ids = store.find_user_ids_by_role_type(OCCUPANT_ROLE_TYPE).await.unwrap();
        assert_eq!(ids, vec![1]);
    }

    #[tokio::test]
    async fn test_inactive_and_unpublished_settings_are_filtered() {
        let store = InMemoryBillingStore::new();
        store.add_monthly_setting(1, Some(100)).await;

        let mut inactive = BillingSetting {
            id: 2,
            document_id: None,
            name: None,
            cadence: Some(MONTHLY_CADENCE.to_string()),
            nominal: Some(100),
            is_active: false,
            published_at: Some(Utc::now()),
        };
        store.add_setting(inactive.clone()).await;

        inactive.id = 3;
        inactive.is_active = true;
        inactive.published_at = None;
        store.add_setting(inactive.clone()).await;

        inactive.id = 4;
        inactive.published_at = Some(Utc::now());
        inactive.cadence = Some("tahunan".to_string());
        store.add_setting(inactive).await;

        let settings = store.find_active_settings(MONTHLY_CADENCE).await.unwrap();
        let ids: Vec<i32> = settings.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[tokio::test]
    async fn test_report_rows_follow_profile_links() {
        let store = InMemoryBillingStore::new();
        store.add_occupant(1, 101).await;
        let created = Utc::now();
        store.seed_billing(101, 3, 2025, 10_000, created, Some("unpaid")).await;
        store.seed_billing(999, 3, 2025, 50_000, created, None).await;

        let rows = store.find_occupant_billing_rows(OCCUPANT_ROLE_TYPE).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user_id, 1);
        assert_eq!(rows[0].nominal, 10_000);
        assert_eq!(rows[0].status.as_deref(), Some("unpaid"));
    }
}
