//! Bulk monthly billing generation and the occupant billing report
//!
//! # Flow
//!
//! ```text
//! create_monthly_billings(user_ids, month, year)
//!   ├─> validate period                 (Validation)
//!   ├─> resolve eligible users          (Resolution)
//!   │     └─> none: return zero counts
//!   ├─> load active monthly settings    (SettingLoad)
//!   ├─> load user → profile links       (Resolution)
//!   ├─> generate pairs (no I/O)         (per-pair failures counted)
//!   └─> persist in batches              (Persistence)
//! ```
//!
//! Running twice for the same period stores the billings twice. Callers are
//! expected to trigger one run per period.

use crate::billing::aggregator::{aggregate_billing_rows, OccupantBillingSummary};
use crate::billing::error::{BillingError, BillingResult};
use crate::billing::generator::generate_billings;
use crate::billing::persistence::persist_in_batches;
use crate::billing::policy::{BillingPeriod, BillingPolicy};
use crate::billing::store::BillingStore;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Counts reported by a bulk generation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkBillingReport {
    /// Users considered
    pub total_users: usize,

    /// (user, setting) pairs attempted
    pub total_billings: usize,

    /// Billings stored
    pub success_count: usize,

    /// Pairs that produced no billing
    pub failed_count: usize,
}

/// Billing generation and reporting over a [`BillingStore`]
#[derive(Clone)]
pub struct BillingService {
    store: Arc<dyn BillingStore>,
    policy: BillingPolicy,
}

impl BillingService {
    pub fn new(store: Arc<dyn BillingStore>, policy: BillingPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &BillingPolicy {
        &self.policy
    }

    /// Generates and stores one billing per (eligible user, active setting)
    ///
    /// # Arguments
    ///
    /// * `user_ids` - Users to bill; `None` or empty bills every occupant
    /// * `month` - Billing month, 1-12
    /// * `year` - Billing year within the policy's bounds
    ///
    /// # Errors
    ///
    /// - `Validation` if the period is out of range (nothing is read)
    /// - `Resolution` / `SettingLoad` if lookups fail (nothing is written)
    /// - `Persistence` if a batch fails (earlier batches stay stored; the
    ///   error carries the run's counts)
    pub async fn create_monthly_billings(
        &self,
        user_ids: Option<Vec<i32>>,
        month: i32,
        year: i32,
    ) -> BillingResult<BulkBillingReport> {
        let period = BillingPeriod::new(month, year, &self.policy)?;

        let users = self.resolve_users(user_ids).await?;
        if users.is_empty() {
            info!(month, year, "No eligible users, nothing to bill");
            return Ok(BulkBillingReport::default());
        }

        let settings = self
            .store
            .find_active_settings(&self.policy.monthly_cadence)
            .await
            .map_err(BillingError::SettingLoad)?;

        let profiles: HashMap<i32, i32> = self
            .store
            .find_profile_links(&users)
            .await
            .map_err(BillingError::Resolution)?
            .into_iter()
            .map(|link| (link.user_id, link.profile_id))
            .collect();

        debug!(
            users = users.len(),
            settings = settings.len(),
            profiles = profiles.len(),
            "Generating billings"
        );

        let outcome = generate_billings(&users, &settings, period, &profiles, Utc::now());

        let counts = BulkBillingReport {
            total_users: outcome.total_users,
            total_billings: outcome.total_billings,
            success_count: 0,
            failed_count: outcome.failures.len(),
        };

        let persisted =
            persist_in_batches(self.store.as_ref(), &outcome.generated, self.policy.batch_size)
                .await
                .map_err(|failure| BillingError::Persistence {
                    report: BulkBillingReport {
                        success_count: failure.persisted,
                        ..counts
                    },
                    lost: failure.lost,
                    source: failure.source,
                })?;

        let report = BulkBillingReport {
            success_count: persisted,
            ..counts
        };

        info!(
            month,
            year,
            total_users = report.total_users,
            total_billings = report.total_billings,
            success_count = report.success_count,
            failed_count = report.failed_count,
            "Bulk billings created"
        );

        Ok(report)
    }

    /// Occupant billings summed per (user, month, year)
    pub async fn occupant_billing_report(&self) -> BillingResult<Vec<OccupantBillingSummary>> {
        let rows = self
            .store
            .find_occupant_billing_rows(&self.policy.occupant_role_type)
            .await
            .map_err(BillingError::Aggregation)?;

        let row_count = rows.len();
        let report = aggregate_billing_rows(rows);

        debug!(rows = row_count, entries = report.len(), "Occupant billing report built");

        Ok(report)
    }

    /// Explicit ids are used as given (first occurrence wins); otherwise
    /// every occupant is billed
    async fn resolve_users(&self, user_ids: Option<Vec<i32>>) -> BillingResult<Vec<i32>> {
        match user_ids {
            Some(ids) if !ids.is_empty() => {
                let mut seen = HashSet::with_capacity(ids.len());
                Ok(ids.into_iter().filter(|id| seen.insert(*id)).collect())
            }
            _ => self
                .store
                .find_user_ids_by_role_type(&self.policy.occupant_role_type)
                .await
                .map_err(BillingError::Resolution),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::memory::InMemoryBillingStore;
    use chrono::TimeZone;

    fn service_with(store: Arc<InMemoryBillingStore>, policy: BillingPolicy) -> BillingService {
        BillingService::new(store, policy)
    }

    async fn seeded_store(users: i32, settings: &[i64]) -> Arc<InMemoryBillingStore> {
        let store = Arc::new(InMemoryBillingStore::new());
        for user_id in 1..=users {
            store.add_occupant(user_id, user_id + 100).await;
        }
        for (i, nominal) in settings.iter().enumerate() {
            store.add_monthly_setting(i as i32 + 1, Some(*nominal)).await;
        }
        store
    }

    #[tokio::test]
    async fn test_all_occupants_times_all_settings() {
        let store = seeded_store(3, &[10_000, 5_000]).await;
        let service = service_with(store.clone(), BillingPolicy::default());

        let report = service.create_monthly_billings(None, 3, 2025).await.unwrap();

        assert_eq!(
            report,
            BulkBillingReport {
                total_users: 3,
                total_billings: 6,
                success_count: 6,
                failed_count: 0,
            }
        );
        assert_eq!(store.billing_count().await, 6);
        assert!(store
            .billings()
            .await
            .iter()
            .all(|b| b.month == 3 && b.year == 2025));
    }

    #[tokio::test]
    async fn test_explicit_ids_are_deduplicated_and_not_checked() {
        let store = seeded_store(2, &[10_000]).await;
        let service = service_with(store.clone(), BillingPolicy::default());

        // 99 does not exist and has no profile
        let report = service
            .create_monthly_billings(Some(vec![2, 1, 2, 99, 1]), 3, 2025)
            .await
            .unwrap();

        assert_eq!(report.total_users, 3);
        assert_eq!(report.total_billings, 3);
        assert_eq!(report.success_count, 2);
        assert_eq!(report.failed_count, 1);
        assert_eq!(store.user_lookups().await, 0);
    }

    #[tokio::test]
    async fn test_empty_explicit_ids_bill_all_occupants() {
        let store = seeded_store(2, &[10_000]).await;
        let service = service_with(store.clone(), BillingPolicy::default());

        let report = service
            .create_monthly_billings(Some(Vec::new()), 3, 2025)
            .await
            .unwrap();

        assert_eq!(report.total_users, 2);
        assert_eq!(store.user_lookups().await, 1);
    }

    #[tokio::test]
    async fn test_counts_always_add_up() {
        let store = seeded_store(4, &[10_000]).await;
        store.add_monthly_setting(50, None).await;
        store.add_monthly_setting(51, Some(-1)).await;
        let service = service_with(store, BillingPolicy::default());

        let report = service.create_monthly_billings(None, 3, 2025).await.unwrap();

        assert_eq!(report.total_billings, 12);
        assert_eq!(report.success_count, 4);
        assert_eq!(report.failed_count, 8);
        assert_eq!(
            report.success_count + report.failed_count,
            report.total_billings
        );
    }

    #[tokio::test]
    async fn test_repeated_run_duplicates_billings() {
        let store = seeded_store(2, &[10_000]).await;
        let service = service_with(store.clone(), BillingPolicy::default());

        service.create_monthly_billings(None, 3, 2025).await.unwrap();
        service.create_monthly_billings(None, 3, 2025).await.unwrap();

        assert_eq!(store.billing_count().await, 4);
    }

    #[tokio::test]
    async fn test_no_users_short_circuits() {
        let store = Arc::new(InMemoryBillingStore::new());
        store.add_monthly_setting(1, Some(10_000)).await;
        let service = service_with(store.clone(), BillingPolicy::default());

        let report = service.create_monthly_billings(None, 3, 2025).await.unwrap();

        assert_eq!(report, BulkBillingReport::default());
        assert_eq!(store.settings_loads().await, 0);
        assert_eq!(store.profile_lookups().await, 0);
        assert!(store.batch_sizes().await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_period_touches_nothing() {
        let store = seeded_store(1, &[10_000]).await;
        let service = service_with(store.clone(), BillingPolicy::default());

        for (month, year) in [(13, 2025), (0, 2025), (3, 1999)] {
            let err = service
                .create_monthly_billings(None, month, year)
                .await
                .unwrap_err();
            assert!(matches!(err, BillingError::Validation(_)));
        }

        assert_eq!(store.user_lookups().await, 0);
        assert_eq!(store.settings_loads().await, 0);
    }

    #[tokio::test]
    async fn test_no_settings_bills_nothing() {
        let store = seeded_store(2, &[]).await;
        let service = service_with(store.clone(), BillingPolicy::default());

        let report = service.create_monthly_billings(None, 3, 2025).await.unwrap();

        assert_eq!(report.total_users, 2);
        assert_eq!(report.total_billings, 0);
        assert!(store.batch_sizes().await.is_empty());
    }

    #[tokio::test]
    async fn test_lookup_failures_map_to_their_stage() {
        let store = seeded_store(1, &[10_000]).await;
        store.fail_user_lookup().await;
        let service = service_with(store.clone(), BillingPolicy::default());
        let err = service.create_monthly_billings(None, 3, 2025).await.unwrap_err();
        assert!(matches!(err, BillingError::Resolution(_)));

        let store = seeded_store(1, &[10_000]).await;
        store.fail_settings().await;
        let service = service_with(store.clone(), BillingPolicy::default());
        let err = service.create_monthly_billings(None, 3, 2025).await.unwrap_err();
        assert!(matches!(err, BillingError::SettingLoad(_)));
        assert_eq!(store.billing_count().await, 0);
    }

    #[tokio::test]
    async fn test_batch_failure_reports_partial_progress() {
        // 250 users × 1 setting with batches of 100
        let store = seeded_store(250, &[10_000]).await;
        store.fail_on_batch(2).await;
        let service = service_with(store.clone(), BillingPolicy::default());

        let err = service.create_monthly_billings(None, 3, 2025).await.unwrap_err();

        match err {
            BillingError::Persistence { report, lost, .. } => {
                assert_eq!(report.success_count, 100);
                assert_eq!(lost, 150);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(store.billing_count().await, 100);
    }

    #[tokio::test]
    async fn test_batch_failure_keeps_pair_failures() {
        // 250 users × (one usable setting, one without a nominal)
        let store = seeded_store(250, &[10_000]).await;
        store.add_monthly_setting(2, None).await;
        store.fail_on_batch(2).await;
        let service = service_with(store.clone(), BillingPolicy::default());

        let err = service.create_monthly_billings(None, 3, 2025).await.unwrap_err();

        match err {
            BillingError::Persistence { report, lost, .. } => {
                assert_eq!(
                    report,
                    BulkBillingReport {
                        total_users: 250,
                        total_billings: 500,
                        success_count: 100,
                        failed_count: 250,
                    }
                );
                assert_eq!(lost, 150);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_configured_batch_size_is_used() {
        let store = seeded_store(5, &[10_000]).await;
        let policy = BillingPolicy {
            batch_size: 2,
            ..Default::default()
        };
        let service = service_with(store.clone(), policy);

        service.create_monthly_billings(None, 3, 2025).await.unwrap();

        assert_eq!(store.batch_sizes().await, vec![2, 2, 1]);
    }

    #[tokio::test]
    async fn test_report_sums_per_user_and_period() {
        let store = seeded_store(2, &[]).await;
        let created = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
        store.seed_billing(101, 3, 2025, 10_000, created, None).await;
        store.seed_billing(101, 3, 2025, 5_000, created, None).await;
        store.seed_billing(102, 4, 2025, 7_500, created, None).await;
        let service = service_with(store, BillingPolicy::default());

        let report = service.occupant_billing_report().await.unwrap();

        assert_eq!(report.len(), 2);
        assert_eq!((report[0].user_id, report[0].month), (1, 3));
        assert_eq!(report[0].total_nominal, 15_000);
        assert_eq!((report[1].user_id, report[1].month), (2, 4));
        assert_eq!(report[1].total_nominal, 7_500);
    }

    #[tokio::test]
    async fn test_report_after_generation() {
        let store = seeded_store(1, &[10_000, 5_000]).await;
        let service = service_with(store, BillingPolicy::default());

        service.create_monthly_billings(None, 3, 2025).await.unwrap();
        let report = service.occupant_billing_report().await.unwrap();

        assert_eq!(report.len(), 1);
        assert_eq!(report[0].total_nominal, 15_000);
        assert_eq!(report[0].billing_count, 2);
    }

    #[tokio::test]
    async fn test_report_without_occupants_is_empty() {
        let store = Arc::new(InMemoryBillingStore::new());
        let service = service_with(store, BillingPolicy::default());

        assert!(service.occupant_billing_report().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_report_failure() {
        let store = Arc::new(InMemoryBillingStore::new());
        store.fail_report().await;
        let service = service_with(store, BillingPolicy::default());

        let err = service.occupant_billing_report().await.unwrap_err();
        assert!(matches!(err, BillingError::Aggregation(_)));
    }
}
