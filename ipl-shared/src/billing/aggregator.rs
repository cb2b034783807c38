//! Occupant billing report: billing rows summed per user and month
//!
//! A user can have several billings in one month (one per active setting).
//! The report collapses them into one entry per (user, month, year) whose
//! `total_nominal` is the sum of every underlying billing.

use crate::models::billing::OccupantBillingRow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// One (user, month, year) entry of the occupant billing report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupantBillingSummary {
    pub user_id: i32,
    pub profile_id: i32,
    pub occupant_name: Option<String>,
    pub mobile_phone: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub role_id: i32,
    pub role_name: Option<String>,
    pub role_type: Option<String>,
    pub month: i32,
    pub year: i32,

    /// Sum of the nominals of every billing in the group
    pub total_nominal: i64,

    pub billing_count: usize,

    /// Underlying billing IDs in ascending order
    pub billing_ids: Vec<i32>,

    /// Status of the representative billing
    pub status: Option<String>,

    /// Billing the descriptive fields were taken from
    pub representative_billing_id: i32,

    pub latest_created_at: DateTime<Utc>,
}

impl OccupantBillingSummary {
    fn from_row(row: OccupantBillingRow) -> Self {
        Self {
            user_id: row.user_id,
            profile_id: row.profile_id,
            occupant_name: row.occupant_name,
            mobile_phone: row.mobile_phone,
            phone: row.phone,
            email: row.email,
            role_id: row.role_id,
            role_name: row.role_name,
            role_type: row.role_type,
            month: row.month,
            year: row.year,
            total_nominal: row.nominal,
            billing_count: 1,
            billing_ids: vec![row.billing_id],
            status: row.status,
            representative_billing_id: row.billing_id,
            latest_created_at: row.billing_created_at,
        }
    }

    /// Adds one more billing of the same group
    fn absorb(&mut self, row: OccupantBillingRow) {
        self.total_nominal = match self.total_nominal.checked_add(row.nominal) {
            Some(total) => total,
            None => {
                warn!(
                    user_id = self.user_id,
                    month = self.month,
                    year = self.year,
                    "Billing total overflowed, saturating"
                );
                i64::MAX
            }
        };
        self.billing_count += 1;
        self.billing_ids.push(row.billing_id);

        let newer = (row.billing_created_at, row.billing_id)
            > (self.latest_created_at, self.representative_billing_id);
        if newer {
            self.profile_id = row.profile_id;
            self.occupant_name = row.occupant_name;
            self.mobile_phone = row.mobile_phone;
            self.phone = row.phone;
            self.email = row.email;
            self.role_id = row.role_id;
            self.role_name = row.role_name;
            self.role_type = row.role_type;
            self.status = row.status;
            self.representative_billing_id = row.billing_id;
            self.latest_created_at = row.billing_created_at;
        }
    }
}

/// Groups billing rows by (user, month, year) and sums their nominals
///
/// Descriptive fields of each group come from its most recently created
/// billing; equal creation times fall back to the highest billing ID. The
/// result is ordered by user, then year, then month.
pub fn aggregate_billing_rows(rows: Vec<OccupantBillingRow>) -> Vec<OccupantBillingSummary> {
    let mut groups: BTreeMap<(i32, i32, i32), OccupantBillingSummary> = BTreeMap::new();

    for row in rows {
        let key = (row.user_id, row.year, row.month);
        match groups.get_mut(&key) {
            Some(summary) => summary.absorb(row),
            None => {
                groups.insert(key, OccupantBillingSummary::from_row(row));
            }
        }
    }

    groups
        .into_values()
        .map(|mut summary| {
            summary.billing_ids.sort_unstable();
            summary
        })
        .collect()
}
