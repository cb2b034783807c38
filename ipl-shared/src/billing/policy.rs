//! Billing policy: who is billed, which settings apply, and valid periods

use crate::billing::error::BillingError;
use serde::{Deserialize, Serialize};

/// `up_roles.type` of residents who receive monthly billings
pub const OCCUPANT_ROLE_TYPE: &str = "penghuni";

/// `setting_billings.jenis_billing` of settings billed every month
pub const MONTHLY_CADENCE: &str = "bulanan";

/// Rows inserted per batch
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Earliest billable year
pub const MIN_YEAR: i32 = 2020;

/// Latest billable year
pub const MAX_YEAR: i32 = 2100;

/// Tunable parameters of bulk billing generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingPolicy {
    /// Role type whose holders are billed when no user ids are given
    pub occupant_role_type: String,

    /// Setting cadence that is generated
    pub monthly_cadence: String,

    /// Maximum rows per insert batch, at least 1
    pub batch_size: usize,

    pub min_year: i32,

    pub max_year: i32,
}

impl Default for BillingPolicy {
    fn default() -> Self {
        Self {
            occupant_role_type: OCCUPANT_ROLE_TYPE.to_string(),
            monthly_cadence: MONTHLY_CADENCE.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            min_year: MIN_YEAR,
            max_year: MAX_YEAR,
        }
    }
}

/// A validated billing month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BillingPeriod {
    month: i32,
    year: i32,
}

impl BillingPeriod {
    /// Validates a (month, year) pair against the policy's year bounds
    ///
    /// # Errors
    ///
    /// `BillingError::Validation` when the month is outside 1..=12 or the
    /// year is outside `policy.min_year..=policy.max_year`
    pub fn new(month: i32, year: i32, policy: &BillingPolicy) -> Result<Self, BillingError> {
        if !(1..=12).contains(&month) {
            return Err(BillingError::Validation(format!(
                "month must be between 1 and 12, got {}",
                month
            )));
        }

        if year < policy.min_year || year > policy.max_year {
            return Err(BillingError::Validation(format!(
                "year must be between {} and {}, got {}",
                policy.min_year, policy.max_year, year
            )));
        }

        Ok(Self { month, year })
    }

    pub fn month(&self) -> i32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }
}
