//! Construction of billing rows for one period
//!
//! Generation does no I/O. Every (user, setting) pair is attempted; a pair
//! that cannot be billed is recorded as a [`PairFailure`] and the rest of the
//! run continues.

use crate::billing::policy::BillingPeriod;
use crate::models::billing::{BillingSetting, GeneratedBilling, NewBilling, NewBillingProfileLink};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use tracing::warn;
use uuid::Uuid;

/// Why a (user, setting) pair produced no billing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum PairFailureReason {
    /// The user has no linked profile to bill
    MissingProfile,

    /// The setting has no nominal
    MissingNominal,

    /// The setting's nominal is below zero
    NegativeNominal { nominal: i64 },
}

impl fmt::Display for PairFailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PairFailureReason::MissingProfile => write!(f, "user has no profile"),
            PairFailureReason::MissingNominal => write!(f, "setting has no nominal"),
            PairFailureReason::NegativeNominal { nominal } => {
                write!(f, "setting nominal is negative ({})", nominal)
            }
        }
    }
}

/// A (user, setting) pair that produced no billing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PairFailure {
    pub user_id: i32,
    pub setting_id: i32,
    #[serde(flatten)]
    pub reason: PairFailureReason,
}

/// Result of one generation run
#[derive(Debug, Clone, Default)]
pub struct GenerationOutcome {
    /// Number of users considered
    pub total_users: usize,

    /// Number of (user, setting) pairs attempted
    pub total_billings: usize,

    /// Billings ready to be stored, in (user, setting) order
    pub generated: Vec<GeneratedBilling>,

    pub failures: Vec<PairFailure>,
}

/// Builds one billing per (user, setting) pair for the given period
///
/// # Arguments
///
/// * `user_ids` - Users to bill, without duplicates
/// * `settings` - Active settings to apply to every user
/// * `period` - Validated billing month
/// * `profiles` - User ID → profile ID
/// * `created_at` - Timestamp stamped on every generated row
///
/// # Returns
///
/// An outcome where `generated.len() + failures.len() == total_billings`
pub fn generate_billings(
    user_ids: &[i32],
    settings: &[BillingSetting],
    period: BillingPeriod,
    profiles: &HashMap<i32, i32>,
    created_at: DateTime<Utc>,
) -> GenerationOutcome {
    let mut outcome = GenerationOutcome {
        total_users: user_ids.len(),
        total_billings: user_ids.len() * settings.len(),
        generated: Vec::with_capacity(user_ids.len() * settings.len()),
        failures: Vec::new(),
    };

    for &user_id in user_ids {
        for setting in settings {
            match build_pair(user_id, setting, period, profiles, created_at) {
                Ok(generated) => outcome.generated.push(generated),
                Err(reason) => {
                    warn!(
                        user_id,
                        setting_id = setting.id,
                        month = period.month(),
                        year = period.year(),
                        %reason,
                        "Skipping billing"
                    );
                    outcome.failures.push(PairFailure {
                        user_id,
                        setting_id: setting.id,
                        reason,
                    });
                }
            }
        }
    }

    outcome
}

fn build_pair(
    user_id: i32,
    setting: &BillingSetting,
    period: BillingPeriod,
    profiles: &HashMap<i32, i32>,
    created_at: DateTime<Utc>,
) -> Result<GeneratedBilling, PairFailureReason> {
    let profile_id = *profiles
        .get(&user_id)
        .ok_or(PairFailureReason::MissingProfile)?;

    let nominal = setting.nominal.ok_or(PairFailureReason::MissingNominal)?;
    if nominal < 0 {
        return Err(PairFailureReason::NegativeNominal { nominal });
    }

    let document_id = Uuid::new_v4().simple().to_string();

    Ok(GeneratedBilling {
        billing: NewBilling {
            document_id: document_id.clone(),
            month: period.month(),
            year: period.year(),
            nominal,
            created_at,
        },
        link: NewBillingProfileLink {
            billing_document_id: document_id,
            profile_id,
        },
    })
}
