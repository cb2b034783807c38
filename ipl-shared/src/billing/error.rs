//! Errors raised by billing generation and the billing report

use crate::billing::service::BulkBillingReport;

/// Billing error types
///
/// Per-pair generation problems (a user without a profile, a setting without
/// a usable nominal) are not errors: they are counted in the generation
/// outcome and logged.
#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    /// Requested period is out of range; nothing was read or written
    #[error("{0}")]
    Validation(String),

    /// Eligible users could not be loaded
    #[error("failed to resolve eligible users: {0}")]
    Resolution(#[source] sqlx::Error),

    /// Active billing settings could not be loaded
    #[error("failed to load billing settings: {0}")]
    SettingLoad(#[source] sqlx::Error),

    /// A batch insert failed; earlier batches stay stored
    ///
    /// `report.success_count` is the number of rows stored before the
    /// failure. The other counts describe the whole run.
    #[error(
        "failed to persist billings after {} rows ({lost} not stored): {source}",
        .report.success_count
    )]
    Persistence {
        report: BulkBillingReport,
        lost: usize,
        #[source]
        source: sqlx::Error,
    },

    /// Occupant billing rows could not be loaded
    #[error("failed to load occupant billings: {0}")]
    Aggregation(#[source] sqlx::Error),
}

/// Billing result type alias
pub type BillingResult<T> = Result<T, BillingError>;
