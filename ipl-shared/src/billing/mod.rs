//! Billing core
//!
//! Bulk monthly billing generation and the occupant billing report.
//!
//! # Modules
//!
//! - [`policy`]: role type, cadence, batch size and period validation
//! - [`store`]: the [`BillingStore`] seam and its PostgreSQL implementation
//! - [`generator`]: pure (user × setting) billing construction
//! - [`persistence`]: batched storage with partial-progress reporting
//! - [`aggregator`]: per-(user, month, year) sums for the report
//! - [`service`]: the [`BillingService`] tying the steps together
//! - [`memory`]: in-memory store for tests
//!
//! # Example
//!
//! ```no_run
//! use ipl_shared::billing::{BillingPolicy, BillingService, PgBillingStore};
//! use sqlx::PgPool;
//! use std::sync::Arc;
//!
//! # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
//! let service = BillingService::new(Arc::new(PgBillingStore::new(pool)), BillingPolicy::default());
//!
//! let report = service.create_monthly_billings(None, 3, 2025).await?;
//! println!("{} of {} billings stored", report.success_count, report.total_billings);
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod error;
pub mod generator;
pub mod memory;
pub mod persistence;
pub mod policy;
pub mod service;
pub mod store;

pub use aggregator::{aggregate_billing_rows, OccupantBillingSummary};
pub use error::{BillingError, BillingResult};
pub use generator::{generate_billings, GenerationOutcome, PairFailure, PairFailureReason};
pub use persistence::{persist_in_batches, BatchFailure};
pub use policy::{BillingPeriod, BillingPolicy, MONTHLY_CADENCE, OCCUPANT_ROLE_TYPE};
pub use service::{BillingService, BulkBillingReport};
pub use store::{BillingStore, PgBillingStore};
