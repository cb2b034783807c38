//! Batched storage of generated billings

use crate::billing::store::BillingStore;
use crate::models::billing::GeneratedBilling;
use tracing::{debug, error};

/// A batch insert failed part way through a run
#[derive(Debug, thiserror::Error)]
#[error("billing batch failed after {persisted} rows ({lost} not stored): {source}")]
pub struct BatchFailure {
    /// Rows stored by earlier batches
    pub persisted: usize,

    /// Rows in the failing batch and every batch after it
    pub lost: usize,

    #[source]
    pub source: sqlx::Error,
}

/// Stores generated billings in chunks of `batch_size`
///
/// Each chunk is handed to [`BillingStore::insert_batch`] as one unit. The
/// first failing chunk stops the run; chunks stored before it stay stored.
///
/// # Returns
///
/// Number of billings stored
///
/// # Errors
///
/// [`BatchFailure`] with the number of rows stored before the failure and
/// the number of rows that were not stored
pub async fn persist_in_batches(
    store: &dyn BillingStore,
    generated: &[GeneratedBilling],
    batch_size: usize,
) -> Result<usize, BatchFailure> {
    let batch_size = batch_size.max(1);
    let mut persisted = 0usize;

    for (index, batch) in generated.chunks(batch_size).enumerate() {
        match store.insert_batch(batch).await {
            Ok(inserted) => {
                persisted += inserted as usize;
                debug!(
                    batch = index + 1,
                    rows = inserted,
                    persisted,
                    "Stored billing batch"
                );
            }
            Err(source) => {
                let lost = generated.len() - persisted;
                error!(
                    batch = index + 1,
                    persisted,
                    lost,
                    error = %source,
                    "Billing batch failed, remaining batches skipped"
                );
                return Err(BatchFailure {
                    persisted,
                    lost,
                    source,
                });
            }
        }
    }

    Ok(persisted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::memory::InMemoryBillingStore;
    use crate::models::billing::{NewBilling, NewBillingProfileLink};
    use chrono::Utc;

    fn generated(count: usize) -> Vec<GeneratedBilling> {
        let now = Utc::now();
        (0..count)
            .map(|i| {
                let document_id = format!("doc-{}", i);
                GeneratedBilling {
                    billing: NewBilling {
                        document_id: document_id.clone(),
                        month: 3,
                        year: 2025,
                        nominal: 10_000,
                        created_at: now,
                    },
                    link: NewBillingProfileLink {
                        billing_document_id: document_id,
                        profile_id: 1,
                    },
                }
            })
            .collect()
    }

    #[tokio::test]
    async fn test_batches_are_bounded() {
        let store = InMemoryBillingStore::new();

        let persisted = persist_in_batches(&store, &generated(250), 100).await.unwrap();

        assert_eq!(persisted, 250);
        assert_eq!(store.batch_sizes().await, vec![100, 100, 50]);
        assert_eq!(store.billing_count().await, 250);
    }

    #[tokio::test]
    async fn test_failure_stops_remaining_batches() {
        let store = InMemoryBillingStore::new();
        store.fail_on_batch(2).await;

        let failure = persist_in_batches(&store, &generated(250), 100)
            .await
            .unwrap_err();

        assert_eq!(failure.persisted, 100);
        assert_eq!(failure.lost, 150);

        // batch 3 was never attempted
        assert_eq!(store.batch_sizes().await, vec![100, 100]);
        assert_eq!(store.billing_count().await, 100);
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_calls() {
        let store = InMemoryBillingStore::new();

        let persisted = persist_in_batches(&store, &[], 100).await.unwrap();

        assert_eq!(persisted, 0);
        assert!(store.batch_sizes().await.is_empty());
    }

    #[tokio::test]
    async fn test_zero_batch_size_is_treated_as_one() {
        let store = InMemoryBillingStore::new();

        persist_in_batches(&store, &generated(3), 0).await.unwrap();

        assert_eq!(store.batch_sizes().await, vec![1, 1, 1]);
    }
}
