//! Billing models and database operations
//!
//! Covers the tables touched by bulk monthly billing generation and the
//! occupant billing report:
//!
//! - `setting_billings`: recurring billing templates (externally managed)
//! - `billings`: one charge for one profile and one period
//! - `billings_profile_id_lnk`: billing → profile association
//! - `billings_status_bill_lnk` / `master_general_statuses`: status per billing
//!
//! Column names follow the existing schema (`bulan`, `tahun`, ...). Every
//! query aliases them onto the English field names of the typed records
//! below, so a renamed column fails loudly at the query instead of silently
//! producing empty fields.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE billings (
//!     id SERIAL PRIMARY KEY,
//!     document_id VARCHAR(255) NOT NULL UNIQUE,
//!     bulan INTEGER NOT NULL CHECK (bulan BETWEEN 1 AND 12),
//!     tahun INTEGER NOT NULL,
//!     nominal BIGINT NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     published_at TIMESTAMPTZ
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};

/// A single billing instance
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Billing {
    /// Billing ID
    pub id: i32,

    /// Stable external identifier, generated at creation time
    pub document_id: String,

    /// Billing month (1-12), column `bulan`
    pub month: i32,

    /// Billing year, column `tahun`
    pub year: i32,

    /// Amount charged, in the smallest currency unit
    pub nominal: i64,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    pub published_at: Option<DateTime<Utc>>,
}

/// A billing row that has been constructed but not yet stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBilling {
    /// Document ID, also used to attach the profile link inside the same batch
    pub document_id: String,

    pub month: i32,

    pub year: i32,

    pub nominal: i64,

    /// Timestamp written to `created_at`, `updated_at` and `published_at`
    pub created_at: DateTime<Utc>,
}

/// Association between a not-yet-stored billing and a profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBillingProfileLink {
    /// Document ID of the billing this link belongs to
    pub billing_document_id: String,

    /// Target profile
    pub profile_id: i32,
}

/// One generated (billing, profile link) pair
///
/// Generation always produces both halves together; persistence always
/// writes both halves in the same batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedBilling {
    pub billing: NewBilling,
    pub link: NewBillingProfileLink,
}

/// Recurring billing template, table `setting_billings`
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BillingSetting {
    pub id: i32,

    pub document_id: Option<String>,

    /// Display name, column `nama_billing`
    pub name: Option<String>,

    /// Billing cadence, column `jenis_billing` (e.g. "bulanan")
    pub cadence: Option<String>,

    /// Amount to charge per period; may be missing in the source data
    pub nominal: Option<i64>,

    pub is_active: bool,

    pub published_at: Option<DateTime<Utc>>,
}

/// Flat row of the occupant billing report query
///
/// One row per (occupant user, billing). The aggregator collapses these per
/// (user, month, year).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OccupantBillingRow {
    pub user_id: i32,
    pub profile_id: i32,
    /// Column `profiles.nama_penghuni`
    pub occupant_name: Option<String>,
    /// Column `profiles.no_hp`
    pub mobile_phone: Option<String>,
    /// Column `profiles.no_telp`
    pub phone: Option<String>,
    pub email: Option<String>,
    pub role_id: i32,
    pub role_name: Option<String>,
    pub role_type: Option<String>,
    pub billing_id: i32,
    pub month: i32,
    pub year: i32,
    pub nominal: i64,
    pub billing_created_at: DateTime<Utc>,
    /// Column `master_general_statuses.status_name`, absent when no status is linked
    pub status: Option<String>,
}

impl Billing {
    /// Finds a billing by ID
    pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Self>, sqlx::Error> {
        let billing = sqlx::query_as::<_, Billing>(
            r#"
            SELECT id, document_id, bulan AS month, tahun AS year, nominal,
                   created_at, updated_at, published_at
            FROM billings
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(billing)
    }

    /// Inserts one batch of generated billings together with their profile links
    ///
    /// Both inserts run in a single transaction: either every billing of the
    /// batch and its link is stored, or none of them is. Links are attached by
    /// joining on the billing `document_id`, so no ordering assumption is made
    /// about `RETURNING` output.
    ///
    /// # Returns
    ///
    /// Number of billing rows inserted
    pub async fn insert_batch(
        pool: &PgPool,
        batch: &[GeneratedBilling],
    ) -> Result<u64, sqlx::Error> {
        if batch.is_empty() {
            return Ok(0);
        }

        let mut tx = pool.begin().await?;

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO billings (document_id, bulan, tahun, nominal, created_at, updated_at, published_at) ",
        );
        builder.push_values(batch, |mut row, generated| {
            let billing = &generated.billing;
            row.push_bind(billing.document_id.clone())
                .push_bind(billing.month)
                .push_bind(billing.year)
                .push_bind(billing.nominal)
                .push_bind(billing.created_at)
                .push_bind(billing.created_at)
                .push_bind(billing.created_at);
        });

        let inserted = builder.build().execute(&mut *tx).await?.rows_affected();

        let document_ids: Vec<String> = batch
            .iter()
            .map(|generated| generated.link.billing_document_id.clone())
            .collect();
        let profile_ids: Vec<i32> = batch.iter().map(|generated| generated.link.profile_id).collect();

        let linked = sqlx::query(
            r#"
            INSERT INTO billings_profile_id_lnk (billing_id, profile_id)
            SELECT b.id, v.profile_id
            FROM UNNEST($1::VARCHAR[], $2::INTEGER[]) AS v(document_id, profile_id)
            JOIN billings b ON b.document_id = v.document_id
            "#,
        )
        .bind(&document_ids)
        .bind(&profile_ids)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if linked != inserted {
            // Rolls back on drop
            return Err(sqlx::Error::Protocol(format!(
                "billing batch inserted {} rows but linked {}",
                inserted, linked
            )));
        }

        tx.commit().await?;

        Ok(inserted)
    }

    /// Lists the billing rows of every user holding the given role type
    ///
    /// Users with several matching roles are reported under the lowest role
    /// ID so that each billing appears exactly once. Billings without a status
    /// link are included with `status = None`.
    pub async fn list_for_role_type(
        pool: &PgPool,
        role_type: &str,
    ) -> Result<Vec<OccupantBillingRow>, sqlx::Error> {
        let rows = sqlx::query_as::<_, OccupantBillingRow>(
            r#"
            SELECT uu.id AS user_id,
                   p.id AS profile_id,
                   p.nama_penghuni AS occupant_name,
                   p.no_hp AS mobile_phone,
                   p.no_telp AS phone,
                   uu.email AS email,
                   ur.id AS role_id,
                   ur.name AS role_name,
                   ur.type AS role_type,
                   b.id AS billing_id,
                   b.bulan AS month,
                   b.tahun AS year,
                   b.nominal AS nominal,
                   b.created_at AS billing_created_at,
                   s.status_name AS status
            FROM up_users uu
            JOIN LATERAL (
                SELECT r.id, r.name, r.type
                FROM up_users_role_lnk url
                JOIN up_roles r ON r.id = url.role_id
                WHERE url.user_id = uu.id AND r.type = $1
                ORDER BY r.id
                LIMIT 1
            ) ur ON TRUE
            JOIN profiles_user_lnk pul ON pul.user_id = uu.id
            JOIN profiles p ON p.id = pul.profile_id
            JOIN billings_profile_id_lnk bpl ON bpl.profile_id = p.id
            JOIN billings b ON b.id = bpl.billing_id
            LEFT JOIN billings_status_bill_lnk bsl ON bsl.t_billing_id = b.id
            LEFT JOIN master_general_statuses s ON s.id = bsl.master_general_status_id
            ORDER BY uu.id, b.tahun, b.bulan, b.id
            "#,
        )
        .bind(role_type)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }
}

impl BillingSetting {
    /// Lists settings that take part in generation for the given cadence
    ///
    /// A setting is live when it is active and has been published.
    pub async fn list_active(pool: &PgPool, cadence: &str) -> Result<Vec<Self>, sqlx::Error> {
        let settings = sqlx::query_as::<_, BillingSetting>(
            r#"
            SELECT id, document_id, nama_billing AS name, jenis_billing AS cadence,
                   nominal, is_active, published_at
            FROM setting_billings
            WHERE jenis_billing = $1
              AND is_active = TRUE
              AND published_at IS NOT NULL
            ORDER BY id
            "#,
        )
        .bind(cadence)
        .fetch_all(pool)
        .await?;

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_billing_serializes_both_halves() {
        let generated = GeneratedBilling {
            billing: NewBilling {
                document_id: "doc-1".to_string(),
                month: 3,
                year: 2025,
                nominal: 150_000,
                created_at: Utc::now(),
            },
            link: NewBillingProfileLink {
                billing_document_id: "doc-1".to_string(),
                profile_id: 42,
            },
        };

        let json = serde_json::to_value(&generated).unwrap();
        assert_eq!(json["billing"]["month"], 3);
        assert_eq!(json["link"]["billing_document_id"], "doc-1");
        assert_eq!(json["link"]["profile_id"], 42);
    }

    #[test]
    fn test_new_billing_holds_only_stored_columns() {
        let billing = NewBilling {
            document_id: "doc-2".to_string(),
            month: 4,
            year: 2025,
            nominal: 10_000,
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&billing).unwrap();
        let mut fields: Vec<&str> = json
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        fields.sort_unstable();
        assert_eq!(fields, ["created_at", "document_id", "month", "nominal", "year"]);
    }

    // Database-backed tests live in tests/billing_store_tests.rs
}
