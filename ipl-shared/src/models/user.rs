//! User, profile and role lookups
//!
//! Users live in the `up_users` table and hold roles through
//! `up_users_role_lnk`. Each user owns at most one profile (`profiles`,
//! linked 1:1 through `profiles_user_lnk`), which is the billable identity.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE up_users (
//!     id SERIAL PRIMARY KEY,
//!     document_id VARCHAR(255),
//!     username VARCHAR(255),
//!     email VARCHAR(255),
//!     blocked BOOLEAN NOT NULL DEFAULT FALSE,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     published_at TIMESTAMPTZ
//! );
//!
//! CREATE TABLE profiles_user_lnk (
//!     id SERIAL PRIMARY KEY,
//!     profile_id INTEGER NOT NULL REFERENCES profiles(id),
//!     user_id INTEGER NOT NULL REFERENCES up_users(id),
//!     UNIQUE (profile_id),
//!     UNIQUE (user_id)
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// User account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// User ID
    pub id: i32,

    pub document_id: Option<String>,

    pub username: Option<String>,

    pub email: Option<String>,

    /// Blocked accounts are still billed; blocking only affects sign-in
    pub blocked: bool,

    pub created_at: DateTime<Utc>,
}

/// User → profile association
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProfileLink {
    pub user_id: i32,
    pub profile_id: i32,
}

/// Profile, account and role details of one user
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserDetail {
    /// Profile ID
    pub id: i32,

    /// Column `profiles.nama_penghuni`
    pub occupant_name: Option<String>,

    /// Column `profiles.no_hp`
    pub mobile_phone: Option<String>,

    /// Column `profiles.no_telp`
    pub phone: Option<String>,

    pub document_id: Option<String>,

    pub email: Option<String>,

    pub user_id: i32,

    pub role_name: Option<String>,

    pub role_id: i32,

    pub role_type: Option<String>,
}

impl User {
    /// Lists all users holding at least one role of the given type
    ///
    /// Each user appears once even when several of their roles match.
    ///
    /// # Arguments
    ///
    /// * `pool` - Database connection pool
    /// * `role_type` - Value of `up_roles.type` to match (e.g. "penghuni")
    ///
    /// # Returns
    ///
    /// Users ordered by ID
    pub async fn find_by_role_type(
        pool: &PgPool,
        role_type: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT uu.id, uu.document_id, uu.username, uu.email, uu.blocked, uu.created_at
            FROM up_users uu
            WHERE EXISTS (
                SELECT 1
                FROM up_users_role_lnk url
                JOIN up_roles ur ON ur.id = url.role_id
                WHERE url.user_id = uu.id AND ur.type = $1
            )
            ORDER BY uu.id
            "#,
        )
        .bind(role_type)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }
}

impl ProfileLink {
    /// Finds the profile links of the given users
    ///
    /// Users without a profile are simply absent from the result.
    pub async fn find_by_user_ids(
        pool: &PgPool,
        user_ids: &[i32],
    ) -> Result<Vec<Self>, sqlx::Error> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let links = sqlx::query_as::<_, ProfileLink>(
            r#"
            SELECT user_id, profile_id
            FROM profiles_user_lnk
            WHERE user_id = ANY($1)
            "#,
        )
        .bind(user_ids)
        .fetch_all(pool)
        .await?;

        Ok(links)
    }
}

impl UserDetail {
    /// Finds user details by profile ID
    ///
    /// When the user holds several roles, the lowest role ID is reported.
    ///
    /// # Returns
    ///
    /// The details if the profile exists and is linked to a user with a role
    pub async fn find_by_profile_id(
        pool: &PgPool,
        profile_id: i32,
    ) -> Result<Option<Self>, sqlx::Error> {
        let detail = sqlx::query_as::<_, UserDetail>(
            r#"
            SELECT p.id,
                   p.nama_penghuni AS occupant_name,
                   p.no_hp AS mobile_phone,
                   p.no_telp AS phone,
                   p.document_id,
                   uu.email,
                   uu.id AS user_id,
                   ur.name AS role_name,
                   ur.id AS role_id,
                   ur.type AS role_type
            FROM profiles p
            JOIN profiles_user_lnk pul ON pul.profile_id = p.id
            JOIN up_users uu ON uu.id = pul.user_id
            JOIN up_users_role_lnk uurl ON uurl.user_id = uu.id
            JOIN up_roles ur ON ur.id = uurl.role_id
            WHERE p.id = $1
            ORDER BY ur.id
            LIMIT 1
            "#,
        )
        .bind(profile_id)
        .fetch_optional(pool)
        .await?;

        Ok(detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_link_is_copy() {
        let link = ProfileLink {
            user_id: 1,
            profile_id: 10,
        };
        let copied = link;
        assert_eq!(link, copied);
    }

    // Database-backed tests live in tests/billing_store_tests.rs
}
