//! Master menu model and role-based menu lookup
//!
//! Master menus are the navigation entries of the admin front end. Roles are
//! granted menus through `role_menus`, which links to both `up_roles`
//! (`role_menus_role_lnk`) and `master_menus` (`role_menus_master_menu_lnk`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

const MENU_COLUMNS: &str = "id, document_id, nama_menu AS name, kode_menu AS code, \
     urutan_menu AS sort_order, is_active, locale, created_at, updated_at, published_at";

/// Master menu entry
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MasterMenu {
    pub id: i32,

    pub document_id: Option<String>,

    /// Display name, column `nama_menu`
    pub name: String,

    /// Unique menu code, column `kode_menu`
    pub code: String,

    /// Position in the menu, column `urutan_menu`
    pub sort_order: Option<i32>,

    pub is_active: Option<bool>,

    pub locale: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    pub published_at: Option<DateTime<Utc>>,
}

/// Input for creating a master menu
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMasterMenu {
    pub document_id: Option<String>,
    pub name: String,
    pub code: String,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
    pub locale: Option<String>,
}

/// Input for a partial master menu update (only `Some` fields change)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMasterMenu {
    pub document_id: Option<String>,
    pub name: Option<String>,
    pub code: Option<String>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
    pub locale: Option<String>,
}

impl UpdateMasterMenu {
    /// Returns true when no field would change
    pub fn is_empty(&self) -> bool {
        self.document_id.is_none()
            && self.name.is_none()
            && self.code.is_none()
            && self.sort_order.is_none()
            && self.is_active.is_none()
            && self.locale.is_none()
    }
}

impl MasterMenu {
    /// Creates a new master menu
    ///
    /// # Errors
    ///
    /// Returns a unique violation if `code` is already used
    pub async fn create(pool: &PgPool, data: CreateMasterMenu) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO master_menus (document_id, nama_menu, kode_menu, urutan_menu, is_active, locale, published_at) \
             VALUES ($1, $2, $3, $4, $5, $6, NOW()) \
             RETURNING {}",
            MENU_COLUMNS
        );

        let menu = sqlx::query_as::<_, MasterMenu>(&query)
            .bind(data.document_id)
            .bind(data.name)
            .bind(data.code)
            .bind(data.sort_order)
            .bind(data.is_active)
            .bind(data.locale)
            .fetch_one(pool)
            .await?;

        Ok(menu)
    }

    /// Finds a master menu by ID
    pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM master_menus WHERE id = $1", MENU_COLUMNS);

        let menu = sqlx::query_as::<_, MasterMenu>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(menu)
    }

    /// Finds a master menu by its code
    pub async fn find_by_code(pool: &PgPool, code: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM master_menus WHERE kode_menu = $1", MENU_COLUMNS);

        let menu = sqlx::query_as::<_, MasterMenu>(&query)
            .bind(code)
            .fetch_optional(pool)
            .await?;

        Ok(menu)
    }

    /// Lists master menus ordered by sort order, then ID
    ///
    /// # Arguments
    ///
    /// * `pool` - Database connection pool
    /// * `limit` - Maximum number of rows
    /// * `offset` - Number of rows to skip
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM master_menus ORDER BY urutan_menu ASC NULLS LAST, id ASC LIMIT $1 OFFSET $2",
            MENU_COLUMNS
        );

        let menus = sqlx::query_as::<_, MasterMenu>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;

        Ok(menus)
    }

    /// Counts all master menus
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM master_menus")
            .fetch_one(pool)
            .await?;

        Ok(count.0)
    }

    /// Updates the given fields of a master menu
    ///
    /// # Returns
    ///
    /// The updated menu, or `None` if no menu has this ID
    pub async fn update(
        pool: &PgPool,
        id: i32,
        data: UpdateMasterMenu,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE master_menus SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.document_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(", document_id = ${}", bind_count));
        }
        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", nama_menu = ${}", bind_count));
        }
        if data.code.is_some() {
            bind_count += 1;
            query.push_str(&format!(", kode_menu = ${}", bind_count));
        }
        if data.sort_order.is_some() {
            bind_count += 1;
            query.push_str(&format!(", urutan_menu = ${}", bind_count));
        }
        if data.is_active.is_some() {
            bind_count += 1;
            query.push_str(&format!(", is_active = ${}", bind_count));
        }
        if data.locale.is_some() {
            bind_count += 1;
            query.push_str(&format!(", locale = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {}", MENU_COLUMNS));

        let mut q = sqlx::query_as::<_, MasterMenu>(&query).bind(id);

        if let Some(document_id) = data.document_id {
            q = q.bind(document_id);
        }
        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(code) = data.code {
            q = q.bind(code);
        }
        if let Some(sort_order) = data.sort_order {
            q = q.bind(sort_order);
        }
        if let Some(is_active) = data.is_active {
            q = q.bind(is_active);
        }
        if let Some(locale) = data.locale {
            q = q.bind(locale);
        }

        let menu = q.fetch_optional(pool).await?;

        Ok(menu)
    }

    /// Deletes a master menu
    ///
    /// # Returns
    ///
    /// `true` if a row was deleted
    pub async fn delete(pool: &PgPool, id: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM master_menus WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists the active menus granted to any role of the given user
    ///
    /// A menu granted through several roles is returned once.
    pub async fn find_active_by_user_id(
        pool: &PgPool,
        user_id: i32,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let menus = sqlx::query_as::<_, MasterMenu>(
            r#"
            SELECT DISTINCT mm.id, mm.document_id, mm.nama_menu AS name, mm.kode_menu AS code,
                   mm.urutan_menu AS sort_order, mm.is_active, mm.locale,
                   mm.created_at, mm.updated_at, mm.published_at
            FROM up_users_role_lnk url
            JOIN role_menus_role_lnk rmrl ON rmrl.role_id = url.role_id
            JOIN role_menus rm ON rm.id = rmrl.role_menu_id
            JOIN role_menus_master_menu_lnk rmml ON rmml.role_menu_id = rm.id
            JOIN master_menus mm ON mm.id = rmml.master_menu_id
            WHERE url.user_id = $1
              AND COALESCE(rm.is_active, TRUE)
              AND COALESCE(mm.is_active, FALSE)
            ORDER BY sort_order ASC NULLS LAST, id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(menus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_is_empty() {
        assert!(UpdateMasterMenu::default().is_empty());

        let update = UpdateMasterMenu {
            is_active: Some(false),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
