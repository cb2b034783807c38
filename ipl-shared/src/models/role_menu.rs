//! Role menu model
//!
//! A role menu is a grant: every role linked through `role_menus_role_lnk`
//! sees every master menu linked through `role_menus_master_menu_lnk`. Both
//! link tables carry their own `role_menu_ord`.

use crate::models::menu::MasterMenu;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;

const ROLE_MENU_COLUMNS: &str = "id, document_id, role_menu_ord AS sort_order, is_active, \
     created_at, updated_at, published_at";

/// Role menu grant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RoleMenu {
    pub id: i32,

    pub document_id: Option<String>,

    /// Column `role_menu_ord`
    pub sort_order: Option<f64>,

    pub is_active: Option<bool>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    pub published_at: Option<DateTime<Utc>>,
}

/// Role from `up_roles`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Role {
    pub id: i32,

    pub document_id: Option<String>,

    pub name: Option<String>,

    pub description: Option<String>,

    /// Column `type`, e.g. "penghuni"
    pub role_type: Option<String>,
}

/// A role menu with its linked master menus and roles, each in link order
#[derive(Debug, Clone, Serialize)]
pub struct RoleMenuWithRelations {
    #[serde(flatten)]
    pub role_menu: RoleMenu,

    pub master_menus: Vec<MasterMenu>,

    pub roles: Vec<Role>,
}

/// Input for creating a role menu
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateRoleMenu {
    pub document_id: Option<String>,
    pub sort_order: Option<f64>,
    pub is_active: Option<bool>,
}

/// Input for a partial role menu update (only `Some` fields change)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRoleMenu {
    pub document_id: Option<String>,
    pub sort_order: Option<f64>,
    pub is_active: Option<bool>,
}

impl UpdateRoleMenu {
    /// Returns true when no field would change
    pub fn is_empty(&self) -> bool {
        self.document_id.is_none() && self.sort_order.is_none() && self.is_active.is_none()
    }
}

#[derive(sqlx::FromRow)]
struct LinkedMasterMenu {
    role_menu_id: i32,
    #[sqlx(flatten)]
    menu: MasterMenu,
}

#[derive(sqlx::FromRow)]
struct LinkedRole {
    role_menu_id: i32,
    #[sqlx(flatten)]
    role: Role,
}

/// Groups `(role_menu_id, item)` pairs by role menu, keeping row order
fn group_by_role_menu<T>(rows: impl IntoIterator<Item = (i32, T)>) -> HashMap<i32, Vec<T>> {
    let mut grouped: HashMap<i32, Vec<T>> = HashMap::new();
    for (role_menu_id, item) in rows {
        grouped.entry(role_menu_id).or_default().push(item);
    }
    grouped
}

impl Role {
    /// Finds a role by ID
    pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Self>, sqlx::Error> {
        let role = sqlx::query_as::<_, Role>(
            "SELECT id, document_id, name, description, type AS role_type FROM up_roles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(role)
    }
}

impl RoleMenu {
    /// Creates a new role menu without any links
    pub async fn create(pool: &PgPool, data: CreateRoleMenu) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO role_menus (document_id, role_menu_ord, is_active, published_at) \
             VALUES ($1, $2, $3, NOW()) \
             RETURNING {}",
            ROLE_MENU_COLUMNS
        );

        let role_menu = sqlx::query_as::<_, RoleMenu>(&query)
            .bind(data.document_id)
            .bind(data.sort_order)
            .bind(data.is_active)
            .fetch_one(pool)
            .await?;

        Ok(role_menu)
    }

    /// Finds a role menu by ID
    pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM role_menus WHERE id = $1", ROLE_MENU_COLUMNS);

        let role_menu = sqlx::query_as::<_, RoleMenu>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(role_menu)
    }

    /// Finds a role menu by ID together with its master menus and roles
    pub async fn find_with_relations(
        pool: &PgPool,
        id: i32,
    ) -> Result<Option<RoleMenuWithRelations>, sqlx::Error> {
        let Some(role_menu) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };

        let mut loaded = Self::with_relations(pool, vec![role_menu]).await?;
        Ok(loaded.pop())
    }

    /// Lists role menus ordered by `role_menu_ord`, then ID
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM role_menus ORDER BY role_menu_ord ASC NULLS LAST, id ASC LIMIT $1 OFFSET $2",
            ROLE_MENU_COLUMNS
        );

        let role_menus = sqlx::query_as::<_, RoleMenu>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;

        Ok(role_menus)
    }

    /// Counts all role menus
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM role_menus")
            .fetch_one(pool)
            .await?;

        Ok(count.0)
    }

    /// Lists the role menus linked to a role, in the role link's order
    pub async fn find_by_role_id(pool: &PgPool, role_id: i32) -> Result<Vec<Self>, sqlx::Error> {
        let role_menus = sqlx::query_as::<_, RoleMenu>(
            r#"
            SELECT rm.id, rm.document_id, rm.role_menu_ord AS sort_order, rm.is_active,
                   rm.created_at, rm.updated_at, rm.published_at
            FROM role_menus rm
            JOIN role_menus_role_lnk rmrl ON rmrl.role_menu_id = rm.id
            WHERE rmrl.role_id = $1
            ORDER BY rmrl.role_menu_ord ASC NULLS LAST, rm.id ASC
            "#,
        )
        .bind(role_id)
        .fetch_all(pool)
        .await?;

        Ok(role_menus)
    }

    /// Loads the master menus and roles of each role menu
    ///
    /// Two queries regardless of the number of role menus. The input order
    /// is kept.
    pub async fn with_relations(
        pool: &PgPool,
        role_menus: Vec<Self>,
    ) -> Result<Vec<RoleMenuWithRelations>, sqlx::Error> {
        if role_menus.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = role_menus.iter().map(|role_menu| role_menu.id).collect();

        let menu_rows = sqlx::query_as::<_, LinkedMasterMenu>(
            r#"
            SELECT rmml.role_menu_id, mm.id, mm.document_id, mm.nama_menu AS name,
                   mm.kode_menu AS code, mm.urutan_menu AS sort_order, mm.is_active,
                   mm.locale, mm.created_at, mm.updated_at, mm.published_at
            FROM role_menus_master_menu_lnk rmml
            JOIN master_menus mm ON mm.id = rmml.master_menu_id
            WHERE rmml.role_menu_id = ANY($1)
            ORDER BY rmml.role_menu_ord ASC NULLS LAST, mm.id ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(pool)
        .await?;

        let role_rows = sqlx::query_as::<_, LinkedRole>(
            r#"
            SELECT rmrl.role_menu_id, ur.id, ur.document_id, ur.name, ur.description,
                   ur.type AS role_type
            FROM role_menus_role_lnk rmrl
            JOIN up_roles ur ON ur.id = rmrl.role_id
            WHERE rmrl.role_menu_id = ANY($1)
            ORDER BY rmrl.role_menu_ord ASC NULLS LAST, ur.id ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(pool)
        .await?;

        let mut menus =
            group_by_role_menu(menu_rows.into_iter().map(|row| (row.role_menu_id, row.menu)));
        let mut roles =
            group_by_role_menu(role_rows.into_iter().map(|row| (row.role_menu_id, row.role)));

        Ok(role_menus
            .into_iter()
            .map(|role_menu| RoleMenuWithRelations {
                master_menus: menus.remove(&role_menu.id).unwrap_or_default(),
                roles: roles.remove(&role_menu.id).unwrap_or_default(),
                role_menu,
            })
            .collect())
    }

    /// Updates the given fields of a role menu
    ///
    /// # Returns
    ///
    /// The updated role menu, or `None` if no role menu has this ID
    pub async fn update(
        pool: &PgPool,
        id: i32,
        data: UpdateRoleMenu,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE role_menus SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.document_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(", document_id = ${}", bind_count));
        }
        if data.sort_order.is_some() {
            bind_count += 1;
            query.push_str(&format!(", role_menu_ord = ${}", bind_count));
        }
        if data.is_active.is_some() {
            bind_count += 1;
            query.push_str(&format!(", is_active = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {}", ROLE_MENU_COLUMNS));

        let mut q = sqlx::query_as::<_, RoleMenu>(&query).bind(id);

        if let Some(document_id) = data.document_id {
            q = q.bind(document_id);
        }
        if let Some(sort_order) = data.sort_order {
            q = q.bind(sort_order);
        }
        if let Some(is_active) = data.is_active {
            q = q.bind(is_active);
        }

        let role_menu = q.fetch_optional(pool).await?;

        Ok(role_menu)
    }

    /// Deletes a role menu together with its links
    ///
    /// # Returns
    ///
    /// `true` if a row was deleted
    pub async fn delete(pool: &PgPool, id: i32) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM role_menus_master_menu_lnk WHERE role_menu_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM role_menus_role_lnk WHERE role_menu_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM role_menus WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    /// Links a master menu to a role menu
    ///
    /// Linking an already linked menu only replaces its order.
    pub async fn attach_master_menu(
        pool: &PgPool,
        id: i32,
        master_menu_id: i32,
        order: Option<f64>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO role_menus_master_menu_lnk (role_menu_id, master_menu_id, role_menu_ord)
            VALUES ($1, $2, $3)
            ON CONFLICT (role_menu_id, master_menu_id)
            DO UPDATE SET role_menu_ord = EXCLUDED.role_menu_ord
            "#,
        )
        .bind(id)
        .bind(master_menu_id)
        .bind(order)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Removes a master menu link
    ///
    /// # Returns
    ///
    /// `true` if a link was removed
    pub async fn detach_master_menu(
        pool: &PgPool,
        id: i32,
        master_menu_id: i32,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM role_menus_master_menu_lnk WHERE role_menu_id = $1 AND master_menu_id = $2",
        )
        .bind(id)
        .bind(master_menu_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Links a role to a role menu
    ///
    /// Linking an already linked role only replaces its order.
    pub async fn attach_role(
        pool: &PgPool,
        id: i32,
        role_id: i32,
        order: Option<f64>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO role_menus_role_lnk (role_menu_id, role_id, role_menu_ord)
            VALUES ($1, $2, $3)
            ON CONFLICT (role_menu_id, role_id)
            DO UPDATE SET role_menu_ord = EXCLUDED.role_menu_ord
            "#,
        )
        .bind(id)
        .bind(role_id)
        .bind(order)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Removes a role link
    ///
    /// # Returns
    ///
    /// `true` if a link was removed
    pub async fn detach_role(pool: &PgPool, id: i32, role_id: i32) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM role_menus_role_lnk WHERE role_menu_id = $1 AND role_id = $2")
                .bind(id)
                .bind(role_id)
                .execute(pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}
