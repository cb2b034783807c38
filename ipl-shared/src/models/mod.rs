//! Database models for the IPL backend
//!
//! Each model owns its queries. Column names follow the existing Strapi
//! schema and are aliased onto English field names in every query.
//!
//! # Models
//!
//! - `user`: users, profile links and user details
//! - `billing`: billing settings, billings and the occupant billing report rows
//! - `menu`: master menus and the menus granted to a user
//! - `role_menu`: role menu grants and their master menu and role links
//!
//! # Example
//!
//! ```no_run
//! use ipl_shared::models::billing::Billing;
//! use ipl_shared::db::pool::{create_pool, DatabaseConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool(DatabaseConfig::default()).await?;
//!
//! if let Some(billing) = Billing::find_by_id(&pool, 42).await? {
//!     println!("{}/{}: {}", billing.month, billing.year, billing.nominal);
//! }
//! # Ok(())
//! # }
//! ```

pub mod billing;
pub mod menu;
pub mod role_menu;
pub mod user;
