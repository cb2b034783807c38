/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `billings`: Bulk monthly generation, occupant report, billing lookup
/// - `users`: User detail by profile
/// - `menus`: Menus granted to a user
/// - `master_menus`: Master menu management
/// - `role_menus`: Role menu management and its master menu and role links

pub mod billings;
pub mod health;
pub mod master_menus;
pub mod menus;
pub mod role_menus;
pub mod users;
