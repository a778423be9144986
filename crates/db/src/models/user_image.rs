//! User image (avatar) model and DTOs.

use leukoscan_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `user_images` table.
///
/// At most one row per user carries `is_profile = true`; the repository
/// enforces this with a delete-then-insert inside a transaction rather than
/// a database constraint.
#[derive(Debug, Clone, FromRow)]
pub struct UserImage {
    pub id: DbId,
    pub user_id: DbId,
    pub image_data: Option<Vec<u8>>,
    pub storage_key: Option<String>,
    pub mime_type: String,
    pub filename: String,
    pub is_profile: bool,
    pub created_at: Timestamp,
}

/// DTO for creating a new user image.
#[derive(Debug, Clone)]
pub struct CreateUserImage {
    pub user_id: DbId,
    pub image_data: Option<Vec<u8>>,
    pub storage_key: Option<String>,
    pub mime_type: String,
    pub filename: String,
    pub is_profile: bool,
}
