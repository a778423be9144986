//! Repository for the `user_images` table.

use leukoscan_core::types::DbId;
use sqlx::PgPool;

use crate::models::user_image::{CreateUserImage, UserImage};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, user_id, image_data, storage_key, mime_type, filename, is_profile, created_at";

/// Provides CRUD operations for user images.
pub struct UserImageRepo;

impl UserImageRepo {
    /// Replace the user's profile image.
    ///
    /// Delete-then-insert runs in one transaction so a reader never observes
    /// two `is_profile` rows for the same user. Two concurrent replacements
    /// still resolve last-writer-wins.
    pub async fn replace_profile(
        pool: &PgPool,
        input: &CreateUserImage,
    ) -> Result<UserImage, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM user_images WHERE user_id = $1 AND is_profile = true")
            .bind(input.user_id)
            .execute(&mut *tx)
            .await?;

        let query = format!(
            "INSERT INTO user_images
                (user_id, image_data, storage_key, mime_type, filename, is_profile)
             VALUES ($1, $2, $3, $4, $5, true)
             RETURNING {COLUMNS}"
        );
        let image = sqlx::query_as::<_, UserImage>(&query)
            .bind(input.user_id)
            .bind(&input.image_data)
            .bind(&input.storage_key)
            .bind(&input.mime_type)
            .bind(&input.filename)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(image)
    }

    /// The user's current profile image, if any.
    pub async fn find_profile(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<UserImage>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM user_images WHERE user_id = $1 AND is_profile = true");
        sqlx::query_as::<_, UserImage>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Number of `is_profile` rows for a user (test invariant helper).
    pub async fn count_profile_rows(pool: &PgPool, user_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM user_images WHERE user_id = $1 AND is_profile = true",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
    }
}
