//! Asset manager for loading and querying asset types

use super::models::{AssetType, NewAssetType};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

/// Asset type queries and admin mutations
pub struct AssetManager;

const ASSET_COLUMNS: &str =
    "asset_id, code, name, description, decimal_places, is_active, created_at, updated_at";

impl AssetManager {
    /// Get an asset type by normalized (uppercase) code
    pub async fn get_by_code(pool: &PgPool, code: &str) -> Result<Option<AssetType>, sqlx::Error> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM asset_types_tb WHERE code = $1",
            ASSET_COLUMNS
        ))
        .bind(code)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(|r| row_to_asset(&r)))
    }

    /// Get an asset type by id
    pub async fn get_by_id(pool: &PgPool, asset_id: Uuid) -> Result<Option<AssetType>, sqlx::Error> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM asset_types_tb WHERE asset_id = $1",
            ASSET_COLUMNS
        ))
        .bind(asset_id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(|r| row_to_asset(&r)))
    }

    /// List all asset types, active and inactive (admin surface)
    pub async fn list_all(pool: &PgPool) -> Result<Vec<AssetType>, sqlx::Error> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM asset_types_tb ORDER BY code ASC",
            ASSET_COLUMNS
        ))
        .fetch_all(pool)
        .await?;

        Ok(rows.iter().map(row_to_asset).collect())
    }

    /// Create a new asset type.
    ///
    /// A duplicate code surfaces as a unique-violation `sqlx::Error`; callers
    /// classify it via `db::is_unique_violation`.
    pub async fn create(pool: &PgPool, new: &NewAssetType) -> Result<AssetType, sqlx::Error> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO asset_types_tb (code, name, description, decimal_places)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            ASSET_COLUMNS
        ))
        .bind(&new.code)
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.decimal_places)
        .fetch_one(pool)
        .await?;

        Ok(row_to_asset(&row))
    }

    /// Deactivate an asset type. Asset types are never deleted.
    pub async fn deactivate(pool: &PgPool, asset_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE asset_types_tb SET is_active = FALSE, updated_at = NOW() WHERE asset_id = $1",
        )
        .bind(asset_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_asset(row: &PgRow) -> AssetType {
    AssetType {
        asset_id: row.get("asset_id"),
        code: row.get("code"),
        name: row.get("name"),
        description: row.get("description"),
        decimal_places: row.get("decimal_places"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
