//! Key/value metadata owned by the sync layer.

use chrono::Utc;
use sqlx::Row;

use super::records::MetadataRecord;
use super::StructuredStore;
use crate::errors::SyncResult;

impl StructuredStore {
    pub async fn get_metadata(&self, key: &str) -> SyncResult<Option<MetadataRecord>> {
        let mut conn = self.reader().await?;
        let row = sqlx::query("SELECT key, value, updated_at FROM sync_metadata WHERE key = ?")
            .bind(key)
            .fetch_optional(conn.get()?)
            .await?;

        match row {
            Some(row) => Ok(Some(MetadataRecord {
                key: row.try_get("key")?,
                value: row.try_get("value")?,
                updated_at: row.try_get("updated_at")?,
            })),
            None => Ok(None),
        }
    }

    /// Pending until the next `save()`
    pub async fn set_metadata(&self, key: &str, value: &str) -> SyncResult<()> {
        let mut conn = self.writer().await?;
        sqlx::query(
            r#"
            INSERT INTO sync_metadata (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(conn.get()?)
        .await?;
        Ok(())
    }

    pub async fn get_flag(&self, key: &str) -> SyncResult<bool> {
        Ok(self
            .get_metadata(key)
            .await?
            .map(|record| record.value == "true")
            .unwrap_or(false))
    }
}
