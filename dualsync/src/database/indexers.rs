//! Indexer queries. Rows are unique by host.

use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{debug, info};

use super::records::{IndexerRecord, RecordIdentity};
use super::StructuredStore;
use crate::codec::structured::{indexer_from_structured, indexer_to_structured};
use crate::errors::SyncResult;
use crate::model::Indexer;

const INDEXER_COLUMNS: &str = "id, display_name, host, api_key, custom_headers, created_at, updated_at";

impl StructuredStore {
    fn row_to_indexer_record(row: &SqliteRow) -> SyncResult<IndexerRecord> {
        Ok(IndexerRecord {
            id: row.try_get("id")?,
            display_name: row.try_get("display_name")?,
            host: row.try_get("host")?,
            api_key: row.try_get("api_key")?,
            custom_headers: row.try_get("custom_headers")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    pub async fn list_indexer_records(&self) -> SyncResult<Vec<IndexerRecord>> {
        let mut conn = self.reader().await?;
        let rows = sqlx::query(&format!("SELECT {} FROM indexers ORDER BY host", INDEXER_COLUMNS))
            .fetch_all(conn.get()?)
            .await?;
        rows.iter().map(Self::row_to_indexer_record).collect()
    }

    pub async fn indexer_record(&self, host: &str) -> SyncResult<Option<IndexerRecord>> {
        let mut conn = self.reader().await?;
        let row = sqlx::query(&format!("SELECT {} FROM indexers WHERE host = ?", INDEXER_COLUMNS))
            .bind(host)
            .fetch_optional(conn.get()?)
            .await?;
        row.as_ref().map(Self::row_to_indexer_record).transpose()
    }

    pub async fn list_indexers(&self) -> SyncResult<Vec<Indexer>> {
        self.list_indexer_records()
            .await?
            .iter()
            .map(indexer_from_structured)
            .collect()
    }

    /// Upsert keyed by host
    pub async fn write_indexer(&self, indexer: &Indexer) -> SyncResult<RecordIdentity> {
        let identity = match self.indexer_record(&indexer.host).await? {
            Some(existing) => RecordIdentity {
                id: existing.id,
                created_at: existing.created_at,
                updated_at: existing.updated_at,
            }
            .touched(),
            None => RecordIdentity::fresh(),
        };
        let record = indexer_to_structured(indexer, &identity);

        let mut conn = self.writer().await?;
        sqlx::query(
            r#"
            INSERT INTO indexers (id, display_name, host, api_key, custom_headers, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(host) DO UPDATE SET
                display_name = excluded.display_name,
                api_key = excluded.api_key,
                custom_headers = excluded.custom_headers,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&record.id)
        .bind(&record.display_name)
        .bind(&record.host)
        .bind(&record.api_key)
        .bind(&record.custom_headers)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(conn.get()?)
        .await?;

        debug!("Wrote indexer {} ({})", record.host, record.id);
        Ok(identity)
    }

    pub async fn remove_indexer(&self, host: &str) -> SyncResult<bool> {
        let mut conn = self.writer().await?;
        let result = sqlx::query("DELETE FROM indexers WHERE host = ?")
            .bind(host)
            .execute(conn.get()?)
            .await?;
        let deleted = result.rows_affected() > 0;
        if deleted {
            info!("Deleted indexer {}", host);
        }
        Ok(deleted)
    }
}
