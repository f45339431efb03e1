//! Profile and per-service credential queries.

use chrono::Utc;
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;
use std::collections::HashMap;
use tracing::{debug, info};

use super::records::{ProfileRecord, RecordIdentity, ServiceRecord, StructuredProfile};
use super::StructuredStore;
use crate::codec::structured::{profile_from_structured, profile_to_structured};
use crate::errors::SyncResult;
use crate::model::Profile;

/// A decoded profile together with its row identity
#[derive(Debug, Clone, PartialEq)]
pub struct StoredProfile {
    pub identity: RecordIdentity,
    pub profile: Profile,
}

const PROFILE_COLUMNS: &str = "id, name, is_enabled, wol_enabled, wol_mac_address, \
     wol_broadcast_address, created_at, updated_at";

const SERVICE_COLUMNS: &str = "profile_id, service, enabled, host, api_key, username, \
     password, custom_headers, strict_tls";

/// Column a single profile is looked up by
#[derive(Debug, Clone, Copy)]
enum ProfileKey {
    Id,
    Name,
}

impl ProfileKey {
    fn column(&self) -> &'static str {
        match self {
            ProfileKey::Id => "id",
            ProfileKey::Name => "name",
        }
    }
}

impl StructuredStore {
    fn row_to_profile_record(row: &SqliteRow) -> SyncResult<ProfileRecord> {
        Ok(ProfileRecord {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            is_enabled: row.try_get("is_enabled")?,
            wol_enabled: row.try_get("wol_enabled")?,
            wol_mac_address: row.try_get("wol_mac_address")?,
            wol_broadcast_address: row.try_get("wol_broadcast_address")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_service_record(row: &SqliteRow) -> SyncResult<ServiceRecord> {
        Ok(ServiceRecord {
            profile_id: row.try_get("profile_id")?,
            service: row.try_get("service")?,
            enabled: row.try_get("enabled")?,
            host: row.try_get("host")?,
            api_key: row.try_get("api_key")?,
            username: row.try_get("username")?,
            password: row.try_get("password")?,
            custom_headers: row.try_get("custom_headers")?,
            strict_tls: row.try_get("strict_tls")?,
        })
    }

    fn decode_stored(record: ProfileRecord, services: Vec<ServiceRecord>) -> SyncResult<StoredProfile> {
        let structured = StructuredProfile { record, services };
        let profile = profile_from_structured(&structured)?;
        let record = structured.record;
        Ok(StoredProfile {
            identity: RecordIdentity {
                id: record.id,
                created_at: record.created_at,
                updated_at: record.updated_at,
            },
            profile,
        })
    }

    async fn services_for(conn: &mut SqliteConnection, profile_id: &str) -> SyncResult<Vec<ServiceRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM profile_services WHERE profile_id = ? ORDER BY service",
            SERVICE_COLUMNS
        ))
        .bind(profile_id)
        .fetch_all(&mut *conn)
        .await?;
        rows.iter().map(Self::row_to_service_record).collect()
    }

    async fn find_profile(conn: &mut SqliteConnection, key: ProfileKey, value: &str) -> SyncResult<Option<StoredProfile>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM profiles WHERE {} = ?",
            PROFILE_COLUMNS,
            key.column()
        ))
        .bind(value)
        .fetch_optional(&mut *conn)
        .await?;

        match row {
            Some(row) => {
                let record = Self::row_to_profile_record(&row)?;
                let services = Self::services_for(conn, &record.id).await?;
                Ok(Some(Self::decode_stored(record, services)?))
            }
            None => Ok(None),
        }
    }

    async fn find_identity(conn: &mut SqliteConnection, key: ProfileKey, value: &str) -> SyncResult<Option<RecordIdentity>> {
        let row = sqlx::query(&format!(
            "SELECT id, created_at, updated_at FROM profiles WHERE {} = ?",
            key.column()
        ))
        .bind(value)
        .fetch_optional(&mut *conn)
        .await?;

        match row {
            Some(row) => Ok(Some(RecordIdentity {
                id: row.try_get("id")?,
                created_at: row.try_get("created_at")?,
                updated_at: row.try_get("updated_at")?,
            })),
            None => Ok(None),
        }
    }

    async fn store_structured(conn: &mut SqliteConnection, structured: &StructuredProfile) -> SyncResult<()> {
        let record = &structured.record;
        sqlx::query(
            r#"
            INSERT INTO profiles (id, name, is_enabled, wol_enabled, wol_mac_address,
                                  wol_broadcast_address, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                is_enabled = excluded.is_enabled,
                wol_enabled = excluded.wol_enabled,
                wol_mac_address = excluded.wol_mac_address,
                wol_broadcast_address = excluded.wol_broadcast_address,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&record.id)
        .bind(&record.name)
        .bind(record.is_enabled)
        .bind(record.wol_enabled)
        .bind(&record.wol_mac_address)
        .bind(&record.wol_broadcast_address)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&mut *conn)
        .await?;

        for service in &structured.services {
            sqlx::query(
                r#"
                INSERT INTO profile_services (profile_id, service, enabled, host, api_key,
                                              username, password, custom_headers, strict_tls)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(profile_id, service) DO UPDATE SET
                    enabled = excluded.enabled,
                    host = excluded.host,
                    api_key = excluded.api_key,
                    username = excluded.username,
                    password = excluded.password,
                    custom_headers = excluded.custom_headers,
                    strict_tls = excluded.strict_tls
                "#,
            )
            .bind(&service.profile_id)
            .bind(&service.service)
            .bind(service.enabled)
            .bind(&service.host)
            .bind(&service.api_key)
            .bind(&service.username)
            .bind(&service.password)
            .bind(&service.custom_headers)
            .bind(service.strict_tls)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    // ========================================================================
    // Public profile queries
    // ========================================================================

    pub async fn list_profiles(&self) -> SyncResult<Vec<StoredProfile>> {
        let mut conn = self.reader().await?;
        let rows = sqlx::query(&format!("SELECT {} FROM profiles ORDER BY name", PROFILE_COLUMNS))
            .fetch_all(conn.get()?)
            .await?;
        let service_rows = sqlx::query(&format!(
            "SELECT {} FROM profile_services ORDER BY profile_id, service",
            SERVICE_COLUMNS
        ))
        .fetch_all(conn.get()?)
        .await?;

        let mut services_by_profile: HashMap<String, Vec<ServiceRecord>> = HashMap::new();
        for row in &service_rows {
            let service = Self::row_to_service_record(row)?;
            services_by_profile
                .entry(service.profile_id.clone())
                .or_default()
                .push(service);
        }

        let mut profiles = Vec::with_capacity(rows.len());
        for row in &rows {
            let record = Self::row_to_profile_record(row)?;
            let services = services_by_profile.remove(&record.id).unwrap_or_default();
            profiles.push(Self::decode_stored(record, services)?);
        }
        Ok(profiles)
    }

    pub async fn find_profile_by_name(&self, name: &str) -> SyncResult<Option<StoredProfile>> {
        let mut conn = self.reader().await?;
        Self::find_profile(conn.get()?, ProfileKey::Name, name).await
    }

    pub async fn find_profile_by_id(&self, id: &str) -> SyncResult<Option<StoredProfile>> {
        let mut conn = self.reader().await?;
        Self::find_profile(conn.get()?, ProfileKey::Id, id).await
    }

    pub async fn count_profiles(&self) -> SyncResult<i64> {
        let mut conn = self.reader().await?;
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles")
            .fetch_one(conn.get()?)
            .await?;
        Ok(count)
    }

    /// Upsert keyed by name: the row holding this name is reused when it
    /// exists, a new row is created otherwise.
    pub async fn write_profile(&self, profile: &Profile) -> SyncResult<RecordIdentity> {
        let mut conn = self.writer().await?;
        let conn = conn.get()?;
        let identity = match Self::find_identity(conn, ProfileKey::Name, &profile.name).await? {
            Some(existing) => existing.touched(),
            None => RecordIdentity::fresh(),
        };
        Self::store_structured(conn, &profile_to_structured(profile, &identity)).await?;
        debug!("Wrote profile {} ({})", profile.name, identity.id);
        Ok(identity)
    }

    /// Update the row with this id, including its name. Returns `None` if no
    /// such row exists.
    pub async fn write_profile_by_id(&self, id: &str, profile: &Profile) -> SyncResult<Option<RecordIdentity>> {
        let mut conn = self.writer().await?;
        let conn = conn.get()?;
        let identity = match Self::find_identity(conn, ProfileKey::Id, id).await? {
            Some(existing) => existing.touched(),
            None => return Ok(None),
        };
        Self::store_structured(conn, &profile_to_structured(profile, &identity)).await?;
        debug!("Wrote profile {} by id ({})", profile.name, identity.id);
        Ok(Some(identity))
    }

    pub async fn remove_profile(&self, name: &str) -> SyncResult<bool> {
        let mut conn = self.writer().await?;
        let conn = conn.get()?;
        let Some(identity) = Self::find_identity(conn, ProfileKey::Name, name).await? else {
            return Ok(false);
        };

        sqlx::query("DELETE FROM profile_services WHERE profile_id = ?")
            .bind(&identity.id)
            .execute(&mut *conn)
            .await?;
        let result = sqlx::query("DELETE FROM profiles WHERE id = ?")
            .bind(&identity.id)
            .execute(&mut *conn)
            .await?;
        info!("Deleted profile {} ({})", name, identity.id);
        Ok(result.rows_affected() > 0)
    }

    /// Rewrite `is_enabled` on every profile so only `name` carries it.
    /// Both statements run in the same unit of work.
    pub async fn set_single_enabled(&self, name: &str) -> SyncResult<()> {
        let mut conn = self.writer().await?;
        let conn = conn.get()?;
        let now = Utc::now();
        sqlx::query("UPDATE profiles SET is_enabled = 0, updated_at = ? WHERE is_enabled = 1 AND name != ?")
            .bind(now)
            .bind(name)
            .execute(&mut *conn)
            .await?;
        sqlx::query("UPDATE profiles SET is_enabled = 1, updated_at = ? WHERE name = ?")
            .bind(now)
            .bind(name)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}
