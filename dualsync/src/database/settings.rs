//! AppSettings singleton queries.

use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::debug;

use super::records::{RecordIdentity, SettingsRecord};
use super::StructuredStore;
use crate::codec::structured::settings_to_structured;
use crate::errors::SyncResult;
use crate::model::AppSettings;

impl StructuredStore {
    fn row_to_settings_record(row: &SqliteRow) -> SyncResult<SettingsRecord> {
        Ok(SettingsRecord {
            id: row.try_get("id")?,
            enabled_profile: row.try_get("enabled_profile")?,
            theme_amoled: row.try_get("theme_amoled")?,
            theme_amoled_border: row.try_get("theme_amoled_border")?,
            theme_image_background_opacity: row.try_get("theme_image_background_opacity")?,
            drawer_automatic_manage: row.try_get("drawer_automatic_manage")?,
            drawer_manual_order: row.try_get("drawer_manual_order")?,
            quick_actions: row.try_get("quick_actions")?,
            networking_tls_validation: row.try_get("networking_tls_validation")?,
            use_24_hour_time: row.try_get("use_24_hour_time")?,
            enable_in_app_notifications: row.try_get("enable_in_app_notifications")?,
            changelog_last_build_version: row.try_get("changelog_last_build_version")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    /// The raw singleton row, if one exists
    pub async fn settings_record(&self) -> SyncResult<Option<SettingsRecord>> {
        let mut conn = self.reader().await?;
        let row = sqlx::query(
            r#"
            SELECT id, enabled_profile, theme_amoled, theme_amoled_border,
                   theme_image_background_opacity, drawer_automatic_manage,
                   drawer_manual_order, quick_actions, networking_tls_validation,
                   use_24_hour_time, enable_in_app_notifications,
                   changelog_last_build_version, created_at, updated_at
            FROM app_settings
            WHERE singleton = 1
            "#,
        )
        .fetch_optional(conn.get()?)
        .await?;

        row.as_ref().map(Self::row_to_settings_record).transpose()
    }

    pub async fn count_settings(&self) -> SyncResult<i64> {
        let mut conn = self.reader().await?;
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM app_settings")
            .fetch_one(conn.get()?)
            .await?;
        Ok(count)
    }

    /// Write the singleton, keeping the identity of an existing row
    pub async fn write_settings(&self, settings: &AppSettings) -> SyncResult<RecordIdentity> {
        let identity = match self.settings_record().await? {
            Some(existing) => RecordIdentity {
                id: existing.id,
                created_at: existing.created_at,
                updated_at: existing.updated_at,
            }
            .touched(),
            None => RecordIdentity::fresh(),
        };
        let record = settings_to_structured(settings, &identity);

        let mut conn = self.writer().await?;
        sqlx::query(
            r#"
            INSERT INTO app_settings (
                singleton, id, enabled_profile, theme_amoled, theme_amoled_border,
                theme_image_background_opacity, drawer_automatic_manage, drawer_manual_order,
                quick_actions, networking_tls_validation, use_24_hour_time,
                enable_in_app_notifications, changelog_last_build_version, created_at, updated_at
            )
            VALUES (1, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(singleton) DO UPDATE SET
                enabled_profile = excluded.enabled_profile,
                theme_amoled = excluded.theme_amoled,
                theme_amoled_border = excluded.theme_amoled_border,
                theme_image_background_opacity = excluded.theme_image_background_opacity,
                drawer_automatic_manage = excluded.drawer_automatic_manage,
                drawer_manual_order = excluded.drawer_manual_order,
                quick_actions = excluded.quick_actions,
                networking_tls_validation = excluded.networking_tls_validation,
                use_24_hour_time = excluded.use_24_hour_time,
                enable_in_app_notifications = excluded.enable_in_app_notifications,
                changelog_last_build_version = excluded.changelog_last_build_version,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&record.id)
        .bind(&record.enabled_profile)
        .bind(record.theme_amoled)
        .bind(record.theme_amoled_border)
        .bind(record.theme_image_background_opacity)
        .bind(record.drawer_automatic_manage)
        .bind(&record.drawer_manual_order)
        .bind(&record.quick_actions)
        .bind(record.networking_tls_validation)
        .bind(record.use_24_hour_time)
        .bind(record.enable_in_app_notifications)
        .bind(record.changelog_last_build_version)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(conn.get()?)
        .await?;

        debug!("Wrote app settings ({})", identity.id);
        Ok(identity)
    }
}
