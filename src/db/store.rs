//! SQLite-backed entity store.

use crate::domain::EntityKind;
use crate::store::{Store, StoreError, StoredEntity};
use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;
use sqlx::Row;

/// Entity store over the `entities` table.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        SqliteStore { pool }
    }

    fn decode_body(kind: EntityKind, id: &str, raw: &str) -> Result<serde_json::Value, StoreError> {
        serde_json::from_str(raw).map_err(|source| StoreError::Codec {
            kind,
            id: id.to_string(),
            source,
        })
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn load(
        &self,
        kind: EntityKind,
        id: &str,
    ) -> Result<Option<serde_json::Value>, StoreError> {
        let row = sqlx::query("SELECT body FROM entities WHERE kind = ? AND id = ?")
            .bind(kind.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => {
                let body: String = r.get("body");
                Self::decode_body(kind, id, &body).map(Some)
            }
            None => Ok(None),
        }
    }

    async fn save(&self, entity: StoredEntity) -> Result<(), StoreError> {
        upsert(&entity, chrono::Utc::now().timestamp_millis())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn save_batch(&self, entities: Vec<StoredEntity>) -> Result<(), StoreError> {
        let now = chrono::Utc::now().timestamp_millis();
        let mut tx = self.pool.begin().await?;
        for entity in &entities {
            upsert(entity, now).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn list(
        &self,
        kind: EntityKind,
        user: Option<&str>,
    ) -> Result<Vec<StoredEntity>, StoreError> {
        let rows = match user {
            Some(u) => {
                sqlx::query("SELECT id, user, body FROM entities WHERE kind = ? AND user = ? ORDER BY id ASC")
                    .bind(kind.as_str())
                    .bind(u)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query("SELECT id, user, body FROM entities WHERE kind = ? ORDER BY id ASC")
                    .bind(kind.as_str())
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.iter()
            .map(|row| {
                let id: String = row.get("id");
                let body: String = row.get("body");
                let body = Self::decode_body(kind, &id, &body)?;
                Ok(StoredEntity {
                    kind,
                    id,
                    user: row.get("user"),
                    body,
                })
            })
            .collect()
    }
}

fn upsert(
    entity: &StoredEntity,
    updated_at: i64,
) -> sqlx::query::Query<'_, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'_>> {
    sqlx::query(
        r#"
        INSERT INTO entities (kind, id, user, body, updated_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(kind, id) DO UPDATE SET
            user = excluded.user,
            body = excluded.body,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(entity.kind.as_str())
    .bind(entity.id.as_str())
    .bind(entity.user.as_deref())
    .bind(entity.body.to_string())
    .bind(updated_at)
}
