//! SQLite 寫入端：每筆記錄的 `data` 以 JSON 文字存放
//!
//! 同一份文件的所有列在同一個 transaction 中寫入。

use crate::core::{NormalizedRecord, PersistenceSink};
use crate::utils::error::Result;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

pub struct SqliteSink {
    pool: SqlitePool,
}

impl SqliteSink {
    /// 例如 `sqlite://eligibility.db`，檔案不存在時自動建立
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;

        tracing::info!("🗄️ Connected to database: {}", database_url);
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS eb_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                member_id TEXT,
                sequence_id INTEGER NOT NULL,
                data TEXT NOT NULL,
                inserted_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_eb_records_member ON eb_records(member_id)")
            .execute(&pool)
            .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl PersistenceSink for SqliteSink {
    async fn persist(&self, member_id: Option<&str>, batch: &[NormalizedRecord]) -> Result<u64> {
        tracing::debug!(
            member_id = ?member_id,
            record_count = batch.len(),
            "Persisting EB records"
        );

        let mut tx = self.pool.begin().await?;
        let mut rows = 0;

        for record in batch {
            let data = serde_json::to_string(&record.fields)?;
            let result = sqlx::query(
                r#"
                INSERT INTO eb_records (member_id, sequence_id, data, inserted_at)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(member_id)
            .bind(record.sequence_id as i64)
            .bind(data)
            .bind(record.processed_at_text())
            .execute(&mut *tx)
            .await?;
            rows += result.rows_affected();
        }

        // 任一列失敗時 tx 在 drop 時 rollback
        tx.commit().await?;
        Ok(rows)
    }
}
