use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqlitePool, FromRow, Result as SqlxResult};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: i64,
    pub email: String,
    pub display_name: Option<String>,
    pub line_user_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AccountDataset {
    pub id: i64,
    pub account_id: i64,
    /// JSON array of canonical records.
    pub records: String,
    pub created_at: i64,
    pub updated_at: i64,
}

fn now_ts() -> i64 {
    chrono::Utc::now().timestamp()
}

#[derive(Clone)]
pub struct Repository {
    pool: Arc<SqlitePool>,
}

impl Repository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // ==================== Accounts ====================

    pub async fn create_account(&self, email: &str, display_name: Option<&str>) -> SqlxResult<i64> {
        let now = now_ts();
        let result = sqlx::query(
            "INSERT INTO accounts (email, display_name, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
        )
        .bind(email)
        .bind(display_name)
        .bind(now)
        .execute(self.pool.as_ref())
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn get_account(&self, id: i64) -> SqlxResult<Option<Account>> {
        sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = ?1")
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await
    }

    pub async fn find_account_by_line_user(&self, line_user_id: &str) -> SqlxResult<Option<Account>> {
        sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE line_user_id = ?1")
            .bind(line_user_id)
            .fetch_optional(self.pool.as_ref())
            .await
    }

    /// Bind a LINE user to an account, releasing it from any other account.
    ///
    /// Returns `false` when the account does not exist.
    pub async fn bind_line_user(&self, id: i64, line_user_id: &str) -> SqlxResult<bool> {
        let now = now_ts();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE accounts SET line_user_id = NULL, updated_at = ?3 WHERE line_user_id = ?1 AND id != ?2",
        )
        .bind(line_user_id)
        .bind(id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let result =
            sqlx::query("UPDATE accounts SET line_user_id = ?1, updated_at = ?3 WHERE id = ?2")
                .bind(line_user_id)
                .bind(id)
                .bind(now)
                .execute(&mut *tx)
                .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }
        tx.commit().await?;
        Ok(true)
    }

    pub async fn delete_account(&self, id: i64) -> SqlxResult<()> {
        sqlx::query("DELETE FROM accounts WHERE id = ?1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }

    // ==================== Datasets ====================

    /// Create or fully overwrite the dataset of an account.
    pub async fn upsert_dataset(&self, account_id: i64, records_json: &str) -> SqlxResult<()> {
        let now = now_ts();
        sqlx::query(
            r#"
            INSERT INTO account_datasets (account_id, records, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?3)
            ON CONFLICT(account_id) DO UPDATE SET
                records = excluded.records,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(account_id)
        .bind(records_json)
        .bind(now)
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }

    pub async fn get_dataset(&self, account_id: i64) -> SqlxResult<Option<AccountDataset>> {
        sqlx::query_as::<_, AccountDataset>("SELECT * FROM account_datasets WHERE account_id = ?1")
            .bind(account_id)
            .fetch_optional(self.pool.as_ref())
            .await
    }

    pub async fn count_datasets(&self, account_id: i64) -> SqlxResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM account_datasets WHERE account_id = ?1")
            .bind(account_id)
            .fetch_one(self.pool.as_ref())
            .await
    }
}
