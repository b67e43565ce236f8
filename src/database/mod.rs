use std::time::Duration;

use anyhow::{anyhow, Result};
use once_cell::sync::OnceCell;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Transaction};

use crate::config;

pub mod table;

static POSTGRES: OnceCell<PostgresSQL> = OnceCell::new();

/// PostgreSQL 連線池封裝。
///
/// 負責建立連線池並提供 transaction 入口，供 `database::table::*` 共享使用。
pub struct PostgresSQL {
    /// SQLx PostgreSQL 連線池實例。
    pub pool: PgPool,
}

impl PostgresSQL {
    /// 建立 PostgreSQL 連線池。
    ///
    /// 連線參數來自 `config::SETTINGS.postgresql`，連線在第一次使用時才建立。
    pub fn new() -> Result<PostgresSQL> {
        let database_url = format!(
            "postgres://{}:{}@{}:{}/{}?application_name=twstock_statement",
            config::SETTINGS.postgresql.user,
            config::SETTINGS.postgresql.password,
            config::SETTINGS.postgresql.host,
            config::SETTINGS.postgresql.port,
            config::SETTINGS.postgresql.db
        );
        let db = PgPoolOptions::new()
            .max_lifetime(Some(Duration::from_secs(1800)))
            // 批次工作依序執行，少量連線即可
            .max_connections(4)
            .min_connections(1)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Some(Duration::from_secs(600)))
            .connect_lazy(&database_url)
            .map_err(|why| {
                anyhow!(
                    "Failed to create the pool for {}:{}/{} because {:?}",
                    config::SETTINGS.postgresql.host,
                    config::SETTINGS.postgresql.port,
                    config::SETTINGS.postgresql.db,
                    why
                )
            })?;

        Ok(Self { pool: db })
    }

    /// 取得連線池參考。
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 從目前連線池建立一筆 transaction。
    ///
    /// # Errors
    /// 當 `BEGIN` 失敗時回傳錯誤。
    pub async fn tx(&self) -> Result<Transaction<'_, Postgres>> {
        Ok(self.pool().begin().await?)
    }
}

fn get_postgresql() -> Result<&'static PostgresSQL> {
    POSTGRES.get_or_try_init(PostgresSQL::new)
}

/// 取得全域 PostgreSQL 連線池。
pub fn get_connection() -> Result<&'static PgPool> {
    Ok(get_postgresql()?.pool())
}

/// 從全域 PostgreSQL 連線池建立 transaction。
///
/// # Errors
/// 當無法成功建立 transaction 時回傳錯誤。
pub async fn get_tx() -> Result<Transaction<'static, Postgres>> {
    get_postgresql()?.tx().await
}
