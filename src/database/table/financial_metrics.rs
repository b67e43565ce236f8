use anyhow::{anyhow, Result};
use sqlx::types::Json;

use crate::{database, statement::metrics::FinancialMetrics};

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS financial_metrics (
    code VARCHAR(16) NOT NULL,
    "year" INTEGER NOT NULL,
    quarter INTEGER NOT NULL,
    data JSONB NOT NULL,
    created_time TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_time TIMESTAMPTZ NOT NULL DEFAULT now(),
    PRIMARY KEY (code, "year", quarter)
);
"#;

/// 建立資料表 (已存在時不做任何事)
pub async fn create_table() -> Result<()> {
    sqlx::query(CREATE_TABLE)
        .execute(database::get_connection()?)
        .await
        .map_err(|why| anyhow!("Failed to create financial_metrics because {:?}", why))?;

    Ok(())
}

/// 在同一個 transaction 內新增或更新多筆資料，指標整筆以 JSONB 保存
pub async fn upsert_all(metrics: &[FinancialMetrics]) -> Result<u64> {
    let sql = r#"
INSERT INTO financial_metrics (code, "year", quarter, data)
VALUES ($1, $2, $3, $4)
ON CONFLICT (code, "year", quarter) DO UPDATE SET
    data = EXCLUDED.data,
    updated_time = now();
"#;
    let mut tx = database::get_tx().await?;
    let mut affected = 0;

    for m in metrics {
        let result = sqlx::query(sql)
            .bind(&m.code)
            .bind(m.year)
            .bind(m.quarter as i32)
            .bind(Json(m))
            .execute(&mut *tx)
            .await
            .map_err(|why| {
                anyhow!(
                    "Failed to upsert({} {}Q{}) into financial_metrics because {:?}",
                    m.code,
                    m.year,
                    m.quarter,
                    why
                )
            })?;

        affected += result.rows_affected();
    }

    tx.commit().await?;

    Ok(affected)
}
