use anyhow::{anyhow, Result};
use sqlx::types::Json;

use crate::{
    database,
    declare::{Quarter, StatementType, StockExchangeMarket},
    statement::table::{CanonicalTable, CODE_COLUMN, SECTOR_COLUMN},
};

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS statement_report (
    market VARCHAR(8) NOT NULL,
    "year" INTEGER NOT NULL,
    quarter INTEGER NOT NULL,
    statement VARCHAR(16) NOT NULL,
    code VARCHAR(16) NOT NULL,
    sector VARCHAR(16) NOT NULL,
    data JSONB NOT NULL,
    created_time TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_time TIMESTAMPTZ NOT NULL DEFAULT now(),
    PRIMARY KEY (market, "year", quarter, statement, code)
);
"#;

/// 季報彙總表的一列，整列資料以 JSONB 保存
#[derive(Debug, Clone, PartialEq)]
pub struct StatementReport {
    pub market: StockExchangeMarket,
    pub year: i32,
    pub quarter: Quarter,
    pub statement: StatementType,
    pub code: String,
    pub sector: String,
    pub data: serde_json::Value,
}

impl StatementReport {
    /// 將合併後的表格轉成資料列，沒有公司代號的列會被略過
    pub fn from_table(
        table: &CanonicalTable,
        market: StockExchangeMarket,
        year: i32,
        quarter: Quarter,
        statement: StatementType,
    ) -> Vec<StatementReport> {
        table
            .to_json_rows()
            .into_iter()
            .enumerate()
            .filter_map(|(i, data)| {
                let code = table.get(i, CODE_COLUMN).to_string();
                if code.is_empty() {
                    return None;
                }

                Some(StatementReport {
                    market,
                    year,
                    quarter,
                    statement,
                    code,
                    sector: table.get(i, SECTOR_COLUMN).to_string(),
                    data,
                })
            })
            .collect()
    }

    /// 建立資料表 (已存在時不做任何事)
    pub async fn create_table() -> Result<()> {
        sqlx::query(CREATE_TABLE)
            .execute(database::get_connection()?)
            .await
            .map_err(|why| anyhow!("Failed to create statement_report because {:?}", why))?;

        Ok(())
    }

    /// 在同一個 transaction 內新增或更新多筆資料
    pub async fn upsert_all(reports: &[StatementReport]) -> Result<u64> {
        let sql = r#"
INSERT INTO statement_report (market, "year", quarter, statement, code, sector, data)
VALUES ($1, $2, $3, $4, $5, $6, $7)
ON CONFLICT (market, "year", quarter, statement, code) DO UPDATE SET
    sector = EXCLUDED.sector,
    data = EXCLUDED.data,
    updated_time = now();
"#;
        let mut tx = database::get_tx().await?;
        let mut affected = 0;

        for report in reports {
            let result = sqlx::query(sql)
                .bind(report.market.to_string())
                .bind(report.year)
                .bind(report.quarter.serial() as i32)
                .bind(report.statement.to_string())
                .bind(&report.code)
                .bind(&report.sector)
                .bind(Json(&report.data))
                .execute(&mut *tx)
                .await
                .map_err(|why| {
                    anyhow!(
                        "Failed to upsert({} {} {}Q{} {}) from database because {:?}",
                        report.market,
                        report.statement,
                        report.year,
                        report.quarter.serial(),
                        report.code,
                        why
                    )
                })?;

            affected += result.rows_affected();
        }

        tx.commit().await?;

        Ok(affected)
    }
}
