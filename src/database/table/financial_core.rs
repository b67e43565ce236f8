use std::collections::BTreeMap;

use anyhow::{anyhow, Result};
use rust_decimal::Decimal;
use sqlx::{types::Json, Row};

use crate::{
    database,
    declare::Quarter,
    statement::metrics::{CoreField, FinancialCore},
};

/// 基本財務數字的兩種期間
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CorePeriod {
    /// 年初至今累計
    YearToDate,
    /// 單季
    SingleQuarter,
}

impl CorePeriod {
    pub fn table_name(&self) -> &'static str {
        match self {
            CorePeriod::YearToDate => "financial_ytd",
            CorePeriod::SingleQuarter => "financial_core",
        }
    }
}

fn create_table_sql(period: CorePeriod) -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS {} (
    code VARCHAR(16) NOT NULL,
    "year" INTEGER NOT NULL,
    quarter INTEGER NOT NULL,
    data JSONB NOT NULL,
    created_time TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_time TIMESTAMPTZ NOT NULL DEFAULT now(),
    PRIMARY KEY (code, "year", quarter)
);
"#,
        period.table_name()
    )
}

/// 建立 financial_ytd 與 financial_core (已存在時不做任何事)
pub async fn create_tables() -> Result<()> {
    for period in [CorePeriod::YearToDate, CorePeriod::SingleQuarter] {
        sqlx::query(&create_table_sql(period))
            .execute(database::get_connection()?)
            .await
            .map_err(|why| anyhow!("Failed to create {} because {:?}", period.table_name(), why))?;
    }

    Ok(())
}

/// 在同一個 transaction 內新增或更新多筆資料
pub async fn upsert_all(period: CorePeriod, cores: &[FinancialCore]) -> Result<u64> {
    let sql = format!(
        r#"
INSERT INTO {} (code, "year", quarter, data)
VALUES ($1, $2, $3, $4)
ON CONFLICT (code, "year", quarter) DO UPDATE SET
    data = EXCLUDED.data,
    updated_time = now();
"#,
        period.table_name()
    );
    let mut tx = database::get_tx().await?;
    let mut affected = 0;

    for core in cores {
        let result = sqlx::query(&sql)
            .bind(&core.code)
            .bind(core.year)
            .bind(core.quarter.serial() as i32)
            .bind(Json(&core.values))
            .execute(&mut *tx)
            .await
            .map_err(|why| {
                anyhow!(
                    "Failed to upsert({} {}Q{}) into {} because {:?}",
                    core.code,
                    core.year,
                    core.quarter.serial(),
                    period.table_name(),
                    why
                )
            })?;

        affected += result.rows_affected();
    }

    tx.commit().await?;

    Ok(affected)
}

/// 取出全部資料，依公司代號、年、季排序
pub async fn fetch_all(period: CorePeriod) -> Result<Vec<FinancialCore>> {
    let sql = format!(
        r#"SELECT code, "year", quarter, data FROM {} ORDER BY code, "year", quarter"#,
        period.table_name()
    );

    let rows = sqlx::query(&sql)
        .fetch_all(database::get_connection()?)
        .await
        .map_err(|why| anyhow!("Failed to fetch_all from {} because {:?}", period.table_name(), why))?;

    let mut cores = Vec::with_capacity(rows.len());
    for row in rows {
        let quarter: i32 = row.try_get("quarter")?;
        let quarter = match Quarter::from_serial(quarter as u32) {
            Some(quarter) => quarter,
            None => return Err(anyhow!("Failed to read quarter {} from {}", quarter, period.table_name())),
        };
        let values: Json<BTreeMap<CoreField, Decimal>> = row.try_get("data")?;

        cores.push(FinancialCore {
            code: row.try_get("code")?,
            year: row.try_get("year")?,
            quarter,
            values: values.0,
        });
    }

    Ok(cores)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_create_table_sql() {
        let sql = create_table_sql(CorePeriod::YearToDate);
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS financial_ytd"));
        assert!(create_table_sql(CorePeriod::SingleQuarter).contains("financial_core"));
    }

    #[test]
    fn test_values_as_json() {
        let core = FinancialCore::new("2330", 2024, Quarter::Q1).with(CoreField::LtLiabsDue1y, dec!(12.5));
        let json = serde_json::to_value(&core.values).unwrap();
        assert_eq!(json, serde_json::json!({ "lt_liabs_due_1y": "12.5" }));

        let back: BTreeMap<CoreField, Decimal> = serde_json::from_value(json).unwrap();
        assert_eq!(back, core.values);
    }

    #[tokio::test]
    #[ignore]
    async fn test_upsert_and_fetch_all() {
        dotenv::dotenv().ok();
        create_tables().await.unwrap();

        let core = FinancialCore::new("0000", 1999, Quarter::Q1).with(CoreField::OprRevenue, dec!(1));
        upsert_all(CorePeriod::YearToDate, &[core.clone()]).await.unwrap();

        let cores = fetch_all(CorePeriod::YearToDate).await.unwrap();
        assert!(cores.contains(&core));
    }
}
