use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{postgres::PgRow, Row};

use crate::{
    database,
    revenue::{
        record::{DerivedRevenue, MonthlyRevenue},
        store::RevenueStore,
    },
};

/// 每次寫入的最大筆數
const BATCH_SIZE: usize = 2000;

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS monthly_revenue (
    stock_symbol VARCHAR(16) NOT NULL,
    "year" INTEGER NOT NULL,
    "month" INTEGER NOT NULL,
    revenue NUMERIC NOT NULL,
    note TEXT,
    revenue_last_year NUMERIC,
    cumulative_revenue NUMERIC,
    cumulative_revenue_last_year NUMERIC,
    mom NUMERIC,
    yoy NUMERIC,
    cumulative_revenue_yoy NUMERIC,
    revenue_ma3 NUMERIC,
    revenue_ma12 NUMERIC,
    cumulative_revenue_yoy_ma3 NUMERIC,
    cumulative_revenue_yoy_ma12 NUMERIC,
    created_time TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_time TIMESTAMPTZ NOT NULL DEFAULT now(),
    PRIMARY KEY (stock_symbol, "year", "month")
);
"#;

/// 以 PostgreSQL `monthly_revenue` 表保存的月營收
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresRevenueStore;

impl PostgresRevenueStore {
    /// 建立資料表 (已存在時不做任何事)
    pub async fn create_table() -> Result<()> {
        sqlx::query(CREATE_TABLE)
            .execute(database::get_connection()?)
            .await
            .map_err(|why| anyhow!("Failed to create monthly_revenue because {:?}", why))?;

        Ok(())
    }
}

fn from_row(row: &PgRow) -> Result<MonthlyRevenue, sqlx::Error> {
    let month: i32 = row.try_get("month")?;

    Ok(MonthlyRevenue {
        stock_symbol: row.try_get("stock_symbol")?,
        year: row.try_get("year")?,
        month: month as u32,
        revenue: row.try_get("revenue")?,
        note: row.try_get("note")?,
        derived: DerivedRevenue {
            revenue_last_year: row.try_get("revenue_last_year")?,
            cumulative_revenue: row.try_get("cumulative_revenue")?,
            cumulative_revenue_last_year: row.try_get("cumulative_revenue_last_year")?,
            mom: row.try_get("mom")?,
            yoy: row.try_get("yoy")?,
            cumulative_revenue_yoy: row.try_get("cumulative_revenue_yoy")?,
            revenue_ma3: row.try_get("revenue_ma3")?,
            revenue_ma12: row.try_get("revenue_ma12")?,
            cumulative_revenue_yoy_ma3: row.try_get("cumulative_revenue_yoy_ma3")?,
            cumulative_revenue_yoy_ma12: row.try_get("cumulative_revenue_yoy_ma12")?,
        },
    })
}

fn keys(rows: &[MonthlyRevenue]) -> (Vec<String>, Vec<i32>, Vec<i32>) {
    (
        rows.iter().map(|r| r.stock_symbol.clone()).collect(),
        rows.iter().map(|r| r.year).collect(),
        rows.iter().map(|r| r.month as i32).collect(),
    )
}

fn column(rows: &[MonthlyRevenue], f: impl Fn(&DerivedRevenue) -> Option<Decimal>) -> Vec<Option<Decimal>> {
    rows.iter().map(|r| f(&r.derived)).collect()
}

#[async_trait]
impl RevenueStore for PostgresRevenueStore {
    async fn read_all_revenue_rows(&self, stock_symbol: Option<&str>) -> Result<Vec<MonthlyRevenue>> {
        let sql = r#"
SELECT
    stock_symbol, "year", "month", revenue, note,
    revenue_last_year, cumulative_revenue, cumulative_revenue_last_year,
    mom, yoy, cumulative_revenue_yoy,
    revenue_ma3, revenue_ma12, cumulative_revenue_yoy_ma3, cumulative_revenue_yoy_ma12
FROM monthly_revenue
WHERE $1::varchar IS NULL OR stock_symbol = $1
ORDER BY stock_symbol, "year", "month";
"#;
        sqlx::query(sql)
            .bind(stock_symbol)
            .try_map(|row: PgRow| from_row(&row))
            .fetch_all(database::get_connection()?)
            .await
            .context(format!(
                "Failed to read_all_revenue_rows({:?}) from database",
                stock_symbol
            ))
    }

    async fn write_derived_fields(&self, rows: &[MonthlyRevenue]) -> Result<u64> {
        let sql = r#"
UPDATE monthly_revenue AS m SET
    revenue_last_year = u.revenue_last_year,
    cumulative_revenue = u.cumulative_revenue,
    cumulative_revenue_last_year = u.cumulative_revenue_last_year,
    mom = u.mom,
    yoy = u.yoy,
    cumulative_revenue_yoy = u.cumulative_revenue_yoy,
    revenue_ma3 = u.revenue_ma3,
    revenue_ma12 = u.revenue_ma12,
    cumulative_revenue_yoy_ma3 = u.cumulative_revenue_yoy_ma3,
    cumulative_revenue_yoy_ma12 = u.cumulative_revenue_yoy_ma12,
    updated_time = now()
FROM UNNEST(
    $1::varchar[], $2::int[], $3::int[],
    $4::numeric[], $5::numeric[], $6::numeric[], $7::numeric[], $8::numeric[],
    $9::numeric[], $10::numeric[], $11::numeric[], $12::numeric[], $13::numeric[]
) AS u(
    stock_symbol, "year", "month",
    revenue_last_year, cumulative_revenue, cumulative_revenue_last_year, mom, yoy,
    cumulative_revenue_yoy, revenue_ma3, revenue_ma12, cumulative_revenue_yoy_ma3, cumulative_revenue_yoy_ma12
)
WHERE m.stock_symbol = u.stock_symbol AND m."year" = u."year" AND m."month" = u."month";
"#;
        let mut tx = database::get_tx().await?;
        let mut updated = 0;

        for chunk in rows.chunks(BATCH_SIZE) {
            let (symbols, years, months) = keys(chunk);
            let result = sqlx::query(sql)
                .bind(symbols)
                .bind(years)
                .bind(months)
                .bind(column(chunk, |d| d.revenue_last_year))
                .bind(column(chunk, |d| d.cumulative_revenue))
                .bind(column(chunk, |d| d.cumulative_revenue_last_year))
                .bind(column(chunk, |d| d.mom))
                .bind(column(chunk, |d| d.yoy))
                .bind(column(chunk, |d| d.cumulative_revenue_yoy))
                .bind(column(chunk, |d| d.revenue_ma3))
                .bind(column(chunk, |d| d.revenue_ma12))
                .bind(column(chunk, |d| d.cumulative_revenue_yoy_ma3))
                .bind(column(chunk, |d| d.cumulative_revenue_yoy_ma12))
                .execute(&mut *tx)
                .await
                .map_err(|why| anyhow!("Failed to write_derived_fields because {:?}", why))?;

            updated += result.rows_affected();
        }

        tx.commit().await?;

        Ok(updated)
    }

    async fn upsert_revenues(&self, rows: &[MonthlyRevenue]) -> Result<u64> {
        let sql = r#"
INSERT INTO monthly_revenue (stock_symbol, "year", "month", revenue, note)
SELECT * FROM UNNEST($1::varchar[], $2::int[], $3::int[], $4::numeric[], $5::text[])
ON CONFLICT (stock_symbol, "year", "month") DO UPDATE SET
    revenue = EXCLUDED.revenue,
    note = EXCLUDED.note,
    updated_time = now();
"#;
        let mut tx = database::get_tx().await?;
        let mut affected = 0;

        for chunk in rows.chunks(BATCH_SIZE) {
            let (symbols, years, months) = keys(chunk);
            let revenues: Vec<Decimal> = chunk.iter().map(|r| r.revenue).collect();
            let notes: Vec<Option<String>> = chunk.iter().map(|r| r.note.clone()).collect();

            let result = sqlx::query(sql)
                .bind(symbols)
                .bind(years)
                .bind(months)
                .bind(revenues)
                .bind(notes)
                .execute(&mut *tx)
                .await
                .map_err(|why| anyhow!("Failed to upsert_revenues because {:?}", why))?;

            affected += result.rows_affected();
        }

        tx.commit().await?;

        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::revenue::store;

    #[test]
    fn test_keys() {
        let rows = vec![
            MonthlyRevenue::new("2330", 2024, 1, dec!(1)),
            MonthlyRevenue::new("1101", 2023, 12, dec!(2)),
        ];
        let (symbols, years, months) = keys(&rows);
        assert_eq!(symbols, vec!["2330".to_string(), "1101".to_string()]);
        assert_eq!(years, vec![2024, 2023]);
        assert_eq!(months, vec![1, 12]);
        assert_eq!(column(&rows, |d| d.mom), vec![None, None]);
    }

    #[tokio::test]
    #[ignore]
    async fn test_refresh_derived() {
        dotenv::dotenv().ok();

        if let Err(why) = PostgresRevenueStore::create_table().await {
            println!("Failed to create_table because {:?}", why);
            return;
        }

        let store = PostgresRevenueStore;
        match store::refresh_derived(&store, Some("2330")).await {
            Ok(updated) => println!("updated:{}", updated),
            Err(why) => println!("Failed to refresh_derived because {:?}", why),
        }
    }
}
