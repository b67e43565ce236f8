use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::revenue::{metrics, record::MonthlyRevenue};

/// 月營收的儲存介面，以 (stock_symbol, year, month) 為鍵並採 upsert 語意
#[async_trait]
pub trait RevenueStore: Send + Sync {
    /// 讀取月營收，`stock_symbol` 為 `None` 時讀取全部，依代號與年月排序
    async fn read_all_revenue_rows(&self, stock_symbol: Option<&str>) -> Result<Vec<MonthlyRevenue>>;

    /// 寫回衍生欄位，回傳更新的筆數
    async fn write_derived_fields(&self, rows: &[MonthlyRevenue]) -> Result<u64>;

    /// 新增或更新當月營收與備註，不影響既有的衍生欄位
    async fn upsert_revenues(&self, rows: &[MonthlyRevenue]) -> Result<u64>;
}

/// 重新計算並寫回衍生欄位
///
/// 即使只新增一個月份，也要重算該股票 (或全部股票) 的所有月份。
pub async fn refresh_derived(store: &dyn RevenueStore, stock_symbol: Option<&str>) -> Result<u64> {
    let rows = store.read_all_revenue_rows(stock_symbol).await?;
    let total = rows.len();
    let rows = metrics::recompute(rows);
    let updated = store.write_derived_fields(&rows).await?;

    tracing::info!(
        stock_symbol = stock_symbol.unwrap_or("*"),
        total,
        updated,
        "revenue derived fields recomputed"
    );

    Ok(updated)
}

type RevenueKey = (String, i32, u32);

/// 以記憶體保存的月營收，供測試與離線計算使用
#[derive(Debug, Default)]
pub struct MemoryRevenueStore {
    rows: RwLock<BTreeMap<RevenueKey, MonthlyRevenue>>,
}

impl MemoryRevenueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    fn key_of(row: &MonthlyRevenue) -> RevenueKey {
        (row.stock_symbol.clone(), row.year, row.month)
    }
}

#[async_trait]
impl RevenueStore for MemoryRevenueStore {
    async fn read_all_revenue_rows(&self, stock_symbol: Option<&str>) -> Result<Vec<MonthlyRevenue>> {
        let rows = self.rows.read().await;
        Ok(rows
            .values()
            .filter(|r| stock_symbol.map_or(true, |s| r.stock_symbol == s))
            .cloned()
            .collect())
    }

    async fn write_derived_fields(&self, rows: &[MonthlyRevenue]) -> Result<u64> {
        let mut stored = self.rows.write().await;
        let mut updated = 0;

        for row in rows {
            if let Some(existing) = stored.get_mut(&Self::key_of(row)) {
                existing.derived = row.derived.clone();
                updated += 1;
            }
        }

        Ok(updated)
    }

    async fn upsert_revenues(&self, rows: &[MonthlyRevenue]) -> Result<u64> {
        let mut stored = self.rows.write().await;

        for row in rows {
            stored
                .entry(Self::key_of(row))
                .and_modify(|existing| {
                    existing.revenue = row.revenue;
                    existing.note = row.note.clone();
                })
                .or_insert_with(|| row.clone());
        }

        Ok(rows.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[tokio::test]
    async fn test_refresh_after_backfilled_month() {
        let store = MemoryRevenueStore::new();
        store
            .upsert_revenues(&[
                MonthlyRevenue::new("2330", 2024, 1, dec!(100)),
                MonthlyRevenue::new("2330", 2024, 3, dec!(120)),
            ])
            .await
            .unwrap();
        refresh_derived(&store, None).await.unwrap();

        let rows = store.read_all_revenue_rows(Some("2330")).await.unwrap();
        assert_eq!(rows[1].derived.mom, Some(dec!(20)));

        // 補上 2 月後，3 月的月增率與累計營收都要跟著修正
        store
            .upsert_revenues(&[MonthlyRevenue::new("2330", 2024, 2, dec!(150))])
            .await
            .unwrap();
        let updated = refresh_derived(&store, Some("2330")).await.unwrap();
        assert_eq!(updated, 3);

        let rows = store.read_all_revenue_rows(Some("2330")).await.unwrap();
        assert_eq!(rows[2].derived.mom, Some(dec!(-20)));
        assert_eq!(rows[2].derived.cumulative_revenue, Some(dec!(370)));
    }

    #[tokio::test]
    async fn test_upsert_keeps_primary_key() {
        let store = MemoryRevenueStore::new();
        let mut first = MonthlyRevenue::new("1101", 2024, 5, dec!(10));
        first.note = Some("舊備註".to_string());
        store.upsert_revenues(&[first]).await.unwrap();
        store
            .upsert_revenues(&[MonthlyRevenue::new("1101", 2024, 5, dec!(11))])
            .await
            .unwrap();

        assert_eq!(store.len().await, 1);
        let rows = store.read_all_revenue_rows(None).await.unwrap();
        assert_eq!(rows[0].revenue, dec!(11));
        assert_eq!(rows[0].note, None);
    }

    #[tokio::test]
    async fn test_refresh_is_idempotent() {
        let store = MemoryRevenueStore::new();
        let rows: Vec<MonthlyRevenue> = (1..=12)
            .map(|m| MonthlyRevenue::new("2454", 2023, m, rust_decimal::Decimal::from(m)))
            .chain((1..=3).map(|m| MonthlyRevenue::new("2454", 2024, m, dec!(7))))
            .collect();
        store.upsert_revenues(&rows).await.unwrap();

        refresh_derived(&store, None).await.unwrap();
        let first = store.read_all_revenue_rows(None).await.unwrap();
        refresh_derived(&store, None).await.unwrap();
        let second = store.read_all_revenue_rows(None).await.unwrap();

        assert_eq!(first, second);
        assert!(store.read_all_revenue_rows(Some("9999")).await.unwrap().is_empty());
    }
}
