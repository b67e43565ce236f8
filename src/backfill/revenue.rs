use anyhow::Result;
use chrono::Local;
use scopeguard::defer;

use crate::{
    crawler::mops,
    database::table::monthly_revenue::PostgresRevenueStore,
    declare::StockExchangeMarket,
    revenue::{
        record::MonthlyRevenue,
        store::{self, RevenueStore},
    },
    util::datetime,
};

/// 下載上個月的上市、上櫃月營收並重新計算衍生欄位
pub async fn execute() -> Result<()> {
    tracing::info!("更新台股月營收開始");
    defer! {
        tracing::info!("更新台股月營收結束");
    }

    let (year, month) = datetime::last_revenue_year_month(Local::now().date_naive());
    PostgresRevenueStore::create_table().await?;

    process_revenues(&PostgresRevenueStore, year, month).await
}

async fn process_revenues(store: &dyn RevenueStore, year: i32, month: u32) -> Result<()> {
    let markets = [StockExchangeMarket::Listed, StockExchangeMarket::OverTheCounter];
    let mut revenues = Vec::with_capacity(2048);

    for (i, market) in markets.iter().enumerate() {
        if i > 0 {
            mops::random_pause().await;
        }

        match mops::visit_revenue(*market, year, month).await {
            Ok(list) => {
                tracing::info!(market = %market, year, month, count = list.len(), "revenues downloaded");
                revenues.extend(list);
            }
            Err(why) => {
                tracing::error!(market = %market, "Failed to mops::visit_revenue because {:?}", why);
            }
        }
    }

    import_revenues(store, revenues).await?;

    Ok(())
}

/// 寫入月營收後重新計算所有股票的衍生欄位
pub async fn import_revenues(store: &dyn RevenueStore, revenues: Vec<MonthlyRevenue>) -> Result<u64> {
    if revenues.is_empty() {
        tracing::warn!("no revenue to import");
        return Ok(0);
    }

    let upserted = store.upsert_revenues(&revenues).await?;
    let updated = store::refresh_derived(store, None).await?;

    tracing::info!(upserted, updated, "revenues imported");

    Ok(updated)
}
