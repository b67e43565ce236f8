use std::collections::HashSet;

use anyhow::{anyhow, Result};
use chrono::Local;
use scopeguard::defer;
use strum::IntoEnumIterator;

use crate::{
    crawler::mops,
    database::table::{
        financial_core::{self, CorePeriod},
        financial_metrics,
        statement_report::StatementReport,
    },
    declare::{Quarter, Sector, StatementType, StockExchangeMarket},
    statement::{self, merger, metrics, StatementOutcome},
    util::datetime,
};

/// 季報依序下載的市場
const MARKETS: [StockExchangeMarket; 2] = [
    StockExchangeMarket::Listed,
    StockExchangeMarket::OverTheCounter,
];

/// 下載最近一季的四種彙總報表並寫入 statement_report，再更新財務指標
pub async fn execute() -> Result<()> {
    tracing::info!("更新季報彙總表開始");
    defer! {
        tracing::info!("更新季報彙總表結束");
    }

    let (year, quarter) = datetime::last_report_year_quarter(Local::now().date_naive())?;
    create_tables().await?;

    process_quarter(year, quarter).await?;
    refresh_metrics().await
}

/// 補齊 start 到 end (含) 每一季的彙總報表，最後重算一次財務指標
pub async fn backfill(start: (i32, Quarter), end: (i32, Quarter)) -> Result<()> {
    tracing::info!(?start, ?end, "補齊季報彙總表開始");
    defer! {
        tracing::info!("補齊季報彙總表結束");
    }

    create_tables().await?;

    for (year, quarter) in datetime::quarters_between(start, end) {
        if let Err(why) = process_quarter(year, quarter).await {
            tracing::error!("Failed to process_quarter({}Q{}) because {:?}", year, quarter.serial(), why);
        }
    }

    refresh_metrics().await
}

async fn create_tables() -> Result<()> {
    StatementReport::create_table().await?;
    financial_core::create_tables().await?;
    financial_metrics::create_table().await
}

/// 下載一季的報表，各市場分別寫入 statement_report，
/// 串接後的全市場報表取出一般業的累計財務數字寫入 financial_ytd
async fn process_quarter(year: i32, quarter: Quarter) -> Result<()> {
    let mut period_tables = Vec::with_capacity(StatementType::iter().len());

    for statement in StatementType::iter() {
        let outcomes = fetch(statement, year, quarter, None).await?;

        for (market, outcome) in &outcomes {
            let reports = StatementReport::from_table(&outcome.table, *market, year, quarter, statement);
            let affected = StatementReport::upsert_all(&reports).await?;

            tracing::info!(
                market = %market,
                statement = %statement,
                year,
                quarter = %quarter,
                affected,
                warnings = outcome.warnings.len(),
                "statement_report upserted"
            );
        }

        let period = concat(statement, outcomes);
        tracing::info!(
            statement = %statement,
            year,
            quarter = %quarter,
            rows = period.table.len(),
            warnings = period.warnings.len(),
            "markets concatenated"
        );
        period_tables.push((statement, period.table));

        mops::random_pause().await;
    }

    let ytd = metrics::collect_core(year, quarter, &period_tables, Some(Sector::Ci));
    let affected = financial_core::upsert_all(CorePeriod::YearToDate, &ytd).await?;
    tracing::info!(year, quarter = %quarter, affected, "financial_ytd upserted");

    Ok(())
}

/// 由 financial_ytd 全部資料重算單季數字與財務指標
pub async fn refresh_metrics() -> Result<()> {
    tracing::info!("重算財務指標開始");
    defer! {
        tracing::info!("重算財務指標結束");
    }

    let ytd = financial_core::fetch_all(CorePeriod::YearToDate).await?;
    let core = metrics::single_quarter(ytd);
    let affected = financial_core::upsert_all(CorePeriod::SingleQuarter, &core).await?;
    tracing::info!(affected, "financial_core upserted");

    let computed = metrics::compute_metrics(core);
    let affected = financial_metrics::upsert_all(&computed).await?;
    tracing::info!(affected, "financial_metrics upserted");

    Ok(())
}

/// 依序下載上市、上櫃的彙總報表並處理成統一格式
///
/// 單一市場下載失敗只記錄錯誤，全部失敗才回傳錯誤。
pub async fn fetch(
    statement: StatementType,
    year: i32,
    quarter: Quarter,
    requested: Option<&HashSet<Sector>>,
) -> Result<Vec<(StockExchangeMarket, StatementOutcome)>> {
    let mut result = Vec::with_capacity(MARKETS.len());

    for (i, market) in MARKETS.iter().enumerate() {
        if i > 0 {
            mops::random_pause().await;
        }

        match mops::visit(statement, *market, year, quarter).await {
            Ok(tables) => {
                let outcome = statement::process_tables(tables, statement, *market, requested);
                result.push((*market, outcome));
            }
            Err(why) => {
                tracing::error!(
                    market = %market,
                    statement = %statement,
                    "Failed to mops::visit because {:?}",
                    why
                );
            }
        }
    }

    if result.is_empty() {
        return Err(anyhow!(
            "Failed to fetch {} for {}Q{} from all markets",
            statement,
            year,
            quarter.serial()
        ));
    }

    Ok(result)
}

/// 將各市場的結果依序串接成一張表
pub fn concat(
    statement: StatementType,
    outcomes: Vec<(StockExchangeMarket, StatementOutcome)>,
) -> StatementOutcome {
    let mut tables = Vec::with_capacity(outcomes.len());
    let mut warnings = Vec::new();

    for (_, outcome) in outcomes {
        tables.push(outcome.table);
        warnings.extend(outcome.warnings);
    }

    StatementOutcome {
        table: merger::concat(statement, tables),
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::{
        metrics::CoreField,
        table::{CODE_COLUMN, SECTOR_COLUMN},
    };

    #[test]
    fn test_concat_keeps_market_order() {
        let tse = crate::statement::table::RawStatementTable::from_text(
            &["公司代號", "公司名稱", "營業活動之淨現金流入（流出）"],
            &[["1101", "台泥", "10"]],
        )
        .unwrap();
        let otc = crate::statement::table::RawStatementTable::from_text(
            &["公司代號", "公司名稱", "營業活動之淨現金流入（流出）"],
            &[["3105", "穩懋", "-5"]],
        )
        .unwrap();

        let form = crate::statement::table::RawStatementTable::default();
        let outcomes = vec![
            (
                StockExchangeMarket::Listed,
                statement::process_tables(
                    vec![form.clone(), tse],
                    StatementType::CashFlow,
                    StockExchangeMarket::Listed,
                    None,
                ),
            ),
            (
                StockExchangeMarket::OverTheCounter,
                statement::process_tables(
                    vec![form, otc],
                    StatementType::CashFlow,
                    StockExchangeMarket::OverTheCounter,
                    None,
                ),
            ),
        ];

        let all = concat(StatementType::CashFlow, outcomes);
        assert_eq!(all.table.len(), 2);
        assert_eq!(all.table.get(0, CODE_COLUMN).to_string(), "1101");
        assert_eq!(all.table.get(1, CODE_COLUMN).to_string(), "3105");
        assert_eq!(all.table.sector_of(1), Some(Sector::Unresolved));
        assert_eq!(all.table.columns().last().map(String::as_str), Some(SECTOR_COLUMN));
        assert_eq!(all.warnings.len(), 2);
    }

    #[test]
    fn test_concat_feeds_ytd_core() {
        let headers = [
            "公司代號",
            "公司名稱",
            "營業收入",
            "營業成本",
            "原始認列生物資產及農產品之利益（損失）",
            "本期淨利（淨損）",
        ];
        let tse = crate::statement::table::RawStatementTable::from_text(
            &headers,
            &[["1101", "台泥", "100", "70", "0", "12"]],
        )
        .unwrap();
        let otc = crate::statement::table::RawStatementTable::from_text(
            &headers,
            &[["3105", "穩懋", "50", "40", "0", "3"]],
        )
        .unwrap();

        let form = crate::statement::table::RawStatementTable::default();
        let outcomes: Vec<(StockExchangeMarket, StatementOutcome)> = [
            (StockExchangeMarket::Listed, tse),
            (StockExchangeMarket::OverTheCounter, otc),
        ]
        .into_iter()
        .map(|(market, table)| {
            let outcome = statement::process_tables(vec![form.clone(), table], StatementType::Income, market, None);
            (market, outcome)
        })
        .collect();

        let period = concat(StatementType::Income, outcomes);
        let ytd = metrics::collect_core(2024, Quarter::Q1, &[(StatementType::Income, period.table)], Some(Sector::Ci));

        assert_eq!(ytd.len(), 2);
        assert_eq!(ytd[0].code, "1101");
        assert_eq!(ytd[1].code, "3105");
        assert_eq!(ytd[1].get(CoreField::OprRevenue), Some(rust_decimal_macros::dec!(50)));
        assert_eq!(ytd[0].get(CoreField::NetIncome), Some(rust_decimal_macros::dec!(12)));
    }

    #[tokio::test]
    #[ignore]
    async fn test_fetch() {
        dotenv::dotenv().ok();

        match fetch(StatementType::Balance, 2024, Quarter::Q1, None).await {
            Ok(outcomes) => {
                let all = concat(StatementType::Balance, outcomes);
                println!("rows:{} warnings:{:#?}", all.table.len(), all.warnings);
            }
            Err(why) => println!("Failed to fetch because {:?}", why),
        }
    }
}
