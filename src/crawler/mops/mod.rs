use std::{collections::HashMap, time::Duration};

use anyhow::{anyhow, Result};
use rand::Rng;

use crate::{
    config::SETTINGS,
    declare::{Quarter, StatementType, StockExchangeMarket},
    revenue::{import, record::MonthlyRevenue},
    statement::{ratio, table::RawStatementTable},
    util::{self, datetime},
};

/// HTML 表格解析
pub mod html;

/// 查無資料時網頁上的訊息
const NO_DATA: &str = "查詢無資料";

/// 彙總報表網址
fn statement_url(statement: StatementType) -> String {
    format!(
        "https://{host}/mops/web/ajax_t163sb{id}",
        host = SETTINGS.mops.host,
        id = statement.report_id()
    )
}

/// 月營收 CSV 網址
fn revenue_url(market: StockExchangeMarket, year: i32, month: u32) -> String {
    format!(
        "https://{host}/nas/t21/{typek}/t21sc03_{roc}_{month}.csv",
        host = SETTINGS.mops.host,
        typek = market.typek(),
        roc = datetime::gregorian_year_to_roc_year(year),
        month = month
    )
}

/// 彙總報表查詢參數
fn statement_params(
    market: StockExchangeMarket,
    year: i32,
    quarter: Quarter,
) -> HashMap<&'static str, String> {
    let mut params = HashMap::with_capacity(7);
    params.insert("encodeURIComponent", "1".to_string());
    params.insert("step", "1".to_string());
    params.insert("firstin", "1".to_string());
    params.insert("off", "1".to_string());
    params.insert("isQuery", "Y".to_string());
    params.insert("TYPEK", market.typek().to_string());
    params.insert(
        "year",
        datetime::gregorian_year_to_roc_year(year).to_string(),
    );
    params.insert("season", format!("0{}", quarter.serial()));
    params
}

/// 下載某一市場、某一季的彙總報表，回傳網頁中依序出現的表格
///
/// 營益分析會先整理成與其他報表相同的排列，所有儲存格都已轉換數值。
pub async fn visit(
    statement: StatementType,
    market: StockExchangeMarket,
    year: i32,
    quarter: Quarter,
) -> Result<Vec<RawStatementTable>> {
    datetime::validate_report_year(year, SETTINGS.mops.start_year)?;

    let url = statement_url(statement);
    let params = statement_params(market, year, quarter);

    tracing::info!(
        statement = %statement,
        market = %market,
        year,
        quarter = %quarter,
        "downloading {}",
        statement.name()
    );

    let response = util::http::post_form(&url, &params).await?;

    parse_response(&response, statement).map_err(|why| {
        anyhow!(
            "Failed to parse {} of {} {}Q{} because {:?}",
            statement,
            market,
            year,
            quarter.serial(),
            why
        )
    })
}

/// 解析彙總報表網頁
pub fn parse_response(response: &str, statement: StatementType) -> Result<Vec<RawStatementTable>> {
    if response.trim().is_empty() || response.contains(NO_DATA) {
        return Err(anyhow!("No data found"));
    }

    let tables = html::parse_tables(response)?;

    match tables.len() {
        0 => return Err(anyhow!("Data not available")),
        n if n < 2 => {
            return Err(anyhow!("Unexpected number of tables inside html, {} < 2", n));
        }
        _ => {}
    }

    let tables = match statement {
        StatementType::Ratio => ratio::reshape(tables)?,
        _ => tables,
    };

    Ok(tables.into_iter().map(RawStatementTable::parse_numbers).collect())
}

/// 下載某一市場某月的月營收
pub async fn visit_revenue(
    market: StockExchangeMarket,
    year: i32,
    month: u32,
) -> Result<Vec<MonthlyRevenue>> {
    datetime::validate_month(month)?;

    let url = revenue_url(market, year, month);
    let data = util::http::get(&url).await?;

    import::parse_revenue_csv(&data, year, month)
}

/// 兩次請求之間隨機暫停，避免被公開資訊觀測站封鎖
pub async fn random_pause() {
    let min = SETTINGS.mops.min_delay_secs;
    let max = SETTINGS.mops.max_delay_secs.max(min);
    let secs = rand::rng().random_range(min..=max);

    tracing::debug!(secs, "pause before next request");
    tokio::time::sleep(Duration::from_secs(secs)).await;
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_request_parameters() {
        let params = statement_params(StockExchangeMarket::OverTheCounter, 2024, Quarter::Q3);
        assert_eq!(params["TYPEK"], "otc");
        assert_eq!(params["year"], "113");
        assert_eq!(params["season"], "03");
        assert_eq!(params["firstin"], "1");

        assert!(statement_url(StatementType::CashFlow).ends_with("/mops/web/ajax_t163sb20"));
        assert!(revenue_url(StockExchangeMarket::Listed, 2024, 1).ends_with("/nas/t21/sii/t21sc03_113_1.csv"));
    }

    #[test]
    fn test_parse_response_no_data() {
        assert!(parse_response("", StatementType::Income).is_err());
        assert!(parse_response("<html><body>查詢無資料</body></html>", StatementType::Income).is_err());
        assert!(parse_response("<table><tr><td>x</td></tr></table>", StatementType::Income).is_err());
    }

    #[test]
    fn test_parse_ratio_response() {
        let page = r#"
<table>
  <tr><td>公司代號</td><td>公司名稱</td><td>營業收入<br>(百萬元)</td></tr>
  <tr><td>1101</td><td>台泥</td><td>105,588.49</td></tr>
  <tr><td>公司代號</td><td>公司名稱</td><td>營業收入<br>(百萬元)</td></tr>
  <tr><td>1219</td><td>福壽</td><td>10,559.02</td></tr>
</table>
<table><tr><td>合計：共 2 家</td></tr></table>"#;

        let tables = parse_response(page, StatementType::Ratio).unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[1].headers(), &["公司代號", "公司名稱", "營業收入 (百萬元)"]);
        assert_eq!(tables[1].len(), 2);
    }

    #[tokio::test]
    #[ignore]
    async fn test_visit() {
        dotenv::dotenv().ok();

        match visit(StatementType::Income, StockExchangeMarket::Listed, 2024, Quarter::Q1).await {
            Ok(tables) => {
                for table in tables {
                    println!("{:?} rows:{}", table.headers(), table.len());
                }
            }
            Err(why) => println!("Failed to visit because {:?}", why),
        }
    }

    #[tokio::test]
    #[ignore]
    async fn test_visit_revenue() {
        dotenv::dotenv().ok();

        match visit_revenue(StockExchangeMarket::Listed, 2024, 1).await {
            Ok(list) => println!("revenues:{}", list.len()),
            Err(why) => println!("Failed to visit_revenue because {:?}", why),
        }
    }
}
