use std::collections::HashSet;

use crate::{
    declare::{Sector, StatementType, StockExchangeMarket},
    error::{TableContext, Warning},
    statement::table::{CanonicalTable, RawStatementTable},
};

/// 產業別判斷
pub mod classifier;
/// 多表格合併
pub mod merger;
/// 季報衍生指標
pub mod metrics;
/// 欄位統一
pub mod normalizer;
/// 營益分析表格整理
pub mod ratio;
/// 欄位名稱對照表
pub mod rename;
/// 產業別判斷規則
pub mod signature;
/// 表格資料結構
pub mod table;

/// 一份報表回應處理後的結果
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatementOutcome {
    pub table: CanonicalTable,
    pub warnings: Vec<Warning>,
}

/// 處理同一個回應中的所有表格：逐一判斷產業別、統一欄位後合併
///
/// `tables` 為回應中依序出現的表格，第 0 個是查詢表單不含資料。
/// 結構不合法的表格會被略過並記錄警告，不影響其他表格。
pub fn process_tables(
    tables: Vec<RawStatementTable>,
    statement: StatementType,
    market: StockExchangeMarket,
    requested: Option<&HashSet<Sector>>,
) -> StatementOutcome {
    let table_count = tables.len();
    let mut warnings = Vec::new();
    let mut sector_tables = Vec::with_capacity(table_count);

    for (table_index, table) in tables.into_iter().enumerate().skip(1) {
        let classification =
            match classifier::classify(&table, statement, market, table_index, table_count) {
                Ok(classification) => classification,
                Err(why) => {
                    tracing::warn!(
                        market = %market,
                        statement = %statement,
                        table_index,
                        table_count,
                        "Failed to classify table because {}",
                        why
                    );
                    warnings.push(Warning::SkippedTable {
                        table_index,
                        error: why,
                    });
                    continue;
                }
            };

        warnings.extend(classification.warning);

        let context = TableContext::new(market, statement, table_index, table_count);
        let normalized = normalizer::normalize(table, context);
        warnings.extend(normalized.warnings);
        sector_tables.push((classification.sector, normalized.table));
    }

    let table = merger::merge(statement, sector_tables, requested);

    tracing::info!(
        market = %market,
        statement = %statement,
        rows = table.len(),
        warnings = warnings.len(),
        "statement tables processed"
    );

    StatementOutcome { table, warnings }
}
