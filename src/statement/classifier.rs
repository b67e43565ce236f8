use crate::{
    declare::{Sector, StatementType, StockExchangeMarket},
    error::{SchemaError, TableContext, Warning},
    statement::{signature, table::RawStatementTable},
};

/// 產業別判斷結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub sector: Sector,
    /// 無法確定產業別時附帶的警告，需人工確認
    pub warning: Option<Warning>,
}

impl Classification {
    fn resolved(sector: Sector) -> Self {
        Classification {
            sector,
            warning: None,
        }
    }
}

/// 判斷一張報表屬於哪個產業別的格式
///
/// 依序比對：
/// 1. 唯一欄位規則，第一條符合的規則決定產業別
/// 2. 含有共用格式的標記欄位時，資料筆數夠多即為一般業，否則依市場與表格位置查表
/// 3. 仍無法判斷時回傳共用格式的備援標記或 `unresolved`，並附帶警告
///
/// 不含標記欄位的表格一律為 `unresolved`。
///
/// 只有表頭不存在時才會回傳錯誤。
pub fn classify(
    table: &RawStatementTable,
    statement: StatementType,
    market: StockExchangeMarket,
    table_index: usize,
    table_count: usize,
) -> Result<Classification, SchemaError> {
    if !table.has_headers() {
        return Err(SchemaError::MissingHeaders { table_index });
    }

    let rules = signature::rules_for(statement);

    if let Some(rule) = rules.unique.iter().find(|r| table.contains_header(r.label)) {
        return Ok(Classification::resolved(rule.sector));
    }

    let context = TableContext::new(market, statement, table_index, table_count);

    let warning = match rules.shared.filter(|shared| shared.matches(table)) {
        Some(shared) => {
            if table.len() >= shared.min_rows_for_general {
                return Ok(Classification::resolved(Sector::Ci));
            }

            if let Some(sector) = shared.lookup(market, table_count, table_index) {
                return Ok(Classification::resolved(sector));
            }

            match shared.fallback {
                Sector::Unresolved => Warning::UnresolvedSector {
                    sector: Sector::Unresolved,
                    context,
                },
                sector => Warning::ClassificationAmbiguity { sector, context },
            }
        }
        None => Warning::UnresolvedSector {
            sector: Sector::Unresolved,
            context,
        },
    };

    let sector = match &warning {
        Warning::ClassificationAmbiguity { sector, .. } | Warning::UnresolvedSector { sector, .. } => *sector,
        _ => Sector::Unresolved,
    };

    tracing::warn!(
        market = %market,
        statement = %statement,
        table_index,
        table_count,
        rows = table.len(),
        "{}",
        warning
    );

    Ok(Classification {
        sector,
        warning: Some(warning),
    })
}
