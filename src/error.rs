//! 財報正規化流程的錯誤與警告。
//!
//! [`SchemaError`] 代表表格結構不合法，只會中止該表格的處理；
//! [`Warning`] 則是不中斷流程的訊號，會隨結果一併回傳並寫入日誌。

use thiserror::Error;

use crate::declare::{Sector, StatementType, StockExchangeMarket};

/// 表格結構錯誤
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// 缺少表頭，或表頭只是位置索引 (0, 1, 2...)
    #[error("table {table_index} has no column headers")]
    MissingHeaders { table_index: usize },
    /// 資料列的欄位數與表頭不符
    #[error("row {row} has {found} cells but the header has {expected} columns")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// 表格在回應中的位置，用來在日誌中指出需要人工判斷的表格
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableContext {
    pub market: StockExchangeMarket,
    pub statement: StatementType,
    /// 表格在回應中的位置 (第 0 個為查詢表單)
    pub table_index: usize,
    /// 回應中的表格總數
    pub table_count: usize,
}

impl TableContext {
    pub fn new(
        market: StockExchangeMarket,
        statement: StatementType,
        table_index: usize,
        table_count: usize,
    ) -> Self {
        TableContext {
            market,
            statement,
            table_index,
            table_count,
        }
    }
}

/// 不中斷流程的警告
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Warning {
    #[error(
        "industry sector is ambiguous, tagged as '{sector}' (market: {}, statement: {}, tbl_num: {}, tbl_index: {})",
        .context.market, .context.statement, .context.table_count, .context.table_index
    )]
    ClassificationAmbiguity { sector: Sector, context: TableContext },
    #[error(
        "unable to decide the industry sector, tagged as '{sector}' (market: {}, statement: {}, tbl_num: {}, tbl_index: {})",
        .context.market, .context.statement, .context.table_count, .context.table_index
    )]
    UnresolvedSector { sector: Sector, context: TableContext },
    #[error(
        "column '{column}' not found in the rename table (market: {}, statement: {}, tbl_num: {}, tbl_index: {})",
        .context.market, .context.statement, .context.table_count, .context.table_index
    )]
    UnknownColumn { column: String, context: TableContext },
    #[error("statement '{statement}' not found in the rename tables")]
    UnknownStatement { statement: String },
    #[error(
        "column '{column}' appears more than once after renaming, later occurrence dropped (market: {}, statement: {}, tbl_num: {}, tbl_index: {})",
        .context.market, .context.statement, .context.table_count, .context.table_index
    )]
    DuplicateColumn { column: String, context: TableContext },
    #[error("table {table_index} skipped: {error}")]
    SkippedTable {
        table_index: usize,
        error: SchemaError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_message_has_context() {
        let warning = Warning::ClassificationAmbiguity {
            sector: Sector::AmbiguousBdCiMim,
            context: TableContext {
                market: StockExchangeMarket::Listed,
                statement: StatementType::Balance,
                table_index: 4,
                table_count: 7,
            },
        };
        let msg = warning.to_string();
        assert!(msg.contains("bd_ci_mim"));
        assert!(msg.contains("market: tse"));
        assert!(msg.contains("tbl_num: 7"));
        assert!(msg.contains("tbl_index: 4"));
    }

    #[test]
    fn test_column_warning_has_context() {
        let warning = Warning::UnknownColumn {
            column: "新科目".to_string(),
            context: TableContext::new(StockExchangeMarket::OverTheCounter, StatementType::Income, 2, 4),
        };
        let msg = warning.to_string();
        assert!(msg.contains("新科目"));
        assert!(msg.contains("market: otc"));
        assert!(msg.contains("statement: income"));
        assert!(msg.contains("tbl_num: 4"));
        assert!(msg.contains("tbl_index: 2"));
    }

    #[test]
    fn test_schema_error_message() {
        let err = SchemaError::MissingHeaders { table_index: 3 };
        assert_eq!(err.to_string(), "table 3 has no column headers");
    }
}
