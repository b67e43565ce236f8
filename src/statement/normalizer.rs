use std::{collections::HashSet, str::FromStr};

use crate::{
    declare::{StatementType, StockExchangeMarket},
    error::{TableContext, Warning},
    statement::{
        rename::{self, ColumnRenameTable},
        table::{CanonicalTable, Cell, RawStatementTable},
    },
};

/// 欄位統一後的結果
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Normalized {
    pub table: CanonicalTable,
    /// 對照表中找不到的原始欄位，原樣保留在輸出表格的最後
    pub unknown_columns: Vec<String>,
    pub warnings: Vec<Warning>,
}

/// 將原始欄位名稱改為統一名稱，移除不再使用的欄位並依統一順序排列
///
/// 對照表中沒有的欄位不會被丟棄，而是放在已知欄位之後並回報警告。
/// 儲存格內容不做任何轉換。`context.statement` 決定使用哪一份對照表。
pub fn normalize(table: RawStatementTable, context: TableContext) -> Normalized {
    let rename_table = rename::table_for(context.statement);
    let (headers, rows) = table.into_parts();

    let mut warnings = Vec::new();
    let mut unknown_columns = Vec::new();
    let mut seen: HashSet<String> = HashSet::with_capacity(headers.len());
    // (排序鍵, 原始位置, 統一名稱)
    let mut keep: Vec<((usize, usize), usize, String)> = Vec::with_capacity(headers.len());

    for (index, header) in headers.iter().enumerate() {
        let (column, known) = match rename_table.canonical(header) {
            Some(canonical) => (canonical.to_string(), true),
            None => (header.clone(), false),
        };

        if known && rename_table.is_dropped(&column) {
            continue;
        }

        if !seen.insert(column.clone()) {
            report(&mut warnings, context, Warning::DuplicateColumn { column, context });
            continue;
        }

        if !known {
            unknown_columns.push(column.clone());
            report(
                &mut warnings,
                context,
                Warning::UnknownColumn {
                    column: column.clone(),
                    context,
                },
            );
        }

        keep.push((sort_key(rename_table, &column, index), index, column));
    }

    keep.sort_by_key(|(key, _, _)| *key);

    let columns = keep.iter().map(|(_, _, c)| c.clone()).collect();
    let rows = rows
        .into_iter()
        .map(|row| pick(row, keep.iter().map(|(_, i, _)| *i)))
        .collect();

    Normalized {
        table: CanonicalTable::from_parts(columns, rows),
        unknown_columns,
        warnings,
    }
}

/// 以報表名稱 (income / balance / cash / ratio) 統一欄位
///
/// 無法辨識的報表名稱會原樣回傳表格並附帶警告。
pub fn normalize_named(
    table: RawStatementTable,
    statement: &str,
    market: StockExchangeMarket,
    table_index: usize,
    table_count: usize,
) -> Normalized {
    match StatementType::from_str(statement) {
        Ok(statement) => normalize(
            table,
            TableContext::new(market, statement, table_index, table_count),
        ),
        Err(_) => {
            tracing::warn!(
                market = %market,
                statement,
                table_index,
                table_count,
                "statement not found in the rename tables"
            );
            Normalized {
                table: CanonicalTable::from(table),
                unknown_columns: Vec::new(),
                warnings: vec![Warning::UnknownStatement {
                    statement: statement.to_string(),
                }],
            }
        }
    }
}

fn report(warnings: &mut Vec<Warning>, context: TableContext, warning: Warning) {
    tracing::warn!(
        market = %context.market,
        statement = %context.statement,
        table_index = context.table_index,
        table_count = context.table_count,
        "{}",
        warning
    );
    warnings.push(warning);
}

/// 已知欄位依統一順序，未知欄位排在最後並維持原本順序
fn sort_key(rename_table: &ColumnRenameTable, column: &str, index: usize) -> (usize, usize) {
    match rename_table.position(column) {
        Some(position) => (position, 0),
        None => (usize::MAX, index),
    }
}

fn pick(row: Vec<Cell>, indices: impl Iterator<Item = usize>) -> Vec<Cell> {
    let mut row: Vec<Option<Cell>> = row.into_iter().map(Some).collect();
    indices
        .map(|i| row.get_mut(i).and_then(Option::take).unwrap_or_default())
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::statement::table::{CODE_COLUMN, NAME_COLUMN};

    fn raw(headers: &[&str], rows: Vec<Vec<Cell>>) -> RawStatementTable {
        RawStatementTable::new(headers.iter().map(|h| h.to_string()).collect(), rows).unwrap()
    }

    fn context(statement: StatementType) -> TableContext {
        TableContext::new(StockExchangeMarket::Listed, statement, 1, 7)
    }

    #[test]
    fn test_rename_drop_and_reorder() {
        let table = raw(
            &["公司名稱", "公司代號", "負債及權益總計", "資產合計", "流動資產"],
            vec![vec![
                Cell::text("台泥"),
                Cell::text("1101"),
                Cell::Number(dec!(300)),
                Cell::Number(dec!(300)),
                Cell::Number(dec!(100)),
            ]],
        );

        let normalized = normalize(table, context(StatementType::Balance));
        assert_eq!(normalized.table.columns(), &[CODE_COLUMN, NAME_COLUMN, "流動資產", "資產總計"]);
        assert_eq!(
            normalized.table.rows()[0],
            vec![
                Cell::text("1101"),
                Cell::text("台泥"),
                Cell::Number(dec!(100)),
                Cell::Number(dec!(300)),
            ]
        );
        assert!(normalized.warnings.is_empty());
    }

    #[test]
    fn test_unknown_column_is_kept_last() {
        let table = raw(
            &["公司代號", "新科目", "營業收入"],
            vec![vec![Cell::text("2330"), Cell::Number(dec!(1)), Cell::Number(dec!(2))]],
        );

        let normalized = normalize(table, context(StatementType::Income));
        assert_eq!(normalized.table.columns(), &[CODE_COLUMN, "營業收入", "新科目"]);
        assert_eq!(normalized.unknown_columns, vec!["新科目".to_string()]);
        assert_eq!(
            normalized.warnings,
            vec![Warning::UnknownColumn {
                column: "新科目".to_string(),
                context: context(StatementType::Income),
            }]
        );
    }

    #[test]
    fn test_duplicate_canonical_keeps_first() {
        let table = raw(
            &["公司代號", "營業利益", "營業利益（損失）"],
            vec![vec![Cell::text("2330"), Cell::Number(dec!(1)), Cell::Number(dec!(2))]],
        );

        let normalized = normalize(table, context(StatementType::Income));
        assert_eq!(normalized.table.columns(), &[CODE_COLUMN, "營業利益"]);
        assert_eq!(normalized.table.rows()[0][1], Cell::Number(dec!(1)));
        assert_eq!(
            normalized.warnings,
            vec![Warning::DuplicateColumn {
                column: "營業利益".to_string(),
                context: context(StatementType::Income),
            }]
        );
    }

    #[test]
    fn test_unknown_statement_passes_through() {
        let table = raw(&["公司代號", "X"], vec![vec![Cell::text("1101"), Cell::Missing]]);
        let normalized = normalize_named(table.clone(), "equity", StockExchangeMarket::Listed, 1, 7);

        assert_eq!(normalized.table, CanonicalTable::from(table));
        assert_eq!(
            normalized.warnings,
            vec![Warning::UnknownStatement {
                statement: "equity".to_string()
            }]
        );
    }

    #[test]
    fn test_named_statement_carries_context() {
        let table = raw(&["公司代號", "新科目"], vec![vec![Cell::text("6488"), Cell::Missing]]);
        let normalized = normalize_named(table, "cash", StockExchangeMarket::OverTheCounter, 2, 3);

        assert_eq!(
            normalized.warnings,
            vec![Warning::UnknownColumn {
                column: "新科目".to_string(),
                context: TableContext::new(StockExchangeMarket::OverTheCounter, StatementType::CashFlow, 2, 3),
            }]
        );
    }

    #[test]
    fn test_historical_spellings_share_one_schema() {
        let old = raw(
            &["公司代號", "公司名稱", "所得稅（費用）利益", "本期稅後淨利（淨損）", "基本每股盈餘（元）"],
            vec![],
        );
        let new = raw(
            &["公司代號", "公司名稱", "本期淨利（淨損）", "所得稅費用（利益）", "基本每股盈餘（元）"],
            vec![],
        );

        let old = normalize(old, context(StatementType::Income));
        let new = normalize(new, context(StatementType::Income));
        assert_eq!(old.table.columns(), new.table.columns());
    }

    fn income_labels() -> Vec<&'static str> {
        vec![
            "公司代號",
            "公司名稱",
            "營業收入",
            "收益",
            "利息淨收益",
            "淨收益",
            "營業成本",
            "營業毛利（毛損）",
            "營業利益（損失）",
            "稅前淨利（淨損）",
            "所得稅費用（利益）",
            "本期淨利（淨損）",
            "本期稅後淨利（淨損）",
            "基本每股盈餘（元）",
        ]
    }

    fn any_statement() -> impl Strategy<Value = StatementType> {
        prop_oneof![
            Just(StatementType::Income),
            Just(StatementType::Balance),
            Just(StatementType::CashFlow),
            Just(StatementType::Ratio),
        ]
    }

    proptest! {
        #[test]
        fn prop_any_spelling_gives_one_schema(
            statement in any_statement(),
            choices in proptest::collection::vec(any::<usize>(), 1..32),
        ) {
            let rename_table = rename::table_for(statement);
            let headers: Vec<&str> = rename_table
                .sequence()
                .iter()
                .enumerate()
                .map(|(i, canonical)| {
                    let spellings = rename_table.spellings(canonical);
                    spellings[choices[i % choices.len()] % spellings.len()]
                })
                .collect();

            let normalized = normalize(raw(&headers, vec![]), context(statement));
            let columns: Vec<&str> = normalized.table.columns().iter().map(String::as_str).collect();

            prop_assert_eq!(columns.as_slice(), rename_table.sequence());
            prop_assert!(normalized.warnings.is_empty());
        }

        #[test]
        fn prop_output_follows_canonical_order(
            picks in Just(income_labels()).prop_shuffle().prop_flat_map(|v| {
                let len = v.len();
                proptest::sample::subsequence(v, 0..=len)
            })
        ) {
            let table = raw(&picks, vec![]);
            let normalized = normalize(table, context(StatementType::Income));
            let rename_table = rename::table_for(StatementType::Income);

            let positions: Vec<usize> = normalized
                .table
                .columns()
                .iter()
                .map(|c| rename_table.position(c).unwrap())
                .collect();
            prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(normalized.unknown_columns.is_empty());
        }
    }
}
