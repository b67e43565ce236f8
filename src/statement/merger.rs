use std::collections::HashSet;

use crate::{
    declare::{Sector, StatementType},
    statement::{
        rename,
        table::{CanonicalTable, Cell, SECTOR_COLUMN},
    },
};

/// 表格是否要納入合併結果
///
/// 未指定產業別時全部納入；無法判斷 (`unresolved`) 的表格一律納入，
/// 共用格式的表格只要任一可能的產業別被指定就納入。
pub fn is_included(sector: Sector, requested: Option<&HashSet<Sector>>) -> bool {
    let requested = match requested {
        None => return true,
        Some(requested) => requested,
    };

    match sector {
        Sector::Unresolved => true,
        Sector::AmbiguousBdCiMim => sector.candidates().iter().any(|s| requested.contains(s)),
        sector => requested.contains(&sector),
    }
}

/// 合併同一市場、同一期間、同一種報表的各產業別表格
///
/// 每一列加上 `Sector` 欄位記錄產業別標記 (包含共用格式與無法判斷的標記)。
/// 輸出欄位為各表格欄位的聯集並依統一順序排列，表格本身沒有的欄位填入
/// `Cell::Missing`。資料列順序與輸入順序相同。
pub fn merge(
    statement: StatementType,
    tables: Vec<(Sector, CanonicalTable)>,
    requested: Option<&HashSet<Sector>>,
) -> CanonicalTable {
    let included: Vec<(Sector, CanonicalTable)> = tables
        .into_iter()
        .filter(|(sector, table)| {
            let keep = is_included(*sector, requested);
            if !keep {
                tracing::debug!(statement = %statement, sector = %sector, rows = table.len(), "table excluded from merge");
            }
            keep
        })
        .collect();

    let columns = union_columns(statement, included.iter().map(|(_, t)| t));
    let sector_index = columns.len() - 1;

    let rows = included
        .iter()
        .flat_map(|(sector, table)| {
            realign(table, &columns).into_iter().map(move |mut row| {
                row[sector_index] = Cell::text(sector.to_string());
                row
            })
        })
        .collect();

    CanonicalTable::from_parts(columns, rows)
}

/// 依序串接已合併的表格 (例如先上市後上櫃)，欄位取聯集
pub fn concat(statement: StatementType, tables: Vec<CanonicalTable>) -> CanonicalTable {
    let columns = union_columns(statement, tables.iter());
    let rows = tables.iter().flat_map(|t| realign(t, &columns)).collect();

    CanonicalTable::from_parts(columns, rows)
}

/// 欄位聯集：已知欄位依統一順序，未知欄位依出現順序，`Sector` 固定在最後
fn union_columns<'a>(
    statement: StatementType,
    tables: impl Iterator<Item = &'a CanonicalTable>,
) -> Vec<String> {
    let rename_table = rename::table_for(statement);
    let mut seen: HashSet<&str> = HashSet::new();
    let mut known: Vec<(usize, String)> = Vec::new();
    let mut unknown: Vec<String> = Vec::new();

    for column in tables.flat_map(|t| t.columns().iter()) {
        if column == SECTOR_COLUMN || !seen.insert(column.as_str()) {
            continue;
        }

        match rename_table.position(column) {
            Some(position) => known.push((position, column.clone())),
            None => unknown.push(column.clone()),
        }
    }

    known.sort_by_key(|(position, _)| *position);

    known
        .into_iter()
        .map(|(_, c)| c)
        .chain(unknown)
        .chain(std::iter::once(SECTOR_COLUMN.to_string()))
        .collect()
}

fn realign(table: &CanonicalTable, columns: &[String]) -> Vec<Vec<Cell>> {
    let index: Vec<Option<usize>> = columns.iter().map(|c| table.column_index(c)).collect();

    table
        .rows()
        .iter()
        .map(|row| {
            index
                .iter()
                .map(|i| i.and_then(|i| row.get(i).cloned()).unwrap_or_default())
                .collect()
        })
        .collect()
}
