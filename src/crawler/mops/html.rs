use anyhow::{anyhow, Result};
use scraper::{ElementRef, Html, Selector};

use crate::{
    statement::table::{Cell, RawStatementTable},
    util::text,
};

/// 解析網頁中所有的 `<table>`，依出現順序回傳
///
/// 第一個全部是 `<th>` 的列作為表頭，之後重複出現的表頭列會被略過；
/// 沒有表頭的表格以 0, 1, 2... 作為欄位名稱。儲存格保留文字，
/// 數值轉換交給 [`RawStatementTable::parse_numbers`]。
pub fn parse_tables(html: &str) -> Result<Vec<RawStatementTable>> {
    let document = Html::parse_document(html);
    let selector_table =
        Selector::parse("table").map_err(|_| anyhow!("Failed to parse table selector"))?;
    let selector_tr = Selector::parse("tr").map_err(|_| anyhow!("Failed to parse tr selector"))?;

    let mut result = Vec::new();

    for table in document.select(&selector_table) {
        let mut headers: Option<Vec<String>> = None;
        let mut rows: Vec<Vec<String>> = Vec::new();

        for tr in table.select(&selector_tr).filter(|tr| is_owned_by(tr, &table)) {
            let cells: Vec<(bool, String)> = tr
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|e| matches!(e.value().name(), "th" | "td"))
                .map(|e| (e.value().name() == "th", cell_text(&e)))
                .collect();

            if cells.is_empty() {
                continue;
            }

            let is_header = cells.iter().all(|(th, _)| *th);
            let texts: Vec<String> = cells.into_iter().map(|(_, t)| t).collect();

            if is_header && headers.is_none() {
                headers = Some(texts);
                continue;
            }

            if is_header && headers.as_ref() == Some(&texts) {
                continue;
            }

            rows.push(texts);
        }

        result.push(build_table(headers, rows));
    }

    Ok(result)
}

fn build_table(headers: Option<Vec<String>>, rows: Vec<Vec<String>>) -> RawStatementTable {
    let row_width = rows.iter().map(Vec::len).max().unwrap_or(0);

    let headers: Vec<String> = match headers {
        Some(headers) => {
            let named = headers.len();
            let mut headers: Vec<String> = headers
                .into_iter()
                .enumerate()
                .map(|(i, h)| if h.is_empty() { unnamed(i) } else { h })
                .collect();

            // 資料列比表頭寬時補上欄位名稱，多出來的資料不丟棄
            if row_width > named {
                tracing::warn!(expected = named, found = row_width, "row wider than header, columns added");
                headers.extend((named..row_width).map(unnamed));
            }

            headers
        }
        None => (0..row_width).map(|i| i.to_string()).collect(),
    };

    let width = headers.len();
    let rows: Vec<Vec<Cell>> = rows
        .into_iter()
        .map(|mut row| {
            row.resize(width, String::new());
            row.into_iter().map(Cell::Text).collect()
        })
        .collect();

    // 每列都已補齊成表頭的寬度
    RawStatementTable::new(headers, rows).unwrap_or_default()
}

fn unnamed(index: usize) -> String {
    format!("Unnamed: {}", index)
}

/// 儲存格內的多段文字以空白串接並收斂空白
fn cell_text(cell: &ElementRef) -> String {
    text::normalize_header(&cell.text().collect::<Vec<_>>().join(" "))
}

/// `tr` 最近一層的 `<table>` 是否為 `table`，巢狀表格的列不算在外層
fn is_owned_by(tr: &ElementRef, table: &ElementRef) -> bool {
    tr.ancestors()
        .find(|n| n.value().as_element().is_some_and(|e| e.name() == "table"))
        .is_some_and(|n| n.id() == table.id())
}
