use crate::{
    error::SchemaError,
    statement::table::{Cell, RawStatementTable},
    util::text,
};

/// 將營益分析的回應整理成與其他報表相同的表格排列
///
/// 營益分析只有一個資料表，表頭不在 `<th>` 而是穿插在資料列之間重複出現。
/// 以第一列作為表頭並移除所有重複的表頭列，回傳
/// `[空的查詢表單, 資料表]`，與其他報表「第 0 個表格不含資料」的慣例一致。
///
/// 儲存格需為尚未轉換數值的文字。
pub fn reshape(tables: Vec<RawStatementTable>) -> Result<Vec<RawStatementTable>, SchemaError> {
    let first = tables
        .into_iter()
        .next()
        .ok_or(SchemaError::MissingHeaders { table_index: 0 })?;
    let (_, rows) = first.into_parts();

    let mut rows = rows.into_iter();
    let header_row = rows.next().ok_or(SchemaError::MissingHeaders { table_index: 0 })?;
    let headers: Vec<String> = header_row
        .iter()
        .map(|c| text::normalize_header(&c.to_string()))
        .collect();

    let first_label = header_row.first().cloned().unwrap_or_default();
    let body = rows
        .filter(|row| row.first() != Some(&first_label))
        .collect::<Vec<Vec<Cell>>>();

    Ok(vec![
        RawStatementTable::default(),
        RawStatementTable::new(headers, body)?,
    ])
}
