use std::fmt;

use anyhow::{anyhow, Result};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::{Serialize, Serializer};

use crate::{declare::Sector, error::SchemaError, util::text};

/// 合併後用來標記產業別的欄位
pub const SECTOR_COLUMN: &str = "Sector";
/// 公司代號
pub const CODE_COLUMN: &str = "Code";
/// 公司名稱
pub const NAME_COLUMN: &str = "Name";
/// 內容必須保留原始文字的欄位 (股票代號可能有前導 0)
pub const IDENTITY_HEADERS: [&str; 3] = ["公司代號", "公司 代號", "公司名稱"];

static MISSING: Cell = Cell::Missing;

/// 表格中的一個儲存格
///
/// `Missing` 與 `Number(0)` 是不同的值：0 是有效的財務數字，
/// `Missing` 代表該欄位對這家公司不適用或沒有資料。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Missing,
    Text(String),
    Number(Decimal),
}

impl Cell {
    /// 將網頁或 CSV 上的原始文字轉成儲存格
    ///
    /// 空字串與 "--" 視為沒有資料。
    pub fn parse(raw: &str) -> Cell {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == "--" {
            return Cell::Missing;
        }

        match text::parse_decimal(trimmed, None) {
            Ok(d) => Cell::Number(d),
            Err(_) => Cell::Text(trimmed.to_string()),
        }
    }

    pub fn text(s: impl Into<String>) -> Cell {
        Cell::Text(s.into())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Cell::Number(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Missing => Ok(()),
            Cell::Text(s) => write!(f, "{}", s),
            Cell::Number(d) => write!(f, "{}", d),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Missing => serializer.serialize_none(),
            Cell::Text(s) => serializer.serialize_str(s),
            Cell::Number(d) => match d.to_f64() {
                Some(v) => serializer.serialize_f64(v),
                None => serializer.serialize_str(&d.to_string()),
            },
        }
    }
}

/// 從網頁解析出的原始報表，表頭保留來源的欄位名稱
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawStatementTable {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl RawStatementTable {
    /// 建立表格，每一列的欄位數必須與表頭一致
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self, SchemaError> {
        if let Some((row, cells)) = rows
            .iter()
            .enumerate()
            .find(|(_, cells)| cells.len() != headers.len())
        {
            return Err(SchemaError::RaggedRow {
                row,
                expected: headers.len(),
                found: cells.len(),
            });
        }

        Ok(RawStatementTable { headers, rows })
    }

    /// 以文字建立表格，再經 [`RawStatementTable::parse_numbers`] 轉換數值
    pub fn from_text<H, R>(headers: &[H], rows: &[R]) -> Result<Self, SchemaError>
    where
        H: AsRef<str>,
        R: AsRef<[&'static str]>,
    {
        let headers = headers.iter().map(|h| h.as_ref().to_string()).collect();
        let rows = rows
            .iter()
            .map(|r| r.as_ref().iter().map(|c| Cell::text(*c)).collect())
            .collect();

        RawStatementTable::new(headers, rows).map(RawStatementTable::parse_numbers)
    }

    /// 將文字儲存格轉成數值
    ///
    /// 公司代號與公司名稱欄位保留文字，其餘欄位依 [`Cell::parse`] 轉換。
    pub fn parse_numbers(mut self) -> Self {
        let identity: Vec<bool> = self
            .headers
            .iter()
            .map(|h| IDENTITY_HEADERS.contains(&h.as_str()))
            .collect();

        for row in &mut self.rows {
            for (cell, is_identity) in row.iter_mut().zip(&identity) {
                if let Cell::Text(raw) = cell {
                    let parsed = match (*is_identity, raw.trim()) {
                        (_, "") => Cell::Missing,
                        (true, trimmed) => Cell::text(trimmed),
                        (false, trimmed) => Cell::parse(trimmed),
                    };
                    *cell = parsed;
                }
            }
        }

        self
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains_header(&self, label: &str) -> bool {
        self.headers.iter().any(|h| h == label)
    }

    /// 表頭是否存在
    ///
    /// 沒有表頭、全部空白，或只是 0, 1, 2... 的位置索引都視為沒有表頭。
    pub fn has_headers(&self) -> bool {
        if self.headers.is_empty() || self.headers.iter().all(|h| h.trim().is_empty()) {
            return false;
        }

        !self
            .headers
            .iter()
            .enumerate()
            .all(|(i, h)| h.trim() == i.to_string())
    }

    pub(crate) fn into_parts(self) -> (Vec<String>, Vec<Vec<Cell>>) {
        (self.headers, self.rows)
    }
}

/// 欄位名稱已統一的報表
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CanonicalTable {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl CanonicalTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self, SchemaError> {
        RawStatementTable::new(columns, rows).map(CanonicalTable::from)
    }

    /// 呼叫端需確保每一列的長度與欄位數一致
    pub(crate) fn from_parts(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        CanonicalTable { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// 取得指定列與欄位的值，欄位不存在時回傳 `Cell::Missing`
    pub fn get(&self, row: usize, column: &str) -> &Cell {
        self.column_index(column)
            .and_then(|i| self.rows.get(row).and_then(|r| r.get(i)))
            .unwrap_or(&MISSING)
    }

    /// 取得指定列的產業別標記
    pub fn sector_of(&self, row: usize) -> Option<Sector> {
        self.get(row, SECTOR_COLUMN)
            .as_str()
            .and_then(|s| s.parse::<Sector>().ok())
    }

    /// 只保留指定產業別的資料列
    pub fn rows_for_sector(&self, sector: Sector) -> CanonicalTable {
        let rows = (0..self.rows.len())
            .filter(|&i| self.sector_of(i) == Some(sector))
            .map(|i| self.rows[i].clone())
            .collect();

        CanonicalTable {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// 移除所有資料列都沒有值的欄位
    pub fn without_empty_columns(&self) -> CanonicalTable {
        let keep: Vec<usize> = (0..self.columns.len())
            .filter(|&i| self.rows.iter().any(|r| !r[i].is_missing()))
            .collect();

        CanonicalTable {
            columns: keep.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|r| keep.iter().map(|&i| r[i].clone()).collect())
                .collect(),
        }
    }

    /// 移除指定欄位
    pub fn without_column(&self, column: &str) -> CanonicalTable {
        match self.column_index(column) {
            None => self.clone(),
            Some(index) => CanonicalTable {
                columns: self
                    .columns
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != index)
                    .map(|(_, c)| c.clone())
                    .collect(),
                rows: self
                    .rows
                    .iter()
                    .map(|r| {
                        r.iter()
                            .enumerate()
                            .filter(|(i, _)| *i != index)
                            .map(|(_, c)| c.clone())
                            .collect()
                    })
                    .collect(),
            },
        }
    }

    /// 輸出成 CSV，沒有資料的欄位輸出空字串
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::with_capacity(self.rows.len() * 256));
        writer.write_record(&self.columns)?;

        for row in &self.rows {
            writer.write_record(row.iter().map(|c| c.to_string()))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|why| anyhow!("Failed to flush csv writer because {:?}", why))?;

        String::from_utf8(bytes).map_err(|why| anyhow!("Failed to build csv text because {:?}", why))
    }

    /// 每一列轉成 JSON 物件，沒有資料的欄位輸出 null
    pub fn to_json_rows(&self) -> Vec<serde_json::Value> {
        self.rows
            .iter()
            .map(|row| {
                let object = self
                    .columns
                    .iter()
                    .zip(row.iter())
                    .map(|(column, cell)| {
                        (
                            column.clone(),
                            serde_json::to_value(cell).unwrap_or(serde_json::Value::Null),
                        )
                    })
                    .collect::<serde_json::Map<_, _>>();
                serde_json::Value::Object(object)
            })
            .collect()
    }
}

impl From<RawStatementTable> for CanonicalTable {
    fn from(table: RawStatementTable) -> Self {
        let (columns, rows) = table.into_parts();
        CanonicalTable { columns, rows }
    }
}
