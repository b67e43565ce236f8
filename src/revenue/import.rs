use anyhow::{anyhow, Result};

use crate::{
    revenue::record::MonthlyRevenue,
    util::{datetime, text},
};

const CODE_HEADERS: [&str; 2] = ["公司代號", "Code"];
const REVENUE_HEADERS: [&str; 2] = ["營業收入-當月營收", "Revenue"];
const NOTE_HEADERS: [&str; 2] = ["備註", "Note"];

/// 解析月營收 CSV
///
/// 支援公開資訊觀測站的 t21sc03 格式 (`公司代號, 公司名稱, 營業收入-當月營收, ..., 備註`)
/// 與本地保存的 `Code, Name, Revenue, Note` 格式。公司代號空白的列會略過，
/// 營收無法解析的列記錄警告後略過。
pub fn parse_revenue_csv(data: &str, year: i32, month: u32) -> Result<Vec<MonthlyRevenue>> {
    datetime::validate_month(month)?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data.trim_start_matches('\u{feff}').as_bytes());

    let headers = reader
        .headers()
        .map_err(|why| anyhow!("Failed to read revenue csv headers because {:?}", why))?
        .clone();
    let find = |candidates: &[&str]| headers.iter().position(|h| candidates.contains(&h));

    let code_index = find(&CODE_HEADERS)
        .ok_or_else(|| anyhow!("Failed to find the stock code column in {:?}", headers))?;
    let revenue_index = find(&REVENUE_HEADERS)
        .ok_or_else(|| anyhow!("Failed to find the revenue column in {:?}", headers))?;
    let note_index = find(&NOTE_HEADERS);

    let mut result = Vec::with_capacity(1024);

    for record in reader.records() {
        let record = record.map_err(|why| anyhow!("Failed to read revenue csv because {:?}", why))?;

        let code = record.get(code_index).unwrap_or_default();
        if code.is_empty() {
            continue;
        }

        let raw_revenue = record.get(revenue_index).unwrap_or_default();
        let revenue = match text::parse_decimal(raw_revenue, None) {
            Ok(revenue) => revenue,
            Err(why) => {
                tracing::warn!(code, year, month, "Failed to parse revenue because {:?}", why);
                continue;
            }
        };

        let mut entity = MonthlyRevenue::new(code, year, month, revenue);
        entity.note = note_index
            .and_then(|i| record.get(i))
            .filter(|note| !note.is_empty() && *note != "-")
            .map(str::to_string);

        result.push(entity);
    }

    Ok(result)
}
