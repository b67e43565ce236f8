use anyhow::{anyhow, Result};
use chrono::{Datelike, NaiveDate};

use crate::declare::Quarter;

/// Convert ROC year to Gregorian year.
pub fn to_gregorian_year(year: i32) -> i32 {
    year + 1911
}

/// Convert Gregorian year to ROC year.
pub fn gregorian_year_to_roc_year(year: i32) -> i32 {
    year - 1911
}

/// 各季財報的可取得區間 (開始月日, 結束月日, 年度減幾年, 季度)
///
/// 申報期限：第一季 5/15 (金控業 5/30)，第二季 8/14 (金融業 8/31)，
/// 第三季 11/14 (金控業 11/29)，年度 3/31。區間提早約一個月開始。
const REPORT_WINDOWS: [((u32, u32), (u32, u32), i32, Quarter); 5] = [
    ((1, 1), (3, 1), 1, Quarter::Q3),
    ((3, 2), (4, 14), 1, Quarter::Q4),
    ((4, 15), (7, 14), 0, Quarter::Q1),
    ((7, 15), (10, 14), 0, Quarter::Q2),
    ((10, 15), (12, 31), 0, Quarter::Q3),
];

/// 取得最近一期可下載的季報年度與季度
pub fn last_report_year_quarter(today: NaiveDate) -> Result<(i32, Quarter)> {
    let year = today.year();
    let md = (today.month(), today.day());

    REPORT_WINDOWS
        .iter()
        .find(|(begin, end, _, _)| *begin <= md && md <= *end)
        .map(|(_, _, dec_year, quarter)| (year - dec_year, *quarter))
        .ok_or_else(|| anyhow!("Can't get the year, quarter for last report on {}", today))
}

/// 取得最近一期月營收的年度與月份 (上個月)
pub fn last_revenue_year_month(today: NaiveDate) -> (i32, u32) {
    if today.month() == 1 {
        (today.year() - 1, 12)
    } else {
        (today.year(), today.month() - 1)
    }
}

/// 檢查季報年度是否在支援範圍內
pub fn validate_report_year(year: i32, start_year: i32) -> Result<()> {
    if year < 1962 {
        return Err(anyhow!("Invalid year '{}', below the start year of TWSE", year));
    }

    if year < start_year {
        return Err(anyhow!(
            "Old HTML format before {} is not supported (year '{}')",
            start_year,
            year
        ));
    }

    Ok(())
}

/// 檢查月份
pub fn validate_month(month: u32) -> Result<()> {
    if !(1..=12).contains(&month) {
        return Err(anyhow!("Invalid month '{}'", month));
    }

    Ok(())
}

/// 從 start 開始到 end (含) 的每一季
pub fn quarters_between(start: (i32, Quarter), end: (i32, Quarter)) -> Vec<(i32, Quarter)> {
    let mut result = Vec::new();
    let mut current = start;

    while (current.0, current.1.serial()) <= (end.0, end.1.serial()) {
        result.push(current);
        current = current.1.next(current.0);
    }

    result
}
