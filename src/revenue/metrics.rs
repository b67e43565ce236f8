//! 月營收衍生欄位計算
//!
//! 每次都以完整的歷史資料重新計算所有欄位，補進一筆較早月份的營收時，
//! 之後月份的去年同期與累計數值才會一併修正。
//!
//! 去年同期取的是同一檔股票排序後往前第 12 筆，而不是日曆上的去年同月。
//! 中間缺少月份的股票會因此與錯誤的月份比較，目前維持這個行為。

use rust_decimal::Decimal;

use crate::revenue::record::{DerivedRevenue, MonthlyRevenue};

/// 去年同期往前的筆數
const LAG: usize = 12;

/// 重新計算所有月營收的衍生欄位
///
/// 回傳依 (stock_symbol, year, month) 排序的結果，輸入順序不影響結果。
pub fn recompute(mut rows: Vec<MonthlyRevenue>) -> Vec<MonthlyRevenue> {
    rows.sort_by(|a, b| a.key().cmp(&b.key()));

    let mut start = 0;
    while start < rows.len() {
        let symbol = rows[start].stock_symbol.as_str();
        let end = rows[start..]
            .iter()
            .position(|r| r.stock_symbol != symbol)
            .map_or(rows.len(), |offset| start + offset);

        recompute_group(&mut rows[start..end]);
        start = end;
    }

    rows
}

/// 計算同一檔股票的衍生欄位，`group` 需已依年月排序
fn recompute_group(group: &mut [MonthlyRevenue]) {
    let revenues: Vec<Option<Decimal>> = group.iter().map(|r| Some(r.revenue)).collect();

    let mut cumulative: Vec<Option<Decimal>> = Vec::with_capacity(group.len());
    for (i, row) in group.iter().enumerate() {
        let value = match i.checked_sub(1) {
            Some(prev) if group[prev].year == row.year => {
                cumulative[prev].and_then(|c: Decimal| c.checked_add(row.revenue))
            }
            _ => Some(row.revenue),
        };
        cumulative.push(value);
    }

    let cumulative_yoy: Vec<Option<Decimal>> = (0..group.len())
        .map(|i| growth(cumulative[i], lagged(&cumulative, i, LAG)))
        .collect();

    for (i, row) in group.iter_mut().enumerate() {
        let revenue_last_year = lagged(&revenues, i, LAG);

        row.derived = DerivedRevenue {
            revenue_last_year,
            cumulative_revenue: cumulative[i],
            cumulative_revenue_last_year: lagged(&cumulative, i, LAG),
            mom: growth(revenues[i], lagged(&revenues, i, 1)),
            yoy: growth(revenues[i], revenue_last_year),
            cumulative_revenue_yoy: cumulative_yoy[i],
            revenue_ma3: moving_average(&revenues, i, 3),
            revenue_ma12: moving_average(&revenues, i, 12),
            cumulative_revenue_yoy_ma3: moving_average(&cumulative_yoy, i, 3),
            cumulative_revenue_yoy_ma12: moving_average(&cumulative_yoy, i, 12),
        };
    }
}

/// 往前第 `n` 筆的值
fn lagged(values: &[Option<Decimal>], index: usize, n: usize) -> Option<Decimal> {
    index.checked_sub(n).and_then(|j| values[j])
}

/// 增減百分比 (current / base - 1) * 100，分母為 0 或缺值時為 `None`
pub fn growth(current: Option<Decimal>, base: Option<Decimal>) -> Option<Decimal> {
    let base = base?;
    if base.is_zero() {
        return None;
    }

    current?
        .checked_div(base)?
        .checked_sub(Decimal::ONE)?
        .checked_mul(Decimal::ONE_HUNDRED)
}

/// 包含 `index` 在內往前 `window` 筆的平均，筆數不足或有缺值時為 `None`
fn moving_average(values: &[Option<Decimal>], index: usize, window: usize) -> Option<Decimal> {
    let begin = (index + 1).checked_sub(window)?;
    let sum = values[begin..=index]
        .iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add((*v)?))?;

    sum.checked_div(Decimal::from(window))
}
