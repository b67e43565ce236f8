use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 個股月營收
///
/// 以 (stock_symbol, year, month) 為主鍵，衍生欄位由 [`crate::revenue::metrics::recompute`] 計算。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyRevenue {
    /// 公司代號
    pub stock_symbol: String,
    /// 西元年
    pub year: i32,
    pub month: u32,
    /// 當月營收 (仟元)
    pub revenue: Decimal,
    /// 備註
    pub note: Option<String>,
    #[serde(flatten)]
    pub derived: DerivedRevenue,
}

impl MonthlyRevenue {
    pub fn new(stock_symbol: impl Into<String>, year: i32, month: u32, revenue: Decimal) -> Self {
        MonthlyRevenue {
            stock_symbol: stock_symbol.into(),
            year,
            month,
            revenue,
            note: None,
            derived: DerivedRevenue::default(),
        }
    }

    pub fn key(&self) -> (&str, i32, u32) {
        (self.stock_symbol.as_str(), self.year, self.month)
    }
}

/// 由當月營收推算的欄位，沒有足夠資料或分母為 0 時為 `None`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DerivedRevenue {
    /// 去年當月營收
    pub revenue_last_year: Option<Decimal>,
    /// 當年累計營收
    pub cumulative_revenue: Option<Decimal>,
    /// 去年累計營收
    pub cumulative_revenue_last_year: Option<Decimal>,
    /// 上月比較增減(%)
    pub mom: Option<Decimal>,
    /// 去年同月增減(%)
    pub yoy: Option<Decimal>,
    /// 累計營收較去年同期增減(%)
    pub cumulative_revenue_yoy: Option<Decimal>,
    /// 近 3 個月平均營收
    pub revenue_ma3: Option<Decimal>,
    /// 近 12 個月平均營收
    pub revenue_ma12: Option<Decimal>,
    pub cumulative_revenue_yoy_ma3: Option<Decimal>,
    pub cumulative_revenue_yoy_ma12: Option<Decimal>,
}
