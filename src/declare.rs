use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

/// 市場別
#[derive(
    PartialEq, Eq, Hash, Debug, Copy, Clone, Display, EnumString, AsRefStr, EnumIter, Serialize, Deserialize,
)]
#[repr(i32)]
pub enum StockExchangeMarket {
    /// 上市 2
    #[strum(serialize = "tse")]
    #[serde(rename = "tse")]
    Listed = 2,
    /// 上櫃 4
    #[strum(serialize = "otc")]
    #[serde(rename = "otc")]
    OverTheCounter = 4,
    /// 興櫃 5
    #[strum(serialize = "esb")]
    #[serde(rename = "esb")]
    Emerging = 5,
}

impl StockExchangeMarket {
    pub fn serial(&self) -> i32 {
        *self as i32
    }

    pub fn name(&self) -> &'static str {
        match *self {
            StockExchangeMarket::Listed => "上市",
            StockExchangeMarket::OverTheCounter => "上櫃",
            StockExchangeMarket::Emerging => "興櫃",
        }
    }

    /// 公開資訊觀測站查詢參數 TYPEK
    pub fn typek(&self) -> &'static str {
        match *self {
            StockExchangeMarket::Listed => "sii",
            StockExchangeMarket::OverTheCounter => "otc",
            StockExchangeMarket::Emerging => "rotc",
        }
    }
}

/// 季度
#[derive(PartialEq, Eq, Hash, Debug, Copy, Clone, Display, EnumString, EnumIter, Serialize, Deserialize)]
pub enum Quarter {
    Q1 = 1,
    Q2 = 2,
    Q3 = 3,
    Q4 = 4,
}

impl Quarter {
    pub fn serial(&self) -> u32 {
        *self as u32
    }

    pub fn from_serial(serial: u32) -> Option<Quarter> {
        Quarter::iter().find(|q| q.serial() == serial)
    }

    /// 月份所屬的季度
    pub fn from_month(month: u32) -> Option<Quarter> {
        match month {
            1..=3 => Some(Quarter::Q1),
            4..=6 => Some(Quarter::Q2),
            7..=9 => Some(Quarter::Q3),
            10..=12 => Some(Quarter::Q4),
            _ => None,
        }
    }

    /// 下一季與其年度
    pub fn next(&self, year: i32) -> (i32, Quarter) {
        match self {
            Quarter::Q1 => (year, Quarter::Q2),
            Quarter::Q2 => (year, Quarter::Q3),
            Quarter::Q3 => (year, Quarter::Q4),
            Quarter::Q4 => (year + 1, Quarter::Q1),
        }
    }
}

/// 財務報表種類
#[derive(
    PartialEq, Eq, Hash, Debug, Copy, Clone, Display, EnumString, AsRefStr, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StatementType {
    /// 綜合損益表
    Income,
    /// 資產負債表
    Balance,
    /// 現金流量表
    #[strum(serialize = "cash")]
    #[serde(rename = "cash")]
    CashFlow,
    /// 財務比率(營益分析)
    Ratio,
}

impl StatementType {
    pub fn name(&self) -> &'static str {
        match self {
            StatementType::Income => "綜合損益表",
            StatementType::Balance => "資產負債表",
            StatementType::CashFlow => "現金流量表",
            StatementType::Ratio => "營益分析",
        }
    }

    /// 彙總報表代號 ajax_t163sb{report_id}
    pub fn report_id(&self) -> &'static str {
        match self {
            StatementType::Income => "04",
            StatementType::Balance => "05",
            StatementType::CashFlow => "20",
            StatementType::Ratio => "06",
        }
    }
}

/// 財報格式的產業別
///
/// 公開資訊觀測站依產業別提供不同欄位格式的報表，
/// 同一份回應內的每個表格只會被標記成其中一個值。
#[derive(
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Debug,
    Copy,
    Clone,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
    Serialize,
    Deserialize,
)]
pub enum Sector {
    /// 金融業
    #[strum(serialize = "basi")]
    #[serde(rename = "basi")]
    Basi,
    /// 證券期貨業
    #[strum(serialize = "bd")]
    #[serde(rename = "bd")]
    Bd,
    /// 一般業
    #[strum(serialize = "ci")]
    #[serde(rename = "ci")]
    Ci,
    /// 金控業
    #[strum(serialize = "fh")]
    #[serde(rename = "fh")]
    Fh,
    /// 保險業
    #[strum(serialize = "ins")]
    #[serde(rename = "ins")]
    Ins,
    /// 異業
    #[strum(serialize = "mim")]
    #[serde(rename = "mim")]
    Mim,
    /// 證券期貨業、一般業、異業共用同一格式而無法區分
    #[strum(serialize = "bd_ci_mim")]
    #[serde(rename = "bd_ci_mim")]
    AmbiguousBdCiMim,
    /// 無法判斷
    #[strum(to_string = "unresolved", serialize = "--")]
    #[serde(rename = "unresolved", alias = "--")]
    Unresolved,
}

impl Sector {
    /// 六個實際的產業別
    pub const CONCRETE: [Sector; 6] = [
        Sector::Basi,
        Sector::Bd,
        Sector::Ci,
        Sector::Fh,
        Sector::Ins,
        Sector::Mim,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Sector::Basi => "金融業",
            Sector::Bd => "證券期貨業",
            Sector::Ci => "一般業",
            Sector::Fh => "金控業",
            Sector::Ins => "保險業",
            Sector::Mim => "異業",
            Sector::AmbiguousBdCiMim => "證券期貨業/一般業/異業",
            Sector::Unresolved => "未知",
        }
    }

    pub fn is_concrete(&self) -> bool {
        !matches!(self, Sector::AmbiguousBdCiMim | Sector::Unresolved)
    }

    /// 此標記可能代表的實際產業別
    pub fn candidates(&self) -> &'static [Sector] {
        match self {
            Sector::Basi => &[Sector::Basi],
            Sector::Bd => &[Sector::Bd],
            Sector::Ci => &[Sector::Ci],
            Sector::Fh => &[Sector::Fh],
            Sector::Ins => &[Sector::Ins],
            Sector::Mim => &[Sector::Mim],
            Sector::AmbiguousBdCiMim => &[Sector::Bd, Sector::Ci, Sector::Mim],
            Sector::Unresolved => &Sector::CONCRETE,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_sector_tags() {
        assert_eq!(Sector::Basi.to_string(), "basi");
        assert_eq!(Sector::AmbiguousBdCiMim.to_string(), "bd_ci_mim");
        assert_eq!(Sector::Unresolved.to_string(), "unresolved");
        assert_eq!(Sector::from_str("--").unwrap(), Sector::Unresolved);
        assert_eq!(Sector::from_str("mim").unwrap(), Sector::Mim);
        assert_eq!(Sector::iter().count(), 8);
    }

    #[test]
    fn test_sector_serde() {
        let json = serde_json::to_string(&Sector::AmbiguousBdCiMim).unwrap();
        assert_eq!(json, "\"bd_ci_mim\"");
        let sector: Sector = serde_json::from_str("\"--\"").unwrap();
        assert_eq!(sector, Sector::Unresolved);
    }

    #[test]
    fn test_statement_type() {
        assert_eq!(StatementType::from_str("cash").unwrap(), StatementType::CashFlow);
        assert_eq!(StatementType::Income.to_string(), "income");
        assert_eq!(StatementType::Balance.report_id(), "05");
        assert!(StatementType::from_str("equity").is_err());
    }

    #[test]
    fn test_market() {
        assert_eq!(StockExchangeMarket::from_str("esb").unwrap().typek(), "rotc");
        assert_eq!(StockExchangeMarket::Listed.to_string(), "tse");
        assert_eq!(StockExchangeMarket::OverTheCounter.serial(), 4);
    }

    #[test]
    fn test_quarter() {
        assert_eq!(Quarter::from_month(5), Some(Quarter::Q2));
        assert_eq!(Quarter::from_serial(4), Some(Quarter::Q4));
        assert_eq!(Quarter::from_serial(5), None);
        assert_eq!(Quarter::Q4.next(2023), (2024, Quarter::Q1));
    }
}
