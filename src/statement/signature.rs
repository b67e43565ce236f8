//! 判斷產業別用的欄位特徵規則
//!
//! 每種報表有一份依序比對的「唯一欄位」規則，欄位存在即可確定產業別。
//! 資產負債表與現金流量表另有多個產業共用同一格式的情況，
//! 表格含有該格式的標記欄位時，改用資料筆數與表格在回應中的位置查表判斷。

use crate::{
    declare::{Sector, StatementType, StockExchangeMarket},
    statement::table::RawStatementTable,
};

/// 欄位 `label` 存在時即為 `sector`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureRule {
    pub label: &'static str,
    pub sector: Sector,
}

/// 共用格式時依市場、表格數量與位置決定產業別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutRule {
    pub market: StockExchangeMarket,
    pub table_count: usize,
    pub table_index: usize,
    pub sector: Sector,
}

/// 多個產業共用的報表格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SharedFormat {
    /// 共用格式才有的欄位，沒有此欄位的表格不適用筆數與位置判斷
    pub marker: &'static str,
    /// 資料筆數達到此數量即為一般業
    pub min_rows_for_general: usize,
    pub layouts: &'static [LayoutRule],
    /// 筆數與位置都無法判斷時使用的標記
    pub fallback: Sector,
}

impl SharedFormat {
    pub fn matches(&self, table: &RawStatementTable) -> bool {
        table.contains_header(self.marker)
    }

    pub fn lookup(
        &self,
        market: StockExchangeMarket,
        table_count: usize,
        table_index: usize,
    ) -> Option<Sector> {
        self.layouts
            .iter()
            .find(|l| l.market == market && l.table_count == table_count && l.table_index == table_index)
            .map(|l| l.sector)
    }
}

/// 一種報表的完整判斷規則
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureRules {
    pub statement: StatementType,
    pub unique: &'static [SignatureRule],
    pub shared: Option<SharedFormat>,
}

const fn rule(label: &'static str, sector: Sector) -> SignatureRule {
    SignatureRule { label, sector }
}

const fn layout(
    market: StockExchangeMarket,
    table_count: usize,
    table_index: usize,
    sector: Sector,
) -> LayoutRule {
    LayoutRule {
        market,
        table_count,
        table_index,
        sector,
    }
}

/// 一般業家數遠多於其他產業，超過此筆數的表格必為一般業
const GENERAL_INDUSTRY_MIN_ROWS: usize = 500;

const INCOME_RULES: [SignatureRule; 6] = [
    rule("收益", Sector::Bd),
    rule("保險負債準備淨變動", Sector::Fh),
    rule("原始認列生物資產及農產品之利益（損失）", Sector::Ci),
    rule("收入", Sector::Mim),
    rule("利息淨收益", Sector::Basi),
    rule("營業收入", Sector::Ins),
];

const BALANCE_RULES: [SignatureRule; 3] = [
    rule("應付商業本票－淨額", Sector::Fh),
    rule("應付金融債券", Sector::Basi),
    rule("分離帳戶保險商品資產", Sector::Ins),
];

/// 證券期貨業、一般業、異業共用資產負債表格式時的表格位置
const BALANCE_LAYOUTS: [LayoutRule; 8] = [
    layout(StockExchangeMarket::Listed, 7, 2, Sector::Bd),
    layout(StockExchangeMarket::Listed, 7, 3, Sector::Ci),
    layout(StockExchangeMarket::Listed, 7, 6, Sector::Mim),
    layout(StockExchangeMarket::OverTheCounter, 3, 1, Sector::Bd),
    layout(StockExchangeMarket::OverTheCounter, 3, 2, Sector::Ci),
    layout(StockExchangeMarket::OverTheCounter, 4, 1, Sector::Bd),
    layout(StockExchangeMarket::OverTheCounter, 4, 2, Sector::Ci),
    layout(StockExchangeMarket::OverTheCounter, 4, 3, Sector::Mim),
];

const RATIO_RULES: [SignatureRule; 1] = [rule("營業收入 (百萬元)", Sector::Ci)];

static INCOME: SignatureRules = SignatureRules {
    statement: StatementType::Income,
    unique: &INCOME_RULES,
    shared: None,
};

static BALANCE: SignatureRules = SignatureRules {
    statement: StatementType::Balance,
    unique: &BALANCE_RULES,
    shared: Some(SharedFormat {
        marker: "流動資產",
        min_rows_for_general: GENERAL_INDUSTRY_MIN_ROWS,
        layouts: &BALANCE_LAYOUTS,
        fallback: Sector::AmbiguousBdCiMim,
    }),
};

// 六個產業的現金流量表欄位完全相同，只能靠筆數認出一般業
static CASH_FLOW: SignatureRules = SignatureRules {
    statement: StatementType::CashFlow,
    unique: &[],
    shared: Some(SharedFormat {
        marker: "營業活動之淨現金流入（流出）",
        min_rows_for_general: GENERAL_INDUSTRY_MIN_ROWS,
        layouts: &[],
        fallback: Sector::Unresolved,
    }),
};

static RATIO: SignatureRules = SignatureRules {
    statement: StatementType::Ratio,
    unique: &RATIO_RULES,
    shared: None,
};

/// 取得報表的判斷規則
pub fn rules_for(statement: StatementType) -> &'static SignatureRules {
    match statement {
        StatementType::Income => &INCOME,
        StatementType::Balance => &BALANCE,
        StatementType::CashFlow => &CASH_FLOW,
        StatementType::Ratio => &RATIO,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_unique_labels_are_disjoint() {
        for statement in StatementType::iter() {
            let rules = rules_for(statement);
            assert_eq!(rules.statement, statement);

            let labels: HashSet<&str> = rules.unique.iter().map(|r| r.label).collect();
            assert_eq!(labels.len(), rules.unique.len(), "{}", statement);
        }
    }

    #[test]
    fn test_balance_layout_lookup() {
        let shared = rules_for(StatementType::Balance).shared.unwrap();
        assert_eq!(shared.lookup(StockExchangeMarket::Listed, 7, 2), Some(Sector::Bd));
        assert_eq!(shared.lookup(StockExchangeMarket::Listed, 7, 6), Some(Sector::Mim));
        assert_eq!(shared.lookup(StockExchangeMarket::OverTheCounter, 4, 3), Some(Sector::Mim));
        assert_eq!(shared.lookup(StockExchangeMarket::OverTheCounter, 7, 2), None);
        assert_eq!(shared.lookup(StockExchangeMarket::Emerging, 3, 1), None);
    }

    #[test]
    fn test_shared_format_marker() {
        let balance = rules_for(StatementType::Balance).shared.unwrap();
        let cash = rules_for(StatementType::CashFlow).shared.unwrap();
        let table = RawStatementTable::from_text(&["公司代號", "流動資產"], &[["1101", "1"]]).unwrap();

        assert!(balance.matches(&table));
        assert!(!cash.matches(&table));
    }

    #[test]
    fn test_layout_rules_only_name_shared_sectors() {
        let shared = rules_for(StatementType::Balance).shared.unwrap();
        assert!(shared
            .layouts
            .iter()
            .all(|l| Sector::AmbiguousBdCiMim.candidates().contains(&l.sector)));
    }
}
