//! 季報衍生指標
//!
//! 彙總報表的損益與現金流量為年初至今的累計數 (YTD)，
//! 先換算成單季數字，再計算利潤率、報酬率、償債能力與季增率/年增率。
//! 任何缺值或除以零的結果都是 `None`。

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

use crate::{
    declare::{Quarter, Sector, StatementType},
    statement::table::{CanonicalTable, Cell, CODE_COLUMN},
};

/// 一季約略的天數
const DAYS_IN_QUARTER: Decimal = dec!(91.25);

/// 從彙總報表取出的基本財務欄位
#[derive(
    PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Copy, Clone, Display, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CoreField {
    CurrAssets,
    NonCurrAssets,
    TotalAssets,
    CurrLiabs,
    NonCurrLiabs,
    TotalLiabs,
    TotalEquity,
    BookValue,
    AcctsReceiv,
    NotesReceiv,
    AcctsNotesReceiv,
    Inventory,
    Prepaid,
    AcctsPay,
    NotesPay,
    AcctsNotesPay,
    StLoans,
    #[strum(serialize = "lt_liabs_due_1y")]
    #[serde(rename = "lt_liabs_due_1y")]
    LtLiabsDue1y,
    LtLoans,
    BondsPay,
    RetEarnings,
    OprRevenue,
    OprCosts,
    GrossProfit,
    OprExpenses,
    OprProfit,
    NonOprIncome,
    PreTaxIncome,
    IncomeTax,
    NetIncome,
    Eps,
    OprCashFlow,
    InvCashFlow,
    FinCashFlow,
    CashEquivs,
    DivsPaid,
}

impl CoreField {
    /// 欄位統一後的名稱
    pub fn label(&self) -> &'static str {
        match self {
            CoreField::CurrAssets => "流動資產",
            CoreField::NonCurrAssets => "非流動資產",
            CoreField::TotalAssets => "資產總計",
            CoreField::CurrLiabs => "流動負債",
            CoreField::NonCurrLiabs => "非流動負債",
            CoreField::TotalLiabs => "負債總計",
            CoreField::TotalEquity => "權益總計",
            CoreField::BookValue => "每股淨值",
            CoreField::AcctsReceiv => "應收帳款",
            CoreField::NotesReceiv => "應收票據",
            CoreField::AcctsNotesReceiv => "應收帳款及票據",
            CoreField::Inventory => "存貨",
            CoreField::Prepaid => "預付款項",
            CoreField::AcctsPay => "應付帳款",
            CoreField::NotesPay => "應付票據",
            CoreField::AcctsNotesPay => "應付帳款及票據",
            CoreField::StLoans => "短期借款",
            CoreField::LtLiabsDue1y => "一年內到期長期負債",
            CoreField::LtLoans => "長期借款",
            CoreField::BondsPay => "應付公司債",
            CoreField::RetEarnings => "保留盈餘",
            CoreField::OprRevenue => "營業收入",
            CoreField::OprCosts => "營業成本",
            CoreField::GrossProfit => "營業毛利",
            CoreField::OprExpenses => "營業費用",
            CoreField::OprProfit => "營業利益",
            CoreField::NonOprIncome => "營業外收入及支出",
            CoreField::PreTaxIncome => "稅前淨利",
            CoreField::IncomeTax => "所得稅費用",
            CoreField::NetIncome => "本期淨利",
            CoreField::Eps => "每股盈餘",
            CoreField::OprCashFlow => "營業活動之淨現金流入",
            CoreField::InvCashFlow => "投資活動之淨現金流入",
            CoreField::FinCashFlow => "籌資活動之淨現金流入",
            CoreField::CashEquivs => "期末現金及約當現金",
            CoreField::DivsPaid => "配發股利",
        }
    }

    /// 欄位所在的報表
    pub fn statement(&self) -> StatementType {
        match self {
            CoreField::OprRevenue
            | CoreField::OprCosts
            | CoreField::GrossProfit
            | CoreField::OprExpenses
            | CoreField::OprProfit
            | CoreField::NonOprIncome
            | CoreField::PreTaxIncome
            | CoreField::IncomeTax
            | CoreField::NetIncome
            | CoreField::Eps => StatementType::Income,
            CoreField::OprCashFlow
            | CoreField::InvCashFlow
            | CoreField::FinCashFlow
            | CoreField::CashEquivs
            | CoreField::DivsPaid => StatementType::CashFlow,
            _ => StatementType::Balance,
        }
    }

    /// 流量欄位 (期間累計，單季 = 本期 YTD - 上期 YTD)；其餘為時點數字，直接沿用
    pub fn is_flow(&self) -> bool {
        match self.statement() {
            StatementType::Income => true,
            StatementType::CashFlow => *self != CoreField::CashEquivs,
            _ => false,
        }
    }
}

/// 一家公司某一季的基本財務數字，沒有值的欄位不會出現在 `values`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialCore {
    pub code: String,
    pub year: i32,
    pub quarter: Quarter,
    pub values: BTreeMap<CoreField, Decimal>,
}

impl FinancialCore {
    pub fn new(code: impl Into<String>, year: i32, quarter: Quarter) -> Self {
        FinancialCore {
            code: code.into(),
            year,
            quarter,
            values: BTreeMap::new(),
        }
    }

    pub fn get(&self, field: CoreField) -> Option<Decimal> {
        self.values.get(&field).copied()
    }

    pub fn with(mut self, field: CoreField, value: Decimal) -> Self {
        self.values.insert(field, value);
        self
    }

    fn key(&self) -> (&str, i32, u32) {
        (&self.code, self.year, self.quarter.serial())
    }
}

/// 由同一期 (year, quarter) 合併後的損益表、資產負債表、現金流量表取出基本財務數字
///
/// `sector` 有值時只取該產業別的資料列。結果依公司代號排序。
pub fn collect_core(
    year: i32,
    quarter: Quarter,
    tables: &[(StatementType, CanonicalTable)],
    sector: Option<Sector>,
) -> Vec<FinancialCore> {
    let mut cores: BTreeMap<String, FinancialCore> = BTreeMap::new();

    for (statement, table) in tables {
        let fields: Vec<(CoreField, usize)> = CoreField::iter()
            .filter(|f| f.statement() == *statement)
            .filter_map(|f| table.column_index(f.label()).map(|i| (f, i)))
            .collect();

        if fields.is_empty() {
            continue;
        }

        for (index, row) in table.rows().iter().enumerate() {
            if sector.is_some() && table.sector_of(index) != sector {
                continue;
            }

            let code = table.get(index, CODE_COLUMN).to_string();
            if code.is_empty() {
                continue;
            }

            let core = cores
                .entry(code)
                .or_insert_with_key(|code| FinancialCore::new(code.clone(), year, quarter));

            for (field, i) in &fields {
                if let Some(value) = row.get(*i).and_then(Cell::as_decimal) {
                    core.values.insert(*field, value);
                }
            }
        }
    }

    cores.into_values().collect()
}

/// 將年初至今的累計數字換算成單季數字
///
/// Q1 直接沿用；Q2~Q4 的流量欄位為本季累計減上一季累計，時點欄位沿用本季。
/// 同一年度缺少上一季資料時該季不輸出。
pub fn single_quarter(mut ytd: Vec<FinancialCore>) -> Vec<FinancialCore> {
    ytd.sort_by(|a, b| a.key().cmp(&b.key()));

    let mut result = Vec::with_capacity(ytd.len());

    for (i, current) in ytd.iter().enumerate() {
        if current.quarter == Quarter::Q1 {
            result.push(current.clone());
            continue;
        }

        let previous = i.checked_sub(1).and_then(|p| ytd.get(p)).filter(|p| {
            p.code == current.code
                && p.year == current.year
                && p.quarter.serial() + 1 == current.quarter.serial()
        });

        let previous = match previous {
            Some(previous) => previous,
            None => {
                tracing::debug!(
                    code = %current.code,
                    year = current.year,
                    quarter = %current.quarter,
                    "previous quarter missing, single quarter skipped"
                );
                continue;
            }
        };

        let mut core = FinancialCore::new(current.code.clone(), current.year, current.quarter);
        for field in CoreField::iter() {
            let value = if field.is_flow() {
                sub(current.get(field), previous.get(field))
            } else {
                current.get(field)
            };

            if let Some(value) = value {
                core.values.insert(field, value);
            }
        }

        result.push(core);
    }

    result
}

/// 單季財務指標，比率皆為小數 (0.25 = 25%)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FinancialMetrics {
    pub code: String,
    pub year: i32,
    pub quarter: u32,
    /// 自由現金流 = 營業現金流 + 投資現金流
    pub free_cash_flow: Option<Decimal>,
    pub days_inventory_outstd: Option<Decimal>,
    pub days_sales_outstd: Option<Decimal>,
    pub days_pay_outstd: Option<Decimal>,
    /// 現金循環週期
    pub ccc: Option<Decimal>,
    pub curr_ratio: Option<Decimal>,
    pub quick_ratio: Option<Decimal>,
    pub debt_ratio: Option<Decimal>,
    pub fin_debt_ratio: Option<Decimal>,
    /// 本業收益比 = 營業利益 / 稅前淨利
    pub core_profit_ratio: Option<Decimal>,
    pub asset_turn_ratio: Option<Decimal>,
    pub gross_margin: Option<Decimal>,
    pub opr_margin: Option<Decimal>,
    pub pre_tax_margin: Option<Decimal>,
    pub net_margin: Option<Decimal>,
    pub roa: Option<Decimal>,
    pub roe: Option<Decimal>,
    pub annual_roa: Option<Decimal>,
    pub annual_roe: Option<Decimal>,
    /// 保留盈餘報酬率
    pub rore: Option<Decimal>,
    pub annual_payout_ratio: Option<Decimal>,
    pub eps_qoq: Option<Decimal>,
    pub eps_yoy: Option<Decimal>,
    pub net_income_qoq: Option<Decimal>,
    pub net_income_yoy: Option<Decimal>,
    pub opr_cash_flow_qoq: Option<Decimal>,
    pub opr_cash_flow_yoy: Option<Decimal>,
    pub gross_margin_qoq: Option<Decimal>,
    pub gross_margin_yoy: Option<Decimal>,
    pub opr_margin_qoq: Option<Decimal>,
    pub opr_margin_yoy: Option<Decimal>,
    pub net_margin_qoq: Option<Decimal>,
    pub net_margin_yoy: Option<Decimal>,
    pub roe_qoq: Option<Decimal>,
    pub roe_yoy: Option<Decimal>,
}

impl FinancialMetrics {
    /// 只依當季數字就能算出的指標
    fn from_core(core: &FinancialCore) -> Self {
        let v = |field: CoreField| core.get(field);

        let days_inventory_outstd = mul(ratio(v(CoreField::Inventory), v(CoreField::OprCosts)), Some(DAYS_IN_QUARTER));
        let receivables = v(CoreField::AcctsNotesReceiv)
            .or_else(|| sum_present(&[v(CoreField::AcctsReceiv), v(CoreField::NotesReceiv)]));
        let days_sales_outstd = mul(ratio(receivables, v(CoreField::OprRevenue)), Some(DAYS_IN_QUARTER));
        let payables = v(CoreField::AcctsNotesPay)
            .or_else(|| sum_present(&[v(CoreField::AcctsPay), v(CoreField::NotesPay)]));
        let days_pay_outstd = mul(ratio(payables, v(CoreField::OprCosts)), Some(DAYS_IN_QUARTER));

        let quick_assets = sub(
            v(CoreField::CurrAssets),
            sum_present(&[v(CoreField::Inventory), v(CoreField::Prepaid)]),
        );
        let fin_debt = sum_present(&[
            v(CoreField::StLoans),
            v(CoreField::NotesPay),
            v(CoreField::LtLiabsDue1y),
            v(CoreField::LtLoans),
            v(CoreField::BondsPay),
        ]);

        let roa = ratio(v(CoreField::NetIncome), v(CoreField::TotalAssets));
        let roe = ratio(v(CoreField::NetIncome), v(CoreField::TotalEquity));

        FinancialMetrics {
            code: core.code.clone(),
            year: core.year,
            quarter: core.quarter.serial(),
            free_cash_flow: add(v(CoreField::OprCashFlow), v(CoreField::InvCashFlow)),
            days_inventory_outstd,
            days_sales_outstd,
            days_pay_outstd,
            ccc: sub(add(days_inventory_outstd, days_sales_outstd), days_pay_outstd),
            curr_ratio: ratio(v(CoreField::CurrAssets), v(CoreField::CurrLiabs)),
            quick_ratio: ratio(quick_assets, v(CoreField::CurrLiabs)),
            debt_ratio: ratio(v(CoreField::TotalLiabs), v(CoreField::TotalAssets)),
            fin_debt_ratio: ratio(fin_debt, v(CoreField::TotalAssets)),
            core_profit_ratio: ratio(v(CoreField::OprProfit), v(CoreField::PreTaxIncome)),
            asset_turn_ratio: ratio(v(CoreField::OprRevenue), v(CoreField::TotalAssets)),
            gross_margin: ratio(v(CoreField::GrossProfit), v(CoreField::OprRevenue)),
            opr_margin: ratio(v(CoreField::OprProfit), v(CoreField::OprRevenue)),
            pre_tax_margin: ratio(v(CoreField::PreTaxIncome), v(CoreField::OprRevenue)),
            net_margin: ratio(v(CoreField::NetIncome), v(CoreField::OprRevenue)),
            roa,
            roe,
            annual_roa: mul(roa, Some(dec!(4))),
            annual_roe: mul(roe, Some(dec!(4))),
            rore: ratio(v(CoreField::NetIncome), v(CoreField::RetEarnings)),
            annual_payout_ratio: ratio(v(CoreField::DivsPaid), v(CoreField::NetIncome)),
            ..Default::default()
        }
    }
}

/// 成長率的基準：每股盈餘、淨利、營業現金流、毛利率、營益率、淨利率、ROE
const GROWTH_BASES: usize = 7;

/// 計算每一季的財務指標
///
/// 季增率與年增率依同一公司排序後的前 1 筆與前 4 筆計算，
/// 以資料列位置而非實際季度判斷，中間缺季時會與更早的季度比較。
pub fn compute_metrics(mut core: Vec<FinancialCore>) -> Vec<FinancialMetrics> {
    core.sort_by(|a, b| a.key().cmp(&b.key()));

    let mut metrics: Vec<FinancialMetrics> = core.iter().map(FinancialMetrics::from_core).collect();

    let mut start = 0;
    while start < core.len() {
        let code = &core[start].code;
        let end = start + core[start..].iter().take_while(|c| &c.code == code).count();
        apply_growth(&core[start..end], &mut metrics[start..end]);
        start = end;
    }

    metrics
}

fn apply_growth(core: &[FinancialCore], metrics: &mut [FinancialMetrics]) {
    let bases: Vec<[Option<Decimal>; GROWTH_BASES]> = core
        .iter()
        .zip(metrics.iter())
        .map(|(c, m)| {
            [
                c.get(CoreField::Eps),
                c.get(CoreField::NetIncome),
                c.get(CoreField::OprCashFlow),
                m.gross_margin,
                m.opr_margin,
                m.net_margin,
                m.roe,
            ]
        })
        .collect();

    for (i, m) in metrics.iter_mut().enumerate() {
        let [eps, net_income, opr_cash_flow, gross_margin, opr_margin, net_margin, roe] =
            shifted_growth(&bases, i, 1);
        m.eps_qoq = eps;
        m.net_income_qoq = net_income;
        m.opr_cash_flow_qoq = opr_cash_flow;
        m.gross_margin_qoq = gross_margin;
        m.opr_margin_qoq = opr_margin;
        m.net_margin_qoq = net_margin;
        m.roe_qoq = roe;

        let [eps, net_income, opr_cash_flow, gross_margin, opr_margin, net_margin, roe] =
            shifted_growth(&bases, i, 4);
        m.eps_yoy = eps;
        m.net_income_yoy = net_income;
        m.opr_cash_flow_yoy = opr_cash_flow;
        m.gross_margin_yoy = gross_margin;
        m.opr_margin_yoy = opr_margin;
        m.net_margin_yoy = net_margin;
        m.roe_yoy = roe;
    }
}

fn shifted_growth(
    bases: &[[Option<Decimal>; GROWTH_BASES]],
    index: usize,
    shift: usize,
) -> [Option<Decimal>; GROWTH_BASES] {
    let mut result = [None; GROWTH_BASES];

    if let Some(previous) = index.checked_sub(shift).and_then(|p| bases.get(p)) {
        for (k, value) in result.iter_mut().enumerate() {
            *value = growth(bases[index][k], previous[k]);
        }
    }

    result
}

/// 成長率 = (本期 - 前期) / |前期|，前期為負值時方向仍正確
pub fn growth(current: Option<Decimal>, previous: Option<Decimal>) -> Option<Decimal> {
    let previous = previous?;
    current?.checked_sub(previous)?.checked_div(previous.abs())
}

fn ratio(numerator: Option<Decimal>, denominator: Option<Decimal>) -> Option<Decimal> {
    numerator?.checked_div(denominator?)
}

fn add(a: Option<Decimal>, b: Option<Decimal>) -> Option<Decimal> {
    a?.checked_add(b?)
}

fn sub(a: Option<Decimal>, b: Option<Decimal>) -> Option<Decimal> {
    a?.checked_sub(b?)
}

fn mul(a: Option<Decimal>, b: Option<Decimal>) -> Option<Decimal> {
    a?.checked_mul(b?)
}

/// 加總有值的項目，全部缺值時為 `None`
fn sum_present(values: &[Option<Decimal>]) -> Option<Decimal> {
    values
        .iter()
        .flatten()
        .try_fold(None, |total: Option<Decimal>, v| match total {
            None => Some(Some(*v)),
            Some(total) => total.checked_add(*v).map(Some),
        })
        .flatten()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;
    use crate::statement::table::{NAME_COLUMN, SECTOR_COLUMN};

    fn table(columns: &[&str], rows: Vec<Vec<Cell>>) -> CanonicalTable {
        CanonicalTable::new(columns.iter().map(|c| c.to_string()).collect(), rows).unwrap()
    }

    fn n(value: Decimal) -> Cell {
        Cell::Number(value)
    }

    #[test]
    fn test_field_labels_are_canonical_columns() {
        for field in CoreField::iter() {
            let rename_table = crate::statement::rename::table_for(field.statement());
            let summary_only = matches!(
                field,
                CoreField::OprRevenue
                    | CoreField::OprCosts
                    | CoreField::GrossProfit
                    | CoreField::OprExpenses
                    | CoreField::OprProfit
                    | CoreField::NonOprIncome
                    | CoreField::PreTaxIncome
                    | CoreField::IncomeTax
                    | CoreField::NetIncome
                    | CoreField::Eps
                    | CoreField::CurrAssets
                    | CoreField::TotalAssets
                    | CoreField::TotalLiabs
                    | CoreField::TotalEquity
                    | CoreField::BookValue
                    | CoreField::OprCashFlow
                    | CoreField::CashEquivs
            );
            if summary_only {
                assert!(rename_table.position(field.label()).is_some(), "{}", field);
            }
        }
        assert_eq!(CoreField::LtLiabsDue1y.to_string(), "lt_liabs_due_1y");
        assert!(CoreField::Eps.is_flow());
        assert!(!CoreField::CashEquivs.is_flow());
        assert!(!CoreField::TotalAssets.is_flow());
    }

    #[test]
    fn test_collect_core_joins_statements_by_code() {
        let income = table(
            &[CODE_COLUMN, NAME_COLUMN, "營業收入", "本期淨利", SECTOR_COLUMN],
            vec![
                vec![Cell::text("1101"), Cell::text("台泥"), n(dec!(100)), n(dec!(10)), Cell::text("ci")],
                vec![Cell::text("2801"), Cell::text("彰銀"), Cell::Missing, n(dec!(5)), Cell::text("basi")],
                vec![Cell::Missing, Cell::Missing, n(dec!(1)), n(dec!(1)), Cell::text("ci")],
            ],
        );
        let balance = table(
            &[CODE_COLUMN, NAME_COLUMN, "資產總計", SECTOR_COLUMN],
            vec![vec![Cell::text("1101"), Cell::text("台泥"), n(dec!(400)), Cell::text("ci")]],
        );

        let tables = vec![(StatementType::Income, income), (StatementType::Balance, balance)];

        let cores = collect_core(2024, Quarter::Q2, &tables, Some(Sector::Ci));
        assert_eq!(
            cores,
            vec![FinancialCore::new("1101", 2024, Quarter::Q2)
                .with(CoreField::TotalAssets, dec!(400))
                .with(CoreField::OprRevenue, dec!(100))
                .with(CoreField::NetIncome, dec!(10))]
        );

        let all = collect_core(2024, Quarter::Q2, &tables, None);
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].code, "2801");
        assert_eq!(all[1].get(CoreField::OprRevenue), None);
    }

    #[test]
    fn test_single_quarter_from_ytd() {
        let ytd = vec![
            FinancialCore::new("2330", 2024, Quarter::Q2)
                .with(CoreField::OprRevenue, dec!(250))
                .with(CoreField::TotalAssets, dec!(1200))
                .with(CoreField::CashEquivs, dec!(90)),
            FinancialCore::new("2330", 2024, Quarter::Q1)
                .with(CoreField::OprRevenue, dec!(100))
                .with(CoreField::TotalAssets, dec!(1000))
                .with(CoreField::Eps, dec!(1.5)),
            // 缺 Q3，Q4 無法換算
            FinancialCore::new("2330", 2024, Quarter::Q4).with(CoreField::OprRevenue, dec!(600)),
        ];

        let core = single_quarter(ytd);
        assert_eq!(core.len(), 2);

        assert_eq!(core[0].quarter, Quarter::Q1);
        assert_eq!(core[0].get(CoreField::Eps), Some(dec!(1.5)));

        assert_eq!(core[1].quarter, Quarter::Q2);
        assert_eq!(core[1].get(CoreField::OprRevenue), Some(dec!(150)));
        assert_eq!(core[1].get(CoreField::TotalAssets), Some(dec!(1200)));
        assert_eq!(core[1].get(CoreField::CashEquivs), Some(dec!(90)));
        // Q2 有值但 Q1 缺值的流量欄位為缺值
        assert_eq!(core[1].get(CoreField::Eps), None);
    }

    #[test]
    fn test_single_quarter_does_not_cross_year() {
        let ytd = vec![
            FinancialCore::new("1101", 2023, Quarter::Q4).with(CoreField::OprRevenue, dec!(400)),
            FinancialCore::new("1101", 2024, Quarter::Q2).with(CoreField::OprRevenue, dec!(200)),
        ];
        assert!(single_quarter(ytd).is_empty());
    }

    #[test]
    fn test_ratios() {
        let core = FinancialCore::new("1101", 2024, Quarter::Q1)
            .with(CoreField::OprRevenue, dec!(200))
            .with(CoreField::OprCosts, dec!(150))
            .with(CoreField::GrossProfit, dec!(50))
            .with(CoreField::OprProfit, dec!(30))
            .with(CoreField::PreTaxIncome, dec!(40))
            .with(CoreField::NetIncome, dec!(20))
            .with(CoreField::CurrAssets, dec!(300))
            .with(CoreField::Inventory, dec!(60))
            .with(CoreField::CurrLiabs, dec!(120))
            .with(CoreField::TotalAssets, dec!(1000))
            .with(CoreField::TotalLiabs, dec!(400))
            .with(CoreField::TotalEquity, dec!(0))
            .with(CoreField::OprCashFlow, dec!(70))
            .with(CoreField::InvCashFlow, dec!(-30));

        let metrics = compute_metrics(vec![core]);
        let m = &metrics[0];

        assert_eq!(m.quarter, 1);
        assert_eq!(m.gross_margin, Some(dec!(0.25)));
        assert_eq!(m.opr_margin, Some(dec!(0.15)));
        assert_eq!(m.pre_tax_margin, Some(dec!(0.2)));
        assert_eq!(m.net_margin, Some(dec!(0.1)));
        assert_eq!(m.core_profit_ratio, Some(dec!(0.75)));
        assert_eq!(m.curr_ratio, Some(dec!(2.5)));
        assert_eq!(m.quick_ratio, Some(dec!(2)));
        assert_eq!(m.debt_ratio, Some(dec!(0.4)));
        assert_eq!(m.roa, Some(dec!(0.02)));
        assert_eq!(m.annual_roa, Some(dec!(0.08)));
        assert_eq!(m.free_cash_flow, Some(dec!(40)));
        assert_eq!(m.days_inventory_outstd, Some(dec!(36.5)));
        // 權益為零、缺少應收與應付資料
        assert_eq!(m.roe, None);
        assert_eq!(m.days_sales_outstd, None);
        assert_eq!(m.ccc, None);
        assert_eq!(m.eps_qoq, None);
    }

    #[test]
    fn test_receivables_fall_back_to_parts() {
        let core = FinancialCore::new("1101", 2024, Quarter::Q1)
            .with(CoreField::OprRevenue, dec!(100))
            .with(CoreField::AcctsReceiv, dec!(400));
        let metrics = compute_metrics(vec![core]);
        assert_eq!(metrics[0].days_sales_outstd, Some(dec!(365)));
    }

    #[test]
    fn test_growth_uses_absolute_previous() {
        assert_eq!(growth(Some(dec!(5)), Some(dec!(-10))), Some(dec!(1.5)));
        assert_eq!(growth(Some(dec!(15)), Some(dec!(10))), Some(dec!(0.5)));
        assert_eq!(growth(Some(dec!(1)), Some(dec!(0))), None);
        assert_eq!(growth(None, Some(dec!(1))), None);
    }

    #[test]
    fn test_qoq_and_yoy_per_code() {
        let periods = [
            (2023, Quarter::Q1),
            (2023, Quarter::Q2),
            (2023, Quarter::Q3),
            (2023, Quarter::Q4),
            (2024, Quarter::Q1),
        ];
        let mut core: Vec<FinancialCore> = periods
            .iter()
            .zip(1..)
            .map(|(&(year, quarter), eps)| {
                FinancialCore::new("2330", year, quarter).with(CoreField::Eps, Decimal::from(eps))
            })
            .collect();
        core.push(FinancialCore::new("1101", 2024, Quarter::Q1).with(CoreField::Eps, dec!(9)));

        let metrics = compute_metrics(core);
        assert_eq!(metrics[0].code, "1101");
        assert_eq!(metrics[0].eps_qoq, None);

        let tsmc: Vec<&FinancialMetrics> = metrics.iter().filter(|m| m.code == "2330").collect();
        assert_eq!(tsmc[1].eps_qoq, Some(dec!(1)));
        assert_eq!(tsmc[3].eps_yoy, None);
        assert_eq!(tsmc[4].eps_qoq, Some(dec!(0.25)));
        assert_eq!(tsmc[4].eps_yoy, Some(dec!(4)));
    }

    #[test]
    fn test_sum_present() {
        assert_eq!(sum_present(&[None, None]), None);
        assert_eq!(sum_present(&[Some(dec!(1)), None, Some(dec!(2))]), Some(dec!(3)));
    }

    proptest! {
        #[test]
        fn prop_single_quarter_flows_add_back_to_ytd(
            revenues in proptest::collection::vec(0i64..1_000_000, 4),
        ) {
            // 各季單季營收加總後等於 Q4 的年初至今累計
            let mut total = 0i64;
            let ytd: Vec<FinancialCore> = Quarter::iter()
                .zip(&revenues)
                .map(|(quarter, revenue)| {
                    total += revenue;
                    FinancialCore::new("2330", 2024, quarter).with(CoreField::OprRevenue, Decimal::from(total))
                })
                .collect();

            let core = single_quarter(ytd);
            let sum: Decimal = core.iter().filter_map(|c| c.get(CoreField::OprRevenue)).sum();

            prop_assert_eq!(core.len(), 4);
            prop_assert_eq!(sum, Decimal::from(total));
        }
    }
}
