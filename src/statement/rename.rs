//! 各報表歷年出現過的欄位名稱與統一後的欄位名稱對照
//!
//! 2013 年導入 IFRS 之後欄位名稱歷經多次修訂，同一個項目在不同年度、
//! 不同產業別的報表上可能有好幾種寫法，這裡全部收斂成同一個名稱。

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;

use crate::{
    declare::StatementType,
    statement::table::{CODE_COLUMN, NAME_COLUMN, SECTOR_COLUMN},
};

/// 一種報表的欄位對照表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRenameTable {
    pub statement: StatementType,
    rename: HashMap<&'static str, &'static str>,
    drop: HashSet<&'static str>,
    sequence: Vec<&'static str>,
}

impl ColumnRenameTable {
    /// 依宣告順序建立對照表，輸出欄位順序為不重複的統一名稱 (排除要移除的欄位)
    fn build(
        statement: StatementType,
        pairs: &[(&'static str, &'static str)],
        drop: &[&'static str],
    ) -> Self {
        let drop: HashSet<&'static str> = drop.iter().copied().collect();
        let mut rename = HashMap::with_capacity(pairs.len());
        let mut sequence: Vec<&'static str> = Vec::new();

        for &(raw, canonical) in pairs {
            rename.insert(raw, canonical);
            if !drop.contains(canonical) && !sequence.contains(&canonical) {
                sequence.push(canonical);
            }
        }

        ColumnRenameTable {
            statement,
            rename,
            drop,
            sequence,
        }
    }

    /// 原始欄位名稱對應的統一名稱
    pub fn canonical(&self, raw: &str) -> Option<&'static str> {
        self.rename.get(raw).copied()
    }

    /// 對應到同一個統一名稱的所有原始寫法
    pub fn spellings(&self, canonical: &str) -> Vec<&'static str> {
        let mut spellings: Vec<&'static str> = self
            .rename
            .iter()
            .filter(|(_, c)| **c == canonical)
            .map(|(raw, _)| *raw)
            .collect();
        spellings.sort_unstable();
        spellings
    }

    /// 統一名稱是否屬於不再使用的欄位
    pub fn is_dropped(&self, canonical: &str) -> bool {
        self.drop.contains(canonical)
    }

    /// 統一後的欄位順序
    pub fn sequence(&self) -> &[&'static str] {
        &self.sequence
    }

    pub fn position(&self, canonical: &str) -> Option<usize> {
        self.sequence.iter().position(|c| *c == canonical)
    }
}

static INCOME: Lazy<ColumnRenameTable> = Lazy::new(|| {
    ColumnRenameTable::build(
        StatementType::Income,
        &[
            ("公司代號", CODE_COLUMN),
            ("公司 代號", CODE_COLUMN),
            ("公司名稱", NAME_COLUMN),
            ("營業收入", "營業收入"),
            ("收益", "收益"),
            ("收入", "收入"),
            ("利息淨收益", "利息淨收益"),
            ("利息以外淨收益", "利息以外淨收益"),
            ("利息以外淨損益", "利息以外淨收益"),
            ("淨收益", "淨收益"),
            ("營業成本", "營業成本"),
            ("支出及費用", "支出及費用"),
            ("支出", "支出"),
            ("呆帳費用、承諾及保證責任準備提存", "呆帳費用、承諾及保證責任準備提存"),
            ("呆帳費用及保證責任準備提存（各項提存）", "呆帳費用、承諾及保證責任準備提存"),
            ("呆帳費用及保證責任準備提存", "呆帳費用、承諾及保證責任準備提存"),
            ("保險負債準備淨變動", "保險負債準備淨變動"),
            ("原始認列生物資產及農產品之利益（損失）", "原始認列生物資產及農產品之利益"),
            ("生物資產當期公允價值減出售成本之變動利益（損失）", "生物資產當期公允價值減出售成本之變動利益"),
            ("營業毛利（毛損）", "營業毛利"),
            ("未實現銷貨（損）益", "未實現銷貨利益"),
            ("已實現銷貨（損）益", "已實現銷貨利益"),
            ("營業毛利（毛損）淨額", "營業毛利淨額"),
            ("營業費用", "營業費用"),
            ("其他收益及費損淨額", "其他收益及費損"),
            ("營業利益", "營業利益"),
            ("營業利益（損失）", "營業利益"),
            ("營業外收入及支出", "營業外收入及支出"),
            ("營業外損益", "營業外收入及支出"),
            ("稅前淨利（淨損）", "稅前淨利"),
            ("繼續營業單位稅前純益（純損）", "繼續營業單位稅前淨利"),
            ("繼續營業單位稅前淨利（淨損）", "繼續營業單位稅前淨利"),
            ("繼續營業單位稅前損益", "繼續營業單位稅前淨利"),
            ("利益（淨損）", "利益"),
            ("所得稅費用（利益）", "所得稅費用"),
            ("所得稅（費用）利益", "所得稅費用"),
            ("所得稅利益（費用）", "所得稅費用"),
            ("繼續營業單位本期淨利（淨損）", "繼續營業單位本期淨利"),
            ("繼續營業單位本期純益（純損）", "繼續營業單位本期淨利"),
            ("繼續營業單位本期稅後淨利（淨損）", "繼續營業單位本期淨利"),
            ("停業單位損益", "停業單位損益"),
            ("合併前非屬共同控制股權損益", "合併前非屬共同控制股權損益"),
            ("本期淨利（淨損）", "本期淨利"),
            ("本期稅後淨利（淨損）", "本期淨利"),
            ("其他綜合損益", "本期其他綜合損益"),
            ("其他綜合損益（淨額）", "本期其他綜合損益"),
            ("其他綜合損益（稅後淨額）", "本期其他綜合損益"),
            ("本期其他綜合損益（稅後淨額）", "本期其他綜合損益"),
            ("其他綜合損益（稅後）", "本期其他綜合損益"),
            ("合併前非屬共同控制股權綜合損益淨額", "合併前非屬共同控制股權綜合損益"),
            ("本期綜合損益總額", "本期綜合損益總額"),
            ("本期綜合損益總額（稅後）", "本期綜合損益總額"),
            ("淨利（淨損）歸屬於母公司業主", "淨利歸屬於母公司業主"),
            ("淨利（損）歸屬於母公司業主", "淨利歸屬於母公司業主"),
            ("淨利（淨損）歸屬於共同控制下前手權益", "淨利歸屬於共同控制下前手權益"),
            ("淨利（損）歸屬於共同控制下前手權益", "淨利歸屬於共同控制下前手權益"),
            ("淨利（淨損）歸屬於非控制權益", "淨利歸屬於非控制權益"),
            ("淨利（損）歸屬於非控制權益", "淨利歸屬於非控制權益"),
            ("綜合損益總額歸屬於母公司業主", "綜合損益總額歸屬於母公司業主"),
            ("綜合損益總額歸屬於共同控制下前手權益", "綜合損益總額歸屬於共同控制下前手權益"),
            ("綜合損益總額歸屬於非控制權益", "綜合損益總額歸屬於非控制權益"),
            ("基本每股盈餘（元）", "每股盈餘"),
            (SECTOR_COLUMN, SECTOR_COLUMN),
        ],
        &["淨收益"],
    )
});

static BALANCE: Lazy<ColumnRenameTable> = Lazy::new(|| {
    ColumnRenameTable::build(
        StatementType::Balance,
        &[
            ("公司代號", CODE_COLUMN),
            ("公司 代號", CODE_COLUMN),
            ("公司名稱", NAME_COLUMN),
            ("流動資產", "流動資產"),
            ("非流動資產", "非流動資產"),
            ("現金及約當現金", "現金及約當現金"),
            ("存放央行及拆借銀行同業", "存放央行及拆借同業"),
            ("存放央行及拆借金融同業", "存放央行及拆借同業"),
            ("透過損益按公允價值衡量之金融資產", "透過損益按公允價值衡量之金融資產"),
            ("備供出售金融資產－淨額", "備供出售金融資產"),
            ("透過其他綜合損益按公允價值衡量之金融資產", "透過其他綜合損益按公允價值衡量之金融資產"),
            ("按攤銷後成本衡量之債務工具投資", "按攤銷後成本衡量之債務工具投資"),
            ("避險之金融資產", "避險之金融資產"),
            ("避險之衍生金融資產淨額", "避險之金融資產"),
            ("避險之衍生金融資產", "避險之金融資產"),
            ("附賣回票券及債券投資", "附賣回票券及債券投資"),
            ("附賣回票券及債券投資淨額", "附賣回票券及債券投資"),
            ("應收款項", "應收款項"),
            ("應收款項－淨額", "應收款項"),
            ("本期所得稅資產", "本期所得稅資產"),
            ("當期所得稅資產", "本期所得稅資產"),
            ("待出售資產", "待出售資產"),
            ("待出售資產－淨額", "待出售資產"),
            ("Unnamed: 12", "待分配予業主之資產"),
            ("待分配予業主之資產（或處分群組）", "待分配予業主之資產"),
            ("待分配予業主之資產－淨額", "待分配予業主之資產"),
            ("貼現及放款－淨額", "貼現及放款"),
            ("持有至到期日金融資產－淨額", "持有至到期日金融資產"),
            ("投資", "投資"),
            ("再保險合約資產", "再保險合約資產"),
            ("再保險合約資產－淨額", "再保險合約資產"),
            ("採用權益法之投資－淨額", "採用權益法之投資"),
            ("受限制資產－淨額", "受限制資產"),
            ("其他金融資產－淨額", "其他金融資產"),
            ("投資性不動產－淨額", "投資性不動產"),
            ("投資性不動產投資－淨額", "投資性不動產"),
            ("不動產及設備", "不動產及設備"),
            ("不動產及設備－淨額", "不動產及設備"),
            ("使用權資產", "使用權資產"),
            ("使用權資產－淨額", "使用權資產"),
            ("無形資產", "無形資產"),
            ("無形資產－淨額", "無形資產"),
            ("遞延所得稅資產", "遞延所得稅資產"),
            ("其他資產", "其他資產"),
            ("其他資產－淨額", "其他資產"),
            ("分離帳戶保險商品資產", "分離帳戶保險商品資產"),
            ("資產總計", "資產總計"),
            ("資產總額", "資產總計"),
            ("資產合計", "資產總計"),
            ("流動負債", "流動負債"),
            ("非流動負債", "非流動負債"),
            ("短期債務", "短期債務"),
            ("央行及銀行同業存款", "央行及同業存款"),
            ("央行及金融同業存款", "央行及同業存款"),
            ("央行及同業融資", "央行及同業融資"),
            ("透過損益按公允價值衡量之金融負債", "透過損益按公允價值衡量之金融負債"),
            ("避險之金融負債", "避險之金融負債"),
            ("避險之衍生金融負債－淨額", "避險之金融負債"),
            ("避險之衍生金融負債", "避險之金融負債"),
            ("附買回票券及債券負債", "附買回票券及債券負債"),
            ("應付商業本票－淨額", "應付商業本票"),
            ("應付款項", "應付款項"),
            ("本期所得稅負債", "本期所得稅負債"),
            ("當期所得稅負債", "本期所得稅負債"),
            ("與待出售資產直接相關之負債", "與待出售資產直接相關之負債"),
            ("存款及匯款", "存款及匯款"),
            ("應付債券", "應付債券"),
            ("應付金融債券", "應付債券"),
            ("應付公司債", "應付公司債"),
            ("其他借款", "其他借款"),
            ("特別股負債", "特別股負債"),
            ("其他金融負債", "其他金融負債"),
            ("以成本衡量之金融負債", "以成本衡量之金融負債"),
            ("租賃負債", "租賃負債"),
            ("保險負債", "保險負債"),
            ("具金融商品性質之保險契約準備", "具金融商品性質之保險契約準備"),
            ("外匯價格變動準備", "外匯價格變動準備"),
            ("負債準備", "負債準備"),
            ("遞延所得稅負債", "遞延所得稅負債"),
            ("其他負債", "其他負債"),
            ("分離帳戶保險商品負債", "分離帳戶保險商品負債"),
            ("負債總計", "負債總計"),
            ("負債總額", "負債總計"),
            ("負債合計", "負債總計"),
            ("股本", "股本"),
            ("權益─具證券性質之虛擬通貨", "具證券性質之虛擬通貨權益"),
            ("權益－具證券性質之虛擬通貨", "具證券性質之虛擬通貨權益"),
            ("資本公積", "資本公積"),
            ("保留盈餘", "保留盈餘"),
            ("保留盈餘（或累積虧損）", "保留盈餘"),
            ("其他權益", "其他權益"),
            ("庫藏股票", "庫藏股票"),
            ("庫藏股", "庫藏股票"),
            ("歸屬於母公司業主之權益合計", "歸屬於母公司業主之權益合計"),
            ("歸屬於母公司業主權益合計", "歸屬於母公司業主之權益合計"),
            ("歸屬於母公司業主之權益", "歸屬於母公司業主之權益合計"),
            ("共同控制下前手權益", "共同控制下前手權益"),
            ("合併前非屬共同控制股權", "合併前非屬共同控制股權"),
            ("非控制權益", "非控制權益"),
            ("權益總計", "權益總計"),
            ("權益總額", "權益總計"),
            ("權益合計", "權益總計"),
            ("負債及權益總計", "負債及權益總計"),
            ("待註銷股本股數（單位：股）", "待註銷股本股數"),
            ("預收股款（權益項下）之約當發行股數（單位：股）", "預收股款之約當發行股數"),
            ("母公司暨子公司所持有之母公司庫藏股股數（單位：股）", "母公司暨子公司所持有之母公司庫藏股股數"),
            ("母公司暨子公司持有之母公司庫藏股股數（單位：股）", "母公司暨子公司所持有之母公司庫藏股股數"),
            ("每股參考淨值", "每股淨值"),
            (SECTOR_COLUMN, SECTOR_COLUMN),
        ],
        // 後三項為 IFRS 9 之前的科目，只出現在 2018 年以前的報表
        &[
            "負債及權益總計",
            "備供出售金融資產",
            "持有至到期日金融資產",
            "以成本衡量之金融負債",
        ],
    )
});

static CASH_FLOW: Lazy<ColumnRenameTable> = Lazy::new(|| {
    ColumnRenameTable::build(
        StatementType::CashFlow,
        &[
            ("公司代號", CODE_COLUMN),
            ("公司 代號", CODE_COLUMN),
            ("公司名稱", NAME_COLUMN),
            ("營業活動之淨現金流入（流出）", "營業活動之淨現金流入"),
            ("投資活動之淨現金流入（流出）", "投資活動之淨現金流入"),
            ("籌資活動之淨現金流入（流出）", "籌資活動之淨現金流入"),
            ("匯率變動對現金及約當現金之影響", "匯率變動對現金及約當現金之影響"),
            ("本期現金及約當現金增加（減少）數", "本期現金及約當現金增加數"),
            ("期初現金及約當現金餘額", "期初現金及約當現金"),
            ("期末現金及約當現金餘額", "期末現金及約當現金"),
            (SECTOR_COLUMN, SECTOR_COLUMN),
        ],
        &[],
    )
});

static RATIO: Lazy<ColumnRenameTable> = Lazy::new(|| {
    ColumnRenameTable::build(
        StatementType::Ratio,
        &[
            ("公司代號", CODE_COLUMN),
            ("公司名稱", NAME_COLUMN),
            ("營業收入 (百萬元)", "營業收入"),
            ("毛利率(%) (營業毛利)/ (營業收入)", "毛利率"),
            ("營業利益率(%) (營業利益)/ (營業收入)", "營業利益率"),
            ("稅前純益率(%) (稅前純益)/ (營業收入)", "稅前純益率"),
            ("稅後純益率(%) (稅後純益)/ (營業收入)", "稅後純益率"),
            (SECTOR_COLUMN, SECTOR_COLUMN),
        ],
        &["營業收入"],
    )
});

/// 取得報表的欄位對照表
pub fn table_for(statement: StatementType) -> &'static ColumnRenameTable {
    match statement {
        StatementType::Income => &INCOME,
        StatementType::Balance => &BALANCE,
        StatementType::CashFlow => &CASH_FLOW,
        StatementType::Ratio => &RATIO,
    }
}
