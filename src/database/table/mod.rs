/// 基本財務數字 (累計與單季)
pub mod financial_core;
/// 季報衍生指標
pub mod financial_metrics;
/// 月營收
pub mod monthly_revenue;
/// 季報彙總表
pub mod statement_report;
