/// 季報彙總表
pub mod financial_statement;
/// 台股月營收
pub mod revenue;
