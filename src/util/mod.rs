/// 日期與財報期間
pub mod datetime;
/// HTTP 請求
pub mod http;
/// 文字與數值處理
pub mod text;
