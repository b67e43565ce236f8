/// 月營收 CSV 匯入
pub mod import;
/// 衍生欄位計算
pub mod metrics;
pub mod record;
/// 儲存介面
pub mod store;
