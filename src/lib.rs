/// 排程工作
pub mod backfill;
/// 設定檔
pub mod config;
/// 網路爬蟲
pub mod crawler;
/// 資料庫
pub mod database;
/// 共用列舉
pub mod declare;
/// 錯誤與警告
pub mod error;
/// 日誌
pub mod logging;
/// 月營收
pub mod revenue;
/// 季報彙總表
pub mod statement;
/// 工具
pub mod util;
