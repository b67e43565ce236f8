/// 公開資訊觀測站
pub mod mops;
