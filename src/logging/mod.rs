use std::{
    fs::{self, File, OpenOptions},
    path::{Path, PathBuf},
    sync::Mutex,
};

use anyhow::{Context, Result};
use chrono::Local;
use tracing_subscriber::{fmt::writer::MakeWriterExt, EnvFilter};

use crate::config::SETTINGS;

/// 初始化日誌，同時輸出到 console 與 log/yyyy-mm-dd_twstock.log
///
/// 重複呼叫不會出錯，只有第一次的設定會生效。
pub fn init() -> Result<()> {
    let log_path = get_log_path(Path::new(&SETTINGS.log.dir), "twstock")?;
    let file = open_log_file(&log_path)?;
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&SETTINGS.log.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .with_writer(std::io::stdout.and(Mutex::new(file)))
        .try_init();

    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }

    Ok(())
}

fn get_log_path(dir: &Path, name: &str) -> Result<PathBuf> {
    if !dir.exists() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    }

    Ok(dir.join(format!("{}_{}.log", Local::now().format("%Y-%m-%d"), name)))
}

fn open_log_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}
