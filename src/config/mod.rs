use std::{
    env,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::Result;
use config::{Config as config_config, File as config_file};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

const CONFIG_PATH: &str = "app.json";

#[derive(Serialize, Deserialize, Default, Debug, Clone)]
pub struct App {
    #[serde(default)]
    pub postgresql: PostgreSQL,
    #[serde(default)]
    pub mops: Mops,
    #[serde(default)]
    pub log: Log,
}

const POSTGRESQL_HOST: &str = "POSTGRESQL_HOST";
const POSTGRESQL_PORT: &str = "POSTGRESQL_PORT";
const POSTGRESQL_USER: &str = "POSTGRESQL_USER";
const POSTGRESQL_PASSWORD: &str = "POSTGRESQL_PASSWORD";
const POSTGRESQL_DB: &str = "POSTGRESQL_DB";

#[derive(Serialize, Deserialize, Default, Debug, Clone)]
pub struct PostgreSQL {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: i32,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub db: String,
}

const MOPS_HOST: &str = "MOPS_HOST";
const MOPS_MIN_DELAY_SECS: &str = "MOPS_MIN_DELAY_SECS";
const MOPS_MAX_DELAY_SECS: &str = "MOPS_MAX_DELAY_SECS";
const MOPS_START_YEAR: &str = "MOPS_START_YEAR";

/// 公開資訊觀測站
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Mops {
    #[serde(default = "Mops::default_host")]
    pub host: String,
    /// 兩次請求之間最少等待秒數
    #[serde(default = "Mops::default_min_delay_secs")]
    pub min_delay_secs: u64,
    /// 兩次請求之間最多等待秒數
    #[serde(default = "Mops::default_max_delay_secs")]
    pub max_delay_secs: u64,
    /// 回補歷史資料的起始年度，在此之前的網頁格式不支援
    #[serde(default = "Mops::default_start_year")]
    pub start_year: i32,
}

impl Mops {
    fn default_host() -> String {
        "mopsov.twse.com.tw".to_string()
    }

    fn default_min_delay_secs() -> u64 {
        2
    }

    fn default_max_delay_secs() -> u64 {
        5
    }

    fn default_start_year() -> i32 {
        2013
    }
}

impl Default for Mops {
    fn default() -> Self {
        Mops {
            host: Mops::default_host(),
            min_delay_secs: Mops::default_min_delay_secs(),
            max_delay_secs: Mops::default_max_delay_secs(),
            start_year: Mops::default_start_year(),
        }
    }
}

const LOG_LEVEL: &str = "LOG_LEVEL";
const LOG_DIR: &str = "LOG_DIR";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Log {
    #[serde(default = "Log::default_level")]
    pub level: String,
    #[serde(default = "Log::default_dir")]
    pub dir: String,
}

impl Log {
    fn default_level() -> String {
        "info".to_string()
    }

    fn default_dir() -> String {
        "log".to_string()
    }
}

impl Default for Log {
    fn default() -> Self {
        Log {
            level: Log::default_level(),
            dir: Log::default_dir(),
        }
    }
}

pub static SETTINGS: Lazy<App> = Lazy::new(|| App::load(&config_path()));

impl App {
    /// 讀取設定檔，失敗時改用環境變數
    ///
    /// logging 依賴設定，此時尚未初始化，錯誤只能寫到 stderr。
    fn load(config_path: &Path) -> App {
        App::get(config_path).unwrap_or_else(|why| {
            eprintln!("I can't read the config context because {:?}", why);
            App::from_env()
        })
    }

    fn get(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let config: App = config_config::builder()
                .add_source(config_file::from(config_path.to_path_buf()))
                .build()?
                .try_deserialize()?;
            return Ok(config.override_with_env());
        }

        Ok(App::from_env())
    }

    /// 從 env 中讀取設定值
    fn from_env() -> Self {
        App::default().override_with_env()
    }

    /// 將來至於 env 的設定值覆蓋掉 json 上的設定值
    fn override_with_env(mut self) -> Self {
        if let Ok(host) = env::var(POSTGRESQL_HOST) {
            self.postgresql.host = host;
        }

        if let Ok(port) = env::var(POSTGRESQL_PORT) {
            self.postgresql.port = i32::from_str(&port).unwrap_or(5432);
        }

        if self.postgresql.port == 0 {
            self.postgresql.port = 5432;
        }

        if let Ok(user) = env::var(POSTGRESQL_USER) {
            self.postgresql.user = user;
        }

        if let Ok(password) = env::var(POSTGRESQL_PASSWORD) {
            self.postgresql.password = password;
        }

        if let Ok(db) = env::var(POSTGRESQL_DB) {
            self.postgresql.db = db;
        }

        if let Ok(host) = env::var(MOPS_HOST) {
            self.mops.host = host;
        }

        if let Ok(secs) = env::var(MOPS_MIN_DELAY_SECS) {
            self.mops.min_delay_secs = u64::from_str(&secs).unwrap_or(self.mops.min_delay_secs);
        }

        if let Ok(secs) = env::var(MOPS_MAX_DELAY_SECS) {
            self.mops.max_delay_secs = u64::from_str(&secs).unwrap_or(self.mops.max_delay_secs);
        }

        if self.mops.max_delay_secs < self.mops.min_delay_secs {
            self.mops.max_delay_secs = self.mops.min_delay_secs;
        }

        if let Ok(year) = env::var(MOPS_START_YEAR) {
            self.mops.start_year = i32::from_str(&year).unwrap_or(self.mops.start_year);
        }

        if let Ok(level) = env::var(LOG_LEVEL) {
            self.log.level = level;
        }

        if let Ok(dir) = env::var(LOG_DIR) {
            self.log.dir = dir;
        }

        self
    }
}

fn config_path() -> PathBuf {
    env::current_dir()
        .map(|dir| dir.join(CONFIG_PATH))
        .unwrap_or_else(|_| PathBuf::from(CONFIG_PATH))
}
