use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub google: GoogleConfig,
    #[serde(default)]
    pub moysklad: MoySkladConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GoogleConfig {
    /// Идентификатор целевой таблицы
    #[serde(default)]
    pub spreadsheet_id: String,
    /// JSON-ключ сервисного аккаунта с правом записи в таблицу
    #[serde(default = "default_credentials_file")]
    pub credentials_file: String,
    #[serde(default = "default_sheets_api_url")]
    pub sheets_api_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MoySkladConfig {
    #[serde(default = "default_moysklad_api_url")]
    pub api_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Лимит строк отчёта об остатках (одна страница)
    #[serde(default = "default_stock_limit")]
    pub stock_limit: u32,
    /// Лимит документов заказов/отгрузок (одна страница)
    #[serde(default = "default_document_limit")]
    pub document_limit: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SyncConfig {
    /// Диапазон с кабинетами: название, логин, пароль
    #[serde(default = "default_cabinets_range")]
    pub cabinets_range: String,
    /// Обрезать пробелы в текстовых полях МойСклад
    #[serde(default = "default_true")]
    pub trim_strings: bool,
    #[serde(default = "default_max_parallel_cabinets")]
    pub max_parallel_cabinets: usize,
}

fn default_credentials_file() -> String {
    "credentials.json".to_string()
}

fn default_sheets_api_url() -> String {
    "https://sheets.googleapis.com/v4/spreadsheets".to_string()
}

fn default_moysklad_api_url() -> String {
    "https://api.moysklad.ru/api/remap/1.2".to_string()
}

fn default_user_agent() -> String {
    "mysklad-sync-bot".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_stock_limit() -> u32 {
    1000
}

fn default_document_limit() -> u32 {
    100
}

fn default_cabinets_range() -> String {
    "основа!A2:C".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_parallel_cabinets() -> usize {
    4
}

impl Default for MoySkladConfig {
    fn default() -> Self {
        Self {
            api_url: default_moysklad_api_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            stock_limit: default_stock_limit(),
            document_limit: default_document_limit(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            cabinets_range: default_cabinets_range(),
            trim_strings: true,
            max_parallel_cabinets: default_max_parallel_cabinets(),
        }
    }
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[google]
spreadsheet_id = ""
credentials_file = "credentials.json"
"#;

impl Config {
    /// Переопределить настройки из окружения (SPREADSHEET_ID, GOOGLE_CREDENTIALS_FILE)
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(id) = lookup("SPREADSHEET_ID").filter(|v| !v.trim().is_empty()) {
            self.google.spreadsheet_id = id.trim().to_string();
        }
        if let Some(path) = lookup("GOOGLE_CREDENTIALS_FILE").filter(|v| !v.trim().is_empty()) {
            self.google.credentials_file = path.trim().to_string();
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.google.spreadsheet_id.trim().is_empty() {
            anyhow::bail!("spreadsheet_id не задан: укажите SPREADSHEET_ID в .env или [google] в config.toml");
        }
        if self.sync.max_parallel_cabinets == 0 {
            anyhow::bail!("sync.max_parallel_cabinets должен быть больше нуля");
        }
        Ok(())
    }
}

/// Load configuration from config.toml file
///
/// Search order:
/// 1. Next to the executable (for production)
/// 2. Falls back to embedded default config
///
/// Environment (including `.env`, loaded by the caller) is applied on top.
pub fn load_config() -> anyhow::Result<Config> {
    let mut config = read_config_file()?;
    config.apply_env_overrides(|key| std::env::var(key).ok());
    Ok(config)
}

fn read_config_file() -> anyhow::Result<Config> {
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let config_path = exe_dir.join("config.toml");

            if config_path.exists() {
                tracing::info!("Loading config from: {}", config_path.display());
                let contents = std::fs::read_to_string(&config_path)?;
                let config: Config = toml::from_str(&contents)?;
                return Ok(config);
            } else {
                tracing::warn!("config.toml not found at: {}", config_path.display());
            }
        }
    }

    tracing::info!("Using default embedded configuration");
    let config: Config = toml::from_str(DEFAULT_CONFIG)?;
    Ok(config)
}

/// Get the service account key path from configuration
/// Resolves relative paths relative to the executable directory,
/// falling back to the current directory when the file is not there
pub fn get_credentials_path(config: &Config) -> PathBuf {
    let key_path = Path::new(&config.google.credentials_file);

    if key_path.is_absolute() {
        return key_path.to_path_buf();
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let resolved = exe_dir.join(key_path);
            if resolved.exists() {
                return resolved;
            }
        }
    }

    key_path.to_path_buf()
}
