//! Configuration management for fintrack
//!
//! This module handles loading, validation, and management of
//! fintrack configuration from YAML files and the process environment.

pub mod error;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub use error::{ConfigError, ConfigResult};

/// Environment variable holding the Notion integration token
pub const ENV_NOTION_TOKEN: &str = "NOTION_TOKEN";
/// Environment variable holding the transactions database id
pub const ENV_TRANSACTIONS_DATABASE: &str = "FINANCE_TRACKER_DATABASE_ID";
/// Environment variable holding the sub-categories database id
pub const ENV_SUB_CATEGORIES_DATABASE: &str = "SUB_CATEGORIES_DATABASE_ID";
/// Environment variable holding the main-categories database id
pub const ENV_MAIN_CATEGORIES_DATABASE: &str = "MAIN_CATEGORIES_DATABASE_ID";
/// Environment variable overriding the chart output directory
pub const ENV_OUTPUT_DIR: &str = "FINTRACK_OUTPUT_DIR";
/// Environment variable enabling the dashboard password
pub const ENV_DASHBOARD_PASSWORD: &str = "FINTRACK_PASSWORD";

/// Setting name reported when the transactions database id is missing
pub fn transactions_database_field() -> String {
    format!("notion.transactions_database (or {})", ENV_TRANSACTIONS_DATABASE)
}

/// Where a loaded configuration came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOrigin {
    File,
    Defaults,
}

// ==================== Configuration Types ====================

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Per-route request budget for chart generation
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Basic authentication (optional)
    #[serde(default)]
    pub auth: Option<AuthConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            rate_limit: RateLimitConfig::default(),
            auth: None,
        }
    }
}

/// Basic authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// When unset any user name is accepted and only the password is checked
    #[serde(default)]
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: String,
}

impl AuthConfig {
    pub fn accepts(&self, username: &str, password: &str) -> bool {
        let user_ok = self.username.as_deref().map_or(true, |expected| expected == username);
        user_ok && self.password == password
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Fixed-window rate limit applied to chart routes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Requests allowed per window
    #[serde(default = "default_rate_requests")]
    pub requests: u32,
    /// Window length in seconds
    #[serde(default = "default_rate_window")]
    pub per_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests: default_rate_requests(),
            per_seconds: default_rate_window(),
        }
    }
}

fn default_rate_requests() -> u32 {
    10
}

fn default_rate_window() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

/// Property (column) names used in the Notion databases
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnNames {
    #[serde(default = "default_name_column")]
    pub name: String,
    #[serde(default = "default_date_column")]
    pub date: String,
    #[serde(default = "default_amount_column")]
    pub amount: String,
    #[serde(default = "default_account_column")]
    pub account: String,
    #[serde(default = "default_cash_flow_column")]
    pub cash_flow_type: String,
    #[serde(default = "default_business_column")]
    pub business_related: String,
    #[serde(default = "default_sub_category_column")]
    pub sub_category: String,
    /// Relation on the sub-categories table pointing at the main category
    #[serde(default = "default_main_relation_column")]
    pub main_category_relation: String,
    /// Optional rollup on the transactions table exposing the main category
    #[serde(default)]
    pub main_category_rollup: Option<String>,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            name: default_name_column(),
            date: default_date_column(),
            amount: default_amount_column(),
            account: default_account_column(),
            cash_flow_type: default_cash_flow_column(),
            business_related: default_business_column(),
            sub_category: default_sub_category_column(),
            main_category_relation: default_main_relation_column(),
            main_category_rollup: None,
        }
    }
}

fn default_name_column() -> String {
    "Name".to_string()
}

fn default_date_column() -> String {
    "Date".to_string()
}

fn default_amount_column() -> String {
    "Amount".to_string()
}

fn default_account_column() -> String {
    "Account".to_string()
}

fn default_cash_flow_column() -> String {
    "Cash Flow Type".to_string()
}

fn default_business_column() -> String {
    "Business Related?".to_string()
}

fn default_sub_category_column() -> String {
    "Sub Category".to_string()
}

fn default_main_relation_column() -> String {
    "Main Finance Categories".to_string()
}

/// Notion workspace access
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotionConfig {
    /// Integration token (usually supplied through NOTION_TOKEN)
    #[serde(default, skip_serializing)]
    pub token: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Value sent in the Notion-Version header
    #[serde(default = "default_notion_version")]
    pub version: String,
    /// Records requested per page (Notion caps this at 100)
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Per-request timeout
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub transactions_database: Option<String>,
    #[serde(default)]
    pub sub_categories_database: Option<String>,
    #[serde(default)]
    pub main_categories_database: Option<String>,
    #[serde(default)]
    pub columns: ColumnNames,
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_base: default_api_base(),
            version: default_notion_version(),
            page_size: default_page_size(),
            timeout_secs: default_timeout(),
            transactions_database: None,
            sub_categories_database: None,
            main_categories_database: None,
            columns: ColumnNames::default(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.notion.com/v1".to_string()
}

fn default_notion_version() -> String {
    "2022-06-28".to_string()
}

fn default_page_size() -> u32 {
    100
}

fn default_timeout() -> u64 {
    60
}

/// Where generated HTML charts are written
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_chart_filename")]
    pub default_filename: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            default_filename: default_chart_filename(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./charts")
}

fn default_chart_filename() -> String {
    "chart.html".to_string()
}

/// Chart and visualization settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Symbol prefixed to amounts in annotations
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
    /// Number of decimal places in annotations
    #[serde(default = "default_decimal_places")]
    pub decimal_places: u32,
    /// Main category name -> hex colour
    #[serde(default)]
    pub category_colors: HashMap<String, String>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            currency_symbol: default_currency_symbol(),
            decimal_places: default_decimal_places(),
            category_colors: HashMap::new(),
        }
    }
}

fn default_currency_symbol() -> String {
    "¥".to_string()
}

fn default_decimal_places() -> u32 {
    2
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Notion access and column names
    #[serde(default)]
    pub notion: NotionConfig,
    /// Chart artifact output
    #[serde(default)]
    pub output: OutputConfig,
    /// Chart settings
    #[serde(default)]
    pub charts: ChartConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => ConfigError::IoError {
                path: path.display().to_string(),
                message: e.to_string(),
            },
        })?;

        let config = Self::from_yaml(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the file if it exists, otherwise start from defaults.
    /// Environment overrides are applied in both cases.
    pub fn load_or_default(path: &Path) -> ConfigResult<(Self, ConfigOrigin)> {
        let (mut config, origin) = if path.exists() {
            (Self::load(path)?, ConfigOrigin::File)
        } else {
            (Self::default(), ConfigOrigin::Defaults)
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok((config, origin))
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(content: &str) -> ConfigResult<Self> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::InvalidYaml {
            message: e.to_string(),
        })
    }

    /// Apply overrides from a variable lookup (the process environment in production)
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = non_empty(ENV_NOTION_TOKEN) {
            self.notion.token = token;
        }
        if let Some(id) = non_empty(ENV_TRANSACTIONS_DATABASE) {
            self.notion.transactions_database = Some(id);
        }
        if let Some(id) = non_empty(ENV_SUB_CATEGORIES_DATABASE) {
            self.notion.sub_categories_database = Some(id);
        }
        if let Some(id) = non_empty(ENV_MAIN_CATEGORIES_DATABASE) {
            self.notion.main_categories_database = Some(id);
        }
        if let Some(dir) = non_empty(ENV_OUTPUT_DIR) {
            self.output.dir = PathBuf::from(dir);
        }
        if let Some(password) = non_empty(ENV_DASHBOARD_PASSWORD) {
            match self.server.auth.as_mut() {
                Some(auth) => auth.password = password,
                None => {
                    self.server.auth = Some(AuthConfig {
                        username: None,
                        password,
                    })
                }
            }
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> ConfigResult<()> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                reason: "Port must be greater than 0".to_string(),
            });
        }

        if self.server.rate_limit.enabled
            && (self.server.rate_limit.per_seconds == 0 || self.server.rate_limit.requests == 0)
        {
            return Err(ConfigError::InvalidValue {
                field: "server.rate_limit".to_string(),
                reason: "Requests and window must both be greater than 0".to_string(),
            });
        }

        if let Some(auth) = &self.server.auth {
            if auth.password.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "server.auth.password".to_string(),
                    reason: "Password must not be empty".to_string(),
                });
            }
        }

        if self.notion.page_size == 0 || self.notion.page_size > 100 {
            return Err(ConfigError::InvalidValue {
                field: "notion.page_size".to_string(),
                reason: "Page size must be between 1 and 100".to_string(),
            });
        }

        if self.charts.decimal_places > 10 {
            return Err(ConfigError::InvalidValue {
                field: "charts.decimal_places".to_string(),
                reason: "Decimal places must be between 0 and 10".to_string(),
            });
        }

        Ok(())
    }

    /// Check that everything needed to talk to Notion is present
    pub fn require_remote(&self) -> ConfigResult<()> {
        if self.notion.token.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: format!("notion.token (or {})", ENV_NOTION_TOKEN),
            });
        }
        if self.transactions_database().is_none() {
            return Err(ConfigError::MissingField {
                field: transactions_database_field(),
            });
        }
        Ok(())
    }

    /// The transactions database id, which every chart needs
    pub fn transactions_database(&self) -> Option<&str> {
        self.notion
            .transactions_database
            .as_deref()
            .filter(|id| !id.trim().is_empty())
    }

    /// Generate a default configuration file
    pub fn generate_default() -> &'static str {
        include_str!("../templates/default_config.yaml")
    }
}
