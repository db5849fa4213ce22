//! Configuration management
//!
//! 設定は以下の優先順位で読み込まれます:
//! 1. 環境変数
//! 2. dust-gateway.toml 設定ファイル
//! 3. デフォルト値
//!
//! 設定ファイル内では `${VAR_NAME}` 形式で環境変数を展開できます。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::Error;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "dust-gateway.toml";

/// Weekly fine-dust forecast endpoint (AirKorea, data.go.kr)
pub const DEFAULT_BASE_URL: &str =
    "https://apis.data.go.kr/B552584/ArpltnInforInqireSvc/getMinuDustWeekFrcstDspth";

/// Upstream API configuration
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DustApiConfig {
    /// data.go.kr service key, inserted into the query string as issued
    pub service_key: String,

    /// Endpoint URL without query string
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// `numOfRows` query parameter
    #[serde(default = "default_num_of_rows")]
    pub num_of_rows: u32,

    /// `pageNo` query parameter
    #[serde(default = "default_page_no")]
    pub page_no: u32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DustApiConfig {
    fn default() -> Self {
        Self {
            service_key: String::new(),
            base_url: default_base_url(),
            num_of_rows: default_num_of_rows(),
            page_no: default_page_no(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl fmt::Debug for DustApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = if self.service_key.is_empty() { "" } else { "***" };
        f.debug_struct("DustApiConfig")
            .field("service_key", &key)
            .field("base_url", &self.base_url)
            .field("num_of_rows", &self.num_of_rows)
            .field("page_no", &self.page_no)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl DustApiConfig {
    /// Create a configuration with the given service key and defaults elsewhere
    pub fn with_key(service_key: impl Into<String>) -> Self {
        Self {
            service_key: service_key.into(),
            ..Self::default()
        }
    }
}

/// MCP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct McpServerConfig {
    /// Server name advertised to MCP clients
    #[serde(default = "default_server_name")]
    pub server_name: String,

    /// Instructions advertised to MCP clients
    #[serde(default = "default_instructions")]
    pub instructions: String,
}

impl Default for McpServerConfig {
    fn default() -> Self {
        Self {
            server_name: default_server_name(),
            instructions: default_instructions(),
        }
    }
}

/// Main configuration for dust-gateway
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Upstream API configuration
    #[serde(default)]
    pub dust_api: DustApiConfig,

    /// MCP server configuration
    #[serde(default)]
    pub mcp: McpServerConfig,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_num_of_rows() -> u32 {
    100
}

fn default_page_no() -> u32 {
    1
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_server_name() -> String {
    "dust-gateway".to_string()
}

fn default_instructions() -> String {
    "미세먼지 주간예보 조회 도구를 제공합니다. getWeeklyDustByDate 에 날짜(yyyy-MM-dd)를 전달하세요."
        .to_string()
}

impl Config {
    /// 設定ファイルから環境変数を展開する
    ///
    /// `${VAR_NAME}` 形式の文字列を環境変数の値に置換します。
    /// 環境変数が存在しない場合は空文字列になります。
    fn expand_env_vars(value: &str) -> String {
        let mut result = String::new();
        let mut chars = value.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'{') {
                chars.next(); // '{' を消費

                let mut var_name = String::new();
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                    var_name.push(c);
                }

                if let Ok(env_value) = std::env::var(&var_name) {
                    result.push_str(&env_value);
                }
            } else {
                result.push(c);
            }
        }

        result
    }

    /// TOML 文字列から設定を読み込む（環境変数の上書きなし）
    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        let expanded = Self::expand_env_vars(content);
        toml::from_str(&expanded)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// TOML 設定ファイルから設定を読み込む
    ///
    /// # 引数
    /// * `path` - TOML ファイルのパス
    ///
    /// # 環境変数展開
    /// 設定ファイル内の `${VAR_NAME}` は環境変数の値に置換されます。
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        tracing::info!(path = %path.display(), "Loading configuration file");

        let toml_content = std::fs::read_to_string(path)?;

        let mut cfg = Self::from_toml_str(&toml_content)?;

        // 既存の環境変数で上書き（環境変数が優先）
        cfg.apply_env_overrides();
        cfg.validate()?;

        Ok(cfg)
    }

    /// デフォルトパスから設定を読み込む
    ///
    /// `./dust-gateway.toml` があればそれを使い、
    /// なければ環境変数のみから読み込みます。
    pub fn load() -> crate::Result<Self> {
        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            return Self::from_toml_file(DEFAULT_CONFIG_FILE);
        }

        Self::from_env()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut cfg = Self::default();
        cfg.apply_env_overrides();
        cfg.validate()?;
        Ok(cfg)
    }

    /// 環境変数で設定を上書きする
    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("DUST_API_KEY") {
            if !key.is_empty() {
                self.dust_api.service_key = key;
            }
        }

        if let Ok(base_url) = std::env::var("DUST_API_BASE_URL") {
            if !base_url.is_empty() {
                self.dust_api.base_url = base_url;
            }
        }

        if let Ok(timeout) = std::env::var("DUST_API_TIMEOUT_SECS") {
            match timeout.parse() {
                Ok(secs) => self.dust_api.timeout_secs = secs,
                Err(_) => tracing::warn!(value = %timeout, "Ignoring invalid DUST_API_TIMEOUT_SECS"),
            }
        }

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            if !name.is_empty() {
                self.mcp.server_name = name;
            }
        }
    }

    /// Check that required values are present
    pub fn validate(&self) -> crate::Result<()> {
        if self.dust_api.service_key.trim().is_empty() {
            return Err(Error::Config(
                "DUST_API_KEY not set (or dust_api.service_key empty)".to_string(),
            ));
        }
        if self.dust_api.base_url.trim().is_empty() {
            return Err(Error::Config("dust_api.base_url is empty".to_string()));
        }
        Ok(())
    }
}
