//! 配置管理模块

use crate::BrokerError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "config/broker.toml";

/// bcrypt 只使用密码的前 72 字节
pub const BCRYPT_MAX_PASSWORD_BYTES: usize = 72;

/// 单个 UTF-16 码元对应的最大 UTF-8 字节数（代理对 2 码元共 4 字节）
const MAX_UTF8_BYTES_PER_UTF16_UNIT: usize = 3;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrokerConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub accounts: AccountRules,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub venue: VenueConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_name")]
    pub name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            log_level: default_log_level(),
        }
    }
}

/// 开户校验规则（闭区间，按 UTF-16 码元计数）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRules {
    #[serde(default = "default_name_min_len")]
    pub name_min_len: usize,
    #[serde(default = "default_name_max_len")]
    pub name_max_len: usize,
    #[serde(default = "default_secret_min_len")]
    pub secret_min_len: usize,
    #[serde(default = "default_secret_max_len")]
    pub secret_max_len: usize,
}

impl Default for AccountRules {
    fn default() -> Self {
        Self {
            name_min_len: default_name_min_len(),
            name_max_len: default_name_max_len(),
            secret_min_len: default_secret_min_len(),
            secret_max_len: default_secret_max_len(),
        }
    }
}

impl AccountRules {
    pub fn name_len_ok(&self, name: &str) -> bool {
        (self.name_min_len..=self.name_max_len).contains(&name.encode_utf16().count())
    }

    pub fn secret_len_ok(&self, secret: &str) -> bool {
        (self.secret_min_len..=self.secret_max_len).contains(&secret.encode_utf16().count())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// bcrypt 代价因子 (4..=31)
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// 登录成功时推送的欢迎语
    #[serde(default = "default_welcome_message")]
    pub welcome_message: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            welcome_message: default_welcome_message(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueConfig {
    #[serde(default = "default_venue_name")]
    pub name: String,
    #[serde(default)]
    pub quotes: Vec<QuoteEntry>,
}

impl Default for VenueConfig {
    fn default() -> Self {
        Self {
            name: default_venue_name(),
            quotes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteEntry {
    pub symbol: String,
    pub quote: String,
}

// 默认值函数
fn default_server_name() -> String {
    "SafeTrade".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_name_min_len() -> usize {
    4
}
fn default_name_max_len() -> usize {
    10
}
fn default_secret_min_len() -> usize {
    2
}
fn default_secret_max_len() -> usize {
    10
}
fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}
fn default_welcome_message() -> String {
    "Welcome to SafeTrade!".to_string()
}
fn default_venue_name() -> String {
    "SafeTrade Exchange".to_string()
}

impl BrokerConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, BrokerError> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| BrokerError::Config(format!("Failed to parse config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_default() -> Result<Self, BrokerError> {
        Self::load_from_file(DEFAULT_CONFIG_PATH)
    }

    /// 校验区间与 bcrypt 代价
    ///
    /// 最长密码的 UTF-8 字节数不得超过 bcrypt 的截断长度，
    /// 否则只有尾部不同的两个密码会被视为相同
    pub fn validate(&self) -> Result<(), BrokerError> {
        let rules = &self.accounts;
        if rules.name_min_len > rules.name_max_len {
            return Err(BrokerError::Config(format!(
                "name_min_len ({}) > name_max_len ({})",
                rules.name_min_len, rules.name_max_len
            )));
        }
        if rules.secret_min_len > rules.secret_max_len {
            return Err(BrokerError::Config(format!(
                "secret_min_len ({}) > secret_max_len ({})",
                rules.secret_min_len, rules.secret_max_len
            )));
        }
        if rules.secret_max_len.saturating_mul(MAX_UTF8_BYTES_PER_UTF16_UNIT) > BCRYPT_MAX_PASSWORD_BYTES {
            return Err(BrokerError::Config(format!(
                "secret_max_len ({}) may exceed bcrypt's {}-byte password limit",
                rules.secret_max_len, BCRYPT_MAX_PASSWORD_BYTES
            )));
        }
        if !(4..=31).contains(&self.security.bcrypt_cost) {
            return Err(BrokerError::Config(format!(
                "bcrypt_cost must be within 4..=31, got {}",
                self.security.bcrypt_cost
            )));
        }
        Ok(())
    }
}
