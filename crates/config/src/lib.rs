//! 应用配置
//!
//! TOML文件加载，缺省值内建；所有配置段在启动时统一校验。

use std::path::Path;

use anyhow::Result;
use config::{Config as ConfigBuilder, File, FileFormat};
use serde::{Deserialize, Serialize};

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("配置错误: {0}")]
    Configuration(String),
    #[error("配置校验失败: {0}")]
    Validation(String),
}

/// 配置段的统一校验入口
pub trait ConfigValidator {
    fn validate(&self) -> ConfigResult<()>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connection_timeout_seconds: u64,
}

impl ConfigValidator for DatabaseConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "database.url不能为空".to_string(),
            ));
        }
        if self.max_connections == 0 || self.max_connections < self.min_connections {
            return Err(ConfigError::Validation(format!(
                "数据库连接池配置无效: max={}, min={}",
                self.max_connections, self.min_connections
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherConfig {
    pub enabled: bool,
    /// tick间隔（粗粒度轮询，目标每分钟一次）
    pub tick_interval_seconds: u64,
}

impl ConfigValidator for DispatcherConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.tick_interval_seconds == 0 {
            return Err(ConfigError::Validation(
                "dispatcher.tick_interval_seconds必须大于0".to_string(),
            ));
        }
        if self.tick_interval_seconds > 3600 {
            return Err(ConfigError::Validation(
                "dispatcher.tick_interval_seconds不能超过1小时".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SenderConfig {
    /// 出站消息通道的webhook地址
    pub webhook_url: String,
    pub request_timeout_seconds: u64,
}

impl ConfigValidator for SenderConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.webhook_url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "sender.webhook_url不能为空".to_string(),
            ));
        }
        if !self.webhook_url.starts_with("http://") && !self.webhook_url.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "sender.webhook_url必须是http(s)地址: {}",
                self.webhook_url
            )));
        }
        if self.request_timeout_seconds == 0 {
            return Err(ConfigError::Validation(
                "sender.request_timeout_seconds必须大于0".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub dispatcher: DispatcherConfig,
    pub sender: SenderConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://campaign_scheduler.db".to_string(),
                max_connections: 5,
                min_connections: 1,
                connection_timeout_seconds: 30,
            },
            dispatcher: DispatcherConfig {
                enabled: true,
                tick_interval_seconds: 60,
            },
            sender: SenderConfig {
                webhook_url: "http://localhost:9100/messages".to_string(),
                request_timeout_seconds: 15,
            },
        }
    }
}

impl AppConfig {
    /// 加载配置；未找到配置文件时使用内建缺省值
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_path {
            if !Path::new(path).exists() {
                return Err(anyhow::anyhow!("配置文件不存在: {path}"));
            }
            builder = builder.add_source(File::new(path, FileFormat::Toml));
        } else {
            let default_paths = ["config/scheduler.toml", "scheduler.toml"];
            for path in &default_paths {
                if Path::new(path).exists() {
                    builder = builder.add_source(File::new(path, FileFormat::Toml));
                    break;
                }
            }
        }

        let defaults = AppConfig::default();
        let config = builder
            .set_default("database.url", defaults.database.url.clone())?
            .set_default("database.max_connections", defaults.database.max_connections)?
            .set_default("database.min_connections", defaults.database.min_connections)?
            .set_default(
                "database.connection_timeout_seconds",
                defaults.database.connection_timeout_seconds,
            )?
            .set_default("dispatcher.enabled", defaults.dispatcher.enabled)?
            .set_default(
                "dispatcher.tick_interval_seconds",
                defaults.dispatcher.tick_interval_seconds,
            )?
            .set_default("sender.webhook_url", defaults.sender.webhook_url.clone())?
            .set_default(
                "sender.request_timeout_seconds",
                defaults.sender.request_timeout_seconds,
            )?
            .build()?;

        let app_config: AppConfig = config.try_deserialize()?;
        app_config
            .validate()
            .map_err(|e| anyhow::anyhow!("{e}"))?;
        Ok(app_config)
    }
}

impl ConfigValidator for AppConfig {
    fn validate(&self) -> ConfigResult<()> {
        self.database.validate()?;
        self.dispatcher.validate()?;
        self.sender.validate()?;
        Ok(())
    }
}
