//! webcrud-config - 配置加载库

use std::collections::HashMap;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::Secret;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Load(Box::new(err))
    }
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 遥测配置
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// 生产环境输出 JSON 日志
    #[serde(default)]
    pub json: bool,
    /// 是否安装 Prometheus recorder
    #[serde(default)]
    pub metrics: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json: false,
            metrics: false,
        }
    }
}

/// JWT 配置
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: Secret<String>,
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
    #[serde(default = "default_issuer")]
    pub issuer: String,
    #[serde(default = "default_audience")]
    pub audience: String,
}

fn default_expires_in() -> i64 {
    3600
}

fn default_issuer() -> String {
    "webcrud".to_string()
}

fn default_audience() -> String {
    "webcrud-api".to_string()
}

/// 单个资源的路由与权限表
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceConfig {
    pub one_slug: String,
    #[serde(default)]
    pub all_slug: String,
    /// 角色名 -> 允许的操作名
    #[serde(default)]
    pub permissions: HashMap<String, Vec<String>>,
}

/// CRUD 分发配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CrudConfig {
    /// CORS 允许的源；为空时不限制
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    /// 权限不足时返回 403，而不是静默完成请求
    #[serde(default)]
    pub deny_with_forbidden: bool,
    #[serde(default)]
    pub resources: HashMap<String, ResourceConfig>,
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app_name: String,
    #[serde(default = "default_app_env")]
    pub app_env: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub crud: CrudConfig,
    pub jwt: JwtConfig,
}

fn default_app_env() -> String {
    "development".to_string()
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 合并顺序：`default.toml` -> `{APP_ENV}.toml` -> `APP_*` 环境变量（`__` 分隔层级）
    ///
    /// `app_env` 始终等于 `APP_ENV`（未设置时为 development），文件中的值会被覆盖。
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| default_app_env());

        let figment = Figment::new()
            .merge(Toml::file(format!("{}/default.toml", config_dir)))
            .merge(Toml::file(format!("{}/{}.toml", config_dir, env)))
            .merge(Env::prefixed("APP_").split("__"))
            .merge(Serialized::default("app_env", &env));

        Self::from_figment(figment)
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (name, resource) in &self.crud.resources {
            if resource.one_slug.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "resource `{}` has an empty one_slug",
                    name
                )));
            }
            if resource.one_slug == resource.all_slug {
                return Err(ConfigError::Invalid(format!(
                    "resource `{}` uses the same slug for single and bulk routes",
                    name
                )));
            }
        }
        Ok(())
    }

    /// 是否为开发环境
    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }
}

#[cfg(test)]
mod tests;
