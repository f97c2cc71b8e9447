//! 定义 tee_log 的配置结构体。
//!
//! 配置以显式传入的 [`LoggingConfig`] 值表示，不存在进程级的可变默认配置。
//! 可从 TOML（文件或字符串）或 `LOGGER_*` 环境变量加载。

use crate::core::level::Level;
use crate::error::{Result, TeeLogError};
use serde::Deserialize;
use std::str::FromStr;

/// 环境变量前缀
pub const ENV_PREFIX: &str = "LOGGER_";

/// 识别的环境变量键（去掉前缀后的小写形式）
const ENV_KEYS: [&str; 9] = [
    "service",
    "level",
    "namespace",
    "disable_stdout",
    "format_stdout",
    "color_stdout",
    "logstash_uri",
    "logstash_protocol",
    "logstash_timeout_ms",
];

// --- 辅助函数，用于提供配置项的默认值 ---
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_logstash_protocol() -> String {
    "udp".to_string()
}
fn default_logstash_timeout_ms() -> u64 {
    30000
}

/// 控制台输出格式
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// 结构化 JSON
    #[default]
    Json,
    /// 人类可读
    Pretty,
}

impl OutputFormat {
    pub const JSON: &'static str = "json";
    pub const PRETTY: &'static str = "pretty";
}

impl FromStr for OutputFormat {
    type Err = TeeLogError;

    /// 空白名称视为未设置，回退到 JSON
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "" | OutputFormat::JSON => Ok(OutputFormat::Json),
            OutputFormat::PRETTY => Ok(OutputFormat::Pretty),
            other => Err(TeeLogError::InvalidFormat(other.to_string())),
        }
    }
}

/// 网络 sink 传输协议
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NetworkProtocol {
    /// 流式（TCP）
    Tcp,
    /// 数据报（UDP）
    Udp,
}

impl FromStr for NetworkProtocol {
    type Err = TeeLogError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "tcp" => Ok(NetworkProtocol::Tcp),
            "" | "udp" => Ok(NetworkProtocol::Udp),
            other => Err(TeeLogError::config(format!(
                "invalid logstash protocol {}, must be tcp or udp",
                other
            ))),
        }
    }
}

/// tee_log 的顶层配置结构体。
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// 服务名，作为静态字段附加到每条记录
    #[serde(default)]
    pub service: String,
    /// 最低级别；为空时使用 info
    #[serde(default)]
    pub level: String,
    /// `namespace` 上下文字段的初始值
    #[serde(default)]
    pub namespace: String,
    /// 不创建控制台 sink
    #[serde(default = "default_false")]
    pub disable_stdout: bool,
    /// `json` 或 `pretty`；为空时使用 json
    #[serde(default)]
    pub format_stdout: String,
    /// pretty 格式下是否为级别着色
    #[serde(default = "default_true")]
    pub color_stdout: bool,
    /// 非空时创建网络 sink
    #[serde(default)]
    pub logstash_uri: String,
    #[serde(default = "default_logstash_protocol")]
    pub logstash_protocol: String,
    /// 网络 sink 建立连接的超时
    #[serde(default = "default_logstash_timeout_ms")]
    pub logstash_timeout_ms: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            service: String::new(),
            level: String::new(),
            namespace: String::new(),
            disable_stdout: default_false(),
            format_stdout: String::new(),
            color_stdout: default_true(),
            logstash_uri: String::new(),
            logstash_protocol: default_logstash_protocol(),
            logstash_timeout_ms: default_logstash_timeout_ms(),
        }
    }
}

impl LoggingConfig {
    /// 从进程环境变量 `LOGGER_*` 加载配置
    pub fn from_env() -> Result<Self> {
        Self::from_env_vars(std::env::vars())
    }

    /// 从给定的环境变量集合加载配置
    ///
    /// 只识别 `LOGGER_` 前缀下的已知键，其它变量被忽略。
    pub fn from_env_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut builder = config::Config::builder();
        for (name, value) in vars {
            let Some(key) = name.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let key = key.to_lowercase();
            if ENV_KEYS.contains(&key.as_str()) {
                builder = builder.set_override(key, value)?;
            }
        }

        let config: LoggingConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// 是否显式设置了级别
    pub fn has_level(&self) -> bool {
        !self.level.trim().is_empty()
    }

    /// 解析级别名称；未设置时为 info
    pub fn resolved_level(&self) -> Result<Level> {
        if !self.has_level() {
            return Ok(Level::Info);
        }
        self.level.trim().parse()
    }

    /// 解析控制台格式名称；未设置时为 json
    pub fn resolved_format(&self) -> Result<OutputFormat> {
        self.format_stdout.parse()
    }

    /// 解析网络协议名称；未设置时为 udp
    pub fn resolved_protocol(&self) -> Result<NetworkProtocol> {
        self.logstash_protocol.parse()
    }

    /// 是否需要网络 sink
    pub fn network_enabled(&self) -> bool {
        !self.logstash_uri.trim().is_empty()
    }
}

/// 用于从 TOML 文件加载 `LoggingConfig` 的辅助函数。
pub fn load_config_from_file(path: &std::path::Path) -> Result<LoggingConfig> {
    use std::fs;

    if !path.exists() {
        return Err(TeeLogError::ConfigFileMissing(
            path.to_string_lossy().into_owned(),
        ));
    }

    let config_str = fs::read_to_string(path)?;
    load_config_from_str(&config_str)
}

/// 用于从 TOML 字符串加载 `LoggingConfig` 的辅助函数。
pub fn load_config_from_str(config_str: &str) -> Result<LoggingConfig> {
    let config: LoggingConfig = toml::from_str(config_str)
        .map_err(|e| TeeLogError::ConfigError(format!("TOML解析失败: {}", e)))?;

    Ok(config)
}

/// 验证配置的有效性。
///
/// 只检查名称，不建立任何连接。
pub fn validate_config(config: &LoggingConfig) -> Result<()> {
    config.resolved_format()?;
    config.resolved_level()?;

    if config.network_enabled() {
        config.resolved_protocol()?;
        if config.logstash_timeout_ms == 0 {
            return Err(TeeLogError::config(
                "logstash_timeout_ms must be greater than zero",
            ));
        }
    }

    Ok(())
}
