// 引擎配置与日志配置
//
// 配置可来自 TOML 文件，并可被 REPORT_ENGINE_* 环境变量覆盖。

use crate::data::managers::TomlManager;
use crate::data::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// 解析字符串为日志级别（忽略大小写）
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// 日志输出目标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Console,
    File,
    Both,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LogConfig {
    #[serde(default)]
    pub level: LogLevel,
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default)]
    pub output: LogOutput,
    /// 文件输出目录，None 时使用 ~/.report-engine/logs
    #[serde(default)]
    pub file_path: Option<String>,
}

/// 位置占位符风格
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderStyle {
    /// $1, $2 ...（PostgreSQL）
    #[default]
    Dollar,
    /// @p1, @p2 ...（SQL Server）
    AtP,
    /// ?（按位置）
    Question,
}

impl PlaceholderStyle {
    /// 第 index 个（从 1 开始）位置占位符
    pub fn marker(&self, index: usize) -> String {
        match self {
            PlaceholderStyle::Dollar => format!("${index}"),
            PlaceholderStyle::AtP => format!("@p{index}"),
            PlaceholderStyle::Question => "?".to_string(),
        }
    }
}

fn default_sweep_secs() -> u64 {
    300
}

fn default_format() -> String {
    "json".to_string()
}

/// 引擎配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 报表定义目录
    pub definitions_dir: PathBuf,
    /// 缓存清扫周期（秒）
    #[serde(default = "default_sweep_secs")]
    pub sweep_interval_secs: u64,
    /// 请求未指定格式时使用的格式
    #[serde(default = "default_format")]
    pub default_format: String,
    #[serde(default)]
    pub placeholder_style: PlaceholderStyle,
    /// 是否监听定义目录并自动重载
    #[serde(default)]
    pub watch_definitions: bool,
    #[serde(default)]
    pub log: LogConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            definitions_dir: PathBuf::from("reports"),
            sweep_interval_secs: default_sweep_secs(),
            default_format: default_format(),
            placeholder_style: PlaceholderStyle::default(),
            watch_definitions: false,
            log: LogConfig::default(),
        }
    }
}

impl EngineConfig {
    /// 指定定义目录，其余使用默认值
    pub fn new(definitions_dir: impl Into<PathBuf>) -> Self {
        Self {
            definitions_dir: definitions_dir.into(),
            ..Self::default()
        }
    }

    /// 从 TOML 文件读取配置
    pub fn from_file(path: &Path) -> Result<Self> {
        TomlManager::new().read_as(path)
    }

    /// 以默认值为基础应用环境变量覆盖
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// 应用 REPORT_ENGINE_* 环境变量覆盖
    pub fn apply_env(&mut self) {
        if let Ok(dir) = std::env::var("REPORT_ENGINE_DEFINITIONS_DIR") {
            self.definitions_dir = PathBuf::from(dir);
        }

        if let Ok(secs) = std::env::var("REPORT_ENGINE_SWEEP_SECS") {
            match secs.parse() {
                Ok(secs) => self.sweep_interval_secs = secs,
                Err(_) => tracing::warn!(value = %secs, "REPORT_ENGINE_SWEEP_SECS 无效，忽略"),
            }
        }

        if let Ok(watch) = std::env::var("REPORT_ENGINE_WATCH") {
            self.watch_definitions = watch.parse().unwrap_or(self.watch_definitions);
        }

        if let Ok(level) = std::env::var("REPORT_ENGINE_LOG_LEVEL") {
            if let Some(level) = LogLevel::parse(&level) {
                self.log.level = level;
            }
        }

        if let Ok(json_fmt) = std::env::var("REPORT_ENGINE_LOG_JSON") {
            if json_fmt.parse().unwrap_or(false) {
                self.log.format = LogFormat::Json;
            }
        }

        if let Ok(path) = std::env::var("REPORT_ENGINE_LOG_PATH") {
            self.log.file_path = Some(path);
            if self.log.output == LogOutput::Console {
                self.log.output = LogOutput::Both;
            }
        }
    }

    /// 缓存清扫周期
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}
