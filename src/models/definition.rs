// 报表定义模型
//
// 每个定义文件对应一个 ReportDefinition，加载后不可变。

use crate::utils::duration::parse_duration;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// 未配置或配置无效时的缓存 TTL（10 分钟）
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(600);

/// 未配置输出格式时的默认格式
pub const DEFAULT_FORMAT: &str = "json";

/// 报表定义
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReportDefinition {
    /// 唯一名称（即报表 ID）
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
    /// 带命名占位符（@name）的查询模板
    #[serde(default)]
    pub query: String,
    /// 参数规格，按声明顺序校验
    #[serde(default, alias = "parameters")]
    pub params: Vec<ParameterSpec>,
    #[serde(default)]
    pub output: OutputSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<SecuritySpec>,
    /// 缓存 TTL 字符串，如 "10m"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_ttl: Option<String>,
}

impl ReportDefinition {
    /// 支持的输出格式，未配置时为 ["json"]
    pub fn output_formats(&self) -> Vec<String> {
        if self.output.formats.is_empty() {
            vec![DEFAULT_FORMAT.to_string()]
        } else {
            self.output.formats.clone()
        }
    }

    /// 是否支持指定输出格式（忽略大小写）
    pub fn supports_format(&self, format: &str) -> bool {
        self.output_formats()
            .iter()
            .any(|f| f.eq_ignore_ascii_case(format))
    }

    /// 解析后的缓存 TTL，缺失或无效时回退到 10 分钟
    pub fn cache_ttl(&self) -> Duration {
        let Some(raw) = self.cache_ttl.as_deref().filter(|s| !s.trim().is_empty()) else {
            return DEFAULT_CACHE_TTL;
        };
        match parse_duration(raw) {
            Ok(ttl) => ttl,
            Err(e) => {
                tracing::warn!(
                    report = %self.name,
                    cache_ttl = raw,
                    error = %e,
                    "缓存 TTL 无效，使用默认值"
                );
                DEFAULT_CACHE_TTL
            }
        }
    }

    /// 结果行数上限（0 表示不限制）
    pub fn max_rows(&self) -> Option<usize> {
        self.security
            .as_ref()
            .map(|s| s.max_rows)
            .filter(|&n| n > 0)
    }

    /// 允许访问的表（为空表示不限制）
    pub fn allowed_tables(&self) -> &[String] {
        self.security
            .as_ref()
            .map(|s| s.allowed_tables.as_slice())
            .unwrap_or_default()
    }
}

/// 参数规格
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParamType,
    #[serde(default)]
    pub required: bool,
    /// 字面量或相对日期表达式（如 "now(-7d)"）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, alias = "constraints")]
    pub validation: ParamConstraints,
}

impl ParameterSpec {
    /// 快速构造（主要用于测试与程序化注册）
    pub fn new(name: impl Into<String>, kind: ParamType) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            default: None,
            description: None,
            validation: ParamConstraints::default(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_validation(mut self, validation: ParamConstraints) -> Self {
        self.validation = validation;
        self
    }
}

/// 声明的参数类型
///
/// 未识别的类型在加载时保留原文，校验时报 "unsupported parameter type"。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ParamType {
    Date,
    DateTime,
    String,
    Int,
    Float,
    Bool,
    Enum,
    Unsupported(String),
}

impl From<String> for ParamType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "date" => ParamType::Date,
            "datetime" => ParamType::DateTime,
            "string" => ParamType::String,
            "int" => ParamType::Int,
            "float" => ParamType::Float,
            "bool" => ParamType::Bool,
            "enum" => ParamType::Enum,
            _ => ParamType::Unsupported(raw),
        }
    }
}

impl From<ParamType> for String {
    fn from(kind: ParamType) -> Self {
        kind.to_string()
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Date => write!(f, "date"),
            ParamType::DateTime => write!(f, "datetime"),
            ParamType::String => write!(f, "string"),
            ParamType::Int => write!(f, "int"),
            ParamType::Float => write!(f, "float"),
            ParamType::Bool => write!(f, "bool"),
            ParamType::Enum => write!(f, "enum"),
            ParamType::Unsupported(raw) => write!(f, "{raw}"),
        }
    }
}

/// 参数约束（仅在值存在时生效）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParamConstraints {
    /// 字符串正则，匹配值的任意位置即可
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    /// 数值下限（含）或日期下限
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Value>,
    /// 数值上限（含）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Value>,
    /// 枚举可选值
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<Value>>,
    /// 日期模板，如 "DD/MM/YYYY"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// 输出规格
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSpec {
    #[serde(default)]
    pub formats: Vec<String>,
    /// 列名 -> 输出字段名
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub field_mapping: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

/// 安全规格
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecuritySpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_tables: Vec<String>,
    #[serde(default)]
    pub max_rows: usize,
    #[serde(default)]
    pub require_auth: bool,
}
