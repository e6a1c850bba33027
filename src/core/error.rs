//! 报表引擎错误体系
//!
//! - `ConfigError`: 定义文件格式错误或不安全，加载/重载时致命，放弃切换
//! - `ValidationError`: 参数缺失或不合法，属于调用方错误，不重试
//! - `ReportError`: 对外暴露的顶层错误

use crate::data::DataError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// 定义加载错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("读取报表定义失败: {0}")]
    Data(#[from] DataError),

    #[error("报表定义 {path} 缺少必填字段 '{field}'")]
    MissingField { path: PathBuf, field: &'static str },

    #[error("报表 '{report}' 的查询包含危险 SQL 关键字: {keyword}")]
    UnsafeSql { report: String, keyword: String },

    #[error("报表 '{report}' 访问了未授权的表: {table}")]
    TableNotAllowed { report: String, table: String },

    #[error("报表名称重复: '{name}'（{first} 与 {second}）")]
    DuplicateName {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("报表定义目录不可用: {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 参数校验错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("缺少必填参数 '{name}'")]
    MissingRequired { name: String },

    #[error("参数 '{name}' 必须是{expected}")]
    WrongType { name: String, expected: &'static str },

    #[error("参数 '{name}' 必须符合格式 {format}")]
    BadFormat { name: String, format: String },

    #[error("参数 '{name}' 不能早于 {min}")]
    BeforeMin { name: String, min: String },

    #[error("参数 '{name}' 不匹配要求的模式")]
    PatternMismatch { name: String },

    #[error("参数 '{name}' 的正则无效: {reason}")]
    InvalidPattern { name: String, reason: String },

    #[error("参数 '{name}' 不能小于 {min}")]
    BelowMin { name: String, min: String },

    #[error("参数 '{name}' 不能大于 {max}")]
    AboveMax { name: String, max: String },

    #[error("参数 '{name}' 必须是以下值之一: [{allowed}]")]
    NotInEnum { name: String, allowed: String },

    #[error("枚举参数 '{name}' 必须配置 'values'")]
    EnumWithoutValues { name: String },

    #[error("不支持的参数类型: {kind}（参数 '{name}'）")]
    UnsupportedType { name: String, kind: String },

    #[error("不支持的输出格式 '{format}'，可用: [{available}]")]
    UnsupportedFormat { format: String, available: String },
}

impl ValidationError {
    /// 出错的参数名（格式错误无参数名）
    pub fn param(&self) -> Option<&str> {
        match self {
            ValidationError::MissingRequired { name }
            | ValidationError::WrongType { name, .. }
            | ValidationError::BadFormat { name, .. }
            | ValidationError::BeforeMin { name, .. }
            | ValidationError::PatternMismatch { name }
            | ValidationError::InvalidPattern { name, .. }
            | ValidationError::BelowMin { name, .. }
            | ValidationError::AboveMax { name, .. }
            | ValidationError::NotInEnum { name, .. }
            | ValidationError::EnumWithoutValues { name }
            | ValidationError::UnsupportedType { name, .. } => Some(name),
            ValidationError::UnsupportedFormat { .. } => None,
        }
    }
}

/// 报表引擎顶层错误
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    #[error("参数校验失败: {0}")]
    Validation(#[from] ValidationError),

    #[error("报表 '{0}' 不存在")]
    NotFound(String),

    #[error("报表 '{report}' 查询执行失败: {source}")]
    Execution {
        report: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("报表 '{report}' 查询超时（{elapsed:?}）")]
    Timeout { report: String, elapsed: Duration },

    #[error("报表结果序列化失败: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;

impl ReportError {
    /// 是否为调用方错误（参数、报表 ID）
    pub fn is_client_fault(&self) -> bool {
        matches!(self, ReportError::Validation(_) | ReportError::NotFound(_))
    }

    /// 引擎内部从不重试，执行器失败原样上抛
    pub fn is_retryable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages() {
        let err = ValidationError::MissingRequired {
            name: "region".into(),
        };
        assert_eq!(err.to_string(), "缺少必填参数 'region'");
        assert_eq!(err.param(), Some("region"));

        let err = ValidationError::NotInEnum {
            name: "mode".into(),
            allowed: "a, b".into(),
        };
        assert_eq!(err.to_string(), "参数 'mode' 必须是以下值之一: [a, b]");
    }

    #[test]
    fn test_unsafe_sql_names_keyword() {
        let err = ConfigError::UnsafeSql {
            report: "sales".into(),
            keyword: "DROP".into(),
        };
        assert!(err.to_string().contains("DROP"));
    }

    #[test]
    fn test_fault_classification() {
        assert!(ReportError::NotFound("x".into()).is_client_fault());
        assert!(ReportError::from(ValidationError::EnumWithoutValues { name: "e".into() })
            .is_client_fault());

        let exec = ReportError::Execution {
            report: "x".into(),
            source: anyhow::anyhow!("connection reset"),
        };
        assert!(!exec.is_client_fault());
        assert!(!exec.is_retryable());
        assert!(exec.to_string().contains("connection reset"));
    }
}
