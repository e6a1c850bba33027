//! 数据层统一错误类型
//!
//! 使用 `thiserror` 定义定义文件读取与缓存层的错误类型，并保持与 `anyhow` 的兼容。

use std::path::PathBuf;
use thiserror::Error;

/// 数据层的统一错误类型
#[derive(Error, Debug)]
pub enum DataError {
    /// 文件 I/O 错误
    #[error("文件 I/O 错误: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON 序列化/反序列化错误
    #[error("JSON 序列化错误: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    /// TOML 反序列化错误
    #[error("TOML 反序列化错误: {0}")]
    TomlDeserialization(#[from] toml::de::Error),

    /// 锁中毒等并发错误
    #[error("并发错误: {0}")]
    Concurrency(String),
}

pub type Result<T> = std::result::Result<T, DataError>;

impl DataError {
    /// 从 `std::io::Error` 和路径创建 I/O 错误
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// 锁中毒时的统一构造器
    pub fn poisoned(what: &str) -> Self {
        Self::Concurrency(format!("{what} 锁已中毒"))
    }
}
