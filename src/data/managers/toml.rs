//! TOML 定义文件管理器
//!
//! # 使用示例
//!
//! ```rust
//! use std::path::Path;
//! use crate::data::managers::TomlManager;
//! use crate::models::ReportDefinition;
//!
//! let def: ReportDefinition = TomlManager::new().read_as(Path::new("reports/sales.toml"))?;
//! ```

use crate::data::{DataError, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// TOML 文件管理器
#[derive(Debug, Default, Clone, Copy)]
pub struct TomlManager;

impl TomlManager {
    pub fn new() -> Self {
        Self
    }

    /// 读取并反序列化为指定类型
    pub fn read_as<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let content = fs::read_to_string(path).map_err(|e| DataError::io(path, e))?;
        toml::from_str(&content).map_err(Into::into)
    }
}
