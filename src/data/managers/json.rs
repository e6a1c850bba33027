//! JSON 定义文件管理器
//!
//! # 使用示例
//!
//! ```rust
//! use std::path::Path;
//! use crate::data::managers::JsonManager;
//! use crate::models::ReportDefinition;
//!
//! let manager = JsonManager::new();
//! let def: ReportDefinition = manager.read_as(Path::new("reports/sales.json"))?;
//! ```

use crate::data::{DataError, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// JSON 文件管理器
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonManager;

impl JsonManager {
    pub fn new() -> Self {
        Self
    }

    /// 读取并反序列化为指定类型
    ///
    /// # 返回
    ///
    /// - `Ok(T)`: 反序列化结果
    /// - `Err(DataError)`: 读取或解析失败
    pub fn read_as<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let content = fs::read_to_string(path).map_err(|e| DataError::io(path, e))?;
        Ok(serde_json::from_str(&content)?)
    }
}
