//! 报表定义文件加载
//!
//! 目录下的 `*.json` / `*.toml` 按路径排序逐个读取，其它扩展名忽略。
//! 任一文件结构无效或未通过安全检查，整批加载失败。

use super::safety::{find_denied_keyword, find_disallowed_table};
use crate::core::error::ConfigError;
use crate::data::managers::{JsonManager, TomlManager};
use crate::models::ReportDefinition;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// 按名称索引的定义集合
pub type DefinitionSet = HashMap<String, Arc<ReportDefinition>>;

/// 定义文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionFormat {
    Json,
    Toml,
}

impl DefinitionFormat {
    /// 根据扩展名识别格式（忽略大小写）
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(DefinitionFormat::Json),
            "toml" => Some(DefinitionFormat::Toml),
            _ => None,
        }
    }
}

/// 列出目录下的定义文件（已排序）
pub fn definition_files(dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let to_err = |source| ConfigError::Directory {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(to_err)? {
        let path = entry.map_err(to_err)?.path();
        if path.is_file() && DefinitionFormat::from_path(&path).is_some() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// 校验单个定义：必填字段、禁用关键字、表白名单
pub fn validate_definition(def: &ReportDefinition, source: &Path) -> Result<(), ConfigError> {
    if def.name.trim().is_empty() {
        return Err(ConfigError::MissingField {
            path: source.to_path_buf(),
            field: "name",
        });
    }
    if def.query.trim().is_empty() {
        return Err(ConfigError::MissingField {
            path: source.to_path_buf(),
            field: "query",
        });
    }

    if let Some(keyword) = find_denied_keyword(&def.query) {
        return Err(ConfigError::UnsafeSql {
            report: def.name.clone(),
            keyword,
        });
    }

    if let Some(table) = find_disallowed_table(&def.query, def.allowed_tables()) {
        return Err(ConfigError::TableNotAllowed {
            report: def.name.clone(),
            table,
        });
    }

    Ok(())
}

/// 定义加载器
#[derive(Debug, Default, Clone)]
pub struct DefinitionLoader {
    json: JsonManager,
    toml: TomlManager,
}

impl DefinitionLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// 读取并校验单个定义文件
    ///
    /// 不支持的扩展名返回 `Ok(None)`。
    pub fn load_file(&self, path: &Path) -> Result<Option<ReportDefinition>, ConfigError> {
        let def: ReportDefinition = match DefinitionFormat::from_path(path) {
            Some(DefinitionFormat::Json) => self.json.read_as(path)?,
            Some(DefinitionFormat::Toml) => self.toml.read_as(path)?,
            None => return Ok(None),
        };

        validate_definition(&def, path)?;
        Ok(Some(def))
    }

    /// 加载目录下全部定义，构建新的定义集合
    ///
    /// 名称重复视为配置错误，报告两个来源文件。
    pub fn load_dir(&self, dir: &Path) -> Result<DefinitionSet, ConfigError> {
        let mut set = DefinitionSet::new();
        let mut sources: HashMap<String, PathBuf> = HashMap::new();

        for path in definition_files(dir)? {
            let Some(def) = self.load_file(&path)? else {
                continue;
            };

            if let Some(first) = sources.get(&def.name) {
                return Err(ConfigError::DuplicateName {
                    name: def.name.clone(),
                    first: first.clone(),
                    second: path,
                });
            }

            tracing::debug!(report = %def.name, path = ?path, "已读取报表定义");
            sources.insert(def.name.clone(), path);
            set.insert(def.name.clone(), Arc::new(def));
        }

        Ok(set)
    }
}
