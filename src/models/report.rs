use super::definition::{ParameterSpec, ReportDefinition};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// 单条输出记录：字段名 -> 单元格值，保持列顺序
pub type Record = Map<String, Value>;

/// 报表结果元数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub report: String,
    #[serde(default)]
    pub version: String,
    /// 回显的参数（含已解析的默认值）
    pub params: BTreeMap<String, Value>,
    pub generated_at: DateTime<Utc>,
    pub format: String,
    pub row_count: usize,
    /// 是否因 max_rows 被截断
    #[serde(default)]
    pub truncated: bool,
    /// 定义中 output.metadata 的原样回显
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

/// 报表结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportResult {
    pub metadata: ReportMetadata,
    pub data: Vec<Record>,
}

/// 可用报表摘要（ListAvailable 的条目）
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub name: String,
    pub description: String,
    pub version: String,
    pub formats: Vec<String>,
    pub query: String,
    pub params: Vec<ParameterSpec>,
    /// 缓存 TTL（秒）
    pub cache_ttl_secs: u64,
    pub require_auth: bool,
}

impl From<&ReportDefinition> for ReportSummary {
    fn from(def: &ReportDefinition) -> Self {
        Self {
            name: def.name.clone(),
            description: def.description.clone(),
            version: def.version.clone(),
            formats: def.output_formats(),
            query: def.query.clone(),
            params: def.params.clone(),
            cache_ttl_secs: def.cache_ttl().as_secs(),
            require_auth: def.security.as_ref().is_some_and(|s| s.require_auth),
        }
    }
}
