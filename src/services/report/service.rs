//! 报表生成服务
//!
//! 组合定义存储、参数校验、查询构建、执行器、结果转换和响应缓存：
//!
//! 1. 按 ID 查找定义，不存在返回 NotFound
//! 2. 校验输出格式与参数，失败时无任何副作用
//! 3. 以 (ID, 定义代数, 规范化参数) 的指纹查缓存，命中直接返回，不调用执行器
//! 4. 未命中时构建语句、调用执行器、转换结果，按定义的 TTL 写入缓存
//!
//! 并发的相同请求在未命中时会各自执行并各自写缓存，后写者覆盖。
//! 重载期间仍在执行的请求按旧代数写缓存，重载后的请求不会命中这些条目。

use super::executor::{QueryExecutor, QueryOutput};
use crate::core::error::{ConfigError, ReportError, Result, ValidationError};
use crate::data::cache::{fingerprint, CacheProvider, ExpiringCache};
use crate::models::config::EngineConfig;
use crate::models::{
    RawParams, ReportDefinition, ReportMetadata, ReportResult, ReportSummary, ValidatedParams,
};
use crate::services::definition::{DefinitionStore, DefinitionWatcher};
use crate::services::params::ParameterValidator;
use crate::services::query::QueryBuilder;
use crate::services::transform::transform_rows;
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// 报表服务
pub struct ReportService {
    config: EngineConfig,
    store: Arc<DefinitionStore>,
    validator: ParameterValidator,
    builder: QueryBuilder,
    executor: Arc<dyn QueryExecutor>,
    cache: ExpiringCache,
}

impl ReportService {
    /// 加载定义目录并创建服务
    ///
    /// 缓存清扫任务在 tokio 运行时内启动。
    pub fn new(
        config: EngineConfig,
        executor: Arc<dyn QueryExecutor>,
    ) -> std::result::Result<Self, ConfigError> {
        let store = Arc::new(DefinitionStore::open(config.definitions_dir.clone())?);
        Ok(Self::with_store(config, store, executor))
    }

    /// 使用已有的定义存储创建服务（不读取目录）
    pub fn with_store(
        config: EngineConfig,
        store: Arc<DefinitionStore>,
        executor: Arc<dyn QueryExecutor>,
    ) -> Self {
        let cache = ExpiringCache::new(config.sweep_interval());
        Self {
            builder: QueryBuilder::new(config.placeholder_style),
            validator: ParameterValidator::new(),
            config,
            store,
            executor,
            cache,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<DefinitionStore> {
        &self.store
    }

    pub fn cache(&self) -> &ExpiringCache {
        &self.cache
    }

    /// 生成报表
    ///
    /// `format` 为空时使用引擎默认格式。
    pub async fn get_report(
        &self,
        id: &str,
        params: &RawParams,
        format: &str,
    ) -> Result<ReportResult> {
        self.generate(id, params, format, None).await
    }

    /// 生成报表，执行器调用超过 `deadline` 时返回 Timeout
    ///
    /// 截止时间只作用于执行器调用，校验和缓存访问不受影响。
    pub async fn get_report_with_deadline(
        &self,
        id: &str,
        params: &RawParams,
        format: &str,
        deadline: Duration,
    ) -> Result<ReportResult> {
        self.generate(id, params, format, Some(deadline)).await
    }

    /// 全部可用报表，按名称排序
    pub fn list_available(&self) -> Vec<ReportSummary> {
        self.store
            .list()
            .iter()
            .map(|def| ReportSummary::from(&**def))
            .collect()
    }

    /// 单个报表的摘要
    pub fn describe(&self, id: &str) -> Result<ReportSummary> {
        self.store
            .get(id)
            .map(|def| ReportSummary::from(&*def))
            .ok_or_else(|| ReportError::NotFound(id.to_string()))
    }

    /// 重新加载定义目录，成功后清空响应缓存
    ///
    /// 失败时保留当前定义集合与缓存。
    pub fn reload(&self) -> Result<usize> {
        let count = self.store.reload()?;
        self.invalidate_cache();
        Ok(count)
    }

    /// 校验并注册单个定义（同名覆盖），成功后清空响应缓存
    pub fn register(&self, def: ReportDefinition) -> Result<()> {
        self.store.register(def)?;
        self.invalidate_cache();
        Ok(())
    }

    /// 监听定义目录，变更时自动重载并清空响应缓存
    pub fn watch_definitions(&self) -> anyhow::Result<DefinitionWatcher> {
        let cache = self.cache.clone();
        DefinitionWatcher::start(self.store.clone(), move |_| {
            if let Err(e) = cache.clear() {
                warn!(error = %e, "清空报表缓存失败");
            }
        })
    }

    /// 停止缓存后台清扫
    pub fn shutdown(&self) {
        self.cache.shutdown();
        info!("报表服务已停止缓存清扫");
    }

    async fn generate(
        &self,
        id: &str,
        params: &RawParams,
        format: &str,
        deadline: Option<Duration>,
    ) -> Result<ReportResult> {
        let (def, generation) = self
            .store
            .lookup(id)
            .ok_or_else(|| ReportError::NotFound(id.to_string()))?;

        let format = self.resolve_format(&def, format)?;
        let validated = self.validator.validate(&def.params, params)?;

        let key = fingerprint(id, generation, &validated);
        if let Some(mut cached) = self.cached(&key) {
            debug!(report = id, key = %key, "报表缓存命中");
            cached.metadata.format = format;
            return Ok(cached);
        }
        debug!(report = id, key = %key, "报表缓存未命中");

        let result = self.execute(&def, &validated, format, deadline).await?;
        self.store_result(&key, &result, def.cache_ttl());
        Ok(result)
    }

    /// 确定输出格式：请求为空时优先引擎默认格式，否则取定义的首个格式
    fn resolve_format(
        &self,
        def: &ReportDefinition,
        requested: &str,
    ) -> std::result::Result<String, ValidationError> {
        let formats = def.output_formats();
        let requested = requested.trim();

        let found = if requested.is_empty() {
            formats
                .iter()
                .find(|f| f.eq_ignore_ascii_case(&self.config.default_format))
                .or_else(|| formats.first())
        } else {
            formats.iter().find(|f| f.eq_ignore_ascii_case(requested))
        };

        found.cloned().ok_or_else(|| ValidationError::UnsupportedFormat {
            format: requested.to_string(),
            available: formats.join(", "),
        })
    }

    /// 读取缓存，载荷损坏时删除并按未命中处理
    fn cached(&self, key: &str) -> Option<ReportResult> {
        let bytes = self.cache.get(key)?;
        match serde_json::from_slice::<ReportResult>(&bytes) {
            Ok(result) => Some(result),
            Err(e) => {
                let err = ReportError::from(e);
                warn!(key, error = %err, "缓存载荷无法解析，按未命中处理");
                if let Err(e) = self.cache.delete(key) {
                    warn!(key, error = %e, "删除损坏的缓存条目失败");
                }
                None
            }
        }
    }

    async fn execute(
        &self,
        def: &ReportDefinition,
        validated: &ValidatedParams,
        format: String,
        deadline: Option<Duration>,
    ) -> Result<ReportResult> {
        let built = self.builder.build(&def.query, validated);
        debug!(
            report = %def.name,
            executor = self.executor.name(),
            statement = %built.statement,
            args = built.args.len(),
            "执行报表查询"
        );

        let started = Instant::now();
        let call = self.executor.query(&built.statement, &built.args);
        let outcome = match deadline {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!(report = %def.name, deadline_ms = limit.as_millis() as u64, "报表查询超时");
                    return Err(ReportError::Timeout {
                        report: def.name.clone(),
                        elapsed: started.elapsed(),
                    });
                }
            },
            None => call.await,
        };

        let QueryOutput { columns, mut rows } =
            outcome.map_err(|source| ReportError::Execution {
                report: def.name.clone(),
                source,
            })?;
        info!(
            report = %def.name,
            rows = rows.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "报表查询完成"
        );

        let mut truncated = false;
        if let Some(max_rows) = def.max_rows() {
            if rows.len() > max_rows {
                warn!(report = %def.name, rows = rows.len(), max_rows, "结果超过行数上限，已截断");
                rows.truncate(max_rows);
                truncated = true;
            }
        }

        let data = transform_rows(&columns, rows, &def.output.field_mapping);
        let metadata = ReportMetadata {
            report: def.name.clone(),
            version: def.version.clone(),
            params: validated
                .iter()
                .map(|(name, value)| (name.clone(), value.to_json()))
                .collect(),
            generated_at: Utc::now(),
            format,
            row_count: data.len(),
            truncated,
            extra: def.output.metadata.clone(),
        };

        Ok(ReportResult { metadata, data })
    }

    /// 写入缓存；失败只记录日志，不影响本次请求
    fn store_result(&self, key: &str, result: &ReportResult, ttl: Duration) {
        if ttl.is_zero() {
            debug!(key, "缓存 TTL 为 0，跳过写入");
            return;
        }

        let bytes = match serde_json::to_vec(result) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(key, error = %e, "报表结果序列化失败，跳过缓存");
                return;
            }
        };

        if let Err(e) = self.cache.set(key, bytes, ttl) {
            warn!(key, error = %e, "写入报表缓存失败");
        }
    }

    fn invalidate_cache(&self) {
        if let Err(e) = self.cache.clear() {
            warn!(error = %e, "清空报表缓存失败");
        }
    }
}
