//! 报表定义存储
//!
//! 活动集合是一个 `Arc<DefinitionSet>` 快照：加载/重载在锁外构建完整的新集合，
//! 成功后一次性替换；失败时保持原集合不变，读者永远看不到半成品。
//!
//! 每次替换（加载、重载、注册）都会递增代数，代数与集合在同一把锁下读取。

use super::loader::{validate_definition, DefinitionLoader, DefinitionSet};
use crate::core::error::ConfigError;
use crate::models::ReportDefinition;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

/// 程序化注册的定义在错误信息中使用的来源标识
const REGISTERED_SOURCE: &str = "<registered>";

/// 活动集合及其代数
#[derive(Debug, Default)]
struct Active {
    set: Arc<DefinitionSet>,
    generation: u64,
}

/// 报表定义存储
#[derive(Debug)]
pub struct DefinitionStore {
    dir: PathBuf,
    loader: DefinitionLoader,
    active: RwLock<Active>,
}

impl DefinitionStore {
    /// 创建空存储（不读取目录）
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            loader: DefinitionLoader::new(),
            active: RwLock::new(Active::default()),
        }
    }

    /// 创建存储并立即加载目录
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let store = Self::new(dir);
        store.load()?;
        Ok(store)
    }

    /// 定义目录
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 加载目录并替换活动集合，返回加载的定义数
    pub fn load(&self) -> Result<usize, ConfigError> {
        let set = self.loader.load_dir(&self.dir)?;
        let count = set.len();
        self.swap(set);
        tracing::info!(dir = ?self.dir, count, "报表定义已加载");
        Ok(count)
    }

    /// 重新加载，失败时保留当前活动集合
    pub fn reload(&self) -> Result<usize, ConfigError> {
        self.load().map_err(|e| {
            tracing::error!(dir = ?self.dir, error = %e, "报表定义重载失败，保留当前定义");
            e
        })
    }

    /// 校验并注册单个定义（同名覆盖）
    pub fn register(&self, def: ReportDefinition) -> Result<(), ConfigError> {
        validate_definition(&def, Path::new(REGISTERED_SOURCE))?;

        let mut guard = self.active.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = DefinitionSet::clone(&guard.set);
        let replaced = next
            .insert(def.name.clone(), Arc::new(def))
            .map(|old| old.name.clone());
        guard.set = Arc::new(next);
        guard.generation += 1;
        drop(guard);

        if let Some(name) = replaced {
            tracing::info!(report = %name, "报表定义已覆盖");
        }
        Ok(())
    }

    /// 按名称查找定义
    pub fn get(&self, name: &str) -> Option<Arc<ReportDefinition>> {
        self.snapshot().get(name).cloned()
    }

    /// 按名称查找定义，同时返回其所在集合的代数
    pub fn lookup(&self, name: &str) -> Option<(Arc<ReportDefinition>, u64)> {
        let active = self.active.read().unwrap_or_else(PoisonError::into_inner);
        active
            .set
            .get(name)
            .map(|def| (def.clone(), active.generation))
    }

    /// 当前代数，每次替换活动集合后递增
    pub fn generation(&self) -> u64 {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .generation
    }

    /// 全部定义，按名称排序
    pub fn list(&self) -> Vec<Arc<ReportDefinition>> {
        let mut defs: Vec<_> = self.snapshot().values().cloned().collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// 当前活动集合的快照
    pub fn snapshot(&self) -> Arc<DefinitionSet> {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .set
            .clone()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn swap(&self, set: DefinitionSet) {
        let mut guard = self.active.write().unwrap_or_else(PoisonError::into_inner);
        guard.set = Arc::new(set);
        guard.generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_def(dir: &Path, name: &str, query: &str) {
        let content = serde_json::json!({"name": name, "query": query}).to_string();
        fs::write(dir.join(format!("{name}.json")), content).unwrap();
    }

    #[test]
    fn test_open_and_get() {
        let temp_dir = TempDir::new().unwrap();
        write_def(temp_dir.path(), "sales", "SELECT * FROM sales");
        write_def(temp_dir.path(), "inventory", "SELECT * FROM stock");

        let store = DefinitionStore::open(temp_dir.path()).unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.get("sales").is_some());
        assert!(store.get("missing").is_none());

        let names: Vec<_> = store.list().iter().map(|d| d.name.clone()).collect();
        assert_eq!(names, vec!["inventory", "sales"]);
    }

    #[test]
    fn test_reload_failure_keeps_active_set() {
        let temp_dir = TempDir::new().unwrap();
        write_def(temp_dir.path(), "sales", "SELECT * FROM sales");
        let store = DefinitionStore::open(temp_dir.path()).unwrap();

        write_def(temp_dir.path(), "evil", "DELETE FROM sales");
        assert!(matches!(
            store.reload(),
            Err(ConfigError::UnsafeSql { .. })
        ));
        assert_eq!(store.len(), 1);
        assert!(store.get("evil").is_none());
        assert!(store.get("sales").is_some());
    }

    #[test]
    fn test_reload_picks_up_changes() {
        let temp_dir = TempDir::new().unwrap();
        write_def(temp_dir.path(), "sales", "SELECT * FROM sales");
        let store = DefinitionStore::open(temp_dir.path()).unwrap();
        let before = store.snapshot();
        let generation = store.generation();

        write_def(temp_dir.path(), "returns", "SELECT * FROM returns");
        assert_eq!(store.reload().unwrap(), 2);
        assert_eq!(store.generation(), generation + 1);
        assert_eq!(store.lookup("returns").map(|(_, g)| g), Some(generation + 1));

        // 旧快照不受替换影响
        assert_eq!(before.len(), 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_register() {
        let store = DefinitionStore::new("/nonexistent");
        assert!(store.is_empty());

        let def = ReportDefinition {
            name: "adhoc".into(),
            query: "SELECT 1".into(),
            ..Default::default()
        };
        store.register(def).unwrap();
        assert!(store.get("adhoc").is_some());

        let bad = ReportDefinition {
            name: "bad".into(),
            query: "TRUNCATE sales".into(),
            ..Default::default()
        };
        assert!(store.register(bad).is_err());
        assert_eq!(store.len(), 1);
        assert!(store.lookup("bad").is_none());
    }

    #[test]
    fn test_generation_advances_on_swap_only() {
        let temp_dir = TempDir::new().unwrap();
        write_def(temp_dir.path(), "sales", "SELECT * FROM sales");
        let store = DefinitionStore::new(temp_dir.path());
        assert_eq!(store.generation(), 0);

        store.load().unwrap();
        assert_eq!(store.generation(), 1);

        write_def(temp_dir.path(), "evil", "DROP TABLE sales");
        assert!(store.reload().is_err());
        assert_eq!(store.generation(), 1);

        let def = ReportDefinition {
            name: "adhoc".into(),
            query: "SELECT 1".into(),
            ..Default::default()
        };
        store.register(def).unwrap();
        assert_eq!(store.generation(), 2);
        assert_eq!(store.lookup("sales").map(|(_, g)| g), Some(2));
    }
}
