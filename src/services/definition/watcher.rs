//! 定义目录监听
//!
//! 基于 OS 通知监听定义目录，目录内容校验和变化时触发重载。
//! 重载失败只记录日志，活动集合保持不变。

use super::loader::{definition_files, DefinitionFormat};
use super::store::DefinitionStore;
use crate::data::managers::compute_checksum;
use anyhow::Result;
use notify::{
    Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 计算定义目录的组合校验和（SHA256）
///
/// 任一定义文件新增、删除或内容变化都会改变校验和。目录不可读时返回 None。
pub fn directory_checksum(dir: &Path) -> Option<String> {
    let files = definition_files(dir).ok()?;

    let mut hasher = Sha256::new();
    for path in files {
        hasher.update(path.to_string_lossy().as_bytes());
        match compute_checksum(&path) {
            Ok(sum) => hasher.update(sum.as_bytes()),
            Err(_) => hasher.update(b"UNREADABLE"),
        }
    }
    Some(format!("{:x}", hasher.finalize()))
}

/// 事件是否涉及定义文件
fn touches_definitions(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) && event
        .paths
        .iter()
        .any(|p| DefinitionFormat::from_path(p).is_some())
}

/// 定义目录监听器，drop 时停止监听
pub struct DefinitionWatcher {
    dir: PathBuf,
    _watcher: RecommendedWatcher,
}

impl DefinitionWatcher {
    /// 开始监听存储对应的定义目录
    ///
    /// 每次重载成功后以新的定义数调用 `on_reload`。
    pub fn start<F>(store: Arc<DefinitionStore>, on_reload: F) -> Result<Self>
    where
        F: Fn(usize) + Send + 'static,
    {
        let dir = store.dir().to_path_buf();
        let dir_for_cb = dir.clone();
        let mut last_checksum = directory_checksum(&dir);

        let mut watcher = RecommendedWatcher::new(
            move |res: std::result::Result<Event, notify::Error>| {
                let event = match res {
                    Ok(event) => event,
                    Err(err) => {
                        warn!(dir = ?dir_for_cb, error = ?err, "定义目录监听出错");
                        return;
                    }
                };
                if !touches_definitions(&event) {
                    return;
                }

                let checksum = directory_checksum(&dir_for_cb);
                // 去重：相同 checksum 不重复触发
                if checksum == last_checksum {
                    return;
                }
                last_checksum = checksum;

                debug!(dir = ?dir_for_cb, paths = ?event.paths, "检测到定义文件改动");
                match store.reload() {
                    Ok(count) => {
                        info!(count, "定义目录变更，已重载");
                        on_reload(count);
                    }
                    Err(err) => warn!(error = %err, "定义目录变更后重载失败"),
                }
            },
            NotifyConfig::default(),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        info!(dir = ?dir, "已启动定义目录监听");

        Ok(Self {
            dir,
            _watcher: watcher,
        })
    }

    /// 监听的目录
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    fn write_def(dir: &Path, name: &str) {
        let content = serde_json::json!({"name": name, "query": "SELECT 1"}).to_string();
        fs::write(dir.join(format!("{name}.json")), content).unwrap();
    }

    #[test]
    fn test_directory_checksum() {
        let temp_dir = TempDir::new().unwrap();
        write_def(temp_dir.path(), "a");

        let first = directory_checksum(temp_dir.path()).unwrap();
        assert_eq!(Some(first.clone()), directory_checksum(temp_dir.path()));

        // 非定义文件不影响校验和
        fs::write(temp_dir.path().join("notes.txt"), "x").unwrap();
        assert_eq!(Some(first.clone()), directory_checksum(temp_dir.path()));

        write_def(temp_dir.path(), "b");
        assert_ne!(Some(first), directory_checksum(temp_dir.path()));

        assert!(directory_checksum(Path::new("/nonexistent/reports")).is_none());
    }

    #[test]
    fn test_watcher_reloads_on_change() {
        let temp_dir = TempDir::new().unwrap();
        write_def(temp_dir.path(), "a");

        let store = Arc::new(DefinitionStore::open(temp_dir.path()).unwrap());
        let reloads = Arc::new(AtomicUsize::new(0));
        let counter = reloads.clone();
        let watcher = DefinitionWatcher::start(store.clone(), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        assert_eq!(watcher.dir(), temp_dir.path());

        write_def(temp_dir.path(), "b");

        let deadline = Instant::now() + Duration::from_secs(10);
        while (store.len() < 2 || reloads.load(Ordering::SeqCst) == 0) && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(50));
        }
        assert_eq!(store.len(), 2);
        assert!(reloads.load(Ordering::SeqCst) >= 1);
    }
}
