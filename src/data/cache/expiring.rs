//! 带过期时间的内存缓存
//!
//! 报表响应以字节形式缓存，每个条目携带绝对过期时间：
//! - 读取时发现过期立即淘汰
//! - 后台任务按固定周期清扫全部过期条目，回收再也不会被读取的条目
//! - 单把粗粒度读写锁保护整个存储，清扫过程中不会暴露半淘汰状态
//!
//! # 使用示例
//!
//! ```rust
//! use std::time::Duration;
//! use crate::data::cache::{CacheProvider, ExpiringCache};
//!
//! let cache = ExpiringCache::new(Duration::from_secs(300));
//! cache.set("report:abc", b"{}".to_vec(), Duration::from_secs(600))?;
//! assert!(cache.get("report:abc").is_some());
//! cache.shutdown();
//! ```

use crate::data::{DataError, Result};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, Weak};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// 缓存提供者接口
///
/// 缓存对载荷内容一无所知，只负责按键存取字节。
pub trait CacheProvider: Send + Sync {
    /// 键存在且未过期时返回载荷
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// 插入或覆盖条目，过期时间为 now + ttl
    fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()>;

    /// 无条件删除条目
    fn delete(&self, key: &str) -> Result<()>;
}

/// 缓存条目：载荷 + 绝对过期时间
#[derive(Debug, Clone)]
struct CacheItem {
    value: Vec<u8>,
    expires_at: Instant,
}

impl CacheItem {
    fn new(value: Vec<u8>, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            value,
            expires_at: now.checked_add(ttl).unwrap_or(now),
        }
    }

    /// 当前时间不早于过期时间即视为过期
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

type Store = RwLock<HashMap<String, CacheItem>>;

/// 带后台清扫的 TTL 缓存
///
/// `Clone` 得到的句柄共享同一份存储和同一个停止信号。
#[derive(Debug, Clone)]
pub struct ExpiringCache {
    entries: Arc<Store>,
    sweep_interval: Duration,
    shutdown: CancellationToken,
}

impl ExpiringCache {
    /// 默认清扫周期（5 分钟）
    pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

    /// 创建缓存并启动后台清扫任务
    ///
    /// 需要在 tokio 运行时内调用；没有运行时则只做读取时淘汰，
    /// 可通过 [`ExpiringCache::purge_expired`] 手动清扫。
    pub fn new(sweep_interval: Duration) -> Self {
        let cache = Self::without_sweeper(sweep_interval);
        cache.spawn_sweeper();
        cache
    }

    /// 创建不带后台任务的缓存
    pub fn without_sweeper(sweep_interval: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            sweep_interval,
            shutdown: CancellationToken::new(),
        }
    }

    /// 启动后台清扫任务，返回是否成功启动
    fn spawn_sweeper(&self) -> bool {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::warn!("未检测到 tokio 运行时，缓存后台清扫未启动");
                return false;
            }
        };

        let entries = Arc::downgrade(&self.entries);
        let token = self.shutdown.clone();
        let period = self.sweep_interval.max(Duration::from_millis(1));

        handle.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // 第一次 tick 立即返回，跳过
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        tracing::debug!("缓存清扫任务收到停止信号");
                        break;
                    }
                    _ = ticker.tick() => {
                        if !sweep_once(&entries) {
                            break;
                        }
                    }
                }
            }
        });

        tracing::debug!(interval_ms = period.as_millis() as u64, "缓存清扫任务已启动");
        true
    }

    /// 立即执行一次清扫，返回淘汰的条目数
    pub fn purge_expired(&self) -> usize {
        purge(&self.entries)
    }

    /// 发送停止信号，结束后台清扫任务
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// 停止信号是否已发出
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// 清扫周期
    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }

    /// 当前存储的条目数（含尚未清扫的过期条目）
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// 检查缓存是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 清空所有条目
    pub fn clear(&self) -> Result<()> {
        self.entries
            .write()
            .map_err(|_| DataError::poisoned("缓存"))?
            .clear();
        Ok(())
    }
}

impl Default for ExpiringCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SWEEP_INTERVAL)
    }
}

impl CacheProvider for ExpiringCache {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        let now = Instant::now();
        {
            let entries = self.entries.read().ok()?;
            match entries.get(key) {
                None => return None,
                Some(item) if !item.is_expired(now) => return Some(item.value.clone()),
                Some(_) => {}
            }
        }

        // 过期：升级为写锁后再次确认，避免误删并发写入的新值
        if let Ok(mut entries) = self.entries.write() {
            if entries.get(key).is_some_and(|item| item.is_expired(now)) {
                entries.remove(key);
                tracing::trace!(key, "读取时淘汰过期缓存");
            }
        }
        None
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| DataError::poisoned("缓存"))?;
        entries.insert(key.to_string(), CacheItem::new(value, ttl));
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| DataError::poisoned("缓存"))?;
        entries.remove(key);
        Ok(())
    }
}

/// 后台任务的单次清扫；存储已被释放时返回 false
fn sweep_once(entries: &Weak<Store>) -> bool {
    match entries.upgrade() {
        Some(store) => {
            let evicted = purge(&store);
            if evicted > 0 {
                tracing::debug!(evicted, "缓存清扫完成");
            }
            true
        }
        None => {
            tracing::debug!("缓存已释放，清扫任务退出");
            false
        }
    }
}

/// 在一次写锁内淘汰全部过期条目
fn purge(store: &Store) -> usize {
    let Ok(mut entries) = store.write() else {
        tracing::warn!("缓存锁已中毒，跳过本次清扫");
        return 0;
    };
    let now = Instant::now();
    let before = entries.len();
    entries.retain(|_, item| !item.is_expired(now));
    before - entries.len()
}
