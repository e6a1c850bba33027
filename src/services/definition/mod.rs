//! 报表定义存储
//!
//! - `safety`: 查询模板的关键字扫描与表白名单检查
//! - `loader`: 定义文件读取与校验
//! - `store`: 活动定义集合（整体替换）
//! - `watcher`: 定义目录监听与自动重载

pub mod loader;
pub mod safety;
pub mod store;
pub mod watcher;

pub use loader::{DefinitionLoader, DefinitionSet};
pub use store::DefinitionStore;
pub use watcher::DefinitionWatcher;
