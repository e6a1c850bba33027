//! 缓存层实现
//!
//! - `expiring`: 带 TTL 与后台清扫的字节缓存
//! - `fingerprint`: 报表 ID + 参数的确定性缓存键

pub mod expiring;
pub mod fingerprint;

pub use expiring::{CacheProvider, ExpiringCache};
pub use fingerprint::{fingerprint, FINGERPRINT_PREFIX};
