//! 报表缓存键
//!
//! 指纹是 (报表 ID, 定义代数, 规范化参数) 的纯函数：参数按名称排序后序列化，
//! 与调用方的插入顺序无关。定义集合替换后代数变化，旧条目不再可达。

use crate::models::ParamValue;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// 缓存键前缀
pub const FINGERPRINT_PREFIX: &str = "report:";

/// 计算报表指纹
///
/// # 示例
///
/// ```rust
/// let key = fingerprint("sales", 1, params.iter());
/// assert!(key.starts_with("report:"));
/// ```
pub fn fingerprint<'a, I>(report_id: &str, generation: u64, params: I) -> String
where
    I: IntoIterator<Item = (&'a String, &'a ParamValue)>,
{
    let normalized: BTreeMap<&str, serde_json::Value> = params
        .into_iter()
        .map(|(name, value)| (name.as_str(), value.to_json()))
        .collect();

    let mut hasher = Sha256::new();
    hasher.update(report_id.as_bytes());
    // 分隔符防止 id 与参数串拼接产生歧义
    hasher.update([0u8]);
    hasher.update(generation.to_be_bytes());
    for (name, value) in &normalized {
        hasher.update(name.as_bytes());
        hasher.update([b'=']);
        hasher.update(value.to_string().as_bytes());
        hasher.update([0u8]);
    }

    format!("{FINGERPRINT_PREFIX}{:x}", hasher.finalize())
}
