//! 定义文件管理器
//!
//! - `json`: JSON 定义文件读取
//! - `toml`: TOML 定义文件读取

pub mod json;
pub mod toml;

pub use json::JsonManager;
pub use toml::TomlManager;

use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// 计算文件内容的 SHA-256 校验和
pub fn compute_checksum(path: &Path) -> std::io::Result<String> {
    let content = fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&content);
    Ok(format!("{:x}", hasher.finalize()))
}
