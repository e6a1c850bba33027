//! 查询模板的词法安全检查
//!
//! 只做关键字扫描，不解析 SQL：出现在字符串字面量或标识符中的整词同样会被拒绝。

use once_cell::sync::Lazy;
use regex::Regex;

/// 禁止出现的整词关键字
const DENIED_KEYWORDS: &[&str] = &[
    "DROP", "DELETE", "UPDATE", "INSERT", "ALTER", "CREATE", "TRUNCATE", "GRANT", "REVOKE",
    "EXEC", "EXECUTE",
];

/// 禁止出现的扩展存储过程前缀，匹配以其开头的任意单词
const DENIED_PREFIXES: &[&str] = &["XP_", "SP_"];

static DENY_LIST: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    let words = DENIED_KEYWORDS
        .iter()
        .map(|kw| (*kw, format!(r"(?i)\b{kw}\b")));
    let prefixes = DENIED_PREFIXES
        .iter()
        .map(|p| (*p, format!(r"(?i)\b{p}\w*")));

    words
        .chain(prefixes)
        .filter_map(|(kw, pattern)| match Regex::new(&pattern) {
            Ok(re) => Some((kw, re)),
            Err(e) => {
                tracing::error!(keyword = kw, error = %e, "安全检查正则编译失败");
                None
            }
        })
        .collect()
});

static TABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:FROM|JOIN)\s+(?:(\w+)\.)?(\w+)").expect("表名提取正则必须合法")
});

/// 扫描查询模板，返回第一个命中的禁用关键字
///
/// 前缀类命中返回实际出现的单词（大写），便于定位。
pub fn find_denied_keyword(query: &str) -> Option<String> {
    DENY_LIST.iter().find_map(|(kw, re)| {
        re.find(query).map(|m| {
            if kw.ends_with('_') {
                m.as_str().to_uppercase()
            } else {
                kw.to_string()
            }
        })
    })
}

/// 提取 FROM/JOIN 之后引用的表名（小写、去重、按出现顺序）
///
/// 带模式前缀的表名（如 `main.sales`）只取表名部分。
///
/// # 示例
///
/// ```rust
/// let tables = extract_tables("SELECT * FROM sales s JOIN regions r ON s.rid = r.id");
/// assert_eq!(tables, vec!["sales", "regions"]);
/// ```
pub fn extract_tables(query: &str) -> Vec<String> {
    let mut tables = Vec::new();

    for cap in TABLE_RE.captures_iter(query) {
        if let Some(table_match) = cap.get(2) {
            let table_name = table_match.as_str().to_lowercase();
            if !tables.contains(&table_name) {
                tables.push(table_name);
            }
        }
    }

    tables
}

/// 返回第一个不在白名单中的表（白名单为空时不限制，大小写不敏感）
pub fn find_disallowed_table(query: &str, allowed: &[String]) -> Option<String> {
    if allowed.is_empty() {
        return None;
    }

    extract_tables(query)
        .into_iter()
        .find(|table| !allowed.iter().any(|a| a.eq_ignore_ascii_case(table)))
}
