//! 日期模板
//!
//! 定义文件使用 `YYYY-MM-DD HH:mm:ss` 风格的模板，解析时转换为 chrono 格式串。

use chrono::{NaiveDate, NaiveDateTime};

/// 日期参数的默认模板
pub const DEFAULT_DATE_TEMPLATE: &str = "YYYY-MM-DD";

/// 日期时间参数的默认模板
pub const DEFAULT_DATETIME_TEMPLATE: &str = "YYYY-MM-DD HH:mm:ss";

/// 默认值解析（now 表达式）使用的输出格式
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

const TOKENS: &[(&str, &str)] = &[
    ("YYYY", "%Y"),
    ("MM", "%m"),
    ("DD", "%d"),
    ("HH", "%H"),
    ("mm", "%M"),
    ("ss", "%S"),
];

/// 模板转换为 chrono 格式串，其它字符原样保留（`%` 会被转义）
pub fn to_chrono_format(template: &str) -> String {
    let mut out = String::with_capacity(template.len() + 4);
    let mut rest = template;

    'outer: while let Some(ch) = rest.chars().next() {
        for (token, spec) in TOKENS {
            if let Some(after) = rest.strip_prefix(token) {
                out.push_str(spec);
                rest = after;
                continue 'outer;
            }
        }
        if ch == '%' {
            out.push_str("%%");
        } else {
            out.push(ch);
        }
        rest = &rest[ch.len_utf8()..];
    }

    out
}

/// 按模板解析日期
pub fn parse_date(text: &str, template: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, &to_chrono_format(template)).ok()
}

/// 按模板解析日期时间，模板不含时间部分时按当天零点处理
pub fn parse_datetime(text: &str, template: &str) -> Option<NaiveDateTime> {
    let format = to_chrono_format(template);
    NaiveDateTime::parse_from_str(text, &format)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, &format)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
