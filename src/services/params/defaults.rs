//! 参数默认值解析
//!
//! - 字面量默认值原样返回
//! - `now()` 解析为今天
//! - `now(<±N><单位>)` 解析为今天偏移 N 个单位，单位为 d（天）、m（月）、y（年）
//! - 无法识别的 now 表达式回退为今天，不报错
//!
//! `h` 单位能被偏移表达式匹配，但没有对应的计算分支，同样回退为今天。

use super::format::DEFAULT_DATE_FORMAT;
use chrono::{Days, Local, Months, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static OFFSET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([+-]?\d+)([dhmy])").expect("偏移表达式正则必须合法"));

/// 以本地日期解析默认值
pub fn resolve_default(value: &Value) -> Value {
    resolve_default_at(value, Local::now().date_naive())
}

/// 以指定日期为"今天"解析默认值
pub fn resolve_default_at(value: &Value, today: NaiveDate) -> Value {
    let Value::String(raw) = value else {
        return value.clone();
    };

    let Some(inner) = raw
        .strip_prefix("now(")
        .and_then(|rest| rest.strip_suffix(')'))
    else {
        return value.clone();
    };

    let date = evaluate_offset(inner, today).unwrap_or(today);
    Value::String(date.format(DEFAULT_DATE_FORMAT).to_string())
}

/// 计算偏移后的日期，无法计算时返回 None
fn evaluate_offset(expr: &str, today: NaiveDate) -> Option<NaiveDate> {
    let caps = OFFSET_RE.captures(expr)?;
    let amount: i64 = caps[1].parse().ok()?;
    let magnitude = amount.unsigned_abs();

    match &caps[2] {
        "d" => {
            let days = Days::new(magnitude);
            if amount < 0 {
                today.checked_sub_days(days)
            } else {
                today.checked_add_days(days)
            }
        }
        "m" => shift_months(today, amount, magnitude),
        "y" => shift_months(today, amount, magnitude.checked_mul(12)?),
        _ => None,
    }
}

/// 月份偏移，目标月份天数不足时落在月末
fn shift_months(today: NaiveDate, sign: i64, months: u64) -> Option<NaiveDate> {
    let months = Months::new(u32::try_from(months).ok()?);
    if sign < 0 {
        today.checked_sub_months(months)
    } else {
        today.checked_add_months(months)
    }
}
