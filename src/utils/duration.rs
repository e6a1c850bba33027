//! 时长字符串解析
//!
//! 支持 "300ms"、"10s"、"10m"、"1h30m"、"1.5h" 这类由若干 `<数字><单位>` 片段组成的写法，
//! 单位：ns / us / µs / ms / s / m / h。

use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;

static SEGMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)(ns|us|µs|ms|s|m|h)").expect("时长正则必须合法")
});

/// 解析时长字符串
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let input = raw.trim();
    if input.is_empty() {
        return Err("时长为空".to_string());
    }
    if input == "0" {
        return Ok(Duration::ZERO);
    }

    let mut total_nanos: f64 = 0.0;
    let mut consumed = 0;

    for cap in SEGMENT_RE.captures_iter(input) {
        let whole = cap.get(0).ok_or_else(|| format!("无效的时长: {raw}"))?;
        // 片段必须首尾相接，不允许夹杂其它字符
        if whole.start() != consumed {
            return Err(format!("无效的时长: {raw}"));
        }
        consumed = whole.end();

        let amount: f64 = cap[1]
            .parse()
            .map_err(|_| format!("无效的时长数值: {}", &cap[1]))?;
        let unit_nanos = match &cap[2] {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60.0 * 1e9,
            "h" => 3600.0 * 1e9,
            other => return Err(format!("未知的时长单位: {other}")),
        };
        total_nanos += amount * unit_nanos;
    }

    if consumed != input.len() {
        return Err(format!("无效的时长: {raw}"));
    }

    Ok(Duration::from_nanos(total_nanos.round() as u64))
}
