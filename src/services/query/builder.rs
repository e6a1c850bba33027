//! 命名占位符到位置占位符的转换
//!
//! 模板中的 `@name`（name 为 `[A-Za-z0-9_]` 的最长连续串）在参数映射中存在时
//! 替换为位置占位符；不存在的保持原样，留给执行器报错。`@@name` 从不替换。
//!
//! 编号按被替换参数名的字典序分配，每个不同的名称对应一个参数。
//! `?` 风格没有编号，参数按出现顺序逐个给出。

use crate::models::config::PlaceholderStyle;
use crate::models::{ParamValue, ValidatedParams};
use std::collections::BTreeMap;

/// 构建结果：语句 + 与占位符对应的参数列表
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub statement: String,
    pub args: Vec<ParamValue>,
}

/// 模板片段
#[derive(Debug, PartialEq)]
enum Token<'a> {
    Text(&'a str),
    Placeholder(&'a str),
}

fn is_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// 将模板切分为文本与占位符
fn tokenize(template: &str) -> Vec<Token<'_>> {
    let bytes = template.as_bytes();
    let mut tokens = Vec::new();
    let mut text_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'@' {
            i += 1;
            continue;
        }

        // @@name：整体作为文本
        if bytes.get(i + 1) == Some(&b'@') {
            i += 2;
            while i < bytes.len() && is_name_char(bytes[i]) {
                i += 1;
            }
            continue;
        }

        let name_start = i + 1;
        let mut name_end = name_start;
        while name_end < bytes.len() && is_name_char(bytes[name_end]) {
            name_end += 1;
        }
        if name_end == name_start {
            i += 1;
            continue;
        }

        if text_start < i {
            tokens.push(Token::Text(&template[text_start..i]));
        }
        tokens.push(Token::Placeholder(&template[name_start..name_end]));
        text_start = name_end;
        i = name_end;
    }

    if text_start < template.len() {
        tokens.push(Token::Text(&template[text_start..]));
    }
    tokens
}

/// 查询构建器
#[derive(Debug, Default, Clone, Copy)]
pub struct QueryBuilder {
    style: PlaceholderStyle,
}

impl QueryBuilder {
    pub fn new(style: PlaceholderStyle) -> Self {
        Self { style }
    }

    /// 构建语句与参数列表
    pub fn build(&self, template: &str, params: &ValidatedParams) -> BuiltQuery {
        let tokens = tokenize(template);

        // 被替换的不同名称，按字典序编号
        let positions: BTreeMap<&str, usize> = {
            let mut names: Vec<&str> = tokens
                .iter()
                .filter_map(|t| match t {
                    Token::Placeholder(name) if params.contains_key(*name) => Some(*name),
                    _ => None,
                })
                .collect();
            names.sort_unstable();
            names.dedup();
            names.into_iter().zip(1..).collect()
        };

        let mut statement = String::with_capacity(template.len());
        let mut args = Vec::new();

        if self.style != PlaceholderStyle::Question {
            args.extend(
                positions
                    .keys()
                    .filter_map(|name| params.get(*name))
                    .cloned(),
            );
        }

        for token in &tokens {
            match token {
                Token::Text(text) => statement.push_str(text),
                Token::Placeholder(name) => match (positions.get(name), params.get(*name)) {
                    (Some(&index), Some(value)) => {
                        statement.push_str(&self.style.marker(index));
                        if self.style == PlaceholderStyle::Question {
                            args.push(value.clone());
                        }
                    }
                    _ => {
                        statement.push('@');
                        statement.push_str(name);
                    }
                },
            }
        }

        BuiltQuery { statement, args }
    }
}
