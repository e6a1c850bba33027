// 报表参数值
//
// 调用方传入的参数在校验前保持宽松（serde_json::Value），
// 校验时一次性转换为封闭的带标签联合 ParamValue。

use serde::{Serialize, Serializer};
use serde_json::{Number, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// 校验前的参数映射
pub type RawParams = HashMap<String, Value>;

/// 校验并填充默认值后的参数映射（按名称有序）
pub type ValidatedParams = BTreeMap<String, ParamValue>;

/// 校验后的参数值
///
/// 日期类参数保留调用方提供的原文，使其能按原格式再次通过校验。
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(String),
    DateTime(String),
}

impl ParamValue {
    /// 转换为 JSON 值（用于缓存指纹、元数据回显和再次校验）
    pub fn to_json(&self) -> Value {
        match self {
            ParamValue::Text(s) | ParamValue::Date(s) | ParamValue::DateTime(s) => {
                Value::String(s.clone())
            }
            ParamValue::Int(i) => Value::Number((*i).into()),
            ParamValue::Float(f) => Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            ParamValue::Bool(b) => Value::Bool(*b),
        }
    }

    /// 宽松转换：用于未声明规格的附加参数和字面量默认值
    ///
    /// 非标量值（数组、对象、null）以其 JSON 文本表示保留。
    pub fn from_json_loose(value: &Value) -> Self {
        match value {
            Value::String(s) => ParamValue::Text(s.clone()),
            Value::Bool(b) => ParamValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => ParamValue::Int(i),
                None => ParamValue::Float(n.as_f64().unwrap_or_default()),
            },
            other => ParamValue::Text(other.to_string()),
        }
    }

    /// 值的类型名称（用于日志）
    pub fn kind(&self) -> &'static str {
        match self {
            ParamValue::Text(_) => "string",
            ParamValue::Int(_) => "int",
            ParamValue::Float(_) => "float",
            ParamValue::Bool(_) => "bool",
            ParamValue::Date(_) => "date",
            ParamValue::DateTime(_) => "datetime",
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Text(s) | ParamValue::Date(s) | ParamValue::DateTime(s) => {
                write!(f, "{s}")
            }
            ParamValue::Int(i) => write!(f, "{i}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl Serialize for ParamValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// 查询串取值：看起来像数字的文本转为数字，其余保持文本
pub fn query_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Number(i.into());
    }
    match trimmed.parse::<f64>().ok().and_then(Number::from_f64) {
        Some(n) => Value::Number(n),
        None => Value::String(raw.to_string()),
    }
}

/// 校验后映射转回宽松映射
pub fn to_raw_params(params: &ValidatedParams) -> RawParams {
    params
        .iter()
        .map(|(name, value)| (name.clone(), value.to_json()))
        .collect()
}
