//! 参数类型校验器
//!
//! 每种声明类型对应一个实现 [`ParamValidator`] 的校验器，按 [`ParamType`] 分派。
//! 新增类型时新增校验器，而不是扩展共享分支。

use super::format::{
    parse_date, parse_datetime, DEFAULT_DATETIME_TEMPLATE, DEFAULT_DATE_TEMPLATE,
};
use crate::core::error::ValidationError;
use crate::models::{ParamType, ParamValue, ParameterSpec};
use regex::Regex;
use serde_json::Value;

/// 单一类型的参数校验能力
pub trait ParamValidator: Send + Sync {
    /// 校验调用方提供的值并转换为类型化的值
    fn validate(&self, spec: &ParameterSpec, raw: &Value) -> Result<ParamValue, ValidationError>;

    /// 将解析后的默认值标记为该类型（不做约束校验）
    ///
    /// 能按类型转换时转换，否则宽松保留。
    fn tag_default(&self, spec: &ParameterSpec, resolved: &Value) -> ParamValue {
        self.validate(&ParameterSpec::new(spec.name.clone(), spec.kind.clone()), resolved)
            .unwrap_or_else(|_| ParamValue::from_json_loose(resolved))
    }
}

/// 按声明类型取校验器，不支持的类型返回 None
pub fn validator_for(kind: &ParamType) -> Option<&'static dyn ParamValidator> {
    static DATE: DateValidator = DateValidator { with_time: false };
    static DATETIME: DateValidator = DateValidator { with_time: true };
    static STRING: StringValidator = StringValidator;
    static INT: IntValidator = IntValidator;
    static FLOAT: FloatValidator = FloatValidator;
    static BOOL: BoolValidator = BoolValidator;
    static ENUM: EnumValidator = EnumValidator;

    match kind {
        ParamType::Date => Some(&DATE),
        ParamType::DateTime => Some(&DATETIME),
        ParamType::String => Some(&STRING),
        ParamType::Int => Some(&INT),
        ParamType::Float => Some(&FLOAT),
        ParamType::Bool => Some(&BOOL),
        ParamType::Enum => Some(&ENUM),
        ParamType::Unsupported(_) => None,
    }
}

fn wrong_type(spec: &ParameterSpec, expected: &'static str) -> ValidationError {
    ValidationError::WrongType {
        name: spec.name.clone(),
        expected,
    }
}

/// 值的字符串形式：字符串取原文，整数值的浮点数不带小数部分，其余取 JSON 文本
fn display_form(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) if n.is_f64() => n
            .as_f64()
            .map(|f| f.to_string())
            .unwrap_or_else(|| n.to_string()),
        other => other.to_string(),
    }
}

/// date / datetime
pub struct DateValidator {
    with_time: bool,
}

impl ParamValidator for DateValidator {
    fn validate(&self, spec: &ParameterSpec, raw: &Value) -> Result<ParamValue, ValidationError> {
        let (expected, default_template) = if self.with_time {
            ("日期时间字符串", DEFAULT_DATETIME_TEMPLATE)
        } else {
            ("日期字符串", DEFAULT_DATE_TEMPLATE)
        };

        let text = raw.as_str().ok_or_else(|| wrong_type(spec, expected))?;
        let template = spec
            .validation
            .format
            .as_deref()
            .unwrap_or(default_template);

        let bad_format = || ValidationError::BadFormat {
            name: spec.name.clone(),
            format: template.to_string(),
        };

        // 统一按日期时间比较下限，date 类型取当天零点
        let parse = |s: &str| {
            if self.with_time {
                parse_datetime(s, template)
            } else {
                parse_date(s, template).and_then(|d| d.and_hms_opt(0, 0, 0))
            }
        };

        let value = parse(text).ok_or_else(bad_format)?;

        // 下限本身无法按模板解析时忽略
        if let Some(min) = spec.validation.min.as_ref().and_then(Value::as_str) {
            if let Some(min_value) = parse(min) {
                if value < min_value {
                    return Err(ValidationError::BeforeMin {
                        name: spec.name.clone(),
                        min: min.to_string(),
                    });
                }
            }
        }

        Ok(if self.with_time {
            ParamValue::DateTime(text.to_string())
        } else {
            ParamValue::Date(text.to_string())
        })
    }

    fn tag_default(&self, _spec: &ParameterSpec, resolved: &Value) -> ParamValue {
        match resolved {
            Value::String(s) if self.with_time => ParamValue::DateTime(s.clone()),
            Value::String(s) => ParamValue::Date(s.clone()),
            other => ParamValue::from_json_loose(other),
        }
    }
}

/// string，可选正则约束（匹配任意位置）
pub struct StringValidator;

impl ParamValidator for StringValidator {
    fn validate(&self, spec: &ParameterSpec, raw: &Value) -> Result<ParamValue, ValidationError> {
        let text = raw.as_str().ok_or_else(|| wrong_type(spec, "字符串"))?;

        if let Some(pattern) = spec.validation.regex.as_deref() {
            let re = Regex::new(pattern).map_err(|e| ValidationError::InvalidPattern {
                name: spec.name.clone(),
                reason: e.to_string(),
            })?;
            if !re.is_match(text) {
                return Err(ValidationError::PatternMismatch {
                    name: spec.name.clone(),
                });
            }
        }

        Ok(ParamValue::Text(text.to_string()))
    }
}

/// 数值约束：min/max 只认数值，其它类型忽略
fn bound(value: Option<&Value>) -> Option<f64> {
    value.and_then(Value::as_f64)
}

fn check_range(spec: &ParameterSpec, value: f64) -> Result<(), ValidationError> {
    if let Some(min) = bound(spec.validation.min.as_ref()) {
        if value < min {
            return Err(ValidationError::BelowMin {
                name: spec.name.clone(),
                min: min.to_string(),
            });
        }
    }
    if let Some(max) = bound(spec.validation.max.as_ref()) {
        if value > max {
            return Err(ValidationError::AboveMax {
                name: spec.name.clone(),
                max: max.to_string(),
            });
        }
    }
    Ok(())
}

/// int：接受整数、浮点数（截断）或整数字符串
pub struct IntValidator;

impl ParamValidator for IntValidator {
    fn validate(&self, spec: &ParameterSpec, raw: &Value) -> Result<ParamValue, ValidationError> {
        let value = match raw {
            Value::Number(n) => match n.as_i64() {
                Some(i) => i,
                None => n.as_f64().ok_or_else(|| wrong_type(spec, "整数"))?.trunc() as i64,
            },
            Value::String(s) => s.parse::<i64>().map_err(|_| wrong_type(spec, "整数"))?,
            _ => return Err(wrong_type(spec, "整数")),
        };

        // 下限/上限与整数比较前截断
        if let Some(min) = bound(spec.validation.min.as_ref()) {
            if value < min.trunc() as i64 {
                return Err(ValidationError::BelowMin {
                    name: spec.name.clone(),
                    min: min.to_string(),
                });
            }
        }
        if let Some(max) = bound(spec.validation.max.as_ref()) {
            if value > max.trunc() as i64 {
                return Err(ValidationError::AboveMax {
                    name: spec.name.clone(),
                    max: max.to_string(),
                });
            }
        }

        Ok(ParamValue::Int(value))
    }
}

/// float：接受数值或数值字符串，拒绝 NaN/无穷
pub struct FloatValidator;

impl ParamValidator for FloatValidator {
    fn validate(&self, spec: &ParameterSpec, raw: &Value) -> Result<ParamValue, ValidationError> {
        let value = match raw {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.parse::<f64>().ok(),
            _ => None,
        }
        .filter(|v| v.is_finite())
        .ok_or_else(|| wrong_type(spec, "数值"))?;

        check_range(spec, value)?;
        Ok(ParamValue::Float(value))
    }
}

/// bool：接受布尔值或可解析为布尔的字符串
pub struct BoolValidator;

impl BoolValidator {
    fn parse(text: &str) -> Option<bool> {
        match text {
            "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
            "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
            _ => None,
        }
    }
}

impl ParamValidator for BoolValidator {
    fn validate(&self, spec: &ParameterSpec, raw: &Value) -> Result<ParamValue, ValidationError> {
        match raw {
            Value::Bool(b) => Ok(ParamValue::Bool(*b)),
            Value::String(s) => Self::parse(s)
                .map(ParamValue::Bool)
                .ok_or_else(|| wrong_type(spec, "布尔值")),
            _ => Err(wrong_type(spec, "布尔值")),
        }
    }
}

/// enum：值的字符串形式必须等于某个可选值的字符串形式
pub struct EnumValidator;

impl ParamValidator for EnumValidator {
    fn validate(&self, spec: &ParameterSpec, raw: &Value) -> Result<ParamValue, ValidationError> {
        let values = spec
            .validation
            .values
            .as_ref()
            .ok_or_else(|| ValidationError::EnumWithoutValues {
                name: spec.name.clone(),
            })?;

        let needle = display_form(raw);
        if values.iter().any(|v| display_form(v) == needle) {
            return Ok(ParamValue::from_json_loose(raw));
        }

        Err(ValidationError::NotInEnum {
            name: spec.name.clone(),
            allowed: values
                .iter()
                .map(display_form)
                .collect::<Vec<_>>()
                .join(", "),
        })
    }

    fn tag_default(&self, _spec: &ParameterSpec, resolved: &Value) -> ParamValue {
        ParamValue::from_json_loose(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ParamConstraints;
    use serde_json::json;

    fn spec(kind: ParamType, validation: ParamConstraints) -> ParameterSpec {
        ParameterSpec::new("p", kind).with_validation(validation)
    }

    fn check(kind: ParamType, validation: ParamConstraints, raw: Value) -> Result<ParamValue, ValidationError> {
        let spec = spec(kind, validation);
        validator_for(&spec.kind)
            .expect("支持的类型")
            .validate(&spec, &raw)
    }

    #[test]
    fn test_unsupported_has_no_validator() {
        assert!(validator_for(&ParamType::Unsupported("uuid".into())).is_none());
    }

    #[test]
    fn test_date_default_format() {
        assert_eq!(
            check(ParamType::Date, Default::default(), json!("2024-01-31")),
            Ok(ParamValue::Date("2024-01-31".into()))
        );
        assert_eq!(
            check(ParamType::Date, Default::default(), json!("31/01/2024")),
            Err(ValidationError::BadFormat {
                name: "p".into(),
                format: "YYYY-MM-DD".into()
            })
        );
        assert!(matches!(
            check(ParamType::Date, Default::default(), json!(20240131)),
            Err(ValidationError::WrongType { .. })
        ));
    }

    #[test]
    fn test_date_custom_format_and_min() {
        let validation = ParamConstraints {
            format: Some("DD/MM/YYYY".into()),
            min: Some(json!("01/01/2024")),
            ..Default::default()
        };
        assert_eq!(
            check(ParamType::Date, validation.clone(), json!("15/03/2024")),
            Ok(ParamValue::Date("15/03/2024".into()))
        );
        // 等于下限通过，早于下限失败
        assert!(check(ParamType::Date, validation.clone(), json!("01/01/2024")).is_ok());
        assert_eq!(
            check(ParamType::Date, validation, json!("31/12/2023")),
            Err(ValidationError::BeforeMin {
                name: "p".into(),
                min: "01/01/2024".into()
            })
        );
    }

    #[test]
    fn test_date_unparseable_min_is_ignored() {
        let validation = ParamConstraints {
            min: Some(json!("soon")),
            ..Default::default()
        };
        assert!(check(ParamType::Date, validation, json!("1999-01-01")).is_ok());
    }

    #[test]
    fn test_datetime() {
        assert_eq!(
            check(ParamType::DateTime, Default::default(), json!("2024-01-31 23:59:59")),
            Ok(ParamValue::DateTime("2024-01-31 23:59:59".into()))
        );
        assert!(matches!(
            check(ParamType::DateTime, Default::default(), json!("2024-01-31")),
            Err(ValidationError::BadFormat { .. })
        ));

        let validation = ParamConstraints {
            min: Some(json!("2024-01-01 12:00:00")),
            ..Default::default()
        };
        assert!(matches!(
            check(ParamType::DateTime, validation, json!("2024-01-01 11:59:59")),
            Err(ValidationError::BeforeMin { .. })
        ));
    }

    #[test]
    fn test_string_regex_matches_anywhere() {
        let validation = ParamConstraints {
            regex: Some("[0-9]{3}".into()),
            ..Default::default()
        };
        assert_eq!(
            check(ParamType::String, validation.clone(), json!("ab123cd")),
            Ok(ParamValue::Text("ab123cd".into()))
        );
        assert_eq!(
            check(ParamType::String, validation, json!("ab12cd")),
            Err(ValidationError::PatternMismatch { name: "p".into() })
        );
        assert!(matches!(
            check(ParamType::String, Default::default(), json!(5)),
            Err(ValidationError::WrongType { .. })
        ));
    }

    #[test]
    fn test_string_invalid_regex() {
        let validation = ParamConstraints {
            regex: Some("([a-z".into()),
            ..Default::default()
        };
        assert!(matches!(
            check(ParamType::String, validation, json!("abc")),
            Err(ValidationError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_int_coercion() {
        let none = ParamConstraints::default;
        assert_eq!(check(ParamType::Int, none(), json!(42)), Ok(ParamValue::Int(42)));
        assert_eq!(check(ParamType::Int, none(), json!("42")), Ok(ParamValue::Int(42)));
        assert_eq!(check(ParamType::Int, none(), json!(7.9)), Ok(ParamValue::Int(7)));
        assert!(check(ParamType::Int, none(), json!("7.5")).is_err());
        assert!(check(ParamType::Int, none(), json!("abc")).is_err());
        assert!(check(ParamType::Int, none(), json!(true)).is_err());
    }

    #[test]
    fn test_int_range_is_inclusive() {
        let validation = ParamConstraints {
            min: Some(json!(1)),
            max: Some(json!(10)),
            ..Default::default()
        };
        assert!(check(ParamType::Int, validation.clone(), json!(1)).is_ok());
        assert!(check(ParamType::Int, validation.clone(), json!(10)).is_ok());
        assert_eq!(
            check(ParamType::Int, validation.clone(), json!(0)),
            Err(ValidationError::BelowMin {
                name: "p".into(),
                min: "1".into()
            })
        );
        assert_eq!(
            check(ParamType::Int, validation, json!("11")),
            Err(ValidationError::AboveMax {
                name: "p".into(),
                max: "10".into()
            })
        );
    }

    #[test]
    fn test_float() {
        let validation = ParamConstraints {
            min: Some(json!(0.5)),
            max: Some(json!(2)),
            ..Default::default()
        };
        assert_eq!(
            check(ParamType::Float, validation.clone(), json!("1.25")),
            Ok(ParamValue::Float(1.25))
        );
        assert_eq!(
            check(ParamType::Float, validation.clone(), json!(2)),
            Ok(ParamValue::Float(2.0))
        );
        assert!(matches!(
            check(ParamType::Float, validation.clone(), json!(0.1)),
            Err(ValidationError::BelowMin { .. })
        ));
        assert!(matches!(
            check(ParamType::Float, validation, json!(2.5)),
            Err(ValidationError::AboveMax { .. })
        ));
        assert!(check(ParamType::Float, Default::default(), json!("NaN")).is_err());
        assert!(check(ParamType::Float, Default::default(), json!("ten")).is_err());
    }

    #[test]
    fn test_bool() {
        assert_eq!(check(ParamType::Bool, Default::default(), json!(true)), Ok(ParamValue::Bool(true)));
        assert_eq!(check(ParamType::Bool, Default::default(), json!("F")), Ok(ParamValue::Bool(false)));
        assert_eq!(check(ParamType::Bool, Default::default(), json!("1")), Ok(ParamValue::Bool(true)));
        assert!(check(ParamType::Bool, Default::default(), json!("yes")).is_err());
        assert!(check(ParamType::Bool, Default::default(), json!(1)).is_err());
    }

    #[test]
    fn test_enum() {
        let validation = ParamConstraints {
            values: Some(vec![json!("a"), json!("b")]),
            ..Default::default()
        };
        assert_eq!(
            check(ParamType::Enum, validation.clone(), json!("a")),
            Ok(ParamValue::Text("a".into()))
        );
        let err = check(ParamType::Enum, validation, json!("c")).unwrap_err();
        assert_eq!(
            err,
            ValidationError::NotInEnum {
                name: "p".into(),
                allowed: "a, b".into()
            }
        );
        assert!(err.to_string().contains("[a, b]"));
    }

    #[test]
    fn test_enum_compares_string_forms() {
        let validation = ParamConstraints {
            values: Some(vec![json!(1), json!(2)]),
            ..Default::default()
        };
        assert_eq!(
            check(ParamType::Enum, validation.clone(), json!("2")),
            Ok(ParamValue::Text("2".into()))
        );
        assert_eq!(check(ParamType::Enum, validation, json!(1)), Ok(ParamValue::Int(1)));
    }

    #[test]
    fn test_enum_whole_float_matches_integer() {
        let validation = ParamConstraints {
            values: Some(vec![json!(1), json!(2), json!(2.5)]),
            ..Default::default()
        };
        assert_eq!(
            check(ParamType::Enum, validation.clone(), json!(2.0)),
            Ok(ParamValue::Float(2.0))
        );
        assert_eq!(
            check(ParamType::Enum, validation.clone(), json!("2.5")),
            Ok(ParamValue::Text("2.5".into()))
        );
        assert!(check(ParamType::Enum, validation, json!(3.0)).is_err());
        assert_eq!(display_form(&json!(2.0)), "2");
        assert_eq!(display_form(&json!(-0.25)), "-0.25");
    }

    #[test]
    fn test_enum_without_values() {
        assert_eq!(
            check(ParamType::Enum, Default::default(), json!("a")),
            Err(ValidationError::EnumWithoutValues { name: "p".into() })
        );
    }

    #[test]
    fn test_tag_default() {
        let date = ParameterSpec::new("since", ParamType::Date);
        assert_eq!(
            validator_for(&date.kind).unwrap().tag_default(&date, &json!("2026-10-12")),
            ParamValue::Date("2026-10-12".into())
        );

        let float = ParameterSpec::new("ratio", ParamType::Float);
        assert_eq!(
            validator_for(&float.kind).unwrap().tag_default(&float, &json!(1)),
            ParamValue::Float(1.0)
        );

        // 无法转换时宽松保留
        let int = ParameterSpec::new("n", ParamType::Int);
        assert_eq!(
            validator_for(&int.kind).unwrap().tag_default(&int, &json!("many")),
            ParamValue::Text("many".into())
        );
    }
}
