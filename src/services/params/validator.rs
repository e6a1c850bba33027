//! 参数校验与默认值填充
//!
//! 按声明顺序逐个处理参数规格：
//! 1. 未提供：有默认值则解析默认值并写回；否则必填参数报错，非必填跳过
//! 2. 已提供：按声明类型校验并转换
//!
//! 未声明规格的附加参数宽松保留，供查询构建使用。JSON `null` 视为未提供。

use super::defaults::resolve_default_at;
use super::kinds::validator_for;
use crate::core::error::ValidationError;
use crate::models::{ParamValue, ParameterSpec, RawParams, ValidatedParams};
use chrono::{Local, NaiveDate};

/// 参数校验器（无状态，可跨请求并发使用）
#[derive(Debug, Default, Clone, Copy)]
pub struct ParameterValidator;

impl ParameterValidator {
    pub fn new() -> Self {
        Self
    }

    /// 以本地日期为"今天"校验参数
    pub fn validate(
        &self,
        specs: &[ParameterSpec],
        raw: &RawParams,
    ) -> Result<ValidatedParams, ValidationError> {
        self.validate_at(specs, raw, Local::now().date_naive())
    }

    /// 以指定日期为"今天"校验参数
    pub fn validate_at(
        &self,
        specs: &[ParameterSpec],
        raw: &RawParams,
        today: NaiveDate,
    ) -> Result<ValidatedParams, ValidationError> {
        let mut validated = ValidatedParams::new();

        for spec in specs {
            match raw.get(&spec.name).filter(|v| !v.is_null()) {
                Some(value) => {
                    let validator = validator_for(&spec.kind).ok_or_else(|| {
                        ValidationError::UnsupportedType {
                            name: spec.name.clone(),
                            kind: spec.kind.to_string(),
                        }
                    })?;
                    let typed = validator.validate(spec, value).map_err(|e| {
                        tracing::debug!(param = %spec.name, error = %e, "参数校验失败");
                        e
                    })?;
                    tracing::trace!(param = %spec.name, kind = typed.kind(), "参数校验通过");
                    validated.insert(spec.name.clone(), typed);
                }
                None => match &spec.default {
                    Some(default) => {
                        let resolved = resolve_default_at(default, today);
                        let tagged = match validator_for(&spec.kind) {
                            Some(validator) => validator.tag_default(spec, &resolved),
                            None => ParamValue::from_json_loose(&resolved),
                        };
                        validated.insert(spec.name.clone(), tagged);
                    }
                    None if spec.required => {
                        return Err(ValidationError::MissingRequired {
                            name: spec.name.clone(),
                        });
                    }
                    None => {}
                },
            }
        }

        for (name, value) in raw {
            if value.is_null() || specs.iter().any(|s| &s.name == name) {
                continue;
            }
            let loose = ParamValue::from_json_loose(value);
            tracing::trace!(param = %name, kind = loose.kind(), "保留未声明的参数");
            validated.insert(name.clone(), loose);
        }

        Ok(validated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{to_raw_params, ParamConstraints, ParamType};
    use serde_json::{json, Value};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn raw(pairs: &[(&str, Value)]) -> RawParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn sales_specs() -> Vec<ParameterSpec> {
        vec![
            ParameterSpec::new("region", ParamType::String).required(),
            ParameterSpec::new("since", ParamType::Date).with_default(json!("now(-7d)")),
            ParameterSpec::new("limit", ParamType::Int).with_validation(ParamConstraints {
                min: Some(json!(1)),
                max: Some(json!(1000)),
                ..Default::default()
            }),
        ]
    }

    #[test]
    fn test_required_missing() {
        let err = ParameterValidator::new()
            .validate_at(&sales_specs(), &RawParams::new(), today())
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingRequired {
                name: "region".into()
            }
        );
    }

    #[test]
    fn test_defaults_are_written_back() {
        let validated = ParameterValidator::new()
            .validate_at(&sales_specs(), &raw(&[("region", json!("west"))]), today())
            .unwrap();

        assert_eq!(validated["region"], ParamValue::Text("west".into()));
        assert_eq!(validated["since"], ParamValue::Date("2026-10-12".into()));
        // 可选且无默认值的参数不出现
        assert!(!validated.contains_key("limit"));
    }

    #[test]
    fn test_required_with_default_uses_default() {
        let specs = vec![ParameterSpec::new("day", ParamType::Date)
            .required()
            .with_default(json!("now()"))];
        let validated = ParameterValidator::new()
            .validate_at(&specs, &RawParams::new(), today())
            .unwrap();
        assert_eq!(validated["day"], ParamValue::Date("2026-10-19".into()));
    }

    #[test]
    fn test_constraints_only_when_present() {
        let validator = ParameterValidator::new();
        let specs = sales_specs();

        let ok = validator
            .validate_at(&specs, &raw(&[("region", json!("west")), ("limit", json!("50"))]), today())
            .unwrap();
        assert_eq!(ok["limit"], ParamValue::Int(50));

        let err = validator
            .validate_at(&specs, &raw(&[("region", json!("west")), ("limit", json!(0))]), today())
            .unwrap_err();
        assert_eq!(err.param(), Some("limit"));
    }

    #[test]
    fn test_first_failure_in_declaration_order() {
        let specs = vec![
            ParameterSpec::new("a", ParamType::Int),
            ParameterSpec::new("b", ParamType::Bool),
        ];
        let err = ParameterValidator::new()
            .validate_at(&specs, &raw(&[("a", json!("x")), ("b", json!("y"))]), today())
            .unwrap_err();
        assert_eq!(err.param(), Some("a"));
    }

    #[test]
    fn test_unsupported_type_only_fails_when_present() {
        let specs = vec![
            ParameterSpec::new("region", ParamType::String).required(),
            ParameterSpec::new("trace_id", ParamType::Unsupported("uuid".into())),
        ];
        let validator = ParameterValidator::new();

        let validated = validator
            .validate_at(&specs, &raw(&[("region", json!("west"))]), today())
            .unwrap();
        assert_eq!(validated.len(), 1);
        assert!(!validated.contains_key("trace_id"));

        let err = validator
            .validate_at(
                &specs,
                &raw(&[("region", json!("west")), ("trace_id", json!("abc"))]),
                today(),
            )
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnsupportedType {
                name: "trace_id".into(),
                kind: "uuid".into()
            }
        );
        assert_eq!(err.to_string(), "不支持的参数类型: uuid（参数 'trace_id'）");
    }

    #[test]
    fn test_unsupported_type_default_is_kept_loose() {
        let specs = vec![ParameterSpec::new("trace_id", ParamType::Unsupported("uuid".into()))
            .with_default(json!("0000"))];
        let validated = ParameterValidator::new()
            .validate_at(&specs, &RawParams::new(), today())
            .unwrap();
        assert_eq!(validated["trace_id"], ParamValue::Text("0000".into()));
    }

    #[test]
    fn test_extras_are_kept_and_null_is_absent() {
        let validated = ParameterValidator::new()
            .validate_at(
                &sales_specs(),
                &raw(&[
                    ("region", json!("west")),
                    ("since", Value::Null),
                    ("channel", json!("web")),
                    ("ignored", Value::Null),
                ]),
                today(),
            )
            .unwrap();

        assert_eq!(validated["since"], ParamValue::Date("2026-10-12".into()));
        assert_eq!(validated["channel"], ParamValue::Text("web".into()));
        assert!(!validated.contains_key("ignored"));
    }

    #[test]
    fn test_validation_is_idempotent() {
        let specs = vec![
            ParameterSpec::new("region", ParamType::String).required(),
            ParameterSpec::new("since", ParamType::Date).with_default(json!("now(-1m)")),
            ParameterSpec::new("at", ParamType::DateTime)
                .with_default(json!("2026-01-01 00:00:00")),
            ParameterSpec::new("ratio", ParamType::Float).with_default(json!(1)),
            ParameterSpec::new("n", ParamType::Int),
            ParameterSpec::new("flag", ParamType::Bool).with_default(json!("true")),
            ParameterSpec::new("mode", ParamType::Enum).with_validation(ParamConstraints {
                values: Some(vec![json!("fast"), json!("slow")]),
                ..Default::default()
            }),
        ];
        let validator = ParameterValidator::new();

        let first = validator
            .validate_at(
                &specs,
                &raw(&[
                    ("region", json!("west")),
                    ("n", json!("12")),
                    ("mode", json!("slow")),
                    ("extra", json!(3)),
                ]),
                today(),
            )
            .unwrap();
        let second = validator
            .validate_at(&specs, &to_raw_params(&first), today())
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first["ratio"], ParamValue::Float(1.0));
        assert_eq!(first["flag"], ParamValue::Bool(true));
    }
}
