//! 表格结果到记录的转换
//!
//! 每行按列顺序生成一条记录，字段名优先取 `field_mapping` 中的映射名。
//! 单元格值原样透传；行短于列数时缺失的列不出现在记录中，多余的单元格忽略。

use crate::models::Record;
use serde_json::Value;
use std::collections::BTreeMap;

/// 列名 -> 输出字段名
pub type FieldMapping = BTreeMap<String, String>;

/// 解析每列的输出字段名
fn output_names<'a>(columns: &'a [String], mapping: &'a FieldMapping) -> Vec<&'a str> {
    columns
        .iter()
        .map(|col| mapping.get(col).unwrap_or(col).as_str())
        .collect()
}

/// 将行数据转换为有序记录
pub fn transform_rows(columns: &[String], rows: Vec<Vec<Value>>, mapping: &FieldMapping) -> Vec<Record> {
    let names = output_names(columns, mapping);

    rows.into_iter()
        .map(|row| {
            names
                .iter()
                .zip(row)
                .map(|(name, cell)| (name.to_string(), cell))
                .collect::<Record>()
        })
        .collect()
}
