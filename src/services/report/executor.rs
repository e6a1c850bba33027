// Query Executor Trait - 查询执行器接口
//
// 引擎不关心具体的数据源：执行器接收带位置占位符的语句和参数，
// 返回列名与行数据，失败由执行器自行定义并原样上抛。

use crate::models::ParamValue;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 执行器返回的表格数据
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryOutput {
    pub columns: Vec<String>,
    /// 每行的单元格与列一一对应
    pub rows: Vec<Vec<Value>>,
}

impl QueryOutput {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }
}

/// 查询执行器 Trait
///
/// 实现方负责连接管理、超时和重试；引擎对执行器调用不做任何重试或退避。
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// 执行器名称（用于日志）
    fn name(&self) -> &str {
        "executor"
    }

    /// 执行语句
    async fn query(&self, statement: &str, args: &[ParamValue]) -> Result<QueryOutput>;
}

/// 未配置数据源时使用的执行器，所有查询都失败
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredExecutor;

#[async_trait]
impl QueryExecutor for UnconfiguredExecutor {
    fn name(&self) -> &str {
        "unconfigured"
    }

    async fn query(&self, _statement: &str, _args: &[ParamValue]) -> Result<QueryOutput> {
        anyhow::bail!("未配置查询执行器")
    }
}
