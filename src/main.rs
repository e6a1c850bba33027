// report-engine - 加载报表定义并输出可用报表
//
// 用法：report-engine [配置文件.toml] [describe <报表 ID>]
//
// 未接入数据源，查询执行器始终返回错误；开启 watch_definitions 时持续监听定义目录直到 Ctrl+C。

use report_engine::core::init_logger;
use report_engine::models::config::EngineConfig;
use report_engine::services::report::{ReportService, UnconfiguredExecutor};
use std::path::Path;
use std::sync::Arc;

fn load_config(path: Option<&str>) -> anyhow::Result<EngineConfig> {
    let mut config = match path {
        Some(path) => EngineConfig::from_file(Path::new(path))?,
        None => EngineConfig::default(),
    };
    config.apply_env();
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (config_path, command) = match args.first().map(String::as_str) {
        Some("describe") | None => (None, args.as_slice()),
        Some(path) => (Some(path), &args[1..]),
    };

    let config = load_config(config_path)?;

    if let Err(e) = init_logger(&config.log) {
        // 日志系统初始化失败时使用 eprintln!（因为 tracing 还不可用）
        eprintln!("WARNING: Failed to initialize logging system: {}", e);
    }
    tracing::info!(dir = ?config.definitions_dir, "报表引擎启动");

    let service = ReportService::new(config.clone(), Arc::new(UnconfiguredExecutor))?;

    match command {
        [cmd, id] if cmd == "describe" => {
            let summary = service.describe(id)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        [] => {
            println!("{}", serde_json::to_string_pretty(&service.list_available())?);
        }
        other => anyhow::bail!("未知命令: {}", other.join(" ")),
    }

    if config.watch_definitions {
        let _watcher = service.watch_definitions()?;
        tracing::info!("正在监听定义目录，按 Ctrl+C 退出");
        tokio::signal::ctrl_c().await?;
    }

    service.shutdown();
    Ok(())
}
