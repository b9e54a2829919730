use anyhow::Result;
use clap::{Arg, Command};

mod app;

use app::{start_application, StartupConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行参数
    let matches = Command::new("campaign-scheduler")
        .version("1.0.0")
        .about("消息营销CRM - 定时发送调度服务")
        .long_about("启动定时发送调度服务，周期性扫描到期计划并向收件人发送消息")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("配置文件路径"),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("日志级别")
                .value_parser(["trace", "debug", "info", "warn", "error"])
                .default_value("info"),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_name("FORMAT")
                .help("日志格式")
                .value_parser(["json", "pretty"])
                .default_value("pretty"),
        )
        .get_matches();

    let startup_config = StartupConfig {
        config_path: matches.get_one::<String>("config").map(|s| s.to_string()),
        log_level: matches.get_one::<String>("log-level").unwrap().to_string(),
        log_format: matches
            .get_one::<String>("log-format")
            .unwrap()
            .to_string(),
    };

    start_application(startup_config).await
}
