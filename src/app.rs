use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use campaign_config::AppConfig;
use campaign_dispatcher::{DispatchLoop, ScheduleDispatcher};
use campaign_infrastructure::{
    create_pool, SqliteContactRepository, SqliteScheduleRepository, WebhookMessageSender,
};

/// 通用的应用启动配置
#[derive(Debug, Clone)]
pub struct StartupConfig {
    pub config_path: Option<String>,
    pub log_level: String,
    pub log_format: String,
}

/// 初始化日志系统
pub fn init_logging(log_level: &str, log_format: &str) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    match log_format {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()
                .context("初始化JSON日志格式失败")?;
        }
        "pretty" => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()
                .context("初始化Pretty日志格式失败")?;
        }
        _ => {
            return Err(anyhow::anyhow!("不支持的日志格式: {log_format}"));
        }
    }

    Ok(())
}

/// 启动调度服务并阻塞直到收到关闭信号
pub async fn start_application(startup_config: StartupConfig) -> Result<()> {
    init_logging(&startup_config.log_level, &startup_config.log_format)?;

    info!("启动消息定时发送调度服务");
    match &startup_config.config_path {
        Some(path) => info!("配置文件: {path}"),
        None => info!("未指定配置文件，使用缺省配置"),
    }

    let config = AppConfig::load(startup_config.config_path.as_deref())
        .context("加载应用配置失败")?;

    if !config.dispatcher.enabled {
        return Err(anyhow::anyhow!("Dispatcher被禁用，请检查配置"));
    }

    // 初始化数据库连接池（内含建表迁移）
    let pool = create_pool(&config.database)
        .await
        .context("创建数据库连接池失败")?;
    info!("数据库初始化完成: {}", config.database.url);

    // 组装派发器
    let schedule_repo = Arc::new(SqliteScheduleRepository::new(pool.clone()));
    let contact_repo = Arc::new(SqliteContactRepository::new(pool));
    let sender = Arc::new(WebhookMessageSender::new(&config.sender).context("创建消息发送通道失败")?);

    let tick_interval = Duration::from_secs(config.dispatcher.tick_interval_seconds);
    let dispatcher = Arc::new(ScheduleDispatcher::new(
        schedule_repo,
        contact_repo,
        sender,
        tick_interval,
    ));

    let dispatch_loop = DispatchLoop::new(dispatcher, tick_interval);
    dispatch_loop.start().await;
    info!(
        "派发循环已启动，tick间隔: {}秒",
        config.dispatcher.tick_interval_seconds
    );

    // 等待关闭信号
    wait_for_shutdown_signal().await;

    info!("收到关闭信号，开始优雅关闭...");

    // 停止循环，等待进行中的tick结束
    match tokio::time::timeout(Duration::from_secs(30), dispatch_loop.stop()).await {
        Ok(_) => info!("调度服务已优雅关闭"),
        Err(_) => warn!("调度服务关闭超时，强制退出"),
    }

    info!("调度服务已退出");
    Ok(())
}

/// 等待关闭信号
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.unwrap_or_else(|e| {
            error!("安装Ctrl+C信号处理器失败: {}", e);
            std::process::exit(1);
        })
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => signal.recv().await,
            Err(e) => {
                error!("安装SIGTERM信号处理器失败: {}", e);
                std::process::exit(1);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("收到Ctrl+C信号");
        },
        _ = terminate => {
            info!("收到SIGTERM信号");
        },
    }
}
