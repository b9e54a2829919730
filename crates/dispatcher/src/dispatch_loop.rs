//! 定时驱动的派发循环
//!
//! 单个后台定时器驱动tick，tick之间严格串行：上一个tick的扫描派发
//! 没有结束前不会进入下一个tick。start/stop只控制是否继续排定后续
//! tick，不会打断进行中的tick。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use campaign_domain::ScheduleDispatchService;

pub struct DispatchLoop {
    dispatcher: Arc<dyn ScheduleDispatchService>,
    tick_interval: Duration,
    shutdown_tx: broadcast::Sender<()>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl DispatchLoop {
    pub fn new(dispatcher: Arc<dyn ScheduleDispatchService>, tick_interval: Duration) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            dispatcher,
            tick_interval,
            shutdown_tx,
            handle: Mutex::new(None),
        }
    }

    /// 启动后台tick循环；重复调用是幂等的
    pub async fn start(&self) {
        let mut handle = self.handle.lock().await;
        if handle.is_some() {
            warn!("派发循环已在运行，忽略重复的start");
            return;
        }

        info!("启动派发循环, tick间隔: {:?}", self.tick_interval);
        let dispatcher = Arc::clone(&self.dispatcher);
        let shutdown_rx = self.shutdown_tx.subscribe();
        let interval = self.tick_interval;
        *handle = Some(tokio::spawn(run_dispatch_loop(
            dispatcher,
            interval,
            shutdown_rx,
        )));
    }

    /// 停止排定后续tick并等待循环退出；进行中的tick运行到结束
    pub async fn stop(&self) {
        let mut handle = self.handle.lock().await;
        let Some(task) = handle.take() else {
            return;
        };
        let _ = self.shutdown_tx.send(());
        if let Err(e) = task.await {
            error!("派发循环任务退出异常: {e}");
        }
        info!("派发循环已停止");
    }

    pub async fn is_running(&self) -> bool {
        self.handle.lock().await.is_some()
    }
}

async fn run_dispatch_loop(
    dispatcher: Arc<dyn ScheduleDispatchService>,
    tick_interval: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let mut interval = tokio::time::interval(tick_interval);
    // 错过的tick不追赶，保持tick串行
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(e) = dispatcher.scan_and_dispatch().await {
                    error!("本次扫描派发失败: {e}");
                }
            }
            _ = shutdown_rx.recv() => {
                info!("派发循环收到关闭信号");
                break;
            }
        }
    }
}
