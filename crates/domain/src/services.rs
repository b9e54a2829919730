//! 领域服务抽象

use async_trait::async_trait;

use crate::errors::SchedulerResult;

/// 单个tick的扫描派发统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchStats {
    pub scanned: usize,
    pub fired: usize,
    pub skipped: usize,
    pub deactivated: usize,
    pub failed: usize,
    pub messages_sent: usize,
    pub messages_failed: usize,
}

impl DispatchStats {
    pub fn processed(&self) -> usize {
        self.fired + self.skipped + self.deactivated + self.failed
    }
}

/// 扫描并派发到期计划的服务接口
#[async_trait]
pub trait ScheduleDispatchService: Send + Sync {
    async fn scan_and_dispatch(&self) -> SchedulerResult<DispatchStats>;
}
