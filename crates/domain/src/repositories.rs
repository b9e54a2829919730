//! 仓储与外部协作方抽象
//!
//! 调度核心只依赖这些接口；持久化、联系人数据和实际的消息通道
//! 都是外部协作方，遵循依赖倒置原则。

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{Contact, Schedule};
use crate::errors::SchedulerResult;

/// 派发后写回的部分字段更新
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchStateUpdate {
    pub is_active: Option<bool>,
    /// None=不修改, Some(None)=置空, Some(Some(t))=设置为t
    pub next_execution_at: Option<Option<DateTime<Utc>>>,
    pub last_executed_at: Option<DateTime<Utc>>,
}

impl DispatchStateUpdate {
    /// ONE_TIME计划的终态：单次尝试后永久停用
    pub fn one_time_finished(executed_at: Option<DateTime<Utc>>) -> Self {
        Self {
            is_active: Some(false),
            next_execution_at: Some(None),
            last_executed_at: executed_at,
        }
    }
    /// 循环计划重新武装到下一个周期
    pub fn rearmed(next: DateTime<Utc>, executed_at: Option<DateTime<Utc>>) -> Self {
        Self {
            is_active: None,
            next_execution_at: Some(Some(next)),
            last_executed_at: executed_at,
        }
    }
    /// 循环规则无法产生下一个时刻时停用
    pub fn deactivated() -> Self {
        Self {
            is_active: Some(false),
            next_execution_at: Some(None),
            last_executed_at: None,
        }
    }
}

/// 定时计划仓储抽象
#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    async fn create(&self, schedule: &Schedule) -> SchedulerResult<Schedule>;
    async fn get_by_id(&self, id: i64) -> SchedulerResult<Option<Schedule>>;
    async fn list_by_company(&self, company_id: i64) -> SchedulerResult<Vec<Schedule>>;
    /// 查找所有到期计划（含尚未计算next_execution_at的新建ONE_TIME计划）
    async fn find_due(&self, now: DateTime<Utc>) -> SchedulerResult<Vec<Schedule>>;
    async fn update(&self, schedule: &Schedule) -> SchedulerResult<()>;
    async fn update_dispatch_state(
        &self,
        id: i64,
        update: &DispatchStateUpdate,
    ) -> SchedulerResult<()>;
    async fn delete(&self, id: i64) -> SchedulerResult<bool>;
}

/// 联系人与群组仓储抽象
#[async_trait]
pub trait ContactRepository: Send + Sync {
    async fn get_contacts_by_ids(&self, ids: &[i64]) -> SchedulerResult<Vec<Contact>>;
    async fn get_group_members(&self, group_id: i64) -> SchedulerResult<Vec<Contact>>;
}

/// 出站消息通道抽象，按收件人逐条发送，互不影响
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(
        &self,
        company_id: i64,
        user_id: i64,
        contact: &Contact,
        content: &str,
    ) -> SchedulerResult<()>;
}
