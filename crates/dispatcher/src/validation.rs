//! 创建时的计划校验
//!
//! 在计划入库前强制一次性/循环两类不变量，并计算初始的
//! next_execution_at。派发循环之后只消费合法的计划。

use chrono::{DateTime, Utc};

use campaign_domain::{Schedule, ScheduleType, SchedulerError, SchedulerResult};

use crate::recurrence::RecurrenceCalculator;

/// 校验新建计划并返回初始的下一次执行时间
///
/// ONE_TIME必须携带scheduled_at且不携带循环规则；循环类型必须携带
/// 本类型可解析的recurring_pattern，且能从当前时刻推算出下一次执行。
pub fn validate_new_schedule(
    schedule: &Schedule,
    now: DateTime<Utc>,
) -> SchedulerResult<DateTime<Utc>> {
    if !schedule.has_content() {
        return Err(SchedulerError::invalid_params("消息正文不能为空"));
    }
    if schedule.recipients.is_empty() {
        return Err(SchedulerError::invalid_params("至少需要一个收件人"));
    }

    match schedule.schedule_type {
        ScheduleType::OneTime => {
            if schedule.recurring_pattern.is_some() {
                return Err(SchedulerError::invalid_params(
                    "ONE_TIME计划不能携带循环规则",
                ));
            }
            schedule
                .scheduled_at
                .ok_or_else(|| SchedulerError::invalid_params("ONE_TIME计划必须指定scheduled_at"))
        }
        _ => {
            let calculator = RecurrenceCalculator::for_schedule(schedule)?;
            calculator.next_execution_time(now).ok_or_else(|| {
                SchedulerError::invalid_recurrence("循环规则无法产生下一次执行时间")
            })
        }
    }
}

/// 校验并就地填充初始next_execution_at，返回填充后的计划
pub fn initialize_schedule(mut schedule: Schedule, now: DateTime<Utc>) -> SchedulerResult<Schedule> {
    let next = validate_new_schedule(&schedule, now)?;
    schedule.next_execution_at = Some(next);
    Ok(schedule)
}
