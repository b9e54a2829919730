//! 到期计划的扫描与派发
//!
//! 每个tick做一次完整的扫描：取出到期计划，逐个独立处理——展开收件人、
//! 生日过滤、逐收件人发送、写回下一次执行状态。单个计划的失败不会
//! 影响同一tick内的其他计划。

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use futures::future;
use tracing::{debug, error, info, warn};

use campaign_domain::{
    Contact, ContactRepository, DispatchStats, DispatchStateUpdate, MessageSender,
    RecipientRef, Schedule, ScheduleDispatchService, ScheduleRepository, ScheduleType,
    SchedulerError, SchedulerResult,
};

use crate::recurrence::RecurrenceCalculator;

/// 本周期跳过发送的原因；跳过不是错误，计划照常推进到下一周期
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// 消息正文为空白
    EmptyContent,
    /// 展开后没有任何收件人
    NoRecipients,
    /// 生日过滤后没有今天过生日的联系人
    NoBirthdays,
}

/// 单个计划在一次tick中的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Fired { sent: usize, failed: usize },
    Skipped(SkipReason),
    /// 循环规则无效或无法产生下一时刻，计划被停用
    Deactivated,
}

struct FireResult {
    fired: bool,
    sent: usize,
    failed: usize,
    skip: Option<SkipReason>,
}

pub struct ScheduleDispatcher {
    schedule_repo: Arc<dyn ScheduleRepository>,
    contact_repo: Arc<dyn ContactRepository>,
    sender: Arc<dyn MessageSender>,
    /// tick间隔；循环计划重新武装时的参考时刻 = now + tick间隔，
    /// 保证下一个tick不会立刻再次选中同一计划
    tick_interval: Duration,
}

impl ScheduleDispatcher {
    pub fn new(
        schedule_repo: Arc<dyn ScheduleRepository>,
        contact_repo: Arc<dyn ContactRepository>,
        sender: Arc<dyn MessageSender>,
        tick_interval: std::time::Duration,
    ) -> Self {
        Self {
            schedule_repo,
            contact_repo,
            sender,
            tick_interval: Duration::from_std(tick_interval).unwrap_or(Duration::minutes(1)),
        }
    }

    /// 以显式的当前时刻执行一次完整的扫描派发，便于测试注入时间
    pub async fn scan_and_dispatch_at(&self, now: DateTime<Utc>) -> SchedulerResult<DispatchStats> {
        let due_schedules = self.schedule_repo.find_due(now).await?;
        let mut stats = DispatchStats {
            scanned: due_schedules.len(),
            ..DispatchStats::default()
        };

        for schedule in &due_schedules {
            match self.process_schedule(schedule, now).await {
                Ok(DispatchOutcome::Fired { sent, failed }) => {
                    stats.fired += 1;
                    stats.messages_sent += sent;
                    stats.messages_failed += failed;
                    info!(
                        "{} 已派发: 成功{}条, 失败{}条",
                        schedule.entity_description(),
                        sent,
                        failed
                    );
                }
                Ok(DispatchOutcome::Skipped(reason)) => {
                    stats.skipped += 1;
                    debug!("{} 本周期跳过: {:?}", schedule.entity_description(), reason);
                }
                Ok(DispatchOutcome::Deactivated) => {
                    stats.deactivated += 1;
                    warn!("{} 已停用", schedule.entity_description());
                }
                // 单个计划的错误不中断本tick；状态未写回的计划下个tick重试
                Err(e) => {
                    stats.failed += 1;
                    error!("{} 处理失败: {}", schedule.entity_description(), e);
                }
            }
        }

        if stats.scanned > 0 {
            info!(
                "本次扫描完成: 到期{}个, 派发{}个, 跳过{}个, 停用{}个, 失败{}个",
                stats.scanned, stats.fired, stats.skipped, stats.deactivated, stats.failed
            );
        }
        Ok(stats)
    }

    async fn process_schedule(
        &self,
        schedule: &Schedule,
        now: DateTime<Utc>,
    ) -> SchedulerResult<DispatchOutcome> {
        // 规则解析失败的循环计划直接停用，不发送也不重试
        let calculator = match RecurrenceCalculator::for_schedule(schedule) {
            Ok(calculator) => calculator,
            Err(SchedulerError::InvalidRecurrence(msg)) => {
                warn!(
                    "{} 循环规则无效，停用: {}",
                    schedule.entity_description(),
                    msg
                );
                self.schedule_repo
                    .update_dispatch_state(schedule.id, &DispatchStateUpdate::deactivated())
                    .await?;
                return Ok(DispatchOutcome::Deactivated);
            }
            Err(e) => return Err(e),
        };

        let fire = self.fire_schedule(schedule, now).await?;
        self.finalize_schedule(schedule, &calculator, &fire, now)
            .await
    }

    /// 尝试触发一次发送；跳过不算失败，照常进入状态推进
    async fn fire_schedule(&self, schedule: &Schedule, now: DateTime<Utc>) -> SchedulerResult<FireResult> {
        if !schedule.has_content() {
            return Ok(FireResult {
                fired: false,
                sent: 0,
                failed: 0,
                skip: Some(SkipReason::EmptyContent),
            });
        }

        let mut recipients = self.expand_recipients(schedule).await?;

        if schedule.schedule_type == ScheduleType::Birthday {
            let before = recipients.len();
            recipients.retain(|contact| contact.has_birthday_on(now));
            debug!(
                "{} 生日过滤: {} -> {}",
                schedule.entity_description(),
                before,
                recipients.len()
            );
            if recipients.is_empty() {
                return Ok(FireResult {
                    fired: false,
                    sent: 0,
                    failed: 0,
                    skip: Some(SkipReason::NoBirthdays),
                });
            }
        }

        if recipients.is_empty() {
            return Ok(FireResult {
                fired: false,
                sent: 0,
                failed: 0,
                skip: Some(SkipReason::NoRecipients),
            });
        }

        let (sent, failed) = self.send_to_recipients(schedule, &recipients).await;
        Ok(FireResult {
            fired: true,
            sent,
            failed,
            skip: None,
        })
    }

    /// 展开收件人引用为去重后的联系人集合（按联系人id去重，
    /// 同一联系人既被直接引用又在群组里也只发一条）
    async fn expand_recipients(&self, schedule: &Schedule) -> SchedulerResult<Vec<Contact>> {
        let mut contact_ids = Vec::new();
        let mut group_ids = Vec::new();
        for recipient in &schedule.recipients {
            match recipient {
                RecipientRef::Contact { id } => contact_ids.push(*id),
                RecipientRef::Group { id } => group_ids.push(*id),
            }
        }

        let mut by_id: BTreeMap<i64, Contact> = BTreeMap::new();
        if !contact_ids.is_empty() {
            for contact in self.contact_repo.get_contacts_by_ids(&contact_ids).await? {
                by_id.insert(contact.id, contact);
            }
        }
        for group_id in group_ids {
            for contact in self.contact_repo.get_group_members(group_id).await? {
                by_id.entry(contact.id).or_insert(contact);
            }
        }
        Ok(by_id.into_values().collect())
    }

    /// 逐收件人并发发送；单个收件人失败不影响其他收件人
    async fn send_to_recipients(&self, schedule: &Schedule, recipients: &[Contact]) -> (usize, usize) {
        let sends = recipients.iter().map(|contact| async move {
            self.sender
                .send(schedule.company_id, schedule.user_id, contact, &schedule.content)
                .await
                .map_err(|e| (contact.id, e))
        });

        let mut sent = 0;
        let mut failed = 0;
        for result in future::join_all(sends).await {
            match result {
                Ok(()) => sent += 1,
                Err((contact_id, e)) => {
                    failed += 1;
                    warn!(
                        "{} 发送给联系人{}失败: {}",
                        schedule.entity_description(),
                        contact_id,
                        e
                    );
                }
            }
        }
        (sent, failed)
    }

    /// 写回本次处理后的计划状态
    ///
    /// ONE_TIME无论发送与否都只尝试这一次，之后永久停用；
    /// 循环类型以 now + tick间隔 为参考向前推算，防止同一时刻被重复选中。
    async fn finalize_schedule(
        &self,
        schedule: &Schedule,
        calculator: &RecurrenceCalculator,
        fire: &FireResult,
        now: DateTime<Utc>,
    ) -> SchedulerResult<DispatchOutcome> {
        let executed_at = fire.fired.then_some(now);

        let update = if schedule.is_recurring() {
            let reference = now + self.tick_interval;
            match calculator.next_execution_time(reference) {
                Some(next) => DispatchStateUpdate::rearmed(next, executed_at),
                None => {
                    warn!(
                        "{} 无法计算下一次执行时间，停用",
                        schedule.entity_description()
                    );
                    self.schedule_repo
                        .update_dispatch_state(schedule.id, &DispatchStateUpdate::deactivated())
                        .await?;
                    return Ok(DispatchOutcome::Deactivated);
                }
            }
        } else {
            DispatchStateUpdate::one_time_finished(executed_at)
        };

        self.schedule_repo
            .update_dispatch_state(schedule.id, &update)
            .await?;

        Ok(match fire.skip {
            Some(reason) => DispatchOutcome::Skipped(reason),
            None => DispatchOutcome::Fired {
                sent: fire.sent,
                failed: fire.failed,
            },
        })
    }
}

#[async_trait]
impl ScheduleDispatchService for ScheduleDispatcher {
    async fn scan_and_dispatch(&self) -> SchedulerResult<DispatchStats> {
        self.scan_and_dispatch_at(Utc::now()).await
    }
}
