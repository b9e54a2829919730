//! 循环时刻计算
//!
//! 纯函数式的下次执行时刻推算：给定计划类型、已解析的循环规则和
//! 参考时刻，产生严格晚于参考时刻的下一次执行时间。无I/O、无副作用，
//! 相同输入永远得到相同输出。所有计算基于UTC。

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};

use campaign_domain::{RecurrenceRule, Schedule, ScheduleType, SchedulerError, SchedulerResult};

/// 规则与scheduled_at都未给出发送时刻时的缺省值
pub fn default_send_time() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default()
}

/// 单个计划的循环时刻计算器，构造时完成规则解析与校验
pub struct RecurrenceCalculator {
    schedule_type: ScheduleType,
    scheduled_at: Option<DateTime<Utc>>,
    rule: Option<RecurrenceRule>,
}

impl RecurrenceCalculator {
    pub fn for_schedule(schedule: &Schedule) -> SchedulerResult<Self> {
        let rule = match schedule.schedule_type {
            ScheduleType::OneTime => None,
            recurring_type => {
                let raw = schedule.recurring_pattern.as_deref().ok_or_else(|| {
                    SchedulerError::invalid_recurrence(format!(
                        "{}缺少recurring_pattern",
                        schedule.entity_description()
                    ))
                })?;
                Some(RecurrenceRule::parse(recurring_type, raw)?)
            }
        };
        Ok(Self {
            schedule_type: schedule.schedule_type,
            scheduled_at: schedule.scheduled_at,
            rule,
        })
    }

    /// 计算严格晚于参考时刻的下一次执行时间
    ///
    /// ONE_TIME直接返回scheduled_at（缺失时返回None，由创建时校验兜底）；
    /// 循环类型永远不会返回等于或早于参考时刻的结果。
    pub fn next_execution_time(&self, reference: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match (self.schedule_type, self.rule) {
            (ScheduleType::OneTime, _) => self.scheduled_at,
            (_, Some(rule)) => self.project(&rule, reference),
            // for_schedule保证循环类型必有规则
            (_, None) => None,
        }
    }

    /// 发送时刻回退链：规则time -> scheduled_at的时分秒 -> 09:00
    fn send_time(&self, rule: &RecurrenceRule) -> NaiveTime {
        rule.time()
            .or_else(|| self.scheduled_at.map(|at| at.time()))
            .unwrap_or_else(default_send_time)
    }

    fn project(&self, rule: &RecurrenceRule, reference: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let time = self.send_time(rule);
        match *rule {
            RecurrenceRule::Weekly { weekday, .. } => {
                let days_ahead = (weekday.num_days_from_sunday() as i64
                    - reference.weekday().num_days_from_sunday() as i64)
                    .rem_euclid(7);
                let date = reference.date_naive() + Duration::days(days_ahead);
                let mut candidate = date.and_time(time).and_utc();
                if candidate <= reference {
                    candidate += Duration::days(7);
                }
                Some(candidate)
            }
            RecurrenceRule::Monthly { day, .. } => {
                let candidate =
                    clamped_date(reference.year(), reference.month(), day)?.and_time(time).and_utc();
                if candidate > reference {
                    return Some(candidate);
                }
                let (year, month) = next_month(reference.year(), reference.month());
                Some(clamped_date(year, month, day)?.and_time(time).and_utc())
            }
            RecurrenceRule::Yearly { month, day, .. } => {
                let month = month.clamp(1, 12);
                let candidate = clamped_date(reference.year(), month, day)?
                    .and_time(time)
                    .and_utc();
                if candidate > reference {
                    return Some(candidate);
                }
                // 跨年后重新按目标年收缩日（2月29日在平年回退到28日）
                Some(
                    clamped_date(reference.year() + 1, month, day)?
                        .and_time(time)
                        .and_utc(),
                )
            }
            RecurrenceRule::Birthday { .. } => {
                // 生日计划按“每日重查”处理，具体哪些联系人过生日由派发环节过滤
                let mut candidate = reference.date_naive().and_time(time).and_utc();
                if candidate <= reference {
                    candidate += Duration::days(1);
                }
                Some(candidate)
            }
        }
    }
}

/// 请求的日号收缩到目标月的实际长度：min(day, 月末日)
fn clamped_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day.min(last_day_of_month(year, month)))
}

fn last_day_of_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month >= 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}

fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month >= 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_day_of_month() {
        assert_eq!(last_day_of_month(2025, 1), 31);
        assert_eq!(last_day_of_month(2025, 2), 28);
        assert_eq!(last_day_of_month(2024, 2), 29);
        assert_eq!(last_day_of_month(2025, 4), 30);
        assert_eq!(last_day_of_month(2025, 12), 31);
    }

    #[test]
    fn test_clamped_date() {
        assert_eq!(
            clamped_date(2025, 2, 31),
            NaiveDate::from_ymd_opt(2025, 2, 28)
        );
        assert_eq!(
            clamped_date(2024, 2, 30),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert_eq!(
            clamped_date(2025, 6, 5),
            NaiveDate::from_ymd_opt(2025, 6, 5)
        );
    }
}
