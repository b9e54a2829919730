//! 循环规则值对象
//!
//! 存储层保存的是不透明JSON字符串，进入领域层时按计划类型解析为
//! 带判别式的枚举，解析即校验，之后的计算不再接触原始JSON。

use chrono::{NaiveTime, Weekday};
use serde::Deserialize;

use crate::entities::ScheduleType;
use crate::errors::{SchedulerError, SchedulerResult};

/// 解析后的循环规则，每个计划类型对应一种形态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecurrenceRule {
    Weekly {
        weekday: Weekday,
        time: Option<NaiveTime>,
    },
    Monthly {
        day: u32,
        time: Option<NaiveTime>,
    },
    Yearly {
        month: u32,
        day: u32,
        time: Option<NaiveTime>,
    },
    Birthday {
        time: Option<NaiveTime>,
    },
}

#[derive(Deserialize)]
struct WeeklyPattern {
    day: String,
    time: Option<String>,
}

#[derive(Deserialize)]
struct MonthlyPattern {
    day: u32,
    time: Option<String>,
}

#[derive(Deserialize)]
struct YearlyPattern {
    month: u32,
    day: u32,
    time: Option<String>,
}

#[derive(Deserialize, Default)]
struct BirthdayPattern {
    time: Option<String>,
}

impl RecurrenceRule {
    /// 按计划类型解析JSON编码的循环规则
    pub fn parse(schedule_type: ScheduleType, raw: &str) -> SchedulerResult<Self> {
        match schedule_type {
            ScheduleType::OneTime => Err(SchedulerError::invalid_recurrence(
                "ONE_TIME计划不携带循环规则",
            )),
            ScheduleType::Weekly => {
                let pattern: WeeklyPattern = parse_json(raw)?;
                Ok(RecurrenceRule::Weekly {
                    weekday: parse_weekday_code(&pattern.day)?,
                    time: parse_time_opt(pattern.time.as_deref())?,
                })
            }
            ScheduleType::Monthly => {
                let pattern: MonthlyPattern = parse_json(raw)?;
                if !(1..=31).contains(&pattern.day) {
                    return Err(SchedulerError::invalid_recurrence(format!(
                        "月循环的day必须在1..=31之间: {}",
                        pattern.day
                    )));
                }
                Ok(RecurrenceRule::Monthly {
                    day: pattern.day,
                    time: parse_time_opt(pattern.time.as_deref())?,
                })
            }
            ScheduleType::Yearly => {
                let pattern: YearlyPattern = parse_json(raw)?;
                if !(1..=12).contains(&pattern.month) {
                    return Err(SchedulerError::invalid_recurrence(format!(
                        "年循环的month必须在1..=12之间: {}",
                        pattern.month
                    )));
                }
                if !(1..=31).contains(&pattern.day) {
                    return Err(SchedulerError::invalid_recurrence(format!(
                        "年循环的day必须在1..=31之间: {}",
                        pattern.day
                    )));
                }
                Ok(RecurrenceRule::Yearly {
                    month: pattern.month,
                    day: pattern.day,
                    time: parse_time_opt(pattern.time.as_deref())?,
                })
            }
            ScheduleType::Birthday => {
                let pattern: BirthdayPattern = parse_json(raw)?;
                Ok(RecurrenceRule::Birthday {
                    time: parse_time_opt(pattern.time.as_deref())?,
                })
            }
        }
    }

    /// 规则中显式指定的发送时刻
    pub fn time(&self) -> Option<NaiveTime> {
        match self {
            RecurrenceRule::Weekly { time, .. }
            | RecurrenceRule::Monthly { time, .. }
            | RecurrenceRule::Yearly { time, .. }
            | RecurrenceRule::Birthday { time } => *time,
        }
    }
}

fn parse_json<'a, T: Deserialize<'a>>(raw: &'a str) -> SchedulerResult<T> {
    serde_json::from_str(raw)
        .map_err(|e| SchedulerError::invalid_recurrence(format!("循环规则JSON无法解析: {e}")))
}

/// 周几代码，周日=0；接受两字母和三字母两种写法
fn parse_weekday_code(code: &str) -> SchedulerResult<Weekday> {
    match code.to_ascii_uppercase().as_str() {
        "SU" | "SUN" => Ok(Weekday::Sun),
        "MO" | "MON" => Ok(Weekday::Mon),
        "TU" | "TUE" => Ok(Weekday::Tue),
        "WE" | "WED" => Ok(Weekday::Wed),
        "TH" | "THU" => Ok(Weekday::Thu),
        "FR" | "FRI" => Ok(Weekday::Fri),
        "SA" | "SAT" => Ok(Weekday::Sat),
        other => Err(SchedulerError::invalid_recurrence(format!(
            "无法识别的周几代码: {other}"
        ))),
    }
}

/// 显式time字段解析失败是致命的InvalidRecurrence，不做静默回退
fn parse_time_opt(time: Option<&str>) -> SchedulerResult<Option<NaiveTime>> {
    match time {
        None => Ok(None),
        Some(s) => NaiveTime::parse_from_str(s, "%H:%M")
            .map(Some)
            .map_err(|_| SchedulerError::invalid_recurrence(format!("time字段格式无效: {s}"))),
    }
}
