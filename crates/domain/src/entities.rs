use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// 定时计划类型（闭集，与存储层的字符串编码一一对应）
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ScheduleType {
    #[serde(rename = "ONE_TIME")]
    OneTime,
    #[serde(rename = "WEEKLY")]
    Weekly,
    #[serde(rename = "MONTHLY")]
    Monthly,
    #[serde(rename = "YEARLY")]
    Yearly,
    #[serde(rename = "BIRTHDAY")]
    Birthday,
}

impl ScheduleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleType::OneTime => "ONE_TIME",
            ScheduleType::Weekly => "WEEKLY",
            ScheduleType::Monthly => "MONTHLY",
            ScheduleType::Yearly => "YEARLY",
            ScheduleType::Birthday => "BIRTHDAY",
        }
    }
    pub fn is_recurring(&self) -> bool {
        !matches!(self, ScheduleType::OneTime)
    }
}

impl std::str::FromStr for ScheduleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ONE_TIME" => Ok(ScheduleType::OneTime),
            "WEEKLY" => Ok(ScheduleType::Weekly),
            "MONTHLY" => Ok(ScheduleType::Monthly),
            "YEARLY" => Ok(ScheduleType::Yearly),
            "BIRTHDAY" => Ok(ScheduleType::Birthday),
            _ => Err(format!("Invalid schedule type: {s}")),
        }
    }
}

/// 收件人引用：直接联系人或群组（群组在派发时展开为成员）
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecipientRef {
    Contact { id: i64 },
    Group { id: i64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub id: i64,
    pub company_id: i64,
    pub user_id: i64,
    pub schedule_type: ScheduleType,
    /// 消息正文，用户变量已替换；联系人/公司内置占位符留到发送时处理
    pub content: String,
    pub scheduled_at: Option<DateTime<Utc>>,
    /// 循环规则的JSON编码，非ONE_TIME类型必填
    pub recurring_pattern: Option<String>,
    pub next_execution_at: Option<DateTime<Utc>>,
    pub last_executed_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub recipients: Vec<RecipientRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Schedule {
    pub fn new(
        company_id: i64,
        user_id: i64,
        schedule_type: ScheduleType,
        content: String,
        recipients: Vec<RecipientRef>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // 将由数据库生成
            company_id,
            user_id,
            schedule_type,
            content,
            scheduled_at: None,
            recurring_pattern: None,
            next_execution_at: None,
            last_executed_at: None,
            is_active: true,
            recipients,
            created_at: now,
            updated_at: now,
        }
    }
    pub fn is_recurring(&self) -> bool {
        self.schedule_type.is_recurring()
    }
    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }
    /// 到期判定：next_execution_at已到，或尚未计算next的新建ONE_TIME计划
    /// 其scheduled_at已到且从未执行过
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        if !self.is_active {
            return false;
        }
        match self.next_execution_at {
            Some(next) => next <= now,
            None => {
                self.schedule_type == ScheduleType::OneTime
                    && self.last_executed_at.is_none()
                    && self.scheduled_at.map(|at| at <= now).unwrap_or(false)
            }
        }
    }
    pub fn entity_description(&self) -> String {
        format!(
            "定时计划 {} (公司: {}, 类型: {})",
            self.id,
            self.company_id,
            self.schedule_type.as_str()
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub id: i64,
    pub company_id: i64,
    pub name: String,
    pub phone_number: String,
    pub birth_month: Option<u32>,
    pub birth_day: Option<u32>,
}

impl Contact {
    /// 生日匹配只比较月和日，忽略出生年份
    pub fn has_birthday_on(&self, date: DateTime<Utc>) -> bool {
        match (self.birth_month, self.birth_day) {
            (Some(month), Some(day)) => date.month() == month && date.day() == day,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_schedule_type_roundtrip() {
        for (ty, s) in [
            (ScheduleType::OneTime, "ONE_TIME"),
            (ScheduleType::Weekly, "WEEKLY"),
            (ScheduleType::Monthly, "MONTHLY"),
            (ScheduleType::Yearly, "YEARLY"),
            (ScheduleType::Birthday, "BIRTHDAY"),
        ] {
            assert_eq!(ty.as_str(), s);
            assert_eq!(s.parse::<ScheduleType>().unwrap(), ty);
        }
        assert!("DAILY".parse::<ScheduleType>().is_err());
    }

    #[test]
    fn test_recipient_ref_json_encoding() {
        let refs = vec![
            RecipientRef::Contact { id: 7 },
            RecipientRef::Group { id: 3 },
        ];
        let json = serde_json::to_string(&refs).unwrap();
        assert!(json.contains("\"CONTACT\""));
        assert!(json.contains("\"GROUP\""));
        let parsed: Vec<RecipientRef> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, refs);
    }

    #[test]
    fn test_one_time_due_without_next_execution() {
        let now = Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap();
        let mut schedule = Schedule::new(
            1,
            1,
            ScheduleType::OneTime,
            "hello".to_string(),
            vec![RecipientRef::Contact { id: 1 }],
        );
        schedule.scheduled_at = Some(now - chrono::Duration::minutes(5));
        assert!(schedule.is_due(now));

        // 已执行过的ONE_TIME不再到期
        schedule.last_executed_at = Some(now - chrono::Duration::minutes(1));
        assert!(!schedule.is_due(now));
    }

    #[test]
    fn test_inactive_schedule_never_due() {
        let now = Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap();
        let mut schedule = Schedule::new(
            1,
            1,
            ScheduleType::Weekly,
            "hi".to_string(),
            vec![RecipientRef::Contact { id: 1 }],
        );
        schedule.next_execution_at = Some(now - chrono::Duration::minutes(1));
        assert!(schedule.is_due(now));
        schedule.is_active = false;
        assert!(!schedule.is_due(now));
    }

    #[test]
    fn test_birthday_match_ignores_year() {
        let contact = Contact {
            id: 1,
            company_id: 1,
            name: "李雷".to_string(),
            phone_number: "+8613800000000".to_string(),
            birth_month: Some(3),
            birth_day: Some(14),
        };
        let same_day = Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).unwrap();
        let other_day = Utc.with_ymd_and_hms(2025, 3, 15, 9, 0, 0).unwrap();
        assert!(contact.has_birthday_on(same_day));
        assert!(!contact.has_birthday_on(other_day));
    }
}
