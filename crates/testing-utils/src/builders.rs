//! 测试数据构造器
//!
//! 带合理默认值的builder，测试只需覆写关心的字段。

use chrono::{DateTime, Utc};

use campaign_domain::{Contact, RecipientRef, Schedule, ScheduleType};

pub struct ScheduleBuilder {
    schedule: Schedule,
}

impl ScheduleBuilder {
    pub fn new() -> Self {
        Self {
            schedule: Schedule {
                id: 1,
                company_id: 1,
                user_id: 1,
                schedule_type: ScheduleType::OneTime,
                content: "测试消息".to_string(),
                scheduled_at: None,
                recurring_pattern: None,
                next_execution_at: None,
                last_executed_at: None,
                is_active: true,
                recipients: vec![RecipientRef::Contact { id: 1 }],
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.schedule.id = id;
        self
    }

    pub fn with_company_id(mut self, company_id: i64) -> Self {
        self.schedule.company_id = company_id;
        self
    }

    pub fn with_type(mut self, schedule_type: ScheduleType) -> Self {
        self.schedule.schedule_type = schedule_type;
        self
    }

    pub fn with_content(mut self, content: &str) -> Self {
        self.schedule.content = content.to_string();
        self
    }

    pub fn with_scheduled_at(mut self, at: DateTime<Utc>) -> Self {
        self.schedule.scheduled_at = Some(at);
        self
    }

    pub fn with_recurring_pattern(mut self, pattern: &str) -> Self {
        self.schedule.recurring_pattern = Some(pattern.to_string());
        self
    }

    pub fn with_next_execution_at(mut self, at: DateTime<Utc>) -> Self {
        self.schedule.next_execution_at = Some(at);
        self
    }

    pub fn with_last_executed_at(mut self, at: DateTime<Utc>) -> Self {
        self.schedule.last_executed_at = Some(at);
        self
    }

    pub fn with_recipients(mut self, recipients: Vec<RecipientRef>) -> Self {
        self.schedule.recipients = recipients;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.schedule.is_active = false;
        self
    }

    pub fn build(self) -> Schedule {
        self.schedule
    }
}

impl Default for ScheduleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ContactBuilder {
    contact: Contact,
}

impl ContactBuilder {
    pub fn new() -> Self {
        Self {
            contact: Contact {
                id: 1,
                company_id: 1,
                name: "测试联系人".to_string(),
                phone_number: "+8613800138000".to_string(),
                birth_month: None,
                birth_day: None,
            },
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.contact.id = id;
        self
    }

    pub fn with_company_id(mut self, company_id: i64) -> Self {
        self.contact.company_id = company_id;
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.contact.name = name.to_string();
        self
    }

    pub fn with_phone(mut self, phone: &str) -> Self {
        self.contact.phone_number = phone.to_string();
        self
    }

    pub fn with_birthday(mut self, month: u32, day: u32) -> Self {
        self.contact.birth_month = Some(month);
        self.contact.birth_day = Some(day);
        self
    }

    pub fn build(self) -> Contact {
        self.contact
    }
}

impl Default for ContactBuilder {
    fn default() -> Self {
        Self::new()
    }
}
