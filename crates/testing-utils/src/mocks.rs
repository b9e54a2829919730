//! 仓储与发送通道的内存Mock实现
//!
//! 单元测试用，不依赖真实数据库和外部服务；支持注入存储写失败和
//! 单个收件人的发送失败。

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use campaign_domain::{
    Contact, ContactRepository, DispatchStateUpdate, MessageSender, Schedule,
    ScheduleRepository, SchedulerError, SchedulerResult,
};

#[derive(Debug, Clone, Default)]
pub struct MockScheduleRepository {
    schedules: Arc<Mutex<HashMap<i64, Schedule>>>,
    next_id: Arc<Mutex<i64>>,
    fail_updates: Arc<Mutex<bool>>,
}

impl MockScheduleRepository {
    pub fn new() -> Self {
        Self {
            schedules: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(Mutex::new(1)),
            fail_updates: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_schedules(schedules: Vec<Schedule>) -> Self {
        let repo = Self::new();
        {
            let mut map = repo.schedules.lock().unwrap();
            let mut next_id = repo.next_id.lock().unwrap();
            for schedule in schedules {
                *next_id = (*next_id).max(schedule.id + 1);
                map.insert(schedule.id, schedule);
            }
        }
        repo
    }

    /// 注入存储写失败，模拟派发后状态写回失败的场景
    pub fn set_fail_updates(&self, fail: bool) {
        *self.fail_updates.lock().unwrap() = fail;
    }

    pub fn get_snapshot(&self, id: i64) -> Option<Schedule> {
        self.schedules.lock().unwrap().get(&id).cloned()
    }

    pub fn count(&self) -> usize {
        self.schedules.lock().unwrap().len()
    }
}

#[async_trait]
impl ScheduleRepository for MockScheduleRepository {
    async fn create(&self, schedule: &Schedule) -> SchedulerResult<Schedule> {
        let mut schedules = self.schedules.lock().unwrap();
        let mut next_id = self.next_id.lock().unwrap();

        let mut created = schedule.clone();
        created.id = *next_id;
        *next_id += 1;
        schedules.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_by_id(&self, id: i64) -> SchedulerResult<Option<Schedule>> {
        Ok(self.schedules.lock().unwrap().get(&id).cloned())
    }

    async fn list_by_company(&self, company_id: i64) -> SchedulerResult<Vec<Schedule>> {
        Ok(self
            .schedules
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.company_id == company_id)
            .cloned()
            .collect())
    }

    async fn find_due(&self, now: DateTime<Utc>) -> SchedulerResult<Vec<Schedule>> {
        let mut due: Vec<Schedule> = self
            .schedules
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.is_due(now))
            .cloned()
            .collect();
        due.sort_by_key(|s| s.id);
        Ok(due)
    }

    async fn update(&self, schedule: &Schedule) -> SchedulerResult<()> {
        if *self.fail_updates.lock().unwrap() {
            return Err(SchedulerError::database_error("模拟的存储写失败"));
        }
        self.schedules
            .lock()
            .unwrap()
            .insert(schedule.id, schedule.clone());
        Ok(())
    }

    async fn update_dispatch_state(
        &self,
        id: i64,
        update: &DispatchStateUpdate,
    ) -> SchedulerResult<()> {
        if *self.fail_updates.lock().unwrap() {
            return Err(SchedulerError::database_error("模拟的存储写失败"));
        }
        let mut schedules = self.schedules.lock().unwrap();
        let schedule = schedules
            .get_mut(&id)
            .ok_or(SchedulerError::ScheduleNotFound { id })?;
        if let Some(active) = update.is_active {
            schedule.is_active = active;
        }
        if let Some(next) = update.next_execution_at {
            schedule.next_execution_at = next;
        }
        if let Some(executed_at) = update.last_executed_at {
            schedule.last_executed_at = Some(executed_at);
        }
        schedule.updated_at = Utc::now();
        Ok(())
    }

    async fn delete(&self, id: i64) -> SchedulerResult<bool> {
        Ok(self.schedules.lock().unwrap().remove(&id).is_some())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockContactRepository {
    contacts: Arc<Mutex<HashMap<i64, Contact>>>,
    groups: Arc<Mutex<HashMap<i64, Vec<i64>>>>,
}

impl MockContactRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contacts(contacts: Vec<Contact>) -> Self {
        let repo = Self::new();
        {
            let mut map = repo.contacts.lock().unwrap();
            for contact in contacts {
                map.insert(contact.id, contact);
            }
        }
        repo
    }

    /// 建立群组与成员联系人id的关联
    pub fn add_group(&self, group_id: i64, member_ids: Vec<i64>) {
        self.groups.lock().unwrap().insert(group_id, member_ids);
    }
}

#[async_trait]
impl ContactRepository for MockContactRepository {
    async fn get_contacts_by_ids(&self, ids: &[i64]) -> SchedulerResult<Vec<Contact>> {
        let contacts = self.contacts.lock().unwrap();
        Ok(ids.iter().filter_map(|id| contacts.get(id).cloned()).collect())
    }

    async fn get_group_members(&self, group_id: i64) -> SchedulerResult<Vec<Contact>> {
        let contacts = self.contacts.lock().unwrap();
        let groups = self.groups.lock().unwrap();
        Ok(groups
            .get(&group_id)
            .map(|member_ids| {
                member_ids
                    .iter()
                    .filter_map(|id| contacts.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// 记录一次发送调用的快照
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub company_id: i64,
    pub user_id: i64,
    pub contact_id: i64,
    pub content: String,
}

#[derive(Debug, Clone, Default)]
pub struct MockMessageSender {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    failing_contacts: Arc<Mutex<HashSet<i64>>>,
}

impl MockMessageSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定的联系人发送时返回失败
    pub fn fail_for_contact(&self, contact_id: i64) {
        self.failing_contacts.lock().unwrap().insert(contact_id);
    }

    pub fn sent_messages(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl MessageSender for MockMessageSender {
    async fn send(
        &self,
        company_id: i64,
        user_id: i64,
        contact: &Contact,
        content: &str,
    ) -> SchedulerResult<()> {
        if self.failing_contacts.lock().unwrap().contains(&contact.id) {
            return Err(SchedulerError::send_failed(contact.id, "模拟的发送失败"));
        }
        self.sent.lock().unwrap().push(SentMessage {
            company_id,
            user_id,
            contact_id: contact.id,
            content: content.to_string(),
        });
        Ok(())
    }
}
