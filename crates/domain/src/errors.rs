use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum SchedulerError {
    #[error("数据库操作失败: {0}")]
    DatabaseOperation(String),
    #[error("定时计划不存在: id={id}")]
    ScheduleNotFound { id: i64 },
    #[error("循环规则无效: {0}")]
    InvalidRecurrence(String),
    #[error("定时计划参数无效: {0}")]
    InvalidScheduleParams(String),
    #[error("消息发送失败: contact_id={contact_id}, {message}")]
    MessageSend { contact_id: i64, message: String },
    #[error("配置错误: {0}")]
    Configuration(String),
    #[error("数据序列化错误: {0}")]
    Serialization(String),
    #[error("系统内部错误: {0}")]
    Internal(String),
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;

impl SchedulerError {
    pub fn database_error<S: Into<String>>(msg: S) -> Self {
        Self::DatabaseOperation(msg.into())
    }
    pub fn schedule_not_found(id: i64) -> Self {
        Self::ScheduleNotFound { id }
    }
    pub fn invalid_recurrence<S: Into<String>>(msg: S) -> Self {
        Self::InvalidRecurrence(msg.into())
    }
    pub fn invalid_params<S: Into<String>>(msg: S) -> Self {
        Self::InvalidScheduleParams(msg.into())
    }
    pub fn send_failed<S: Into<String>>(contact_id: i64, msg: S) -> Self {
        Self::MessageSend {
            contact_id,
            message: msg.into(),
        }
    }
    /// 可重试错误：状态未持久化，计划在下一个tick仍会被选中
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SchedulerError::DatabaseOperation(_) | SchedulerError::MessageSend { .. }
        )
    }
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SchedulerError::Internal(_) | SchedulerError::Configuration(_)
        )
    }
}

impl From<serde_json::Error> for SchedulerError {
    fn from(err: serde_json::Error) -> Self {
        SchedulerError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for SchedulerError {
    fn from(err: anyhow::Error) -> Self {
        SchedulerError::Internal(err.to_string())
    }
}
