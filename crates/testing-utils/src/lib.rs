//! 测试工具：内存Mock与测试数据构造器

pub mod builders;
pub mod mocks;

pub use builders::{ContactBuilder, ScheduleBuilder};
pub use mocks::{MockContactRepository, MockMessageSender, MockScheduleRepository, SentMessage};
