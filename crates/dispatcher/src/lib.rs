//! 定时发送调度核心
//!
//! 两个协作部件自底向上构成：纯函数的循环时刻计算器，以及依赖它和
//! 外部仓储/发送通道的定时派发循环。

pub mod dispatch;
pub mod dispatch_loop;
pub mod recurrence;
pub mod validation;

pub use dispatch::{DispatchOutcome, ScheduleDispatcher, SkipReason};
pub use dispatch_loop::DispatchLoop;
pub use recurrence::RecurrenceCalculator;
pub use validation::{initialize_schedule, validate_new_schedule};
