pub mod entities;
pub mod errors;
pub mod recurrence;
pub mod repositories;
pub mod services;

pub use entities::*;
pub use errors::{SchedulerError, SchedulerResult};
pub use recurrence::RecurrenceRule;
pub use repositories::*;
pub use services::*;
