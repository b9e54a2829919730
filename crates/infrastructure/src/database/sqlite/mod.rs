pub mod sqlite_contact_repository;
pub mod sqlite_schedule_repository;

pub use sqlite_contact_repository::SqliteContactRepository;
pub use sqlite_schedule_repository::SqliteScheduleRepository;
