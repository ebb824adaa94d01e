//! Application use cases / business logic

pub mod extract;
pub mod format;
pub mod generate;
pub mod scheduler;

pub use extract::extract;
pub use format::PostFormatter;
pub use generate::{ContentGenerator, GenerateConfig};
pub use scheduler::{Scheduler, SchedulerConfig};
