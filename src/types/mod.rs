pub mod constants;
pub mod error;
pub mod message;

pub use constants::*;
pub use error::{RealtimeError, Result};
pub use message::{
    DepartmentStatistics, QueueItem, QueueStatistics, QueueUpdate, ServiceInfo,
};
