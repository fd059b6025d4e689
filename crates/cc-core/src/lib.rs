//! cc-core
//!
//! Business logic and services for Control Center.
//! Depends on cc-domain. No CLI, no terminal I/O, no direct storage interactions.

pub mod cash_flow_service;
pub mod draft;
pub mod error;
pub mod recurrence_service;
pub mod schedule_service;
pub mod storage;
pub mod task_service;
pub mod time;


pub use cash_flow_service::*;
pub use draft::*;
pub use error::CoreError;
pub use recurrence_service::*;
pub use schedule_service::*;
pub use task_service::*;
pub use time::{Clock, FixedClock};
