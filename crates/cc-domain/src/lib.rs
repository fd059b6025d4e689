//! cc-domain
//!
//! Pure domain models for Control Center (Office, Task, CashFlowEntry) and the
//! recurrence date engine. No I/O, no CLI, no storage.

pub mod cash_flow;
pub mod common;
pub mod office;
pub mod recurrence;
pub mod task;

pub use cash_flow::*;
pub use common::*;
pub use office::*;
pub use recurrence::*;
pub use task::*;
