#![doc(test(attr(deny(warnings))))]

//! Control Center tracks a household office: tasks with follow-ups and
//! recurring deadlines, cash flow with projections, and a daily dashboard.

pub mod cli;
pub mod core;
pub mod utils;

pub use cc_config as config;
pub use cc_core as services;
pub use cc_domain as domain;
pub use cc_storage_json as storage;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Control Center tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
    }
}
