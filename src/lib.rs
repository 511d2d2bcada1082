#![doc(test(attr(deny(warnings))))]

//! Finance Core offers the ledger, budget tracking, and savings goal
//! primitives that power higher level personal finance workflows.

pub mod clock;
pub mod core;
pub mod domain;
pub mod errors;
pub mod ledger;
pub mod notify;
pub mod storage;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Finance Core tracing initialized.");
    });
}
