//! This module provides reusable test utilities:
//! - A harness wiring both stores, the engine and the bridge
//! - Mock legacy channels (gated, failing)
//! - Common test data

// Allow unused code in test fixtures - not every test binary uses all of them
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod mock_channel;
pub mod test_data;
pub mod test_harness;

// Re-export commonly used items
pub use mock_channel::{FailingChannel, GatedChannel};
pub use test_data::*;
pub use test_harness::TestHarness;
