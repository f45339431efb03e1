//! HTTP request handlers.
//!
//! - `bridge` - bridge façade over HTTP
//! - `common` - Shared response types
//! - `status` - Engine and migration status

pub mod bridge;
pub mod common;
pub mod status;

pub use bridge::*;
pub use status::*;
