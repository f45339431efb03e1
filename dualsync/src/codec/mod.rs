//! Stateless converters between the canonical entities and each backend's
//! native representation.
//!
//! - `legacy` - canonical ⇄ dictionary-of-primitives (`LegacyMap`)
//! - `structured` - canonical ⇄ database rows
//!
//! Nothing here performs I/O or takes a lock.

pub mod legacy;
pub mod structured;

pub use legacy::{LegacyMap, LegacySnapshot};
