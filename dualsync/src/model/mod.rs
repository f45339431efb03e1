//! Canonical in-memory entities.
//!
//! These are the shapes the rest of the crate works with. Each backend has its
//! own native representation and the codec layer converts between them:
//! - `profile` - Profile, per-service credentials, Wake-on-LAN
//! - `settings` - AppSettings singleton
//! - `indexer` - search indexer configuration

mod indexer;
mod profile;
mod settings;

pub use indexer::Indexer;
pub use profile::{Profile, ServiceAuth, ServiceCredential, ServiceKind, WakeOnLan};
pub use settings::AppSettings;
