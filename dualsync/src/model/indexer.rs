use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Search indexer configuration, identified by `host`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Indexer {
    pub display_name: String,
    pub host: String,
    pub api_key: String,
    #[serde(default)]
    pub custom_headers: BTreeMap<String, String>,
}
