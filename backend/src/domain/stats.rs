//! Store-wide counters.

use serde::{Deserialize, Serialize};

/// Row counts for the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub users: u64,
    pub items: u64,
    pub kudos: u64,
}
