use serde::{Deserialize, Serialize};

/// Canonical link record as stored durably.
///
/// `click_count` and `expires_at` are only authoritative between sync
/// cycles; live reads go through the fast-store keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlMapping {
    pub short_code: String,
    pub original_url: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub click_count: u64,
}
