use serde::{Deserialize, Serialize};

/// Placeholder for author and publish time when no strategy resolved them.
pub const UNKNOWN: &str = "Unknown";

/// One feed item as delivered to the consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestedRecord {
    /// Native card id, or a surrogate hash when the card carries none.
    pub id: String,
    pub author: String,
    pub content: String,
    pub publish_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default)]
    pub is_retweet: bool,
}
