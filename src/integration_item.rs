use serde::{Deserialize, Serialize};

/// Vendor-neutral view of one record loaded from an integration.
///
/// Items are rebuilt on every load and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationItem {
    pub id: String,
    pub name: Option<String>,
    pub domain: Option<String>,
    #[serde(rename = "type")]
    pub item_type: String,
    pub parent_id: Option<String>,
    pub parent_path_or_name: Option<String>,
}
