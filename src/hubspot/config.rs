use serde::{Deserialize, Serialize};

/// HubSpot app registration and endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubSpotConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
    #[serde(default = "default_authorization_url")]
    pub authorization_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_items_url")]
    pub items_url: String,
    /// Type tag stamped on every loaded item
    #[serde(default = "default_item_type")]
    pub item_type: String,
    /// Seconds the state record and verifier stay valid
    #[serde(default = "default_flow_ttl")]
    pub state_ttl: u64,
    /// Seconds credentials wait for pickup after the callback
    #[serde(default = "default_flow_ttl")]
    pub credentials_ttl: u64,
    /// Send the verifier as a PKCE challenge/verifier pair
    #[serde(default)]
    pub pkce: bool,
    /// Upper bound on list pages fetched per load
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
}

fn default_redirect_uri() -> String {
    "http://localhost:8000/integrations/hubspot/oauth2callback".to_string()
}

fn default_scopes() -> Vec<String> {
    vec!["oauth".to_string(), "crm.objects.companies.read".to_string()]
}

fn default_authorization_url() -> String {
    "https://app.hubspot.com/oauth/authorize".to_string()
}

fn default_token_url() -> String {
    "https://api.hubapi.com/oauth/v1/token".to_string()
}

fn default_items_url() -> String {
    "https://api.hubapi.com/crm/v3/objects/companies".to_string()
}

fn default_item_type() -> String {
    "hubspot_company".to_string()
}

fn default_flow_ttl() -> u64 {
    600 // 10 minutes
}

fn default_max_pages() -> usize {
    100
}

impl Default for HubSpotConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: default_redirect_uri(),
            scopes: default_scopes(),
            authorization_url: default_authorization_url(),
            token_url: default_token_url(),
            items_url: default_items_url(),
            item_type: default_item_type(),
            state_ttl: default_flow_ttl(),
            credentials_ttl: default_flow_ttl(),
            pkce: false,
            max_pages: default_max_pages(),
        }
    }
}
