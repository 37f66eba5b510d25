use crate::{cache::typed_cache, error::AppError};
use base64::{
    Engine, alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use oauth2::CsrfToken;
use serde::{Deserialize, Serialize};

/// Default lifetime of every flow record (10 minutes)
pub const FLOW_TTL_SECONDS: u64 = 600;

/// Padded URL-safe base64 out, padding optional in
const STATE_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Anti-CSRF state for one pending authorization
#[typed_cache(prefix = "hubspot_state", ttl = 600)]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateData {
    pub state: String,
    pub user_id: String,
    pub org_id: String,
}

impl StateData {
    /// Fresh state with a 32-byte random token
    pub fn new(user_id: &str, org_id: &str) -> Self {
        Self {
            state: CsrfToken::new_random_len(32).secret().clone(),
            user_id: user_id.to_string(),
            org_id: org_id.to_string(),
        }
    }

    /// Encode as the `state` query parameter sent to HubSpot
    pub fn encode(&self) -> Result<String, AppError> {
        let json = serde_json::to_vec(self)
            .map_err(|e| AppError::Internal(format!("Failed to serialize state: {e}")))?;
        Ok(STATE_ENGINE.encode(json))
    }

    pub fn decode(encoded: &str) -> Result<Self, AppError> {
        let bytes = STATE_ENGINE
            .decode(encoded.trim())
            .map_err(|e| AppError::BadRequest(format!("Malformed state parameter: {e}")))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| AppError::BadRequest(format!("Malformed state parameter: {e}")))
    }
}

/// Random verifier stored beside the state record
#[typed_cache(prefix = "hubspot_verifier", ttl = 600)]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodeVerifier(pub String);

/// Raw token endpoint response, held until the client picks it up once
#[typed_cache(prefix = "hubspot_credentials", ttl = 600)]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credentials(pub serde_json::Value);

/// Cache key shared by all records of one `(org, user)` flow
pub fn flow_key(org_id: &str, user_id: &str) -> String {
    format!("{org_id}:{user_id}")
}
