use crate::{
    cache::CacheManager,
    error::AppError,
    hubspot::{
        client::{AuthorizeClient, create_authorize_client, create_http_client, parse_endpoint},
        config::HubSpotConfig,
        state::{CodeVerifier, Credentials, StateData, flow_key},
    },
};
use oauth2::{CsrfToken, PkceCodeChallenge, Scope};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::{sync::Arc, time::Duration};
use tracing::{debug, info, warn};

/// Page returned to the OAuth popup; it only closes itself
pub const CLOSE_WINDOW_HTML: &str = r#"<html>
    <script>
        window.close();
    </script>
</html>
"#;

/// Query parameters HubSpot appends to the redirect URI
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// OAuth handshake for HubSpot: authorize, callback, one-shot credential pickup
pub struct HubSpotFlows {
    config: HubSpotConfig,
    oauth_client: AuthorizeClient,
    http_client: Client,
    cache: Arc<CacheManager>,
}

impl HubSpotFlows {
    pub fn new(config: HubSpotConfig, cache: Arc<CacheManager>) -> Result<Self, AppError> {
        let oauth_client = create_authorize_client(&config)?;
        parse_endpoint("token URL", &config.token_url)?;

        Ok(Self {
            config,
            oauth_client,
            http_client: create_http_client()?,
            cache,
        })
    }

    /// Start a flow for `(user_id, org_id)` and return the HubSpot consent URL
    pub async fn authorize(&self, user_id: &str, org_id: &str) -> Result<String, AppError> {
        let state_data = StateData::new(user_id, org_id);
        let encoded_state = state_data.encode()?;
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
        let verifier = CodeVerifier(pkce_verifier.secret().clone());

        let key = flow_key(org_id, user_id);
        let ttl = Some(Duration::from_secs(self.config.state_ttl));
        let state_cache = self.cache.cache::<StateData>();
        let verifier_cache = self.cache.cache::<CodeVerifier>();

        tokio::try_join!(
            state_cache.set_with_ttl(&key, &state_data, ttl),
            verifier_cache.set_with_ttl(&key, &verifier, ttl),
        )?;
        debug!(org_id, user_id, "stored HubSpot state and verifier");

        let mut request = self
            .oauth_client
            .authorize_url(move || CsrfToken::new(encoded_state))
            .add_scopes(self.config.scopes.iter().cloned().map(Scope::new));
        if self.config.pkce {
            request = request.set_pkce_challenge(pkce_challenge);
        }
        let (authorization_url, _state) = request.url();

        info!(org_id, user_id, "HubSpot authorization started");
        Ok(authorization_url.to_string())
    }

    /// Validate the returned state, exchange the code, and park the credentials
    pub async fn handle_callback(&self, params: CallbackParams) -> Result<(), AppError> {
        if let Some(error) = params.error {
            warn!(error = %error, "HubSpot authorization was denied");
            return Err(AppError::ProviderDenied(
                params.error_description.unwrap_or(error),
            ));
        }

        let code = params
            .code
            .ok_or_else(|| AppError::BadRequest("Missing authorization code".to_string()))?;
        let encoded_state = params
            .state
            .ok_or_else(|| AppError::BadRequest("Missing state parameter".to_string()))?;
        let returned = StateData::decode(&encoded_state)?;

        let key = flow_key(&returned.org_id, &returned.user_id);
        let state_cache = self.cache.cache::<StateData>();
        let verifier_cache = self.cache.cache::<CodeVerifier>();

        let (saved_state, verifier) =
            tokio::try_join!(state_cache.get(&key), verifier_cache.get(&key))?;

        match saved_state {
            Some(saved) if saved.state == returned.state => {}
            _ => {
                warn!(
                    org_id = %returned.org_id,
                    user_id = %returned.user_id,
                    "HubSpot callback state mismatch"
                );
                return Err(AppError::StateMismatch);
            }
        }

        // The flow records are cleared whether or not the exchange succeeds
        let (credentials, state_deleted, verifier_deleted) = tokio::join!(
            self.exchange_code(&code, verifier.as_ref()),
            state_cache.delete(&key),
            verifier_cache.delete(&key),
        );
        state_deleted?;
        verifier_deleted?;
        let credentials = credentials?;

        self.cache
            .cache::<Credentials>()
            .set_with_ttl(
                &key,
                &Credentials(credentials),
                Some(Duration::from_secs(self.config.credentials_ttl)),
            )
            .await?;

        info!(
            org_id = %returned.org_id,
            user_id = %returned.user_id,
            "HubSpot authorization completed"
        );
        Ok(())
    }

    /// Read and delete the cached credentials; works once per callback
    pub async fn take_credentials(&self, user_id: &str, org_id: &str) -> Result<Value, AppError> {
        let credentials = self
            .cache
            .cache::<Credentials>()
            .take(&flow_key(org_id, user_id))
            .await?
            .ok_or(AppError::CredentialsNotFound)?;

        debug!(org_id, user_id, "HubSpot credentials handed out");
        Ok(credentials.0)
    }

    async fn exchange_code(
        &self,
        code: &str,
        verifier: Option<&CodeVerifier>,
    ) -> Result<Value, AppError> {
        let mut form = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];
        if self.config.pkce {
            if let Some(verifier) = verifier {
                form.push(("code_verifier", verifier.0.as_str()));
            }
        }

        let response = self
            .http_client
            .post(&self.config.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::TokenExchange(format!("request failed: {e}")))?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::TokenExchange(format!("invalid response body: {e}")))?;

        if !status.is_success() {
            return Err(AppError::TokenExchange(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        Ok(body)
    }
}
