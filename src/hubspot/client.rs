use crate::{error::AppError, hubspot::config::HubSpotConfig};
use oauth2::{AuthUrl, ClientId, EndpointNotSet, EndpointSet, RedirectUrl, basic::BasicClient};

// Only the authorization endpoint is driven through oauth2; the token
// response is cached verbatim, so the exchange goes through reqwest.
pub type AuthorizeClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet>;

/// Build the authorization-URL client, validating the configured endpoints
pub fn create_authorize_client(config: &HubSpotConfig) -> Result<AuthorizeClient, AppError> {
    if config.client_id.is_empty() {
        return Err(AppError::Internal(
            "HubSpot client_id is not configured".to_string(),
        ));
    }

    let auth_url = AuthUrl::new(config.authorization_url.clone()).map_err(|e| {
        AppError::Internal(format!(
            "Invalid HubSpot authorization URL '{}': {e}",
            config.authorization_url
        ))
    })?;

    let redirect_url = RedirectUrl::new(config.redirect_uri.clone()).map_err(|e| {
        AppError::Internal(format!(
            "Invalid HubSpot redirect URI '{}': {e}",
            config.redirect_uri
        ))
    })?;

    Ok(BasicClient::new(ClientId::new(config.client_id.clone()))
        .set_auth_uri(auth_url)
        .set_redirect_uri(redirect_url))
}

/// Parse an endpoint URL from configuration
pub fn parse_endpoint(name: &str, value: &str) -> Result<url::Url, AppError> {
    url::Url::parse(value)
        .map_err(|e| AppError::Internal(format!("Invalid HubSpot {name} '{value}': {e}")))
}

/// Outbound HTTP client for HubSpot API calls
pub fn create_http_client() -> Result<reqwest::Client, AppError> {
    reqwest::ClientBuilder::new()
        // Following redirects opens the client up to SSRF vulnerabilities.
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(|e| AppError::Internal(format!("reqwest build error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> HubSpotConfig {
        HubSpotConfig {
            client_id: "test-client-id".to_string(),
            client_secret: "test-client-secret".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_authorize_client() {
        assert!(create_authorize_client(&create_test_config()).is_ok());
    }

    #[test]
    fn test_create_authorize_client_missing_client_id() {
        let config = HubSpotConfig::default();
        let err = create_authorize_client(&config).unwrap_err();
        assert!(err.to_string().contains("client_id is not configured"));
    }

    #[test]
    fn test_create_authorize_client_bad_redirect() {
        let mut config = create_test_config();
        config.redirect_uri = "not a url".to_string();
        let err = create_authorize_client(&config).unwrap_err();
        assert!(err.to_string().contains("Invalid HubSpot redirect URI"));
    }

    #[test]
    fn test_parse_endpoint() {
        assert!(parse_endpoint("token URL", "https://api.hubapi.com/oauth/v1/token").is_ok());
        assert!(parse_endpoint("token URL", "relative/path").is_err());
    }
}
