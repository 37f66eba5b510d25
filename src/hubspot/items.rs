use crate::{
    error::AppError,
    hubspot::{
        client::{create_http_client, parse_endpoint},
        config::HubSpotConfig,
    },
    integration_item::IntegrationItem,
};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info};

/// Fetch-path failures, kept apart for logs and collapsed into
/// `AppError::ItemFetch` at the boundary
#[derive(Debug, Error)]
enum FetchError {
    #[error("credentials are not valid JSON: {0}")]
    InvalidCredentials(#[source] serde_json::Error),
    #[error("credentials do not contain an access_token")]
    MissingAccessToken,
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("list endpoint returned {0}")]
    Status(StatusCode),
    #[error("record {index} has no usable id")]
    MissingId { index: usize },
    #[error("stopped after {0} pages without reaching the end")]
    PageLimit(usize),
}

/// One page of the CRM list endpoint
#[derive(Debug, Deserialize)]
struct ListPage {
    #[serde(default)]
    results: Vec<Value>,
    #[serde(default)]
    limit: Option<u64>,
}

/// Loads CRM records page by page and normalizes them into integration items
#[derive(Clone)]
pub struct ItemFetcher {
    http_client: Client,
    items_url: String,
    item_type: String,
    max_pages: usize,
}

impl ItemFetcher {
    pub fn new(config: &HubSpotConfig) -> Result<Self, AppError> {
        parse_endpoint("items URL", &config.items_url)?;

        Ok(Self {
            http_client: create_http_client()?,
            items_url: config.items_url.clone(),
            item_type: config.item_type.clone(),
            max_pages: config.max_pages,
        })
    }

    /// Load every record visible to the credentials blob
    pub async fn fetch_items(&self, credentials: &str) -> Result<Vec<IntegrationItem>, AppError> {
        self.fetch_items_inner(credentials).await.map_err(|e| {
            error!(error = %e, "HubSpot item fetch failed");
            AppError::ItemFetch(e.to_string())
        })
    }

    async fn fetch_items_inner(&self, credentials: &str) -> Result<Vec<IntegrationItem>, FetchError> {
        let credentials: Value =
            serde_json::from_str(credentials).map_err(FetchError::InvalidCredentials)?;
        let access_token = credentials
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or(FetchError::MissingAccessToken)?;

        let records = self.fetch_all_pages(access_token).await?;

        let items = records
            .iter()
            .enumerate()
            .map(|(index, record)| company_item(index, record, &self.item_type, None, None))
            .collect::<Result<Vec<_>, _>>()?;

        info!(count = items.len(), item_type = %self.item_type, "loaded HubSpot items");
        Ok(items)
    }

    /// Follow the `limit` field from page to page until a page omits it
    async fn fetch_all_pages(&self, access_token: &str) -> Result<Vec<Value>, FetchError> {
        let mut records = Vec::new();
        let mut limit: Option<u64> = None;

        for page_number in 1..=self.max_pages {
            let mut request = self.http_client.get(&self.items_url).bearer_auth(access_token);
            if let Some(limit) = limit {
                request = request.query(&[("limit", limit)]);
            }

            let response = request.send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status(status));
            }

            let page: ListPage = response.json().await?;
            debug!(
                page = page_number,
                results = page.results.len(),
                limit = ?page.limit,
                "fetched HubSpot list page"
            );
            records.extend(page.results);

            match page.limit {
                Some(next) => limit = Some(next),
                None => return Ok(records),
            }
        }

        Err(FetchError::PageLimit(self.max_pages))
    }
}

/// Map one CRM record onto an integration item
fn company_item(
    index: usize,
    record: &Value,
    item_type: &str,
    parent_id: Option<&str>,
    parent_name: Option<&str>,
) -> Result<IntegrationItem, FetchError> {
    let id = match record.get("id") {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => return Err(FetchError::MissingId { index }),
    };
    let property = |name: &str| {
        record
            .get("properties")
            .and_then(|properties| properties.get(name))
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    Ok(IntegrationItem {
        id: format!("{id}_{item_type}"),
        name: property("name"),
        domain: property("domain"),
        item_type: item_type.to_string(),
        parent_id: parent_id.map(|parent| format!("{parent}_Base")),
        parent_path_or_name: parent_name.map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_company_item_mapping() {
        let record = json!({
            "id": "42",
            "properties": {"name": "Acme", "domain": "acme.com"}
        });

        let item = company_item(0, &record, "hubspot_company", None, None).unwrap();
        assert_eq!(
            item,
            IntegrationItem {
                id: "42_hubspot_company".to_string(),
                name: Some("Acme".to_string()),
                domain: Some("acme.com".to_string()),
                item_type: "hubspot_company".to_string(),
                parent_id: None,
                parent_path_or_name: None,
            }
        );
    }

    #[test]
    fn test_company_item_with_parent() {
        let record = json!({"id": 7, "properties": {"name": "Sub"}});

        let item =
            company_item(0, &record, "hubspot_company", Some("99"), Some("Parent Co")).unwrap();
        assert_eq!(item.id, "7_hubspot_company");
        assert_eq!(item.domain, None);
        assert_eq!(item.parent_id.as_deref(), Some("99_Base"));
        assert_eq!(item.parent_path_or_name.as_deref(), Some("Parent Co"));
    }

    #[test]
    fn test_company_item_without_properties() {
        let item = company_item(0, &json!({"id": "1"}), "hubspot_company", None, None).unwrap();
        assert_eq!(item.name, None);
        assert_eq!(item.domain, None);
    }

    #[test]
    fn test_company_item_missing_id() {
        let result = company_item(3, &json!({"properties": {}}), "hubspot_company", None, None);
        assert!(matches!(result, Err(FetchError::MissingId { index: 3 })));
    }

    #[tokio::test]
    async fn test_invalid_credentials_collapse_to_item_fetch() {
        let fetcher = ItemFetcher::new(&HubSpotConfig::default()).unwrap();

        let err = fetcher.fetch_items("not json").await.unwrap_err();
        assert!(matches!(err, AppError::ItemFetch(_)));

        let err = fetcher.fetch_items(r#"{"token_type": "bearer"}"#).await.unwrap_err();
        assert!(err.to_string().contains("access_token"));
    }
}
