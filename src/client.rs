//! HTTP side of the search widget: one `GET /search?q=...` per submission.

use std::future::Future;

use reqwest::{Client, Url, header};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::error::SearchError;

/// Issues a search and decodes the JSON body into `T`.
pub trait SearchClient {
    fn search<T: DeserializeOwned>(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<T, SearchError>>;
}

#[derive(Debug, Clone)]
pub struct HttpSearchClient {
    http_client: Client,
    search_url: Url,
}

impl HttpSearchClient {
    /// `search_url` is the full endpoint, e.g. `http://help.example.com/search`.
    /// No timeout is configured; a hung endpoint leaves the request pending.
    pub fn new(search_url: Url) -> Self {
        Self::with_client(Client::new(), search_url)
    }

    pub fn with_client(http_client: Client, search_url: Url) -> Self {
        Self {
            http_client,
            search_url,
        }
    }

    pub fn parse(search_url: &str) -> Result<Self, SearchError> {
        let url = Url::parse(search_url).map_err(|e| SearchError::InvalidUrl {
            url: search_url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::new(url))
    }

    pub fn search_url(&self) -> &Url {
        &self.search_url
    }
}

impl SearchClient for HttpSearchClient {
    async fn search<T: DeserializeOwned>(&self, query: &str) -> Result<T, SearchError> {
        debug!(url = %self.search_url, query = %query, "sending search request");

        let response = self
            .http_client
            .get(self.search_url.clone())
            .query(&[("q", query)])
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        trace!(body = %body, "search response body");

        serde_json::from_str(&body)
            .map_err(|e| SearchError::InvalidResponse(format!("JSON parse error: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_url() {
        let client = HttpSearchClient::parse("http://localhost:8080/search").unwrap();
        assert_eq!(client.search_url().path(), "/search");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(HttpSearchClient::parse("not a url").is_err());
    }
}
