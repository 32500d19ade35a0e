//! GitHub API client.

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, LINK, USER_AGENT};

use crate::error::{OrgCloneError, Result};
use crate::github::repos::parse_next_page;
use crate::transport::HttpTransport;

/// Client for interacting with the GitHub API.
#[derive(Clone)]
pub struct GitHubClient {
    pub(crate) token: Option<String>,
    pub(crate) base_url: String,
    pub(crate) client: Client,
}

impl GitHubClient {
    /// Create a client for `base_url` whose requests go through `transport`.
    ///
    /// Without a token, requests are made anonymously.
    pub fn new(
        transport: &HttpTransport,
        base_url: impl Into<String>,
        token: Option<String>,
    ) -> Result<Self> {
        let mut url = base_url.into();
        // Remove trailing slash if present
        while url.ends_with('/') {
            url.pop();
        }
        Ok(Self {
            token: token.filter(|t| !t.is_empty()),
            base_url: url,
            client: transport.http_client()?,
        })
    }

    /// Get the default headers for API requests.
    pub(crate) fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &self.token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
                OrgCloneError::GitHub {
                    message: "Invalid token format".into(),
                }
            })?;
            headers.insert(AUTHORIZATION, value);
        }
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("github-org-clone"));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        Ok(headers)
    }

    /// Make a GET request and return the body with the next page number.
    ///
    /// The next page comes from the `Link` header and is 0 on the last page.
    pub(crate) fn get_page<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
    ) -> Result<(T, u32)> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self.client.get(&url).headers(self.headers()?).send()?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(OrgCloneError::GitHub {
                message: format!("API request failed ({}): {}", status, body),
            });
        }

        let next_page = response
            .headers()
            .get(LINK)
            .and_then(|value| value.to_str().ok())
            .map(parse_next_page)
            .unwrap_or(0);

        let body = response.json().map_err(|e| OrgCloneError::GitHub {
            message: format!("Failed to parse response: {}", e),
        })?;

        Ok((body, next_page))
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether requests carry an API token.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}
