//! HTTP client for county inspection portals.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};

use crate::error::ScraperError;
use crate::rate_limit::retry_with_backoff;

const BROWSER_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const BROWSER_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";
const JSON_ACCEPT: &str = "application/json, text/javascript, */*; q=0.01";

/// Form fields or query parameters, serialized in key order.
pub type FormData = BTreeMap<String, String>;

/// A successful portal response with the body already read.
#[derive(Debug, Clone)]
pub struct PortalResponse {
    /// Final URL after redirects.
    pub url: String,
    pub content_type: Option<String>,
    pub body: String,
}

impl PortalResponse {
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("json"))
    }
}

/// Browser-like HTTP session for one scrape run.
///
/// Sends desktop-browser headers and keeps cookies between requests, since
/// the portal ties search results to the session that loaded the form.
/// 429s, 5xx responses and network failures are retried with exponential
/// backoff up to `max_retries` additional attempts.
#[derive(Debug, Clone)]
pub struct PortalClient {
    client: Client,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl PortalClient {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, ScraperError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static(BROWSER_ACCEPT_LANGUAGE),
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .default_headers(headers)
            .cookie_store(true)
            .build()?;
        Ok(Self {
            client,
            max_retries,
            backoff_base_secs,
        })
    }

    /// # Errors
    ///
    /// Any [`ScraperError`] left after retries.
    pub async fn get(&self, url: &str) -> Result<PortalResponse, ScraperError> {
        self.send_text(url, || self.client.get(url)).await
    }

    /// GET with `query` appended as URL parameters.
    ///
    /// # Errors
    ///
    /// Any [`ScraperError`] left after retries.
    pub async fn get_with_query(
        &self,
        url: &str,
        query: &FormData,
    ) -> Result<PortalResponse, ScraperError> {
        self.send_text(url, || self.client.get(url).query(query))
            .await
    }

    /// POST `form` as `application/x-www-form-urlencoded`.
    ///
    /// # Errors
    ///
    /// Any [`ScraperError`] left after retries.
    pub async fn post_form(
        &self,
        url: &str,
        form: &FormData,
    ) -> Result<PortalResponse, ScraperError> {
        self.send_text(url, || self.client.post(url).form(form))
            .await
    }

    /// POST `form` the way the portal's own search script does when it asks
    /// for JSON.
    ///
    /// # Errors
    ///
    /// Any [`ScraperError`] left after retries.
    pub async fn post_form_for_json(
        &self,
        url: &str,
        form: &FormData,
    ) -> Result<PortalResponse, ScraperError> {
        self.send_text(url, || {
            self.client
                .post(url)
                .header(ACCEPT, JSON_ACCEPT)
                .header("X-Requested-With", "XMLHttpRequest")
                .form(form)
        })
        .await
    }

    /// Downloads a binary document such as an inspection report PDF.
    ///
    /// # Errors
    ///
    /// Any [`ScraperError`] left after retries.
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, ScraperError> {
        retry_with_backoff(self.max_retries, self.backoff_base_secs, || async {
            let response = check_status(self.client.get(url).send().await?, url)?;
            Ok(response.bytes().await?.to_vec())
        })
        .await
    }

    async fn send_text(
        &self,
        url: &str,
        build: impl Fn() -> RequestBuilder,
    ) -> Result<PortalResponse, ScraperError> {
        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let request = build();
            async move {
                let response = check_status(request.send().await?, url)?;
                let final_url = response.url().to_string();
                let content_type = response
                    .headers()
                    .get(CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_owned);
                let body = response.text().await?;
                Ok(PortalResponse {
                    url: final_url,
                    content_type,
                    body,
                })
            }
        })
        .await
    }
}

fn check_status(response: Response, url: &str) -> Result<Response, ScraperError> {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
            .unwrap_or(60);
        return Err(ScraperError::RateLimited {
            domain: domain_of(url),
            retry_after_secs,
        });
    }

    if status == StatusCode::NOT_FOUND {
        return Err(ScraperError::NotFound {
            url: url.to_owned(),
        });
    }

    if !status.is_success() {
        return Err(ScraperError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_owned(),
        });
    }

    Ok(response)
}

fn domain_of(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .unwrap_or_else(|| url.to_owned())
}
