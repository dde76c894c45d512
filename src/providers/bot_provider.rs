use crate::core::config::BotProviderConfig;
use crate::core::rate::{FetchError, RatePageSource};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::Url;
use std::time::Duration;
use tracing::{debug, instrument};

/// The upstream answers unrecognised clients differently, so requests identify as a
/// desktop browser.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Fetches the Bank of Taiwan daily listing page: `{base_url}/xrt/all/{date}`.
pub struct BotRateProvider {
    base_url: Url,
    client: reqwest::Client,
}

impl BotRateProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid provider base URL: {base_url}"))?;
        if base_url.cannot_be_a_base() {
            bail!("Provider base URL cannot carry a path: {base_url}");
        }

        let client = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { base_url, client })
    }

    pub fn from_config(config: &BotProviderConfig) -> Result<Self> {
        Self::new(&config.base_url, Duration::from_secs(config.timeout_secs))
    }

    /// The date is appended as a single percent-encoded path segment, so it can never
    /// add path levels, a query or a fragment to the upstream request.
    fn listing_url(&self, date: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["xrt", "all", date]);
        }
        url
    }
}

#[async_trait]
impl RatePageSource for BotRateProvider {
    #[instrument(name = "BotPageFetch", skip(self), fields(date = %date))]
    async fn fetch(&self, date: &str) -> Result<String, FetchError> {
        let url = self.listing_url(date);
        debug!("Requesting rate listing from {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Network(format!("Request error: {e} URL: {url}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Network(format!(
                "HTTP error: {status} URL: {url}"
            )));
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Network(format!("Failed to read response body: {e}")))
    }
}
