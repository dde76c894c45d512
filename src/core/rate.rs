//! Exchange-rate listing types and the upstream page abstraction

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Currency the upstream quotes against. It never appears in the listing itself.
pub const LOCAL_CURRENCY: &str = "TWD";

/// Rate of the local currency against itself.
pub const LOCAL_RATE: &str = "1";

/// Placeholder the upstream renders when a rate is not quoted.
pub const UNAVAILABLE: &str = "-";

/// One currency row of the listing. Rates stay as the upstream formats them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateRecord {
    #[serde(rename = "幣別")]
    pub currency_code: String,
    #[serde(rename = "現金匯率_本行買入")]
    pub cash_buy: String,
    #[serde(rename = "現金匯率_本行賣出")]
    pub cash_sell: String,
    #[serde(rename = "即期匯率_本行買入")]
    pub spot_buy: String,
    #[serde(rename = "即期匯率_本行賣出")]
    pub spot_sell: String,
}

/// Whether a rate cell carries an actual quote rather than the placeholder.
pub fn is_quoted(value: &str) -> bool {
    !value.is_empty() && value != UNAVAILABLE
}

/// All rows of one day's listing, in page order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RateTable(Vec<RateRecord>);

impl RateTable {
    pub fn new(records: Vec<RateRecord>) -> Self {
        Self(records)
    }

    pub fn records(&self) -> &[RateRecord] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RateRecord> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<RateRecord>> for RateTable {
    fn from(records: Vec<RateRecord>) -> Self {
        Self(records)
    }
}

impl<'a> IntoIterator for &'a RateTable {
    type Item = &'a RateRecord;
    type IntoIter = std::slice::Iter<'a, RateRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network request failed: {0}")]
    Network(String),
}

/// Source of the raw listing markup for a given date.
#[async_trait]
pub trait RatePageSource: Send + Sync {
    async fn fetch(&self, date: &str) -> Result<String, FetchError>;
}
