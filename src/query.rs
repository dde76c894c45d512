use crate::core::lookup;
use crate::core::rate::{FetchError, LOCAL_RATE, RatePageSource, RateTable};
use crate::providers::bot_parser;
use thiserror::Error;
use tracing::{debug, instrument, warn};

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("invalid query string: {0}")]
    InvalidQuery(String),
    #[error("no usable rate for {currency} on {date}")]
    NotFound { date: String, currency: String },
    #[error("no rates listed on {date}")]
    NoRates { date: String },
    #[error(transparent)]
    Network(#[from] FetchError),
}

/// Returns `value` when it is present and not blank.
pub fn require<'a>(value: Option<&'a str>, name: &'static str) -> Result<&'a str, QueryError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(QueryError::MissingParameter(name)),
    }
}

/// Fetches and parses the listing for `date`. An empty listing is an error here.
#[instrument(name = "AllRates", skip(source))]
pub async fn all_rates(source: &dyn RatePageSource, date: &str) -> Result<RateTable, QueryError> {
    let markup = source.fetch(date).await.inspect_err(|e| {
        warn!(error = %e, "Failed to fetch rate listing");
    })?;

    let table = bot_parser::parse(&markup);
    debug!(rows = table.len(), "Parsed rate listing");

    if table.is_empty() {
        return Err(QueryError::NoRates {
            date: date.to_string(),
        });
    }
    Ok(table)
}

/// Spot-sell rate for one currency on `date`.
///
/// The local currency is answered without contacting the upstream.
#[instrument(name = "SpotSellRate", skip(source))]
pub async fn spot_sell_rate(
    source: &dyn RatePageSource,
    date: &str,
    currency: &str,
) -> Result<String, QueryError> {
    if lookup::is_local_currency(currency) {
        return Ok(LOCAL_RATE.to_string());
    }

    let markup = source.fetch(date).await.inspect_err(|e| {
        warn!(error = %e, "Failed to fetch rate listing");
    })?;
    let table = bot_parser::parse(&markup);

    lookup::spot_sell_rate(&table, currency).ok_or_else(|| QueryError::NotFound {
        date: date.to_string(),
        currency: currency.to_string(),
    })
}
