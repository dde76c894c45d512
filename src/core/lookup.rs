//! Currency lookup over a parsed listing

use super::rate::{LOCAL_CURRENCY, LOCAL_RATE, RateRecord, RateTable, is_quoted};

/// Upper-cased, trimmed form of a user-supplied currency code.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

pub fn is_local_currency(code: &str) -> bool {
    normalize_code(code) == LOCAL_CURRENCY
}

/// First record whose label contains `code`.
///
/// Labels on the listing are composite (code plus display name), so matching is by
/// substring and the first row wins when several match.
pub fn find_record<'a>(table: &'a RateTable, code: &str) -> Option<&'a RateRecord> {
    let code = normalize_code(code);
    if code.is_empty() {
        return None;
    }
    table
        .iter()
        .find(|record| record.currency_code.to_uppercase().contains(&code))
}

/// Spot-sell rate for `code`, or `None` when the currency is missing or not quoted.
pub fn spot_sell_rate(table: &RateTable, code: &str) -> Option<String> {
    if is_local_currency(code) {
        return Some(LOCAL_RATE.to_string());
    }

    find_record(table, code)
        .filter(|record| is_quoted(&record.spot_sell))
        .map(|record| record.spot_sell.clone())
}
