//! Extracts the daily rate listing from the Bank of Taiwan page markup.
//!
//! The listing is the `table-hover` table. Each body row is one currency: the first
//! cell carries the currency label, the next four carry cash buy, cash sell, spot buy
//! and spot sell. Later cells (forward rates, history links) are ignored.

use crate::core::rate::{RateRecord, RateTable, UNAVAILABLE};
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::debug;

const RATE_CELLS: usize = 5;

struct Selectors {
    table: Selector,
    row: Selector,
    cell: Selector,
    label: Selector,
}

static SELECTORS: LazyLock<Option<Selectors>> = LazyLock::new(|| {
    Some(Selectors {
        table: Selector::parse("table.table-hover").ok()?,
        row: Selector::parse("tbody > tr").ok()?,
        cell: Selector::parse("td").ok()?,
        label: Selector::parse("div.visible-phone").ok()?,
    })
});

/// Parses `markup` into a rate table. Missing structure yields an empty table.
pub fn parse(markup: &str) -> RateTable {
    let Some(selectors) = SELECTORS.as_ref() else {
        return RateTable::default();
    };

    let document = Html::parse_document(markup);
    let Some(table) = document.select(&selectors.table).next() else {
        debug!("Rate table not found in page");
        return RateTable::default();
    };

    table
        .select(&selectors.row)
        .enumerate()
        .filter_map(|(index, row)| {
            let record = parse_row(selectors, row);
            if record.is_none() {
                debug!(row = index, "Skipping malformed rate row");
            }
            record
        })
        .collect::<Vec<_>>()
        .into()
}

fn parse_row(selectors: &Selectors, row: ElementRef<'_>) -> Option<RateRecord> {
    let cells: Vec<ElementRef<'_>> = row.select(&selectors.cell).take(RATE_CELLS).collect();
    if cells.len() < RATE_CELLS {
        return None;
    }

    let currency_code = currency_label(selectors, cells[0]);
    if currency_code.is_empty() {
        return None;
    }

    Some(RateRecord {
        currency_code,
        cash_buy: rate_value(cells[1]),
        cash_sell: rate_value(cells[2]),
        spot_buy: rate_value(cells[3]),
        spot_sell: rate_value(cells[4]),
    })
}

fn currency_label(selectors: &Selectors, cell: ElementRef<'_>) -> String {
    match cell.select(&selectors.label).next() {
        Some(label) => collapse_whitespace(label),
        None => collapse_whitespace(cell),
    }
}

fn rate_value(cell: ElementRef<'_>) -> String {
    let text = cell.text().collect::<String>();
    let text = text.trim();
    if is_numeric_like(text) {
        text.to_string()
    } else {
        if !text.is_empty() && text != UNAVAILABLE {
            debug!(cell = %text, "Unexpected rate cell content");
        }
        UNAVAILABLE.to_string()
    }
}

fn collapse_whitespace(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_numeric_like(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit())
        && text.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',')
}
