use super::ui;
use crate::core::rate::{RatePageSource, RateTable};
use crate::query;
use anyhow::{Context, Result};
use comfy_table::Cell;

/// Renders a day's listing as a terminal table.
pub fn display_rate_table(date: &str, table: &RateTable) -> String {
    let mut output = format!(
        "Exchange rates: {}\n\n",
        ui::style_text(date, ui::StyleType::Title)
    );

    let mut rendered = ui::new_styled_table();
    rendered.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell("Cash Buy"),
        ui::header_cell("Cash Sell"),
        ui::header_cell("Spot Buy"),
        ui::header_cell("Spot Sell"),
    ]);

    for record in table {
        rendered.add_row(vec![
            Cell::new(&record.currency_code),
            ui::rate_cell(&record.cash_buy),
            ui::rate_cell(&record.cash_sell),
            ui::rate_cell(&record.spot_buy),
            ui::rate_cell(&record.spot_sell),
        ]);
    }

    output.push_str(&rendered.to_string());
    output.push_str(&format!(
        "\n{}",
        ui::style_text(
            &format!("{} currencies listed", table.len()),
            ui::StyleType::Subtle
        )
    ));
    output
}

/// Renders a single spot-sell rate line.
pub fn display_rate(date: &str, currency: &str, rate: &str) -> String {
    format!(
        "{} {} spot sell: {}",
        ui::style_text(date, ui::StyleType::Subtle),
        currency,
        ui::style_text(rate, ui::StyleType::Value)
    )
}

/// Prints the day's listing. Failures are returned to the caller unprinted.
pub async fn show_rates(source: &dyn RatePageSource, date: &str) -> Result<()> {
    let spinner = ui::new_spinner(&format!("Fetching rates for {date}"));
    let result = query::all_rates(source, date).await;
    spinner.finish_and_clear();

    let table = result.with_context(|| format!("Failed to get rates for {date}"))?;
    println!("{}", display_rate_table(date, &table));
    Ok(())
}

pub async fn show_rate(source: &dyn RatePageSource, date: &str, currency: &str) -> Result<()> {
    let spinner = ui::new_spinner(&format!("Fetching {currency} rate for {date}"));
    let result = query::spot_sell_rate(source, date, currency).await;
    spinner.finish_and_clear();

    let rate = result.with_context(|| format!("Failed to get {currency} rate for {date}"))?;
    println!("{}", display_rate(date, currency, &rate));
    Ok(())
}
