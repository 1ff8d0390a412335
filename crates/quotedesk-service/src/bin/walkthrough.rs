//! # Lifecycle Walkthrough
//!
//! Drives two quotes through the full lifecycle against a manual clock and
//! prints the resulting email context and audit trail.
//!
//! ## Usage
//! ```bash
//! cargo run -p quotedesk-service --bin walkthrough
//!
//! # Different currency, verbose logs
//! QUOTEDESK_DEFAULT_CURRENCY=EUR RUST_LOG=debug cargo run -p quotedesk-service --bin walkthrough
//! ```
//!
//! Quote A: draft → pending → sent → viewed → accepted → converted
//! Quote B: draft → sent → (31 days later) expired by the sweep, then duplicated

use std::sync::Arc;

use chrono::{Duration, Utc};
use quotedesk_core::{Actor, FixedClock, LineItemInput, Money, QuoteStatus};
use quotedesk_service::{init_tracing, QuoteService, ServiceConfig};
use rust_decimal::Decimal;
use tracing::info;

/// Sample catalogue: (description, quantity, unit price, discount %, tax %)
const SAMPLE_ITEMS: &[(&str, i64, i64, Option<i64>, i64)] = &[
    ("Implementation services (days)", 2, 5000, Some(5), 85),
    ("Annual platform licence", 1, 12000, None, 85),
    ("Onboarding workshop", 3, 750, Some(10), 0),
];

fn sample_input(entry: &(&str, i64, i64, Option<i64>, i64)) -> LineItemInput {
    let (description, quantity, price, discount, tax_tenths) = *entry;
    LineItemInput {
        description: description.to_string(),
        quantity,
        unit_price: Decimal::new(price, 0),
        discount_percentage: discount.map(|pct| Decimal::new(pct, 0)),
        tax_rate: Decimal::new(tax_tenths, 1),
        ..Default::default()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_tracing()?;

    let config = ServiceConfig::from_env()?;
    info!(?config, "Configuration loaded");

    let clock = Arc::new(FixedClock::new(Utc::now()));
    let service = QuoteService::new(config, clock.clone());
    let sales = Actor::new("u-100", "Sam Seller");
    let manager = Actor::new("u-200", "Morgan Manager");

    // -------------------------------------------------------------------------
    // Quote A: happy path
    // -------------------------------------------------------------------------
    let quote = service.create_quote("cust-acme", None).await?;
    let id_a = quote.quote.id.clone();
    for entry in SAMPLE_ITEMS {
        service.upsert_line_item(&id_a, sample_input(entry)).await?;
    }
    service
        .set_shipping(&id_a, Money::new(Decimal::new(4950, 2)))
        .await?;
    service
        .submit_for_approval(&id_a, &sales, Some("Discount above 5%"))
        .await?;

    let pending = service.get_quote(&id_a).await?;
    let sent = service
        .change_status(&id_a, pending.version, QuoteStatus::Sent, &manager, Some("Approved"))
        .await?;

    clock.advance(Duration::days(2));
    service.record_view(&id_a).await?;
    let viewed = service.get_quote(&id_a).await?;
    let labels: Vec<String> = service
        .available_actions(&id_a)
        .await?
        .into_iter()
        .map(|action| action.label)
        .collect();
    info!(actions = ?labels, "Customer viewed quote");

    clock.advance(Duration::days(3));
    service
        .change_status(&id_a, viewed.version, QuoteStatus::Accepted, &sales, Some("Signed PO"))
        .await?;
    service.mark_converted(&id_a, Some("SO-2024-0042")).await?;

    println!("== Email context for {} ==", sent.quote.quote_number);
    println!(
        "{}",
        serde_json::to_string_pretty(&service.email_context(&id_a).await?)?
    );

    println!("== Audit trail ==");
    for record in service.history(&id_a).await? {
        println!(
            "{}  {:>9} → {:<9}  by {} {}",
            record.changed_at().format("%Y-%m-%d %H:%M"),
            record.from_status(),
            record.to_status(),
            record.changed_by_name(),
            record.comment().unwrap_or_default()
        );
    }
    info!(status = %service.verify_history(&id_a).await?, "History replays cleanly");

    // -------------------------------------------------------------------------
    // Quote B: expires, then duplicated
    // -------------------------------------------------------------------------
    let quote = service.create_quote("cust-globex", None).await?;
    let id_b = quote.quote.id.clone();
    let quote = service
        .upsert_line_item(&id_b, sample_input(&SAMPLE_ITEMS[1]))
        .await?;
    service
        .change_status(&id_b, quote.version, QuoteStatus::Sent, &sales, None)
        .await?;

    let validity = i64::from(quote.quote.terms().validity_days);
    clock.advance(Duration::days(validity + 1));
    let expired = service.expire_overdue().await?;
    println!("== Expired by sweep: {} quote(s) ==", expired.len());

    let copy = service.duplicate_quote(&id_b).await?;
    println!(
        "Duplicated {} into {} ({}), total {}",
        quote.quote.quote_number,
        copy.quote.quote_number,
        copy.quote.status(),
        copy.quote.totals().total.format(&copy.quote.terms().currency)
    );

    Ok(())
}
