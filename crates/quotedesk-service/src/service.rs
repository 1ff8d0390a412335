//! # Quote Service
//!
//! Orchestrates the engine for every caller of the quote lifecycle.
//!
//! ## Operation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  caller ──► QuoteService::op(quote_id, ..)                              │
//! │                 │                                                       │
//! │                 ├─ book.get(id)            ── QuoteNotFound             │
//! │                 ├─ entry.lock().await      (per-quote serialisation)    │
//! │                 ├─ version check           ── VersionConflict           │
//! │                 ├─ engine call on a COPY   ── CoreError / Validation    │
//! │                 └─ commit (version + 1, history append)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Status changes are validated against the stored status while the entry is
//! locked, so a stale action list in the UI cannot commit an illegal change.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use quotedesk_core::validation::{validate_customer_id, validate_terms};
use quotedesk_core::workflow::{
    self, apply_transition, is_expiry_eligible, validate_transition, StatusAction,
    TransitionTrigger,
};
use quotedesk_core::{
    Actor, Clock, CoreError, LineItem, LineItemInput, Money, Quote, QuoteEmailContext,
    QuoteStatus, QuoteTerms, StatusChangeRecord, SystemClock,
};
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ServiceConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::store::{EntryHandle, QuoteBook, QuoteEntry, QuoteSnapshot};

/// Quote lifecycle orchestrator.
#[derive(Debug)]
pub struct QuoteService<C: Clock = SystemClock> {
    config: ServiceConfig,
    clock: C,
    book: QuoteBook,
}

impl QuoteService<SystemClock> {
    /// Service on the wall clock.
    pub fn with_system_clock(config: ServiceConfig) -> Self {
        QuoteService::new(config, SystemClock)
    }
}

impl<C: Clock> QuoteService<C> {
    pub fn new(config: ServiceConfig, clock: C) -> Self {
        QuoteService {
            config,
            clock,
            book: QuoteBook::new(),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn system_actor(&self) -> Actor {
        Actor::system_named(self.config.system_actor_name.clone())
    }

    async fn entry(&self, quote_id: &str) -> ServiceResult<EntryHandle> {
        self.book
            .get(quote_id)
            .await
            .ok_or_else(|| ServiceError::QuoteNotFound(quote_id.to_string()))
    }

    // =========================================================================
    // Creation & Reads
    // =========================================================================

    /// Creates an empty DRAFT quote with the next quote number.
    ///
    /// Uses the configured default terms when `terms` is `None`.
    pub async fn create_quote(
        &self,
        customer_id: &str,
        terms: Option<QuoteTerms>,
    ) -> ServiceResult<QuoteSnapshot> {
        let terms = terms.unwrap_or_else(|| self.config.default_terms());
        // Rejected input must not consume a quote number
        validate_customer_id(customer_id)?;
        validate_terms(&terms)?;
        let number = self.config.quote_number(self.book.next_sequence());

        let quote = Quote::new(number, customer_id, terms, self.now())?;
        let handle = self.book.insert(quote).await;
        let entry = handle.lock().await;

        info!(
            quote_id = %entry.quote().id,
            quote_number = %entry.quote().quote_number,
            customer_id,
            "Quote created"
        );
        Ok(entry.snapshot())
    }

    pub async fn get_quote(&self, quote_id: &str) -> ServiceResult<QuoteSnapshot> {
        let handle = self.entry(quote_id).await?;
        let entry = handle.lock().await;
        Ok(entry.snapshot())
    }

    /// Status history, oldest first.
    pub async fn history(&self, quote_id: &str) -> ServiceResult<Vec<StatusChangeRecord>> {
        let handle = self.entry(quote_id).await?;
        let entry = handle.lock().await;
        Ok(entry.history().to_vec())
    }

    /// Replays the stored history and checks it ends at the current status.
    pub async fn verify_history(&self, quote_id: &str) -> ServiceResult<QuoteStatus> {
        let handle = self.entry(quote_id).await?;
        let entry = handle.lock().await;

        let replayed = workflow::replay_history(entry.history())?;
        if replayed != entry.quote().status() {
            return Err(CoreError::HistoryMismatch {
                index: entry.history().len(),
                expected: entry.quote().status(),
                found: replayed,
            }
            .into());
        }
        Ok(replayed)
    }

    /// User actions for the quote's current status.
    pub async fn available_actions(&self, quote_id: &str) -> ServiceResult<Vec<StatusAction>> {
        let handle = self.entry(quote_id).await?;
        let entry = handle.lock().await;
        Ok(workflow::available_actions(entry.quote().status()))
    }

    /// Template variables for the quote email.
    pub async fn email_context(&self, quote_id: &str) -> ServiceResult<QuoteEmailContext> {
        let handle = self.entry(quote_id).await?;
        let entry = handle.lock().await;
        Ok(QuoteEmailContext::build(entry.quote(), self.now())?)
    }

    // =========================================================================
    // Edits
    // =========================================================================

    async fn edit<F>(
        &self,
        quote_id: &str,
        op: &'static str,
        apply: F,
    ) -> ServiceResult<QuoteSnapshot>
    where
        F: FnOnce(&mut Quote, DateTime<Utc>) -> Result<(), CoreError>,
    {
        let handle = self.entry(quote_id).await?;
        let mut entry = handle.lock().await;

        let mut quote = entry.quote().clone();
        apply(&mut quote, self.now())?;
        entry.commit_edit(quote);

        debug!(
            quote_id,
            op,
            version = entry.version(),
            total = %entry.quote().totals().total,
            "Quote edited"
        );
        Ok(entry.snapshot())
    }

    /// Adds or replaces a line item from wizard input.
    pub async fn upsert_line_item(
        &self,
        quote_id: &str,
        input: LineItemInput,
    ) -> ServiceResult<QuoteSnapshot> {
        let item = LineItem::try_from(input)?;
        self.edit(quote_id, "upsert_line_item", |quote, now| {
            quote.upsert_line_item(item, now)
        })
        .await
    }

    pub async fn remove_line_item(
        &self,
        quote_id: &str,
        line_item_id: &str,
    ) -> ServiceResult<QuoteSnapshot> {
        self.edit(quote_id, "remove_line_item", |quote, now| {
            quote.remove_line_item(line_item_id, now).map(|_| ())
        })
        .await
    }

    pub async fn set_shipping(
        &self,
        quote_id: &str,
        shipping: Money,
    ) -> ServiceResult<QuoteSnapshot> {
        self.edit(quote_id, "set_shipping", |quote, now| {
            quote.set_shipping_total(shipping, now)
        })
        .await
    }

    pub async fn update_terms(
        &self,
        quote_id: &str,
        terms: QuoteTerms,
    ) -> ServiceResult<QuoteSnapshot> {
        self.edit(quote_id, "update_terms", |quote, now| {
            quote.update_terms(terms, now)
        })
        .await
    }

    // =========================================================================
    // Status Changes
    // =========================================================================

    /// Applies a transition to a locked entry and records it.
    fn commit_transition(
        &self,
        entry: &mut QuoteEntry,
        to: QuoteStatus,
        actor: &Actor,
        comment: Option<&str>,
        metadata: Option<(&str, Value)>,
    ) -> ServiceResult<QuoteSnapshot> {
        let from = entry.quote().status();
        let (quote, mut record) = apply_transition(entry.quote(), to, actor, comment, self.now())?;
        if let Some((key, value)) = metadata {
            record = record.with_metadata(key, value);
        }
        entry.commit_transition(quote, record);

        info!(
            quote_id = %entry.quote().id,
            from = %from,
            to = %to,
            actor = %actor.id,
            version = entry.version(),
            "Quote status changed"
        );
        Ok(entry.snapshot())
    }

    /// Performs a user action (Send, Mark Accepted, Mark Rejected, Resend).
    ///
    /// `expected_version` is the version the caller rendered its actions
    /// from. Automated edges (approval, view, conversion, expiry) are not
    /// reachable here; they have dedicated operations.
    ///
    /// ## Errors
    /// - [`ServiceError::VersionConflict`] when the quote changed since it was read
    /// - [`CoreError::InvalidTransition`] when `to` is not a user action from
    ///   the current status
    pub async fn change_status(
        &self,
        quote_id: &str,
        expected_version: u64,
        to: QuoteStatus,
        actor: &Actor,
        comment: Option<&str>,
    ) -> ServiceResult<QuoteSnapshot> {
        let handle = self.entry(quote_id).await?;
        let mut entry = handle.lock().await;

        if entry.version() != expected_version {
            warn!(
                quote_id,
                expected_version,
                actual_version = entry.version(),
                "Stale status change rejected"
            );
            return Err(ServiceError::VersionConflict {
                quote_id: quote_id.to_string(),
                expected: expected_version,
                actual: entry.version(),
            });
        }

        let from = entry.quote().status();
        let transition = validate_transition(from, to)?;
        if !matches!(transition.trigger, TransitionTrigger::User(_)) {
            return Err(CoreError::InvalidTransition { from, to }.into());
        }

        self.commit_transition(&mut entry, to, actor, comment, None)
    }

    /// DRAFT → PENDING: the author asks for internal approval.
    pub async fn submit_for_approval(
        &self,
        quote_id: &str,
        actor: &Actor,
        comment: Option<&str>,
    ) -> ServiceResult<QuoteSnapshot> {
        let handle = self.entry(quote_id).await?;
        let mut entry = handle.lock().await;
        self.commit_transition(&mut entry, QuoteStatus::Pending, actor, comment, None)
    }

    /// SENT → VIEWED when the customer opens the quote.
    ///
    /// Repeat views of a VIEWED quote change nothing.
    pub async fn record_view(&self, quote_id: &str) -> ServiceResult<QuoteSnapshot> {
        let handle = self.entry(quote_id).await?;
        let mut entry = handle.lock().await;

        if entry.quote().status() == QuoteStatus::Viewed {
            debug!(quote_id, "Repeat view ignored");
            return Ok(entry.snapshot());
        }

        let actor = self.system_actor();
        self.commit_transition(&mut entry, QuoteStatus::Viewed, &actor, None, None)
    }

    /// ACCEPTED → CONVERTED once an order has been created downstream.
    pub async fn mark_converted(
        &self,
        quote_id: &str,
        order_reference: Option<&str>,
    ) -> ServiceResult<QuoteSnapshot> {
        let handle = self.entry(quote_id).await?;
        let mut entry = handle.lock().await;

        let actor = self.system_actor();
        let metadata = order_reference.map(|reference| ("orderReference", Value::from(reference)));
        self.commit_transition(&mut entry, QuoteStatus::Converted, &actor, None, metadata)
    }

    // =========================================================================
    // Expiry Sweep
    // =========================================================================

    /// Moves every SENT / VIEWED quote past its expiry to EXPIRED.
    ///
    /// Returns the ids of the expired quotes. Each quote is checked under its
    /// own lock, so a quote accepted moments before the sweep reaches it is
    /// left alone.
    pub async fn expire_overdue(&self) -> ServiceResult<Vec<String>> {
        let now = self.now();
        let actor = self.system_actor();
        let mut expired = Vec::new();

        for handle in self.book.handles().await {
            let mut entry = handle.lock().await;
            if !is_expiry_eligible(entry.quote(), now) {
                continue;
            }

            let expires_at = entry
                .quote()
                .expires_at()
                .map(|at| Value::from(at.to_rfc3339()))
                .unwrap_or(Value::Null);
            let snapshot = self.commit_transition(
                &mut entry,
                QuoteStatus::Expired,
                &actor,
                None,
                Some(("expiresAt", expires_at)),
            )?;
            expired.push(snapshot.quote.id);
        }

        info!(count = expired.len(), "Expiry sweep finished");
        Ok(expired)
    }

    // =========================================================================
    // Duplication
    // =========================================================================

    /// Copies a quote (any status) into a fresh DRAFT with a new number.
    pub async fn duplicate_quote(&self, quote_id: &str) -> ServiceResult<QuoteSnapshot> {
        let source = self.get_quote(quote_id).await?.quote;
        let number = self.config.quote_number(self.book.next_sequence());

        let copy = source.duplicate(number, self.now())?;
        let handle = self.book.insert(copy).await;
        let entry = handle.lock().await;

        info!(
            source_id = quote_id,
            quote_id = %entry.quote().id,
            quote_number = %entry.quote().quote_number,
            "Quote duplicated"
        );
        Ok(entry.snapshot())
    }
}

/// Runs [`QuoteService::expire_overdue`] every `sweep_interval` until the
/// task is aborted.
pub fn spawn_expiry_sweep<C>(service: Arc<QuoteService<C>>) -> JoinHandle<()>
where
    C: Clock + 'static,
{
    let period = service.config().sweep_interval;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(err) = service.expire_overdue().await {
                warn!(error = %err, "Expiry sweep failed");
            }
        }
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
