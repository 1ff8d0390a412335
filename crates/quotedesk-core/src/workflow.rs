//! # Status Workflow
//!
//! The quote lifecycle as data: one static transition table consulted by the
//! detail view, the edit view, the expiry sweep and history replay.
//!
//! ## Transition Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  From            To          Trigger                     Confirm       │
//! │  ──────────────  ──────────  ──────────────────────────  ───────       │
//! │  DRAFT, PENDING  SENT        Send                        no            │
//! │  SENT, VIEWED    ACCEPTED    Mark Accepted               yes           │
//! │  SENT, VIEWED    REJECTED    Mark Rejected               yes           │
//! │  SENT, VIEWED    SENT        Resend (re-stamps sentAt)   no            │
//! │  ACCEPTED        CONVERTED   system: order conversion    -             │
//! │  SENT, VIEWED    EXPIRED     system: validity elapsed    -             │
//! │  DRAFT           PENDING     system: approval requested  -             │
//! │  SENT            VIEWED      system: customer opened     -             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! User-facing actions are derived from the table; [`validate_transition`]
//! is the authoritative gate and is re-applied when a change is committed.
//!
//! ## Time
//! Nothing in this module reads the clock. Every time-dependent function
//! takes `now` from the caller.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::quote::{expiry_from, Quote};
use crate::types::{Actor, QuoteStatus, StatusChangeRecord};


// =============================================================================
// Transition Triggers
// =============================================================================

/// A button a user can press on the quote detail view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusActionKind {
    Send,
    MarkAccepted,
    MarkRejected,
    Resend,
}

impl StatusActionKind {
    pub const fn id(&self) -> &'static str {
        match self {
            StatusActionKind::Send => "send",
            StatusActionKind::MarkAccepted => "mark_accepted",
            StatusActionKind::MarkRejected => "mark_rejected",
            StatusActionKind::Resend => "resend",
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            StatusActionKind::Send => "Send",
            StatusActionKind::MarkAccepted => "Mark Accepted",
            StatusActionKind::MarkRejected => "Mark Rejected",
            StatusActionKind::Resend => "Resend",
        }
    }

    pub const fn confirmation_message(&self) -> Option<&'static str> {
        match self {
            StatusActionKind::MarkAccepted => {
                Some("Mark this quote as accepted by the customer? This cannot be undone.")
            }
            StatusActionKind::MarkRejected => {
                Some("Mark this quote as rejected by the customer? This cannot be undone.")
            }
            StatusActionKind::Send | StatusActionKind::Resend => None,
        }
    }

    pub const fn requires_confirmation(&self) -> bool {
        self.confirmation_message().is_some()
    }
}

/// A transition driven by automation rather than a user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemEvent {
    SubmittedForApproval,
    CustomerViewed,
    ConvertedToOrder,
    ValidityElapsed,
}

impl SystemEvent {
    pub const fn id(&self) -> &'static str {
        match self {
            SystemEvent::SubmittedForApproval => "submitted_for_approval",
            SystemEvent::CustomerViewed => "customer_viewed",
            SystemEvent::ConvertedToOrder => "converted_to_order",
            SystemEvent::ValidityElapsed => "validity_elapsed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionTrigger {
    User(StatusActionKind),
    System(SystemEvent),
}

impl TransitionTrigger {
    pub const fn id(&self) -> &'static str {
        match self {
            TransitionTrigger::User(kind) => kind.id(),
            TransitionTrigger::System(event) => event.id(),
        }
    }
}

/// One legal edge of the lifecycle graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: QuoteStatus,
    pub to: QuoteStatus,
    pub trigger: TransitionTrigger,
}

const fn user(from: QuoteStatus, to: QuoteStatus, kind: StatusActionKind) -> Transition {
    Transition {
        from,
        to,
        trigger: TransitionTrigger::User(kind),
    }
}

const fn system(from: QuoteStatus, to: QuoteStatus, event: SystemEvent) -> Transition {
    Transition {
        from,
        to,
        trigger: TransitionTrigger::System(event),
    }
}

/// Every legal status change. Order defines the order of rendered actions.
pub static TRANSITIONS: &[Transition] = &[
    user(QuoteStatus::Draft, QuoteStatus::Sent, StatusActionKind::Send),
    user(QuoteStatus::Pending, QuoteStatus::Sent, StatusActionKind::Send),
    user(QuoteStatus::Sent, QuoteStatus::Accepted, StatusActionKind::MarkAccepted),
    user(QuoteStatus::Sent, QuoteStatus::Rejected, StatusActionKind::MarkRejected),
    user(QuoteStatus::Sent, QuoteStatus::Sent, StatusActionKind::Resend),
    user(QuoteStatus::Viewed, QuoteStatus::Accepted, StatusActionKind::MarkAccepted),
    user(QuoteStatus::Viewed, QuoteStatus::Rejected, StatusActionKind::MarkRejected),
    user(QuoteStatus::Viewed, QuoteStatus::Sent, StatusActionKind::Resend),
    system(QuoteStatus::Draft, QuoteStatus::Pending, SystemEvent::SubmittedForApproval),
    system(QuoteStatus::Sent, QuoteStatus::Viewed, SystemEvent::CustomerViewed),
    system(QuoteStatus::Accepted, QuoteStatus::Converted, SystemEvent::ConvertedToOrder),
    system(QuoteStatus::Sent, QuoteStatus::Expired, SystemEvent::ValidityElapsed),
    system(QuoteStatus::Viewed, QuoteStatus::Expired, SystemEvent::ValidityElapsed),
];

// =============================================================================
// Table Queries
// =============================================================================

/// Action metadata for rendering a status button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StatusAction {
    pub id: String,
    pub label: String,
    pub target_status: QuoteStatus,
    pub requires_confirmation: bool,
    pub confirmation_message: Option<String>,
}

impl StatusAction {
    fn new(kind: StatusActionKind, target_status: QuoteStatus) -> Self {
        StatusAction {
            id: kind.id().to_string(),
            label: kind.label().to_string(),
            target_status,
            requires_confirmation: kind.requires_confirmation(),
            confirmation_message: kind.confirmation_message().map(str::to_string),
        }
    }
}

/// User actions legal from `status`. Empty for terminal statuses, where the
/// caller offers only duplication.
pub fn available_actions(status: QuoteStatus) -> Vec<StatusAction> {
    TRANSITIONS
        .iter()
        .filter(|t| t.from == status)
        .filter_map(|t| match t.trigger {
            TransitionTrigger::User(kind) => Some(StatusAction::new(kind, t.to)),
            TransitionTrigger::System(_) => None,
        })
        .collect()
}

/// Every status reachable in one step from `status`, system edges included.
pub fn allowed_targets(status: QuoteStatus) -> Vec<QuoteStatus> {
    let mut targets: Vec<QuoteStatus> = Vec::new();
    for transition in TRANSITIONS.iter().filter(|t| t.from == status) {
        if !targets.contains(&transition.to) {
            targets.push(transition.to);
        }
    }
    targets
}

pub fn find_transition(from: QuoteStatus, to: QuoteStatus) -> Option<&'static Transition> {
    TRANSITIONS.iter().find(|t| t.from == from && t.to == to)
}

/// Rejects any `to` that is not an edge out of `from`.
pub fn validate_transition(from: QuoteStatus, to: QuoteStatus) -> CoreResult<&'static Transition> {
    find_transition(from, to).ok_or(CoreError::InvalidTransition { from, to })
}

// =============================================================================
// Editability
// =============================================================================

/// Line items and terms may change only in DRAFT and PENDING.
pub const fn is_editable(status: QuoteStatus) -> bool {
    matches!(status, QuoteStatus::Draft | QuoteStatus::Pending)
}

pub fn ensure_editable(quote: &Quote) -> CoreResult<()> {
    if is_editable(quote.status()) {
        Ok(())
    } else {
        Err(CoreError::NotEditable {
            quote_id: quote.id.clone(),
            status: quote.status(),
        })
    }
}

// =============================================================================
// Applying Transitions
// =============================================================================

/// Validates and applies a status change.
///
/// Returns the updated quote and the audit record; the input quote is not
/// modified. Timestamps stamped at `now`:
///
/// | Target    | Stamped                                                  |
/// |-----------|----------------------------------------------------------|
/// | SENT      | `sent_at`, and `expires_at = now + validity_days`         |
/// | ACCEPTED  | `accepted_at`                                            |
/// | REJECTED  | `rejected_at`                                            |
///
/// `updated_at` is always set. The record's metadata carries the trigger id
/// under `"trigger"`.
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use quotedesk_core::quote::Quote;
/// use quotedesk_core::types::{Actor, QuoteStatus, QuoteTerms};
/// use quotedesk_core::workflow::apply_transition;
///
/// let now = Utc::now();
/// let draft = Quote::new("Q-1", "cust-1", QuoteTerms::default(), now).unwrap();
/// let actor = Actor::new("u-1", "Ada");
///
/// let (sent, record) = apply_transition(&draft, QuoteStatus::Sent, &actor, None, now).unwrap();
/// assert_eq!(sent.status(), QuoteStatus::Sent);
/// assert_eq!(record.to_status(), QuoteStatus::Sent);
///
/// assert!(apply_transition(&draft, QuoteStatus::Accepted, &actor, None, now).is_err());
/// ```
pub fn apply_transition(
    quote: &Quote,
    to: QuoteStatus,
    actor: &Actor,
    comment: Option<&str>,
    now: DateTime<Utc>,
) -> CoreResult<(Quote, StatusChangeRecord)> {
    let from = quote.status();
    let transition = validate_transition(from, to)?;

    let mut next = quote.clone();
    next.status = to;
    next.updated_at = now;

    match to {
        QuoteStatus::Sent => {
            next.sent_at = Some(now);
            next.expires_at = Some(expiry_from(now, &next.terms));
        }
        QuoteStatus::Accepted => next.accepted_at = Some(now),
        QuoteStatus::Rejected => next.rejected_at = Some(now),
        _ => {}
    }

    let record = StatusChangeRecord::new(from, to, actor, comment, now).with_metadata(
        "trigger",
        serde_json::Value::String(transition.trigger.id().to_string()),
    );

    Ok((next, record))
}

// =============================================================================
// Expiry
// =============================================================================

/// Where a quote stands relative to its expiry boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ExpiryState {
    pub is_expired: bool,
    /// Whole days left, rounded up. Zero or negative once the boundary
    /// has passed.
    pub days_remaining: i64,
}

/// `is_expired` iff `now > expires_at`; `days_remaining` is
/// `ceil((expires_at - now) / 1 day)` and never increases as `now` advances.
pub fn compute_expiry_state(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> ExpiryState {
    let remaining = expires_at - now;
    // num_days truncates toward zero, which is already the ceiling when negative.
    let whole_days = remaining.num_days();
    let days_remaining = if remaining > Duration::days(whole_days) {
        whole_days + 1
    } else {
        whole_days
    };

    ExpiryState {
        is_expired: now > expires_at,
        days_remaining,
    }
}

/// True for a SENT or VIEWED quote whose validity has elapsed.
pub fn is_expiry_eligible(quote: &Quote, now: DateTime<Utc>) -> bool {
    quote.status().is_outstanding()
        && quote
            .expires_at()
            .is_some_and(|expires_at| compute_expiry_state(expires_at, now).is_expired)
}

// =============================================================================
// History Replay
// =============================================================================

/// Replays an audit log from DRAFT and returns the status it leads to.
///
/// Each record must start where the previous one ended and be a legal edge.
pub fn replay_history(records: &[StatusChangeRecord]) -> CoreResult<QuoteStatus> {
    records
        .iter()
        .enumerate()
        .try_fold(QuoteStatus::Draft, |current, (index, record)| {
            if record.from_status() != current {
                return Err(CoreError::HistoryMismatch {
                    index,
                    expected: current,
                    found: record.from_status(),
                });
            }
            validate_transition(record.from_status(), record.to_status())?;
            Ok(record.to_status())
        })
}

// =============================================================================
// Unit Tests
// =============================================================================
