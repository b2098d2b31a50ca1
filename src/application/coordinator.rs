//! Per-item quote state machine: `idle → quoting → quoted | failed`.
//!
//! Requests run as independent tokio tasks and report back over a channel to
//! the owning session, which hands each outcome to
//! [`QuoteCoordinator::apply_outcome`]. An outcome only lands if the item is
//! still quoting under the exact ticket the request was issued with.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::application::debounce::SettledInputs;
use crate::application::readiness;
use crate::application::resolver::{self, OfferingIndex};
use crate::domain::errors::BackendError;
use crate::domain::line_item::{ItemId, LineItem};
use crate::domain::order::OrderDraft;
use crate::domain::ports::QuoteService;
use crate::domain::quote::{QuoteResult, QuoteState, QuoteStatus, QuoteTicket};

#[derive(Debug)]
pub struct QuoteOutcome {
    pub item_id: ItemId,
    pub ticket: QuoteTicket,
    pub result: Result<QuoteResult, BackendError>,
}

/// Counts from one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub reconciled: usize,
    pub issued: usize,
}

pub struct QuoteCoordinator {
    quotes: Arc<dyn QuoteService>,
    outcomes: mpsc::UnboundedSender<QuoteOutcome>,
    settled: SettledInputs,
    next_seq: u64,
}

impl QuoteCoordinator {
    pub fn new(quotes: Arc<dyn QuoteService>, outcomes: mpsc::UnboundedSender<QuoteOutcome>) -> Self {
        Self {
            quotes,
            outcomes,
            settled: SettledInputs::default(),
            next_seq: 1,
        }
    }

    /// Make the next pass reconcile `id` regardless of its fingerprint.
    pub fn forget(&mut self, id: ItemId) {
        self.settled.forget(id);
    }

    pub fn forget_all(&mut self) {
        self.settled.forget_all();
    }

    /// Re-resolve and, where the gate passes, quote every item whose pricing
    /// inputs changed since it was last reconciled.
    pub fn reconcile(&mut self, draft: &mut OrderDraft, index: &OfferingIndex) -> ReconcileReport {
        self.settled.retain_items(draft.items());
        let changed: Vec<ItemId> = self
            .settled
            .changed(draft.items())
            .into_iter()
            .map(LineItem::id)
            .collect();
        let customer_id = draft.customer_id();
        let mut offerings = resolver::resolve(draft.items(), index);
        let mut report = ReconcileReport::default();

        for id in changed {
            let Some(item) = draft.item_mut(id) else {
                continue;
            };
            report.reconciled += 1;
            let resolution = resolver::classify(item, offerings.remove(&id).flatten());
            item.set_resolution(resolution);
            self.settled.record(item);

            if item.quote_state().status() == QuoteStatus::Quoting {
                continue;
            }
            let Some(offering) = item.offering().cloned() else {
                continue;
            };
            let Some(request) = readiness::quote_request(item, &offering, customer_id) else {
                continue;
            };

            let ticket = QuoteTicket {
                seq: self.next_seq,
                request,
            };
            self.next_seq += 1;
            item.set_quote_state(QuoteState::Quoting(ticket.clone()));
            self.spawn_quote(id, ticket);
            report.issued += 1;
        }
        report
    }

    fn spawn_quote(&self, item_id: ItemId, ticket: QuoteTicket) {
        log::debug!(
            "Requesting quote #{} for item {} (offering {}, qty {})",
            ticket.seq,
            item_id,
            ticket.request.offering_id,
            ticket.request.quantity
        );
        let quotes = Arc::clone(&self.quotes);
        let outcomes = self.outcomes.clone();
        tokio::spawn(async move {
            let result = quotes.quote(ticket.request.clone()).await;
            let outcome = QuoteOutcome {
                item_id,
                ticket,
                result,
            };
            if outcomes.send(outcome).is_err() {
                log::debug!("Session ended before quote for item {} returned", item_id);
            }
        });
    }

    /// Apply a finished quote. Returns `false` when the outcome was stale and
    /// dropped.
    pub fn apply_outcome(&self, draft: &mut OrderDraft, outcome: QuoteOutcome) -> bool {
        let customer_id = draft.customer_id();
        let Some(item) = draft.item_mut(outcome.item_id) else {
            log::debug!("Dropping quote #{} for removed item {}", outcome.ticket.seq, outcome.item_id);
            return false;
        };
        if !is_current(item, &outcome.ticket, customer_id) {
            log::debug!(
                "Dropping stale quote #{} for item {}",
                outcome.ticket.seq,
                outcome.item_id
            );
            return false;
        }

        match outcome.result {
            Ok(result) => {
                log::debug!(
                    "Quote #{} for item {}: subtotal {} per {}",
                    outcome.ticket.seq,
                    outcome.item_id,
                    result.subtotal,
                    result.applied_unit
                );
                item.set_quote_state(QuoteState::Quoted(result));
            }
            Err(err) => {
                log::warn!("Quote #{} for item {} failed: {}", outcome.ticket.seq, outcome.item_id, err);
                item.set_quote_state(QuoteState::Failed {
                    message: err.to_string(),
                });
            }
        }
        true
    }
}

/// The item is still waiting on exactly this ticket, and the ticket still
/// describes the item's current inputs.
fn is_current(item: &LineItem, ticket: &QuoteTicket, customer_id: Option<uuid::Uuid>) -> bool {
    if item.quote_state().ticket() != Some(ticket) {
        return false;
    }
    item.offering()
        .and_then(|offering| readiness::quote_request(item, offering, customer_id))
        .is_some_and(|request| request == ticket.request)
}
