use bigdecimal::{BigDecimal, Zero};

use crate::application::readiness;
use crate::domain::line_item::LineItem;
use crate::domain::order::{OrderDraft, SubmitBlocker};
use crate::domain::quote::QuoteStatus;

/// Sum of quoted subtotals. Idle, quoting and failed items count as zero.
pub fn total(items: &[LineItem]) -> BigDecimal {
    items
        .iter()
        .filter_map(|item| item.quote_state().result())
        .fold(BigDecimal::zero(), |acc, quote| acc + &quote.subtotal)
}

pub fn any_quoting(items: &[LineItem]) -> bool {
    items
        .iter()
        .any(|item| item.quote_state().status() == QuoteStatus::Quoting)
}

/// Everything currently preventing submission, in item order.
pub fn submit_blockers(draft: &OrderDraft) -> Vec<SubmitBlocker> {
    let mut blockers = Vec::new();
    if draft.items().is_empty() {
        blockers.push(SubmitBlocker::NoItems);
    }
    if draft.customer_id().is_none() {
        blockers.push(SubmitBlocker::NoCustomer);
    }
    for item in draft.items() {
        let blocker = match item.quote_state().status() {
            QuoteStatus::Quoting => Some(SubmitBlocker::ItemQuoting(item.id())),
            QuoteStatus::Failed => Some(SubmitBlocker::ItemFailed(item.id())),
            QuoteStatus::Idle | QuoteStatus::Quoted => {
                let complete = item.offering().is_some_and(|offering| {
                    draft.customer_id().is_none()
                        || readiness::is_ready_to_quote(item, offering, draft.customer_id())
                });
                (!complete).then(|| SubmitBlocker::ItemIncomplete(item.id()))
            }
        };
        blockers.extend(blocker);
    }
    blockers
}

pub fn can_submit(draft: &OrderDraft) -> bool {
    submit_blockers(draft).is_empty()
}
