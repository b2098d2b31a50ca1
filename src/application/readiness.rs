//! Decides whether a line item carries enough information to be quoted.
//!
//! Not being ready is a normal state while the user is still typing and is
//! never reported as an error.

use bigdecimal::{BigDecimal, Zero};
use uuid::Uuid;

use crate::domain::line_item::LineItem;
use crate::domain::offering::{Offering, PricingKind};
use crate::domain::quote::QuoteRequest;

/// The request that would be sent for `item` right now, if it is ready.
pub fn quote_request(
    item: &LineItem,
    offering: &Offering,
    customer_id: Option<Uuid>,
) -> Option<QuoteRequest> {
    let customer_id = customer_id?;
    let quantity = item.parsed_quantity().filter(|q| *q >= 1)?;
    let (length, width) = match offering.kind() {
        PricingKind::DimensionBased => (
            Some(positive(item.parsed_length())?),
            Some(positive(item.parsed_width())?),
        ),
        PricingKind::Fixed => (None, None),
    };
    Some(QuoteRequest {
        offering_id: offering.id,
        customer_id,
        quantity,
        length,
        width,
    })
}

pub fn is_ready_to_quote(item: &LineItem, offering: &Offering, customer_id: Option<Uuid>) -> bool {
    quote_request(item, offering, customer_id).is_some()
}

fn positive(value: Option<BigDecimal>) -> Option<BigDecimal> {
    value.filter(|v| *v > BigDecimal::zero())
}
