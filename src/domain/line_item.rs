use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::offering::{Offering, PricingKind};
use super::order::ExistingLine;
use super::quote::QuoteState;

/// Client-generated identity of a line item. Stable for the lifetime of a
/// composition session and never sent to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ItemId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Outcome of matching an item's selections against the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Resolution {
    /// Pricing inputs changed since the last settle.
    #[default]
    Unresolved,
    /// Product type or action not chosen yet.
    Unselected,
    Resolved(Arc<Offering>),
    /// Both chosen, but no unique offering matches.
    NoMatch,
}

impl Resolution {
    pub fn offering(&self) -> Option<&Arc<Offering>> {
        match self {
            Resolution::Resolved(offering) => Some(offering),
            _ => None,
        }
    }
}

/// Parsed values of the fields that affect pricing. Two items with equal
/// fingerprints would be quoted identically for the same customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingFingerprint {
    pub product_type_id: Option<Uuid>,
    pub action_id: Option<Uuid>,
    pub quantity: Option<u32>,
    pub length: Option<BigDecimal>,
    pub width: Option<BigDecimal>,
}

pub fn parse_quantity(raw: &str) -> Option<u32> {
    raw.trim().parse().ok()
}

pub fn parse_dimension(raw: Option<&str>) -> Option<BigDecimal> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    BigDecimal::from_str(raw).ok()
}

/// One row of an order under composition.
///
/// User-editable fields are only written through [`crate::domain::order::OrderDraft::apply`];
/// resolution and quote state are owned by the pricing engine.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    id: ItemId,
    pub(crate) line_id: Option<Uuid>,
    pub(crate) product_type_id: Option<Uuid>,
    pub(crate) action_id: Option<Uuid>,
    pub(crate) quantity: String,
    pub(crate) length: Option<String>,
    pub(crate) width: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) notes: Option<String>,
    resolution: Resolution,
    quote: QuoteState,
}

impl LineItem {
    pub fn new(id: ItemId) -> Self {
        Self {
            id,
            line_id: None,
            product_type_id: None,
            action_id: None,
            quantity: "1".to_string(),
            length: None,
            width: None,
            description: None,
            notes: None,
            resolution: Resolution::Unresolved,
            quote: QuoteState::Idle,
        }
    }

    pub fn from_existing(line: &ExistingLine) -> Self {
        Self {
            line_id: Some(line.id),
            product_type_id: Some(line.product_type_id),
            action_id: Some(line.action_id),
            quantity: line.quantity.to_string(),
            length: line.length.as_ref().map(ToString::to_string),
            width: line.width.as_ref().map(ToString::to_string),
            description: line.description.clone(),
            notes: line.notes.clone(),
            ..Self::new(ItemId::new())
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    /// Server-side id of the line when editing an existing order.
    pub fn line_id(&self) -> Option<Uuid> {
        self.line_id
    }

    pub fn product_type_id(&self) -> Option<Uuid> {
        self.product_type_id
    }

    pub fn action_id(&self) -> Option<Uuid> {
        self.action_id
    }

    pub fn quantity(&self) -> &str {
        &self.quantity
    }

    pub fn length(&self) -> Option<&str> {
        self.length.as_deref()
    }

    pub fn width(&self) -> Option<&str> {
        self.width.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    pub fn offering(&self) -> Option<&Arc<Offering>> {
        self.resolution.offering()
    }

    pub fn pricing_kind(&self) -> Option<PricingKind> {
        self.offering().map(|o| o.kind())
    }

    pub fn quote_state(&self) -> &QuoteState {
        &self.quote
    }

    /// Field-level error for a selection that matches no offering.
    pub fn resolution_error(&self) -> Option<&'static str> {
        match self.resolution {
            Resolution::NoMatch => {
                Some("No offering is available for the selected product type and action")
            }
            _ => None,
        }
    }

    pub fn parsed_quantity(&self) -> Option<u32> {
        parse_quantity(&self.quantity)
    }

    pub fn parsed_length(&self) -> Option<BigDecimal> {
        parse_dimension(self.length.as_deref())
    }

    pub fn parsed_width(&self) -> Option<BigDecimal> {
        parse_dimension(self.width.as_deref())
    }

    pub fn fingerprint(&self) -> PricingFingerprint {
        PricingFingerprint {
            product_type_id: self.product_type_id,
            action_id: self.action_id,
            quantity: self.parsed_quantity(),
            length: self.parsed_length(),
            width: self.parsed_width(),
        }
    }

    /// Drop every engine-derived value.
    pub(crate) fn invalidate(&mut self) {
        self.resolution = Resolution::Unresolved;
        self.quote = QuoteState::Idle;
    }

    /// Record a new resolution; a different offering resets the quote.
    pub(crate) fn set_resolution(&mut self, resolution: Resolution) {
        let same_offering = match (self.resolution.offering(), resolution.offering()) {
            (Some(old), Some(new)) => old.id == new.id,
            _ => false,
        };
        if !same_offering {
            self.quote = QuoteState::Idle;
        }
        self.resolution = resolution;
    }

    pub(crate) fn set_quote_state(&mut self, quote: QuoteState) {
        self.quote = quote;
    }
}
