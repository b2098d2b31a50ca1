use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use uuid::Uuid;

use super::errors::{DomainError, FieldViolation, ItemFieldError, SubmissionRejection};
use super::line_item::{ItemId, LineItem};
use super::offering::PricingKind;

/// A line of an order loaded from the backend for editing.
#[derive(Debug, Clone)]
pub struct ExistingLine {
    pub id: Uuid,
    pub product_type_id: Uuid,
    pub action_id: Uuid,
    pub quantity: u32,
    pub length: Option<BigDecimal>,
    pub width: Option<BigDecimal>,
    pub description: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ExistingOrder {
    pub id: Uuid,
    pub customer_id: Option<Uuid>,
    pub notes: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub lines: Vec<ExistingLine>,
}

/// What is handed to the order-creation/update function. Derived quote values
/// are deliberately absent; the server recomputes them.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSubmission {
    pub customer_id: Uuid,
    pub notes: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub lines: Vec<SubmissionLine>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionLine {
    pub line_id: Option<Uuid>,
    pub offering_id: Uuid,
    pub quantity: u32,
    pub length: Option<BigDecimal>,
    pub width: Option<BigDecimal>,
    pub description: Option<String>,
    pub notes: Option<String>,
}

/// Why an order cannot be submitted right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitBlocker {
    NoItems,
    NoCustomer,
    ItemQuoting(ItemId),
    ItemFailed(ItemId),
    /// Not reconciled yet, no matching offering, or inputs not ready.
    ItemIncomplete(ItemId),
}

/// A user intent against the draft. Every user mutation goes through
/// [`OrderDraft::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    AddItem,
    RemoveItem { item_id: ItemId },
    SetProductType { item_id: ItemId, product_type_id: Option<Uuid> },
    SetAction { item_id: ItemId, action_id: Option<Uuid> },
    SetQuantity { item_id: ItemId, quantity: String },
    SetLength { item_id: ItemId, length: Option<String> },
    SetWidth { item_id: ItemId, width: Option<String> },
    SetDescription { item_id: ItemId, description: Option<String> },
    SetItemNotes { item_id: ItemId, notes: Option<String> },
    SetCustomer { customer_id: Option<Uuid> },
    SetNotes { notes: Option<String> },
    SetDueDate { due_date: Option<NaiveDate> },
}

/// Side information the session needs after an edit has been applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditOutcome {
    /// Set for [`Edit::AddItem`].
    pub added: Option<ItemId>,
    /// The item collection (or the customer it is priced for) changed.
    pub collection_changed: bool,
    /// Items whose derived pricing was reset by this edit.
    pub invalidated: Vec<ItemId>,
}

/// The order under composition.
#[derive(Debug, Clone, Default)]
pub struct OrderDraft {
    order_id: Option<Uuid>,
    customer_id: Option<Uuid>,
    notes: Option<String>,
    due_date: Option<NaiveDate>,
    items: Vec<LineItem>,
}

impl OrderDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_existing(order: &ExistingOrder) -> Self {
        Self {
            order_id: Some(order.id),
            customer_id: order.customer_id,
            notes: order.notes.clone(),
            due_date: order.due_date,
            items: order.lines.iter().map(LineItem::from_existing).collect(),
        }
    }

    /// Id of the order being edited, `None` for a new order.
    pub fn order_id(&self) -> Option<Uuid> {
        self.order_id
    }

    pub fn customer_id(&self) -> Option<Uuid> {
        self.customer_id
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn item(&self, id: ItemId) -> Option<&LineItem> {
        self.items.iter().find(|i| i.id() == id)
    }

    pub(crate) fn item_mut(&mut self, id: ItemId) -> Option<&mut LineItem> {
        self.items.iter_mut().find(|i| i.id() == id)
    }

    pub(crate) fn items_mut(&mut self) -> impl Iterator<Item = &mut LineItem> {
        self.items.iter_mut()
    }

    /// Apply one user intent, invalidating derived pricing where a
    /// pricing-relevant input changed.
    pub fn apply(&mut self, edit: Edit) -> Result<EditOutcome, DomainError> {
        match edit {
            Edit::AddItem => {
                let id = ItemId::new();
                self.items.push(LineItem::new(id));
                Ok(EditOutcome {
                    added: Some(id),
                    collection_changed: true,
                    invalidated: Vec::new(),
                })
            }
            Edit::RemoveItem { item_id } => {
                let index = self
                    .items
                    .iter()
                    .position(|i| i.id() == item_id)
                    .ok_or(DomainError::ItemNotFound(item_id))?;
                self.items.remove(index);
                Ok(EditOutcome {
                    collection_changed: true,
                    ..EditOutcome::default()
                })
            }
            Edit::SetProductType {
                item_id,
                product_type_id,
            } => self.edit_item(item_id, |item| item.product_type_id = product_type_id),
            Edit::SetAction { item_id, action_id } => {
                self.edit_item(item_id, |item| item.action_id = action_id)
            }
            Edit::SetQuantity { item_id, quantity } => {
                self.edit_item(item_id, |item| item.quantity = quantity)
            }
            Edit::SetLength { item_id, length } => {
                self.edit_item(item_id, |item| item.length = length)
            }
            Edit::SetWidth { item_id, width } => {
                self.edit_item(item_id, |item| item.width = width)
            }
            Edit::SetDescription {
                item_id,
                description,
            } => self.edit_item(item_id, |item| item.description = description),
            Edit::SetItemNotes { item_id, notes } => {
                self.edit_item(item_id, |item| item.notes = notes)
            }
            Edit::SetCustomer { customer_id } => {
                if self.customer_id == customer_id {
                    return Ok(EditOutcome::default());
                }
                self.customer_id = customer_id;
                // Quotes are customer specific. Every item stays unsubmittable
                // until the next settle has re-resolved and re-quoted it.
                let mut invalidated = Vec::new();
                for item in self.items.iter_mut() {
                    item.invalidate();
                    invalidated.push(item.id());
                }
                Ok(EditOutcome {
                    added: None,
                    collection_changed: true,
                    invalidated,
                })
            }
            Edit::SetNotes { notes } => {
                self.notes = notes;
                Ok(EditOutcome::default())
            }
            Edit::SetDueDate { due_date } => {
                self.due_date = due_date;
                Ok(EditOutcome::default())
            }
        }
    }

    fn edit_item(
        &mut self,
        item_id: ItemId,
        mutate: impl FnOnce(&mut LineItem),
    ) -> Result<EditOutcome, DomainError> {
        let item = self
            .item_mut(item_id)
            .ok_or(DomainError::ItemNotFound(item_id))?;
        let before = item.fingerprint();
        mutate(item);
        let mut outcome = EditOutcome {
            collection_changed: true,
            ..EditOutcome::default()
        };
        if item.fingerprint() != before {
            item.invalidate();
            outcome.invalidated.push(item_id);
        }
        Ok(outcome)
    }

    /// Build the submission payload. Fails if any line lacks what the server
    /// needs; callers are expected to check the submission gate first.
    pub fn to_submission(&self) -> Result<OrderSubmission, DomainError> {
        let customer_id = self
            .customer_id
            .ok_or(DomainError::SubmitBlocked(vec![SubmitBlocker::NoCustomer]))?;
        let lines = self
            .items
            .iter()
            .map(|item| {
                let incomplete =
                    || DomainError::SubmitBlocked(vec![SubmitBlocker::ItemIncomplete(item.id())]);
                let offering = item.offering().ok_or_else(incomplete)?;
                let quantity = item.parsed_quantity().ok_or_else(incomplete)?;
                let (length, width) = match offering.kind() {
                    PricingKind::DimensionBased => (item.parsed_length(), item.parsed_width()),
                    PricingKind::Fixed => (None, None),
                };
                Ok(SubmissionLine {
                    line_id: item.line_id(),
                    offering_id: offering.id,
                    quantity,
                    length,
                    width,
                    description: item.description.clone(),
                    notes: item.notes.clone(),
                })
            })
            .collect::<Result<Vec<_>, DomainError>>()?;
        Ok(OrderSubmission {
            customer_id,
            notes: self.notes.clone(),
            due_date: self.due_date,
            lines,
        })
    }

    /// Attribute backend validation errors to items by position.
    pub fn map_rejection(&self, violations: &[FieldViolation]) -> SubmissionRejection {
        let mut rejection = SubmissionRejection::default();
        for violation in violations {
            let located = item_key(&violation.key)
                .and_then(|(index, field)| self.items.get(index).map(|item| (index, item, field)));
            match located {
                Some((index, item, field)) => rejection.items.push(ItemFieldError {
                    index,
                    item_id: item.id(),
                    field,
                    message: violation.message.clone(),
                }),
                None => rejection.general.push(violation.message.clone()),
            }
        }
        rejection
    }
}

/// Split `items.3.quantity` / `items[3].quantity` into `(3, "quantity")`.
fn item_key(key: &str) -> Option<(usize, String)> {
    let rest = key.strip_prefix("items")?;
    let (index, field) = if let Some(rest) = rest.strip_prefix('[') {
        let (index, field) = rest.split_once(']')?;
        (index, field.strip_prefix('.').unwrap_or(field))
    } else {
        let rest = rest.strip_prefix('.')?;
        rest.split_once('.').unwrap_or((rest, ""))
    };
    Some((index.parse().ok()?, field.to_string()))
}
