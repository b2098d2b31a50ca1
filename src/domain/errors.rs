use thiserror::Error;
use uuid::Uuid;

use super::line_item::ItemId;
use super::order::SubmitBlocker;

/// A single field-level violation reported by the backend, keyed the way the
/// backend keys it (e.g. `items.2.quantity` or `customer_id`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub key: String,
    pub message: String,
}

/// Failure of a call into one of the backend ports.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// Business-rule rejection. The message is shown to the user verbatim.
    #[error("{0}")]
    Rejected(String),
    #[error("{}", join_violations(.0))]
    Validation(Vec<FieldViolation>),
    #[error("Backend returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Backend unreachable: {0}")]
    Transport(String),
    #[error("Malformed backend response: {0}")]
    Decode(String),
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| v.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// A submission validation error attributed to one line item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFieldError {
    pub index: usize,
    pub item_id: ItemId,
    pub field: String,
    pub message: String,
}

/// The backend rejected a whole order, with errors mapped back onto items where
/// the key could be matched positionally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionRejection {
    pub general: Vec<String>,
    pub items: Vec<ItemFieldError>,
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Composition session {0} not found")]
    SessionNotFound(Uuid),
    #[error("Line item {0} not found")]
    ItemNotFound(ItemId),
    #[error("Order {0} not found")]
    OrderNotFound(Uuid),
    #[error("Order cannot be submitted yet")]
    SubmitBlocked(Vec<SubmitBlocker>),
    #[error("Order was rejected by the backend")]
    SubmissionRejected(SubmissionRejection),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("Composition session has been closed")]
    SessionClosed,
}
