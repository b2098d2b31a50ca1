use bigdecimal::BigDecimal;
use uuid::Uuid;

/// Inputs sent to the backend pricing function. Also serves as the exact
/// input fingerprint an in-flight quote was computed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRequest {
    pub offering_id: Uuid,
    pub customer_id: Uuid,
    pub quantity: u32,
    pub length: Option<BigDecimal>,
    pub width: Option<BigDecimal>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteResult {
    pub unit_price: BigDecimal,
    pub subtotal: BigDecimal,
    pub applied_unit: String,
}

/// Tag attached to an outgoing quote. A result is only applied while the item
/// is still quoting under the same ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteTicket {
    pub seq: u64,
    pub request: QuoteRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteStatus {
    Idle,
    Quoting,
    Quoted,
    Failed,
}

impl QuoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteStatus::Idle => "idle",
            QuoteStatus::Quoting => "quoting",
            QuoteStatus::Quoted => "quoted",
            QuoteStatus::Failed => "failed",
        }
    }
}

/// Per-item quoting state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum QuoteState {
    #[default]
    Idle,
    Quoting(QuoteTicket),
    Quoted(QuoteResult),
    Failed { message: String },
}

impl QuoteState {
    pub fn status(&self) -> QuoteStatus {
        match self {
            QuoteState::Idle => QuoteStatus::Idle,
            QuoteState::Quoting(_) => QuoteStatus::Quoting,
            QuoteState::Quoted(_) => QuoteStatus::Quoted,
            QuoteState::Failed { .. } => QuoteStatus::Failed,
        }
    }

    pub fn result(&self) -> Option<&QuoteResult> {
        match self {
            QuoteState::Quoted(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            QuoteState::Failed { message } => Some(message),
            _ => None,
        }
    }

    pub fn ticket(&self) -> Option<&QuoteTicket> {
        match self {
            QuoteState::Quoting(ticket) => Some(ticket),
            _ => None,
        }
    }
}
