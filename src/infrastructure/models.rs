//! JSON shapes exchanged with the REST backend, and their conversions into
//! domain types. Decimal values travel as strings.

use std::collections::BTreeMap;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::{BackendError, FieldViolation};
use crate::domain::offering::{Offering, PricingStrategy, ProductType, ServiceAction};
use crate::domain::order::{ExistingLine, ExistingOrder, OrderSubmission, SubmissionLine};
use crate::domain::quote::{QuoteRequest, QuoteResult};

fn decimal(field: &str, raw: &str) -> Result<BigDecimal, BackendError> {
    BigDecimal::from_str(raw.trim())
        .map_err(|e| BackendError::Decode(format!("invalid {} '{}': {}", field, raw, e)))
}

fn optional_decimal(field: &str, raw: Option<&str>) -> Result<Option<BigDecimal>, BackendError> {
    raw.map(|raw| decimal(field, raw)).transpose()
}

// ── Catalog ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferingRow {
    pub id: Uuid,
    pub product_type_id: Uuid,
    pub action_id: Uuid,
    /// `fixed` or `dimension_based`.
    pub pricing_strategy: String,
    #[serde(default)]
    pub base_price: Option<String>,
    #[serde(default)]
    pub price_per_square_meter: Option<String>,
    #[serde(default)]
    pub minimum_price: Option<String>,
}

impl TryFrom<OfferingRow> for Offering {
    type Error = BackendError;

    fn try_from(row: OfferingRow) -> Result<Self, Self::Error> {
        let missing =
            |field: &str| BackendError::Decode(format!("offering {} has no {}", row.id, field));
        let pricing = match row.pricing_strategy.as_str() {
            "fixed" => PricingStrategy::Fixed {
                base_price: decimal(
                    "base_price",
                    row.base_price.as_deref().ok_or_else(|| missing("base_price"))?,
                )?,
            },
            "dimension_based" => PricingStrategy::DimensionBased {
                price_per_square_meter: decimal(
                    "price_per_square_meter",
                    row.price_per_square_meter
                        .as_deref()
                        .ok_or_else(|| missing("price_per_square_meter"))?,
                )?,
                minimum_price: optional_decimal("minimum_price", row.minimum_price.as_deref())?,
            },
            other => {
                return Err(BackendError::Decode(format!(
                    "offering {} has unknown pricing strategy '{}'",
                    row.id, other
                )))
            }
        };
        Ok(Offering {
            id: row.id,
            product_type_id: row.product_type_id,
            action_id: row.action_id,
            pricing,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedRow {
    pub id: Uuid,
    pub name: String,
}

impl From<NamedRow> for ProductType {
    fn from(row: NamedRow) -> Self {
        ProductType {
            id: row.id,
            name: row.name,
        }
    }
}

impl From<NamedRow> for ServiceAction {
    fn from(row: NamedRow) -> Self {
        ServiceAction {
            id: row.id,
            name: row.name,
        }
    }
}

// ── Pricing ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRequestBody {
    pub offering_id: Uuid,
    pub customer_id: Uuid,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
}

impl From<&QuoteRequest> for QuoteRequestBody {
    fn from(request: &QuoteRequest) -> Self {
        QuoteRequestBody {
            offering_id: request.offering_id,
            customer_id: request.customer_id,
            quantity: request.quantity,
            length: request.length.as_ref().map(ToString::to_string),
            width: request.width.as_ref().map(ToString::to_string),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteResultBody {
    pub unit_price: String,
    pub subtotal: String,
    pub applied_unit: String,
}

impl TryFrom<QuoteResultBody> for QuoteResult {
    type Error = BackendError;

    fn try_from(body: QuoteResultBody) -> Result<Self, Self::Error> {
        Ok(QuoteResult {
            unit_price: decimal("unit_price", &body.unit_price)?,
            subtotal: decimal("subtotal", &body.subtotal)?,
            applied_unit: body.applied_unit,
        })
    }
}

// ── Orders ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemRow {
    pub id: Uuid,
    pub product_type_id: Uuid,
    pub action_id: Uuid,
    pub quantity: u32,
    #[serde(default)]
    pub length: Option<String>,
    #[serde(default)]
    pub width: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRow {
    pub id: Uuid,
    #[serde(default)]
    pub customer_id: Option<Uuid>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    pub items: Vec<OrderItemRow>,
}

impl TryFrom<OrderRow> for ExistingOrder {
    type Error = BackendError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let lines = row
            .items
            .into_iter()
            .map(|item| {
                Ok(ExistingLine {
                    id: item.id,
                    product_type_id: item.product_type_id,
                    action_id: item.action_id,
                    quantity: item.quantity,
                    length: optional_decimal("length", item.length.as_deref())?,
                    width: optional_decimal("width", item.width.as_deref())?,
                    description: item.description,
                    notes: item.notes,
                })
            })
            .collect::<Result<Vec<_>, BackendError>>()?;
        Ok(ExistingOrder {
            id: row.id,
            customer_id: row.customer_id,
            notes: row.notes,
            due_date: row.due_date,
            lines,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderItemRow {
    /// Only present for lines that already exist on the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub offering_id: Uuid,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderRow {
    pub customer_id: Uuid,
    pub notes: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub items: Vec<NewOrderItemRow>,
}

impl From<&SubmissionLine> for NewOrderItemRow {
    fn from(line: &SubmissionLine) -> Self {
        NewOrderItemRow {
            id: line.line_id,
            offering_id: line.offering_id,
            quantity: line.quantity,
            length: line.length.as_ref().map(ToString::to_string),
            width: line.width.as_ref().map(ToString::to_string),
            description: line.description.clone(),
            notes: line.notes.clone(),
        }
    }
}

impl From<&OrderSubmission> for NewOrderRow {
    fn from(order: &OrderSubmission) -> Self {
        NewOrderRow {
            customer_id: order.customer_id,
            notes: order.notes.clone(),
            due_date: order.due_date,
            items: order.lines.iter().map(NewOrderItemRow::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedRow {
    pub id: Uuid,
}

// ── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Validation { errors: BTreeMap<String, Vec<String>> },
    Message { error: String },
}

/// Interpret a non-success response.
pub fn error_from_response(status: u16, body: &str) -> BackendError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody::Validation { errors }) => BackendError::Validation(
            errors
                .into_iter()
                .flat_map(|(key, messages)| {
                    messages.into_iter().map(move |message| FieldViolation {
                        key: key.clone(),
                        message,
                    })
                })
                .collect(),
        ),
        Ok(ErrorBody::Message { error }) if (400..500).contains(&status) => {
            BackendError::Rejected(error)
        }
        _ => BackendError::Status {
            status,
            body: body.to_string(),
        },
    }
}
