use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::catalog::CatalogSnapshot;
use crate::application::registry::SessionRegistry;
use crate::application::session::DraftSnapshot;
use crate::domain::line_item::{ItemId, LineItem};
use crate::domain::offering::{Offering, PricingStrategy};
use crate::domain::order::{Edit, SubmitBlocker};
use crate::errors::AppError;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct OpenSessionRequest {
    /// Existing order to edit. Omit to compose a new order.
    #[serde(default)]
    pub order_id: Option<Uuid>,
}

/// One user intent. Exactly one field changes per edit.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EditRequest {
    AddItem,
    RemoveItem { item_id: Uuid },
    SetProductType { item_id: Uuid, product_type_id: Option<Uuid> },
    SetAction { item_id: Uuid, action_id: Option<Uuid> },
    /// Raw text as typed; readiness is decided by the engine.
    SetQuantity { item_id: Uuid, quantity: String },
    SetLength { item_id: Uuid, length: Option<String> },
    SetWidth { item_id: Uuid, width: Option<String> },
    SetDescription { item_id: Uuid, description: Option<String> },
    SetItemNotes { item_id: Uuid, notes: Option<String> },
    SetCustomer { customer_id: Option<Uuid> },
    SetNotes { notes: Option<String> },
    SetDueDate { due_date: Option<NaiveDate> },
}

impl From<EditRequest> for Edit {
    fn from(request: EditRequest) -> Self {
        let item = |id: Uuid| ItemId::from(id);
        match request {
            EditRequest::AddItem => Edit::AddItem,
            EditRequest::RemoveItem { item_id } => Edit::RemoveItem {
                item_id: item(item_id),
            },
            EditRequest::SetProductType {
                item_id,
                product_type_id,
            } => Edit::SetProductType {
                item_id: item(item_id),
                product_type_id,
            },
            EditRequest::SetAction { item_id, action_id } => Edit::SetAction {
                item_id: item(item_id),
                action_id,
            },
            EditRequest::SetQuantity { item_id, quantity } => Edit::SetQuantity {
                item_id: item(item_id),
                quantity,
            },
            EditRequest::SetLength { item_id, length } => Edit::SetLength {
                item_id: item(item_id),
                length,
            },
            EditRequest::SetWidth { item_id, width } => Edit::SetWidth {
                item_id: item(item_id),
                width,
            },
            EditRequest::SetDescription {
                item_id,
                description,
            } => Edit::SetDescription {
                item_id: item(item_id),
                description,
            },
            EditRequest::SetItemNotes { item_id, notes } => Edit::SetItemNotes {
                item_id: item(item_id),
                notes,
            },
            EditRequest::SetCustomer { customer_id } => Edit::SetCustomer { customer_id },
            EditRequest::SetNotes { notes } => Edit::SetNotes { notes },
            EditRequest::SetDueDate { due_date } => Edit::SetDueDate { due_date },
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EditResponse {
    /// Id of the item created by an `add_item` edit.
    pub item_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BlockerResponse {
    /// `no_items`, `no_customer`, `item_quoting`, `item_failed` or `item_incomplete`.
    pub reason: String,
    pub item_id: Option<Uuid>,
}

impl From<&SubmitBlocker> for BlockerResponse {
    fn from(blocker: &SubmitBlocker) -> Self {
        let (reason, item_id) = match blocker {
            SubmitBlocker::NoItems => ("no_items", None),
            SubmitBlocker::NoCustomer => ("no_customer", None),
            SubmitBlocker::ItemQuoting(id) => ("item_quoting", Some(id.as_uuid())),
            SubmitBlocker::ItemFailed(id) => ("item_failed", Some(id.as_uuid())),
            SubmitBlocker::ItemIncomplete(id) => ("item_incomplete", Some(id.as_uuid())),
        };
        BlockerResponse {
            reason: reason.to_string(),
            item_id,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LineItemResponse {
    pub id: Uuid,
    pub product_type_id: Option<Uuid>,
    pub action_id: Option<Uuid>,
    pub quantity: String,
    pub length: Option<String>,
    pub width: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub offering_id: Option<Uuid>,
    pub pricing_strategy: Option<String>,
    /// `idle`, `quoting`, `quoted` or `failed`.
    pub status: String,
    pub unit_price: Option<String>,
    pub subtotal: Option<String>,
    pub applied_unit: Option<String>,
    pub error: Option<String>,
    pub resolution_error: Option<String>,
}

impl From<&LineItem> for LineItemResponse {
    fn from(item: &LineItem) -> Self {
        let quote = item.quote_state();
        let result = quote.result();
        LineItemResponse {
            id: item.id().as_uuid(),
            product_type_id: item.product_type_id(),
            action_id: item.action_id(),
            quantity: item.quantity().to_string(),
            length: item.length().map(str::to_string),
            width: item.width().map(str::to_string),
            description: item.description().map(str::to_string),
            notes: item.notes().map(str::to_string),
            offering_id: item.offering().map(|o| o.id),
            pricing_strategy: item.pricing_kind().map(|k| k.as_str().to_string()),
            status: quote.status().as_str().to_string(),
            unit_price: result.map(|r| r.unit_price.to_string()),
            subtotal: result.map(|r| r.subtotal.to_string()),
            applied_unit: result.map(|r| r.applied_unit.clone()),
            error: quote.error().map(str::to_string),
            resolution_error: item.resolution_error().map(str::to_string),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub id: Uuid,
    /// Order being edited, if any.
    pub order_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub notes: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub items: Vec<LineItemResponse>,
    /// Decimal total as a string, e.g. "42.50".
    pub total: String,
    pub any_quoting: bool,
    pub settling: bool,
    pub can_submit: bool,
    pub blockers: Vec<BlockerResponse>,
}

impl From<&DraftSnapshot> for SessionResponse {
    fn from(snapshot: &DraftSnapshot) -> Self {
        let draft = &snapshot.draft;
        SessionResponse {
            id: snapshot.session_id,
            order_id: draft.order_id(),
            customer_id: draft.customer_id(),
            notes: draft.notes().map(str::to_string),
            due_date: draft.due_date(),
            items: draft.items().iter().map(LineItemResponse::from).collect(),
            total: snapshot.total.to_string(),
            any_quoting: snapshot.any_quoting,
            settling: snapshot.settling,
            can_submit: snapshot.can_submit(),
            blockers: snapshot.blockers.iter().map(BlockerResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NamedResponse {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OfferingResponse {
    pub id: Uuid,
    pub product_type_id: Uuid,
    pub action_id: Uuid,
    pub pricing_strategy: String,
    pub base_price: Option<String>,
    pub price_per_square_meter: Option<String>,
    pub minimum_price: Option<String>,
}

impl From<&Offering> for OfferingResponse {
    fn from(offering: &Offering) -> Self {
        let (base_price, price_per_square_meter, minimum_price) = match &offering.pricing {
            PricingStrategy::Fixed { base_price } => (Some(base_price.to_string()), None, None),
            PricingStrategy::DimensionBased {
                price_per_square_meter,
                minimum_price,
            } => (
                None,
                Some(price_per_square_meter.to_string()),
                minimum_price.as_ref().map(ToString::to_string),
            ),
        };
        OfferingResponse {
            id: offering.id,
            product_type_id: offering.product_type_id,
            action_id: offering.action_id,
            pricing_strategy: offering.kind().as_str().to_string(),
            base_price,
            price_per_square_meter,
            minimum_price,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CatalogResponse {
    pub product_types: Vec<NamedResponse>,
    pub service_actions: Vec<NamedResponse>,
    pub offerings: Vec<OfferingResponse>,
}

impl From<&CatalogSnapshot> for CatalogResponse {
    fn from(catalog: &CatalogSnapshot) -> Self {
        CatalogResponse {
            product_types: catalog
                .product_types()
                .iter()
                .map(|p| NamedResponse {
                    id: p.id,
                    name: p.name.clone(),
                })
                .collect(),
            service_actions: catalog
                .service_actions()
                .iter()
                .map(|a| NamedResponse {
                    id: a.id,
                    name: a.name.clone(),
                })
                .collect(),
            offerings: catalog
                .offerings()
                .iter()
                .map(|o| OfferingResponse::from(o.as_ref()))
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitResponse {
    pub order_id: Uuid,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /sessions
///
/// Loads the catalog (and the order being edited, if any) and starts a
/// composition session.
#[utoipa::path(
    post,
    path = "/sessions",
    request_body = OpenSessionRequest,
    responses(
        (status = 201, description = "Session started", body = SessionResponse),
        (status = 404, description = "Order to edit not found"),
        (status = 502, description = "Backend unavailable"),
    ),
    tag = "sessions"
)]
pub async fn open_session(
    registry: web::Data<SessionRegistry>,
    body: web::Json<OpenSessionRequest>,
) -> Result<HttpResponse, AppError> {
    let handle = registry.open(body.into_inner().order_id).await?;
    let snapshot = handle.snapshot().await?;
    Ok(HttpResponse::Created().json(SessionResponse::from(&snapshot)))
}

/// GET /sessions/{id}
///
/// Current draft with per-item quote state and order-level aggregates.
#[utoipa::path(
    get,
    path = "/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session snapshot", body = SessionResponse),
        (status = 404, description = "Session not found"),
    ),
    tag = "sessions"
)]
pub async fn get_session(
    registry: web::Data<SessionRegistry>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let snapshot = registry.get(path.into_inner())?.snapshot().await?;
    Ok(HttpResponse::Ok().json(SessionResponse::from(&snapshot)))
}

/// GET /sessions/{id}/catalog
#[utoipa::path(
    get,
    path = "/sessions/{id}/catalog",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Catalog loaded for this session", body = CatalogResponse),
        (status = 404, description = "Session not found"),
    ),
    tag = "sessions"
)]
pub async fn get_catalog(
    registry: web::Data<SessionRegistry>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let handle = registry.get(path.into_inner())?;
    Ok(HttpResponse::Ok().json(CatalogResponse::from(handle.catalog().as_ref())))
}

/// POST /sessions/{id}/edits
///
/// Applies one edit. Pricing is re-derived asynchronously once input settles;
/// poll the session to observe it.
#[utoipa::path(
    post,
    path = "/sessions/{id}/edits",
    params(("id" = Uuid, Path, description = "Session id")),
    request_body = EditRequest,
    responses(
        (status = 200, description = "Edit applied", body = EditResponse),
        (status = 404, description = "Session or item not found"),
    ),
    tag = "sessions"
)]
pub async fn apply_edit(
    registry: web::Data<SessionRegistry>,
    path: web::Path<Uuid>,
    body: web::Json<EditRequest>,
) -> Result<HttpResponse, AppError> {
    let handle = registry.get(path.into_inner())?;
    let outcome = handle.edit(body.into_inner().into()).await?;
    Ok(HttpResponse::Ok().json(EditResponse {
        item_id: outcome.added.map(|id| id.as_uuid()),
    }))
}

/// POST /sessions/{id}/submit
///
/// Hands the draft to the backend. The session ends on success.
#[utoipa::path(
    post,
    path = "/sessions/{id}/submit",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 201, description = "Order saved", body = SubmitResponse),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Order cannot be submitted yet"),
        (status = 422, description = "Backend rejected the order"),
        (status = 502, description = "Backend unavailable"),
    ),
    tag = "sessions"
)]
pub async fn submit_session(
    registry: web::Data<SessionRegistry>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = registry.submit(path.into_inner()).await?;
    Ok(HttpResponse::Created().json(SubmitResponse { order_id }))
}

/// DELETE /sessions/{id}
///
/// Discards the draft.
#[utoipa::path(
    delete,
    path = "/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 204, description = "Session discarded"),
        (status = 404, description = "Session not found"),
    ),
    tag = "sessions"
)]
pub async fn close_session(
    registry: web::Data<SessionRegistry>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    registry.close(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
