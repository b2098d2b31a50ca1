use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use super::errors::BackendError;
use super::offering::{Offering, ProductType, ServiceAction};
use super::order::{ExistingOrder, OrderSubmission};
use super::quote::{QuoteRequest, QuoteResult};

/// Read-only source of what can be sold. Loaded once per composition session.
#[async_trait]
pub trait OfferingCatalog: Send + Sync + 'static {
    async fn list_offerings(&self) -> Result<Vec<Offering>, BackendError>;
    async fn list_product_types(&self) -> Result<Vec<ProductType>, BackendError>;
    async fn list_service_actions(&self) -> Result<Vec<ServiceAction>, BackendError>;
}

/// The backend's authoritative pricing function.
#[async_trait]
pub trait QuoteService: Send + Sync + 'static {
    async fn quote(&self, request: QuoteRequest) -> Result<QuoteResult, BackendError>;
}

#[async_trait]
pub trait OrderGateway: Send + Sync + 'static {
    async fn load_order(&self, id: Uuid) -> Result<Option<ExistingOrder>, BackendError>;
    async fn create_order(&self, order: OrderSubmission) -> Result<Uuid, BackendError>;
    async fn update_order(&self, id: Uuid, order: OrderSubmission) -> Result<Uuid, BackendError>;
}

/// The three backend collaborators a composition session talks to.
#[derive(Clone)]
pub struct Backend {
    pub catalog: Arc<dyn OfferingCatalog>,
    pub quotes: Arc<dyn QuoteService>,
    pub orders: Arc<dyn OrderGateway>,
}

impl Backend {
    /// Use one implementation for every port.
    pub fn shared<B>(backend: Arc<B>) -> Self
    where
        B: OfferingCatalog + QuoteService + OrderGateway,
    {
        Self {
            catalog: backend.clone(),
            quotes: backend.clone(),
            orders: backend,
        }
    }
}
