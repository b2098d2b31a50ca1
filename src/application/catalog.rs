use std::sync::Arc;

use crate::application::resolver::OfferingIndex;
use crate::domain::errors::BackendError;
use crate::domain::offering::{Offering, ProductType, ServiceAction};
use crate::domain::ports::OfferingCatalog;

/// Everything a composition session needs from the catalog, loaded once and
/// immutable afterwards.
#[derive(Debug)]
pub struct CatalogSnapshot {
    product_types: Vec<ProductType>,
    service_actions: Vec<ServiceAction>,
    offerings: Vec<Arc<Offering>>,
    index: OfferingIndex,
}

impl CatalogSnapshot {
    pub fn new(
        offerings: Vec<Offering>,
        product_types: Vec<ProductType>,
        service_actions: Vec<ServiceAction>,
    ) -> Self {
        let offerings: Vec<Arc<Offering>> = offerings.into_iter().map(Arc::new).collect();
        let index = OfferingIndex::build(offerings.iter().cloned());
        Self {
            product_types,
            service_actions,
            offerings,
            index,
        }
    }

    pub async fn load(catalog: &dyn OfferingCatalog) -> Result<Self, BackendError> {
        let (offerings, product_types, service_actions) = tokio::try_join!(
            catalog.list_offerings(),
            catalog.list_product_types(),
            catalog.list_service_actions(),
        )?;
        log::info!(
            "Loaded catalog: {} offerings, {} product types, {} service actions",
            offerings.len(),
            product_types.len(),
            service_actions.len()
        );
        Ok(Self::new(offerings, product_types, service_actions))
    }

    pub fn product_types(&self) -> &[ProductType] {
        &self.product_types
    }

    pub fn service_actions(&self) -> &[ServiceAction] {
        &self.service_actions
    }

    pub fn offerings(&self) -> &[Arc<Offering>] {
        &self.offerings
    }

    pub fn index(&self) -> &OfferingIndex {
        &self.index
    }
}
