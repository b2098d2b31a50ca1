//! In-process implementation of every backend port, with scripted latency and
//! failures and a record of every call.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use uuid::Uuid;

use order_composer::domain::errors::BackendError;
use order_composer::domain::offering::{Offering, PricingStrategy, ProductType, ServiceAction};
use order_composer::domain::order::{ExistingOrder, OrderSubmission};
use order_composer::domain::ports::{OfferingCatalog, OrderGateway, QuoteService};
use order_composer::domain::quote::{QuoteRequest, QuoteResult};

pub fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).expect("valid decimal")
}

/// Ids of the fixture catalog.
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    pub rug: Uuid,
    pub shirt: Uuid,
    pub wash: Uuid,
    pub iron: Uuid,
    /// rug × wash, 8 per m².
    pub rug_wash: Uuid,
    /// shirt × iron, 3 per piece.
    pub shirt_iron: Uuid,
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            rug: Uuid::new_v4(),
            shirt: Uuid::new_v4(),
            wash: Uuid::new_v4(),
            iron: Uuid::new_v4(),
            rug_wash: Uuid::new_v4(),
            shirt_iron: Uuid::new_v4(),
        }
    }

    pub fn offerings(&self) -> Vec<Offering> {
        vec![
            Offering {
                id: self.rug_wash,
                product_type_id: self.rug,
                action_id: self.wash,
                pricing: PricingStrategy::DimensionBased {
                    price_per_square_meter: dec("8"),
                    minimum_price: None,
                },
            },
            Offering {
                id: self.shirt_iron,
                product_type_id: self.shirt,
                action_id: self.iron,
                pricing: PricingStrategy::Fixed {
                    base_price: dec("3"),
                },
            },
        ]
    }
}

type QuoteRule = dyn Fn(&QuoteRequest) -> Option<BackendError> + Send + Sync;

pub struct FakeBackend {
    pub catalog: Catalog,
    quote_delay: Mutex<Duration>,
    quote_rule: Mutex<Option<Box<QuoteRule>>>,
    requests: Mutex<Vec<QuoteRequest>>,
    existing: Mutex<HashMap<Uuid, ExistingOrder>>,
    submissions: Mutex<Vec<(Option<Uuid>, OrderSubmission)>>,
    submit_error: Mutex<Option<BackendError>>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            catalog: Catalog::new(),
            quote_delay: Mutex::new(Duration::from_millis(50)),
            quote_rule: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
            existing: Mutex::new(HashMap::new()),
            submissions: Mutex::new(Vec::new()),
            submit_error: Mutex::new(None),
        })
    }

    pub fn set_quote_delay(&self, delay: Duration) {
        *self.quote_delay.lock().unwrap() = delay;
    }

    /// Fail every quote for which `rule` returns an error.
    pub fn fail_quotes_when<F>(&self, rule: F)
    where
        F: Fn(&QuoteRequest) -> Option<BackendError> + Send + Sync + 'static,
    {
        *self.quote_rule.lock().unwrap() = Some(Box::new(rule));
    }

    pub fn stop_failing_quotes(&self) {
        *self.quote_rule.lock().unwrap() = None;
    }

    pub fn quote_requests(&self) -> Vec<QuoteRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn insert_order(&self, order: ExistingOrder) {
        self.existing.lock().unwrap().insert(order.id, order);
    }

    pub fn fail_next_submission(&self, err: BackendError) {
        *self.submit_error.lock().unwrap() = Some(err);
    }

    pub fn submissions(&self) -> Vec<(Option<Uuid>, OrderSubmission)> {
        self.submissions.lock().unwrap().clone()
    }

    fn price(&self, request: &QuoteRequest) -> QuoteResult {
        let quantity = BigDecimal::from(request.quantity);
        if request.offering_id == self.catalog.rug_wash {
            let area = request.length.clone().unwrap_or_default()
                * request.width.clone().unwrap_or_default();
            let unit_price = dec("8") * area;
            QuoteResult {
                subtotal: &unit_price * &quantity,
                unit_price,
                applied_unit: "m²".to_string(),
            }
        } else {
            QuoteResult {
                unit_price: dec("3"),
                subtotal: dec("3") * &quantity,
                applied_unit: "piece".to_string(),
            }
        }
    }
}

#[async_trait]
impl OfferingCatalog for FakeBackend {
    async fn list_offerings(&self) -> Result<Vec<Offering>, BackendError> {
        Ok(self.catalog.offerings())
    }

    async fn list_product_types(&self) -> Result<Vec<ProductType>, BackendError> {
        Ok(vec![
            ProductType {
                id: self.catalog.rug,
                name: "Rug".to_string(),
            },
            ProductType {
                id: self.catalog.shirt,
                name: "Shirt".to_string(),
            },
        ])
    }

    async fn list_service_actions(&self) -> Result<Vec<ServiceAction>, BackendError> {
        Ok(vec![
            ServiceAction {
                id: self.catalog.wash,
                name: "Wash".to_string(),
            },
            ServiceAction {
                id: self.catalog.iron,
                name: "Iron".to_string(),
            },
        ])
    }
}

#[async_trait]
impl QuoteService for FakeBackend {
    async fn quote(&self, request: QuoteRequest) -> Result<QuoteResult, BackendError> {
        self.requests.lock().unwrap().push(request.clone());
        let delay = *self.quote_delay.lock().unwrap();
        tokio::time::sleep(delay).await;
        let failure = self
            .quote_rule
            .lock()
            .unwrap()
            .as_ref()
            .and_then(|rule| rule(&request));
        match failure {
            Some(err) => Err(err),
            None => Ok(self.price(&request)),
        }
    }
}

#[async_trait]
impl OrderGateway for FakeBackend {
    async fn load_order(&self, id: Uuid) -> Result<Option<ExistingOrder>, BackendError> {
        Ok(self.existing.lock().unwrap().get(&id).cloned())
    }

    async fn create_order(&self, order: OrderSubmission) -> Result<Uuid, BackendError> {
        if let Some(err) = self.submit_error.lock().unwrap().take() {
            return Err(err);
        }
        self.submissions.lock().unwrap().push((None, order));
        Ok(Uuid::new_v4())
    }

    async fn update_order(&self, id: Uuid, order: OrderSubmission) -> Result<Uuid, BackendError> {
        if let Some(err) = self.submit_error.lock().unwrap().take() {
            return Err(err);
        }
        self.submissions.lock().unwrap().push((Some(id), order));
        Ok(id)
    }
}
