use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::errors::BackendError;
use crate::domain::offering::{Offering, ProductType, ServiceAction};
use crate::domain::order::{ExistingOrder, OrderSubmission};
use crate::domain::ports::{OfferingCatalog, OrderGateway, QuoteService};
use crate::domain::quote::{QuoteRequest, QuoteResult};

use super::models::{
    error_from_response, CreatedRow, NamedRow, NewOrderRow, OfferingRow, OrderRow,
    QuoteRequestBody, QuoteResultBody,
};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            BackendError::Decode(e.to_string())
        } else {
            BackendError::Transport(e.to_string())
        }
    }
}

// ── Client ───────────────────────────────────────────────────────────────────

/// REST client for the console backend, implementing every backend port.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let response = self.http.get(self.url(path)).send().await?;
        decode(response).await
    }

    async fn send<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T, BackendError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .http
            .request(method, self.url(path))
            .json(body)
            .send()
            .await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }
    let body = response.text().await.unwrap_or_default();
    Err(error_from_response(status.as_u16(), &body))
}

#[async_trait]
impl OfferingCatalog for HttpBackend {
    async fn list_offerings(&self) -> Result<Vec<Offering>, BackendError> {
        let rows: Vec<OfferingRow> = self.get("/offerings").await?;
        rows.into_iter().map(Offering::try_from).collect()
    }

    async fn list_product_types(&self) -> Result<Vec<ProductType>, BackendError> {
        let rows: Vec<NamedRow> = self.get("/product-types").await?;
        Ok(rows.into_iter().map(ProductType::from).collect())
    }

    async fn list_service_actions(&self) -> Result<Vec<ServiceAction>, BackendError> {
        let rows: Vec<NamedRow> = self.get("/service-actions").await?;
        Ok(rows.into_iter().map(ServiceAction::from).collect())
    }
}

#[async_trait]
impl QuoteService for HttpBackend {
    async fn quote(&self, request: QuoteRequest) -> Result<QuoteResult, BackendError> {
        let body = QuoteRequestBody::from(&request);
        let result: QuoteResultBody = self.send(Method::POST, "/pricing/quote", &body).await?;
        QuoteResult::try_from(result)
    }
}

#[async_trait]
impl OrderGateway for HttpBackend {
    async fn load_order(&self, id: Uuid) -> Result<Option<ExistingOrder>, BackendError> {
        let response = self.http.get(self.url(&format!("/orders/{}", id))).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let row: OrderRow = decode(response).await?;
        ExistingOrder::try_from(row).map(Some)
    }

    async fn create_order(&self, order: OrderSubmission) -> Result<Uuid, BackendError> {
        let created: CreatedRow = self
            .send(Method::POST, "/orders", &NewOrderRow::from(&order))
            .await?;
        Ok(created.id)
    }

    async fn update_order(&self, id: Uuid, order: OrderSubmission) -> Result<Uuid, BackendError> {
        let updated: CreatedRow = self
            .send(Method::PUT, &format!("/orders/{}", id), &NewOrderRow::from(&order))
            .await?;
        Ok(updated.id)
    }
}
