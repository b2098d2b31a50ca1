use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use uuid::Uuid;

use crate::application::catalog::CatalogSnapshot;
use crate::application::session::{CompositionSession, SessionHandle, SessionSettings};
use crate::domain::errors::DomainError;
use crate::domain::order::OrderDraft;
use crate::domain::ports::Backend;

/// Open composition sessions, keyed by session id.
pub struct SessionRegistry {
    backend: Backend,
    settings: SessionSettings,
    sessions: Mutex<HashMap<Uuid, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new(backend: Backend, settings: SessionSettings) -> Self {
        Self {
            backend,
            settings,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Start a session for a new order, or for editing `order_id`.
    pub async fn open(&self, order_id: Option<Uuid>) -> Result<SessionHandle, DomainError> {
        let catalog = Arc::new(CatalogSnapshot::load(self.backend.catalog.as_ref()).await?);
        let draft = match order_id {
            Some(id) => {
                let order = self
                    .backend
                    .orders
                    .load_order(id)
                    .await?
                    .ok_or(DomainError::OrderNotFound(id))?;
                OrderDraft::from_existing(&order)
            }
            None => OrderDraft::new(),
        };
        let handle = CompositionSession::spawn(
            draft,
            catalog,
            self.backend.quotes.clone(),
            self.backend.orders.clone(),
            self.settings,
        );
        let mut sessions = self.lock();
        // Expired sessions are dropped here as well as on lookup.
        sessions.retain(|_, open| !open.is_closed());
        sessions.insert(handle.id(), handle.clone());
        Ok(handle)
    }

    pub fn get(&self, id: Uuid) -> Result<SessionHandle, DomainError> {
        let mut sessions = self.lock();
        match sessions.get(&id) {
            Some(handle) if !handle.is_closed() => Ok(handle.clone()),
            Some(_) => {
                sessions.remove(&id);
                Err(DomainError::SessionNotFound(id))
            }
            None => Err(DomainError::SessionNotFound(id)),
        }
    }

    pub async fn close(&self, id: Uuid) -> Result<(), DomainError> {
        let handle = self
            .lock()
            .remove(&id)
            .ok_or(DomainError::SessionNotFound(id))?;
        handle.close().await;
        Ok(())
    }

    /// Submit the session's order; the session is discarded on success.
    pub async fn submit(&self, id: Uuid) -> Result<Uuid, DomainError> {
        let handle = self.get(id)?;
        let order_id = handle.submit().await?;
        self.lock().remove(&id);
        Ok(order_id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, SessionHandle>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
