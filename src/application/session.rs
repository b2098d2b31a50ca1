//! A composition session: one tokio task that owns an [`OrderDraft`] and is
//! the only place it is mutated.
//!
//! User edits arrive on the command channel, quote outcomes on the outcome
//! channel, and reconciliation runs whenever the debouncer settles. Everything
//! between those suspension points runs to completion, so every read sees one
//! consistent draft.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use bigdecimal::BigDecimal;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Instant};
use uuid::Uuid;

use crate::application::aggregator;
use crate::application::catalog::CatalogSnapshot;
use crate::application::coordinator::{QuoteCoordinator, QuoteOutcome};
use crate::application::debounce::{Debouncer, DEFAULT_WINDOW};
use crate::domain::errors::{BackendError, DomainError};
use crate::domain::order::{Edit, EditOutcome, OrderDraft, SubmitBlocker};
use crate::domain::ports::{OrderGateway, QuoteService};

const COMMAND_BUFFER: usize = 64;

pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub debounce: Duration,
    /// A session that receives no command for this long ends itself.
    pub idle_timeout: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_WINDOW,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

/// Read-only view of a session at one instant.
#[derive(Debug, Clone)]
pub struct DraftSnapshot {
    pub session_id: Uuid,
    pub draft: OrderDraft,
    pub total: BigDecimal,
    pub any_quoting: bool,
    pub blockers: Vec<SubmitBlocker>,
    /// A debounce window is open; pricing may still change.
    pub settling: bool,
}

impl DraftSnapshot {
    pub fn can_submit(&self) -> bool {
        self.blockers.is_empty()
    }
}

enum Command {
    Edit {
        edit: Edit,
        reply: oneshot::Sender<Result<EditOutcome, DomainError>>,
    },
    Snapshot {
        reply: oneshot::Sender<DraftSnapshot>,
    },
    Submit {
        reply: oneshot::Sender<Result<Uuid, DomainError>>,
    },
    Close,
}

/// Cloneable handle used to talk to a running session.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    id: Uuid,
    catalog: Arc<CatalogSnapshot>,
    commands: mpsc::Sender<Command>,
}

impl SessionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn catalog(&self) -> &Arc<CatalogSnapshot> {
        &self.catalog
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    pub async fn edit(&self, edit: Edit) -> Result<EditOutcome, DomainError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Edit { edit, reply }).await?;
        rx.await.map_err(|_| DomainError::SessionClosed)?
    }

    pub async fn snapshot(&self) -> Result<DraftSnapshot, DomainError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot { reply }).await?;
        rx.await.map_err(|_| DomainError::SessionClosed)
    }

    /// Submit the order. On success the session ends.
    pub async fn submit(&self) -> Result<Uuid, DomainError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Submit { reply }).await?;
        rx.await.map_err(|_| DomainError::SessionClosed)?
    }

    pub async fn close(&self) {
        // Already gone is fine.
        let _ = self.commands.send(Command::Close).await;
    }

    async fn send(&self, command: Command) -> Result<(), DomainError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| DomainError::SessionClosed)
    }
}

pub struct CompositionSession {
    id: Uuid,
    draft: OrderDraft,
    catalog: Arc<CatalogSnapshot>,
    orders: Arc<dyn OrderGateway>,
    debouncer: Debouncer,
    coordinator: QuoteCoordinator,
    idle_timeout: Duration,
    commands: mpsc::Receiver<Command>,
    outcomes: mpsc::UnboundedReceiver<QuoteOutcome>,
}

impl CompositionSession {
    /// Start a session task for `draft` and return its handle.
    pub fn spawn(
        draft: OrderDraft,
        catalog: Arc<CatalogSnapshot>,
        quotes: Arc<dyn QuoteService>,
        orders: Arc<dyn OrderGateway>,
        settings: SessionSettings,
    ) -> SessionHandle {
        let id = Uuid::new_v4();
        let (command_tx, commands) = mpsc::channel(COMMAND_BUFFER);
        let (outcome_tx, outcomes) = mpsc::unbounded_channel();
        let session = CompositionSession {
            id,
            draft,
            catalog: catalog.clone(),
            orders,
            debouncer: Debouncer::new(settings.debounce),
            coordinator: QuoteCoordinator::new(quotes, outcome_tx),
            idle_timeout: settings.idle_timeout,
            commands,
            outcomes,
        };
        tokio::spawn(session.run());
        SessionHandle {
            id,
            catalog,
            commands: command_tx,
        }
    }

    async fn run(mut self) {
        log::info!(
            "Composition session {} started ({} item(s), editing {:?})",
            self.id,
            self.draft.items().len(),
            self.draft.order_id()
        );
        // Pre-populated items are priced straight away.
        if !self.draft.items().is_empty() {
            self.debouncer.fire_now();
        }

        let mut idle_deadline = Instant::now() + self.idle_timeout;
        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    let Some(command) = command else { break };
                    idle_deadline = Instant::now() + self.idle_timeout;
                    if self.handle(command).await.is_break() {
                        break;
                    }
                }
                Some(outcome) = self.outcomes.recv() => {
                    self.coordinator.apply_outcome(&mut self.draft, outcome);
                }
                _ = self.debouncer.settled() => {
                    self.debouncer.cancel();
                    let report = self.coordinator.reconcile(&mut self.draft, self.catalog.index());
                    log::debug!(
                        "Session {} settled: {} item(s) reconciled, {} quote(s) issued",
                        self.id,
                        report.reconciled,
                        report.issued
                    );
                }
                _ = sleep_until(idle_deadline) => {
                    log::info!(
                        "Composition session {} expired after {:?} without activity",
                        self.id,
                        self.idle_timeout
                    );
                    break;
                }
            }
        }
        log::info!("Composition session {} closed", self.id);
    }

    async fn handle(&mut self, command: Command) -> ControlFlow<()> {
        match command {
            Command::Edit { edit, reply } => {
                let result = self.apply_edit(edit);
                let _ = reply.send(result);
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            Command::Submit { reply } => {
                let result = self.submit().await;
                let submitted = result.is_ok();
                let _ = reply.send(result);
                if submitted {
                    return ControlFlow::Break(());
                }
            }
            Command::Close => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    fn apply_edit(&mut self, edit: Edit) -> Result<EditOutcome, DomainError> {
        let customer_before = self.draft.customer_id();
        let outcome = self.draft.apply(edit)?;
        if self.draft.customer_id() != customer_before {
            self.coordinator.forget_all();
        }
        for id in &outcome.invalidated {
            self.coordinator.forget(*id);
        }
        if outcome.collection_changed {
            self.debouncer.touch();
        }
        Ok(outcome)
    }

    fn snapshot(&self) -> DraftSnapshot {
        DraftSnapshot {
            session_id: self.id,
            draft: self.draft.clone(),
            total: aggregator::total(self.draft.items()),
            any_quoting: aggregator::any_quoting(self.draft.items()),
            blockers: aggregator::submit_blockers(&self.draft),
            settling: self.debouncer.is_pending(),
        }
    }

    async fn submit(&mut self) -> Result<Uuid, DomainError> {
        let blockers = aggregator::submit_blockers(&self.draft);
        if !blockers.is_empty() {
            return Err(DomainError::SubmitBlocked(blockers));
        }
        let submission = self.draft.to_submission()?;
        let result = match self.draft.order_id() {
            Some(order_id) => self.orders.update_order(order_id, submission).await,
            None => self.orders.create_order(submission).await,
        };
        match result {
            Ok(order_id) => {
                log::info!("Session {} submitted order {}", self.id, order_id);
                Ok(order_id)
            }
            Err(BackendError::Validation(violations)) => {
                log::info!(
                    "Session {} submission rejected with {} violation(s)",
                    self.id,
                    violations.len()
                );
                Err(DomainError::SubmissionRejected(
                    self.draft.map_rejection(&violations),
                ))
            }
            Err(err) => Err(err.into()),
        }
    }
}
