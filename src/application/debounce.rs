//! Quiet-window timer and the settle-diff that decides which items need to be
//! reconciled once input has stopped.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::{sleep_until, Instant};

use crate::domain::line_item::{ItemId, LineItem, PricingFingerprint};

pub const DEFAULT_WINDOW: Duration = Duration::from_millis(750);

/// A restartable one-shot timer.
///
/// Every [`touch`](Debouncer::touch) pushes the deadline out by the full
/// window; a pending settle is discarded, never merged.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    pub fn touch(&mut self) {
        self.deadline = Some(Instant::now() + self.window);
    }

    /// Arm the timer to fire as soon as possible.
    pub fn fire_now(&mut self) {
        self.deadline = Some(Instant::now());
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Resolves once the window has elapsed without a further touch. Never
    /// resolves while disarmed. The caller must [`cancel`](Debouncer::cancel)
    /// after handling the settle.
    pub async fn settled(&self) {
        match self.deadline {
            Some(deadline) => sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }
}

/// Last fingerprint each item was reconciled at.
#[derive(Debug, Default)]
pub struct SettledInputs {
    reconciled: HashMap<ItemId, PricingFingerprint>,
}

impl SettledInputs {
    pub fn record(&mut self, item: &LineItem) {
        self.reconciled.insert(item.id(), item.fingerprint());
    }

    pub fn forget(&mut self, id: ItemId) {
        self.reconciled.remove(&id);
    }

    pub fn forget_all(&mut self) {
        self.reconciled.clear();
    }

    /// Drop entries for items no longer present.
    pub fn retain_items(&mut self, items: &[LineItem]) {
        self.reconciled
            .retain(|id, _| items.iter().any(|item| item.id() == *id));
    }

    /// Items of the settled snapshot whose pricing inputs differ from when
    /// they were last reconciled.
    pub fn changed<'a>(&self, items: &'a [LineItem]) -> Vec<&'a LineItem> {
        items
            .iter()
            .filter(|item| pricing_changed(self.reconciled.get(&item.id()), &item.fingerprint()))
            .collect()
    }
}

pub fn pricing_changed(previous: Option<&PricingFingerprint>, current: &PricingFingerprint) -> bool {
    previous != Some(current)
}
