use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use chrono::NaiveDate;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use shared::{
    domain::{BucketKey, Order, OrderAttachment, OrderComment, OrderId, ProductionStatus},
    error::ApiException,
};

pub mod archive;
pub mod backend;

pub use archive::{ArchiveStore, MissingArchiveStore};
pub use backend::{BackendResult, HttpOrdersBackend, MissingOrdersBackend, OrdersBackend};

/// UI-facing notifications. Transient by design: a dropped receiver only
/// misses notices, never state.
#[derive(Debug, Clone)]
pub enum BoardEvent {
    OrdersRefreshed {
        count: usize,
    },
    StatusUpdated {
        order_id: OrderId,
        status: ProductionStatus,
    },
    StatusUpdateFailed {
        order_id: OrderId,
        restored: ProductionStatus,
        message: String,
    },
    /// A pending order was dropped on another column; the confirm flow must
    /// run instead of a direct relabel.
    ConfirmationRequired {
        order_id: OrderId,
    },
    OrderConfirmed {
        order_id: OrderId,
    },
    ArchiveToggled {
        order_id: OrderId,
        archived: bool,
    },
    CommentAdded {
        order_id: OrderId,
        comment: OrderComment,
    },
    AttachmentAdded {
        order_id: OrderId,
        attachment: OrderAttachment,
    },
    Error(String),
}

/// Result of a single drop gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    /// Source and destination name the same column.
    NoOp,
    /// The destination key names no column; nothing happened.
    Ignored,
    /// The order is pending; the confirm flow was requested instead.
    ConfirmationRequired,
    /// Optimistic update held; the backend acknowledged the new status.
    Applied(ProductionStatus),
    /// The backend rejected the update; the exact prior status was restored.
    RolledBack(ProductionStatus),
    /// A previous update for this order is still in flight.
    Busy,
}

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("unknown order {0}")]
    UnknownOrder(OrderId),
    #[error(transparent)]
    Backend(#[from] ApiException),
    #[error(transparent)]
    Archive(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum ConfirmError {
    #[error("unknown order {0}")]
    UnknownOrder(OrderId),
    #[error("order {0} is not awaiting confirmation")]
    NotPending(OrderId),
    #[error("choose either the requested delivery date or an alternative, not both")]
    AmbiguousDeliveryDate,
    #[error("a delivery date must be chosen before confirming")]
    MissingDeliveryDate,
    #[error("order has no requested delivery date to accept")]
    NoRequestedDate,
    #[error(transparent)]
    Backend(ApiException),
}

/// Confirm-dialog input as the user left it. Exactly one of
/// `accept_requested_date` / `alternative_date` must be chosen; validation
/// happens in [`OrderBoard::confirm`] before any remote call.
#[derive(Debug, Clone, Default)]
pub struct ConfirmForm {
    pub accept_requested_date: bool,
    pub alternative_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl ConfirmForm {
    fn resolve_date(&self, order: &Order) -> Result<NaiveDate, ConfirmError> {
        match (self.accept_requested_date, self.alternative_date) {
            (true, Some(_)) => Err(ConfirmError::AmbiguousDeliveryDate),
            (true, None) => order
                .expected_delivery_date
                .ok_or(ConfirmError::NoRequestedDate),
            (false, Some(date)) => Ok(date),
            (false, None) => Err(ConfirmError::MissingDeliveryDate),
        }
    }
}

struct BoardState {
    orders: Vec<Order>,
    archived: HashSet<OrderId>,
    in_flight: HashSet<OrderId>,
    /// Bumped on every optimistic apply and on every refresh. A rollback
    /// only lands if the epoch it captured is still current, so a refresh
    /// that raced an in-flight update wins over the stale revert.
    epochs: HashMap<OrderId, u64>,
}

/// The order status board: four columns derived from the fetched order list,
/// drag transitions synchronized to the remote store with optimistic update
/// and rollback, and a locally persisted archive set.
///
/// All in-memory mutation happens under `inner` between suspension points;
/// the lock is never held across a remote call, so drops on different orders
/// proceed concurrently.
pub struct OrderBoard {
    backend: Arc<dyn OrdersBackend>,
    archive: Arc<dyn ArchiveStore>,
    scope: String,
    inner: Mutex<BoardState>,
    events: broadcast::Sender<BoardEvent>,
}

impl OrderBoard {
    pub fn new(
        backend: Arc<dyn OrdersBackend>,
        archive: Arc<dyn ArchiveStore>,
        scope: impl Into<String>,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            backend,
            archive,
            scope: scope.into(),
            inner: Mutex::new(BoardState {
                orders: Vec::new(),
                archived: HashSet::new(),
                in_flight: HashSet::new(),
                epochs: HashMap::new(),
            }),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<BoardEvent> {
        self.events.subscribe()
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Reads the archive set once, then fetches the order list. Call at
    /// mount.
    pub async fn load(&self) -> Result<(), BoardError> {
        let archived = self.archive.load(&self.scope).await?;
        {
            let mut state = self.inner.lock().await;
            state.archived = archived;
        }
        self.refresh().await
    }

    /// Replaces the in-memory list with a fresh fetch.
    pub async fn refresh(&self) -> Result<(), BoardError> {
        let orders = self.backend.fetch_orders().await?;
        let count = orders.len();
        {
            let mut state = self.inner.lock().await;
            state.orders = orders;
            // Fetched state supersedes any pending rollback value.
            for epoch in state.epochs.values_mut() {
                *epoch += 1;
            }
        }
        info!(count, "board: orders refreshed");
        let _ = self.events.send(BoardEvent::OrdersRefreshed { count });
        Ok(())
    }

    /// The full fetched collection, archived orders included.
    pub async fn orders(&self) -> Vec<Order> {
        self.inner.lock().await.orders.clone()
    }

    pub async fn order(&self, order_id: OrderId) -> Option<Order> {
        self.inner
            .lock()
            .await
            .orders
            .iter()
            .find(|order| order.order_id == order_id)
            .cloned()
    }

    pub async fn is_archived(&self, order_id: OrderId) -> bool {
        self.inner.lock().await.archived.contains(&order_id)
    }

    /// The four columns in render order. Within a column, orders keep their
    /// fetched-list position; archived orders are excluded everywhere.
    pub async fn buckets(&self) -> Vec<(BucketKey, Vec<Order>)> {
        let state = self.inner.lock().await;
        BucketKey::ALL
            .iter()
            .map(|&key| {
                let orders = state
                    .orders
                    .iter()
                    .filter(|order| !state.archived.contains(&order.order_id))
                    .filter(|order| order.bucket() == Some(key))
                    .cloned()
                    .collect();
                (key, orders)
            })
            .collect()
    }

    /// Executes one drop gesture. `source_key` and `destination_key` arrive
    /// as raw strings from the drag-and-drop layer.
    pub async fn handle_drop(
        &self,
        order_id: OrderId,
        source_key: &str,
        destination_key: &str,
    ) -> Result<DropOutcome, BoardError> {
        if source_key == destination_key {
            return Ok(DropOutcome::NoOp);
        }
        let Some(destination) = BucketKey::parse(destination_key) else {
            debug!(%order_id, destination_key, "board: drop on unknown column ignored");
            return Ok(DropOutcome::Ignored);
        };
        if BucketKey::parse(source_key) == Some(destination) {
            return Ok(DropOutcome::NoOp);
        }

        let target = destination.target_status();

        let (previous, epoch) = {
            let mut state = self.inner.lock().await;
            let Some(order) = state
                .orders
                .iter()
                .find(|order| order.order_id == order_id)
            else {
                return Err(BoardError::UnknownOrder(order_id));
            };

            // Pending orders must go through the explicit confirm action
            // (with a delivery date) before they may progress.
            if order.production_status == ProductionStatus::Pending {
                drop(state);
                let _ = self
                    .events
                    .send(BoardEvent::ConfirmationRequired { order_id });
                return Ok(DropOutcome::ConfirmationRequired);
            }

            if state.in_flight.contains(&order_id) {
                drop(state);
                let _ = self.events.send(BoardEvent::Error(format!(
                    "order {order_id} already has a status update in flight"
                )));
                return Ok(DropOutcome::Busy);
            }

            let order = state
                .orders
                .iter_mut()
                .find(|order| order.order_id == order_id)
                .ok_or(BoardError::UnknownOrder(order_id))?;
            let previous = order.production_status;
            order.production_status = target;
            state.in_flight.insert(order_id);
            let epoch = state.epochs.entry(order_id).or_insert(0);
            *epoch += 1;
            (previous, *epoch)
        };

        let result = self.backend.update_status(order_id, target, None).await;

        let mut state = self.inner.lock().await;
        state.in_flight.remove(&order_id);
        match result {
            Ok(()) => {
                drop(state);
                info!(%order_id, status = %target, "board: status update acknowledged");
                let _ = self.events.send(BoardEvent::StatusUpdated {
                    order_id,
                    status: target,
                });
                Ok(DropOutcome::Applied(target))
            }
            Err(err) => {
                let current = state.epochs.get(&order_id).copied().unwrap_or(0);
                if current == epoch {
                    if let Some(order) = state
                        .orders
                        .iter_mut()
                        .find(|order| order.order_id == order_id)
                    {
                        // Restore the exact prior value: a column can map to
                        // more than one status, so "back to the source
                        // column" would not be enough.
                        order.production_status = previous;
                    }
                }
                drop(state);
                warn!(%order_id, error = %err, "board: status update rejected; reverting");
                let _ = self.events.send(BoardEvent::StatusUpdateFailed {
                    order_id,
                    restored: previous,
                    message: err.to_string(),
                });
                Ok(DropOutcome::RolledBack(previous))
            }
        }
    }

    /// Confirms a pending order with a resolved delivery date, then reloads
    /// the whole list (confirmation is a richer server-side transition, so
    /// no optimistic patch here). On failure the caller keeps the dialog
    /// open and may retry; nothing is retried automatically.
    pub async fn confirm(&self, order_id: OrderId, form: &ConfirmForm) -> Result<(), ConfirmError> {
        let delivery_date = {
            let state = self.inner.lock().await;
            let order = state
                .orders
                .iter()
                .find(|order| order.order_id == order_id)
                .ok_or(ConfirmError::UnknownOrder(order_id))?;
            if order.production_status != ProductionStatus::Pending {
                return Err(ConfirmError::NotPending(order_id));
            }
            form.resolve_date(order)?
        };

        self.backend
            .confirm_order(order_id, delivery_date, form.notes.as_deref())
            .await
            .map_err(ConfirmError::Backend)?;

        info!(%order_id, %delivery_date, "board: order confirmed");
        let _ = self.events.send(BoardEvent::OrderConfirmed { order_id });

        if let Err(err) = self.refresh().await {
            let _ = self.events.send(BoardEvent::Error(format!(
                "refresh after confirm failed: {err}"
            )));
        }
        Ok(())
    }

    /// Flips local archive membership for an order and persists the whole
    /// set immediately. Order status is untouched and the remote store is
    /// never called.
    pub async fn toggle_archive(&self, order_id: OrderId) -> Result<bool, BoardError> {
        let (ids, archived) = {
            let mut state = self.inner.lock().await;
            let archived = if state.archived.remove(&order_id) {
                false
            } else {
                state.archived.insert(order_id);
                true
            };
            (state.archived.clone(), archived)
        };

        if let Err(err) = self.archive.save(&self.scope, &ids).await {
            // Persistence failed: undo the flip so memory and disk agree.
            let mut state = self.inner.lock().await;
            if archived {
                state.archived.remove(&order_id);
            } else {
                state.archived.insert(order_id);
            }
            return Err(BoardError::Archive(err));
        }

        let _ = self
            .events
            .send(BoardEvent::ArchiveToggled { order_id, archived });
        Ok(archived)
    }

    pub async fn add_comment(
        &self,
        order_id: OrderId,
        text: &str,
        author_name: &str,
    ) -> Result<OrderComment, BoardError> {
        if self.order(order_id).await.is_none() {
            return Err(BoardError::UnknownOrder(order_id));
        }

        let comment = self.backend.add_comment(order_id, text, author_name).await?;

        {
            let mut state = self.inner.lock().await;
            if let Some(order) = state
                .orders
                .iter_mut()
                .find(|order| order.order_id == order_id)
            {
                order.comments.push(comment.clone());
            }
        }
        let _ = self.events.send(BoardEvent::CommentAdded {
            order_id,
            comment: comment.clone(),
        });
        Ok(comment)
    }

    pub async fn add_attachment(
        &self,
        order_id: OrderId,
        file_name: &str,
        file_url: &str,
    ) -> Result<OrderAttachment, BoardError> {
        if self.order(order_id).await.is_none() {
            return Err(BoardError::UnknownOrder(order_id));
        }

        let attachment = self
            .backend
            .add_attachment(order_id, file_name, file_url)
            .await?;

        {
            let mut state = self.inner.lock().await;
            if let Some(order) = state
                .orders
                .iter_mut()
                .find(|order| order.order_id == order_id)
            {
                order.attachments.push(attachment.clone());
            }
        }
        let _ = self.events.send(BoardEvent::AttachmentAdded {
            order_id,
            attachment: attachment.clone(),
        });
        Ok(attachment)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
