use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Result;
use async_trait::async_trait;
use futures::future::join_all;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::{
    item::{BoardItem, StatusKey},
    partition::StatusPartition,
    state::{BoardState, MovePhase, MoveRejected},
};

/// Confirmation returned by the backend for a status update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange<T: BoardItem> {
    pub id: T::Id,
    pub status: T::Status,
}

/// Backend operations the board needs.
///
/// `update_status` returning `Ok(None)` means the backend did not find (or
/// would not touch) the item; the controller treats it like an error.
#[async_trait]
pub trait StatusRemote<T: BoardItem>: Send + Sync {
    async fn update_status(
        &self,
        id: &T::Id,
        status: T::Status,
    ) -> Result<Option<StatusChange<T>>>;
    async fn list(&self) -> Result<Vec<T>>;
}

/// Where a dragged item was released.
#[derive(Debug, Clone, PartialEq)]
pub enum DropTarget<T: BoardItem> {
    Item(T::Id),
    Column(T::Status),
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoardEvent<T: BoardItem> {
    Moved { id: T::Id, status: T::Status },
    MoveFailed {
        id: T::Id,
        status: T::Status,
        reason: String,
    },
    BulkUpdated { count: usize },
    BulkFailed { count: usize },
    Refreshed { items: usize, dropped: usize },
    RefreshFailed { reason: String },
}

impl<T: BoardItem> BoardEvent<T> {
    /// Short user-facing text for the notification area.
    pub fn message(&self) -> String {
        match self {
            BoardEvent::Moved { id, status } => format!("{id} moved to {status}"),
            BoardEvent::MoveFailed { id, reason, .. } => {
                format!("could not update {id}: {reason}")
            }
            BoardEvent::BulkUpdated { count } => format!("{count} updated"),
            BoardEvent::BulkFailed { count } => format!("{count} failed"),
            BoardEvent::Refreshed { items, .. } => format!("{items} loaded"),
            BoardEvent::RefreshFailed { reason } => format!("refresh failed: {reason}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Nothing to do: unknown item/column, no drop target, or same position.
    Unchanged,
    Committed,
    RolledBack,
    /// The controller was detached before the backend answered.
    Ignored,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkOutcome {
    pub updated: usize,
    pub failed: usize,
}

pub struct BoardController<T: BoardItem> {
    remote: Arc<dyn StatusRemote<T>>,
    state: Mutex<BoardState<T>>,
    attached: AtomicBool,
    events: broadcast::Sender<BoardEvent<T>>,
}

impl<T: BoardItem> BoardController<T> {
    pub fn new(remote: Arc<dyn StatusRemote<T>>) -> Self {
        Self::with_columns(remote, <T::Status as StatusKey>::ALL.to_vec())
    }

    pub fn with_columns(remote: Arc<dyn StatusRemote<T>>, columns: Vec<T::Status>) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            remote,
            state: Mutex::new(BoardState::new(columns)),
            attached: AtomicBool::new(true),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BoardEvent<T>> {
        self.events.subscribe()
    }

    /// Stops applying results. Requests already in flight still complete but
    /// their outcome is discarded.
    pub fn detach(&self) {
        self.attached.store(false, Ordering::SeqCst);
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    pub async fn partition(&self) -> StatusPartition<T> {
        self.state.lock().await.partition().clone()
    }

    pub async fn phase(&self, id: &T::Id) -> MovePhase {
        self.state.lock().await.phase(id)
    }

    /// Full listing from the backend, replacing whatever is visible.
    pub async fn load(&self) -> Result<usize> {
        let items = match self.remote.list().await {
            Ok(items) => items,
            Err(err) => {
                warn!(error = %err, "board: listing failed");
                self.emit(BoardEvent::RefreshFailed {
                    reason: err.to_string(),
                });
                return Err(err);
            }
        };
        if !self.is_attached() {
            return Ok(0);
        }

        let (items, dropped) = {
            let mut state = self.state.lock().await;
            state.replace(items);
            (state.partition().len(), state.partition().dropped())
        };
        self.emit(BoardEvent::Refreshed { items, dropped });
        Ok(items)
    }

    /// Moves `id` into `target` at `target_index`, optimistically.
    ///
    /// Unknown items and columns are no-ops; only a second move for an item
    /// that is still in flight is rejected.
    pub async fn move_item(
        &self,
        id: &T::Id,
        target: T::Status,
        target_index: Option<usize>,
    ) -> Result<MoveOutcome, MoveRejected> {
        let ticket = {
            let mut state = self.state.lock().await;
            match state.begin_move(id, target, target_index) {
                Ok(Some(ticket)) => ticket,
                Ok(None) => {
                    debug!(%id, %target, "board: move leaves item in place");
                    return Ok(MoveOutcome::Unchanged);
                }
                Err(err @ MoveRejected::InFlight(_)) => return Err(err),
                Err(err) => {
                    debug!(%id, error = %err, "board: ignoring move");
                    return Ok(MoveOutcome::Unchanged);
                }
            }
        };

        let result = self.remote.update_status(&ticket.id, ticket.to).await;
        if !self.is_attached() {
            return Ok(MoveOutcome::Ignored);
        }

        let failure = match result {
            Ok(Some(_)) => None,
            Ok(None) => Some("not found".to_string()),
            Err(err) => Some(err.to_string()),
        };

        match failure {
            None => {
                self.state.lock().await.commit(&ticket.id);
                info!(id = %ticket.id, from = %ticket.from, to = %ticket.to, "board: status updated");
                self.emit(BoardEvent::Moved {
                    id: ticket.id,
                    status: ticket.to,
                });
                self.refresh().await;
                Ok(MoveOutcome::Committed)
            }
            Some(reason) => {
                self.state.lock().await.rollback(&ticket.id);
                warn!(id = %ticket.id, to = %ticket.to, %reason, "board: status update failed, rolled back");
                self.emit(BoardEvent::MoveFailed {
                    id: ticket.id,
                    status: ticket.to,
                    reason,
                });
                Ok(MoveOutcome::RolledBack)
            }
        }
    }

    /// Status-menu change: the item goes to the end of `target`.
    pub async fn set_status(
        &self,
        id: &T::Id,
        target: T::Status,
    ) -> Result<MoveOutcome, MoveRejected> {
        self.move_item(id, target, None).await
    }

    /// Resolves a drag release into a move. Dropping on an item takes that
    /// item's column and position; dropping on a column appends.
    pub async fn drag_end(
        &self,
        active: &T::Id,
        over: Option<DropTarget<T>>,
    ) -> Result<MoveOutcome, MoveRejected> {
        let (target, target_index) = match over {
            None => return Ok(MoveOutcome::Unchanged),
            Some(DropTarget::Column(status)) => (status, None),
            Some(DropTarget::Item(over_id)) => {
                let found = {
                    let state = self.state.lock().await;
                    let location = state.partition().locate(&over_id);
                    location.map(|location| (location.status, location.index))
                };
                match found {
                    Some((status, index)) => (status, Some(index)),
                    None => return Ok(MoveOutcome::Unchanged),
                }
            }
        };
        self.move_item(active, target, target_index).await
    }

    /// Sends one update per id concurrently, reports successes and failures
    /// separately, then reloads once.
    pub async fn bulk_set_status(&self, ids: &[T::Id], target: T::Status) -> BulkOutcome {
        if ids.is_empty() {
            return BulkOutcome::default();
        }

        let updates = ids.iter().map(|id| {
            let remote = Arc::clone(&self.remote);
            async move {
                match remote.update_status(id, target).await {
                    Ok(Some(_)) => true,
                    Ok(None) => {
                        warn!(%id, %target, "board: bulk update found no item");
                        false
                    }
                    Err(err) => {
                        warn!(%id, %target, error = %err, "board: bulk update failed");
                        false
                    }
                }
            }
        });
        let results = join_all(updates).await;

        let updated = results.iter().filter(|ok| **ok).count();
        let outcome = BulkOutcome {
            updated,
            failed: results.len() - updated,
        };
        if !self.is_attached() {
            return outcome;
        }

        info!(updated = outcome.updated, failed = outcome.failed, %target, "board: bulk status change");
        if outcome.updated > 0 {
            self.emit(BoardEvent::BulkUpdated {
                count: outcome.updated,
            });
        }
        if outcome.failed > 0 {
            self.emit(BoardEvent::BulkFailed {
                count: outcome.failed,
            });
        }
        self.refresh().await;
        outcome
    }

    async fn refresh(&self) {
        // Failures are already reported through `RefreshFailed`.
        let _ = self.load().await;
    }

    fn emit(&self, event: BoardEvent<T>) {
        if self.is_attached() {
            let _ = self.events.send(event);
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
