//! Board state container: the confirmed partition plus in-flight moves.
//!
//! Pending moves are kept as data and replayed over the confirmed partition,
//! so undoing one move never touches another item or a newer listing.

use std::collections::HashMap;

use thiserror::Error;

use crate::{
    item::{BoardItem, StatusKey},
    partition::{is_noop_move, move_item, StatusPartition},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovePhase {
    Idle,
    Optimistic,
    Committed,
    RolledBack,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveRejected {
    #[error("item {0} is not on the board")]
    UnknownItem(String),
    #[error("status {0} is not a column on this board")]
    UnknownColumn(String),
    #[error("item {0} already has a status update in flight")]
    InFlight(String),
}

/// The remote update a successful `begin_move` asks the caller to issue.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveTicket<T: BoardItem> {
    pub id: T::Id,
    pub from: T::Status,
    pub to: T::Status,
}

#[derive(Debug, Clone)]
struct PendingMove<T: BoardItem> {
    id: T::Id,
    to: T::Status,
    index: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct BoardState<T: BoardItem> {
    columns: Vec<T::Status>,
    /// Last listing from the backend plus the moves it has since confirmed.
    confirmed: StatusPartition<T>,
    /// `confirmed` with every pending move replayed in the order it began.
    visible: StatusPartition<T>,
    pending: Vec<PendingMove<T>>,
    settled: HashMap<T::Id, MovePhase>,
}

impl<T: BoardItem> Default for BoardState<T> {
    fn default() -> Self {
        Self::new(<T::Status as StatusKey>::ALL.to_vec())
    }
}

impl<T: BoardItem> BoardState<T> {
    pub fn new(columns: Vec<T::Status>) -> Self {
        let confirmed = StatusPartition::<T>::with_columns(&columns, Vec::new());
        Self {
            columns,
            visible: confirmed.clone(),
            confirmed,
            pending: Vec::new(),
            settled: HashMap::new(),
        }
    }

    pub fn partition(&self) -> &StatusPartition<T> {
        &self.visible
    }

    pub fn columns(&self) -> &[T::Status] {
        &self.columns
    }

    /// Rebuilds from a fresh listing. Moves still in flight stay applied on
    /// top of it.
    pub fn replace(&mut self, items: Vec<T>) {
        self.confirmed = StatusPartition::<T>::with_columns(&self.columns, items);
        self.visible = self.replay();
    }

    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    pub fn phase(&self, id: &T::Id) -> MovePhase {
        if self.pending_index(id).is_some() {
            return MovePhase::Optimistic;
        }
        self.settled.get(id).copied().unwrap_or(MovePhase::Idle)
    }

    /// Applies a move optimistically and records it as pending.
    ///
    /// Returns `Ok(None)` when the item would land where it already is; no
    /// remote update is needed in that case.
    pub fn begin_move(
        &mut self,
        id: &T::Id,
        target: T::Status,
        target_index: Option<usize>,
    ) -> Result<Option<MoveTicket<T>>, MoveRejected> {
        if self.pending_index(id).is_some() {
            return Err(MoveRejected::InFlight(id.to_string()));
        }
        let from = self
            .visible
            .locate(id)
            .map(|location| location.status)
            .ok_or_else(|| MoveRejected::UnknownItem(id.to_string()))?;
        if !self.visible.has_column(target) {
            return Err(MoveRejected::UnknownColumn(target.to_string()));
        }
        if is_noop_move(&self.visible, id, target, target_index) {
            return Ok(None);
        }

        self.visible = move_item(&self.visible, id, target, target_index);
        self.pending.push(PendingMove {
            id: id.clone(),
            to: target,
            index: target_index,
        });
        self.settled.remove(id);

        Ok(Some(MoveTicket {
            id: id.clone(),
            from,
            to: target,
        }))
    }

    /// Folds the move into the confirmed partition. Returns false when
    /// nothing was pending.
    pub fn commit(&mut self, id: &T::Id) -> bool {
        let Some(position) = self.pending_index(id) else {
            return false;
        };
        let done = self.pending.remove(position);
        self.confirmed = move_item(&self.confirmed, &done.id, done.to, done.index);
        self.visible = self.replay();
        self.settled.insert(done.id, MovePhase::Committed);
        true
    }

    /// Drops the move and shows the confirmed partition with the remaining
    /// pending moves. With no other move in flight this is exactly the
    /// partition seen before `begin_move`. Returns false when nothing was
    /// pending.
    pub fn rollback(&mut self, id: &T::Id) -> bool {
        let Some(position) = self.pending_index(id) else {
            return false;
        };
        let undone = self.pending.remove(position);
        self.visible = self.replay();
        self.settled.insert(undone.id, MovePhase::RolledBack);
        true
    }

    fn pending_index(&self, id: &T::Id) -> Option<usize> {
        self.pending.iter().position(|pending| &pending.id == id)
    }

    fn replay(&self) -> StatusPartition<T> {
        self.pending
            .iter()
            .fold(self.confirmed.clone(), |partition, pending| {
                move_item(&partition, &pending.id, pending.to, pending.index)
            })
    }
}

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod tests;
