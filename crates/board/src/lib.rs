//! Status boards: items grouped into one column per status, moved between
//! columns with optimistic updates against a remote backend.

pub mod controller;
pub mod item;
mod kinds;
pub mod partition;
pub mod state;

pub use controller::{
    BoardController, BoardEvent, BulkOutcome, DropTarget, MoveOutcome, StatusChange, StatusRemote,
};
pub use item::{BoardItem, StatusKey};
pub use partition::{is_noop_move, locate, move_item, Column, Location, StatusPartition};
pub use state::{BoardState, MovePhase, MoveRejected, MoveTicket};

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod support;
