use std::{fmt, hash::Hash};

/// A finite, ordered status domain. The order of `ALL` is the column order.
pub trait StatusKey: Copy + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static {
    const ALL: &'static [Self];
}

/// An entity that can be laid out on a status board.
pub trait BoardItem: Clone + fmt::Debug + PartialEq + Send + Sync + 'static {
    type Id: Clone + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static;
    type Status: StatusKey;

    fn id(&self) -> &Self::Id;
    fn status(&self) -> Self::Status;
    fn set_status(&mut self, status: Self::Status);
}
