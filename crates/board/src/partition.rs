use std::collections::HashSet;

use tracing::warn;

use crate::item::{BoardItem, StatusKey};

/// One board column: a status and the items carrying it, in display order.
#[derive(Debug, Clone, PartialEq)]
pub struct Column<T: BoardItem> {
    status: T::Status,
    items: Vec<T>,
}

impl<T: BoardItem> Column<T> {
    fn empty(status: T::Status) -> Self {
        Self {
            status,
            items: Vec::new(),
        }
    }

    pub fn status(&self) -> T::Status {
        self.status
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Where an item currently sits on a board.
#[derive(Debug, Clone, PartialEq)]
pub struct Location<'a, T: BoardItem> {
    pub status: T::Status,
    pub index: usize,
    pub item: &'a T,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    column: usize,
    index: usize,
}

/// All items of a board grouped by status.
///
/// Every configured status has a column, even when empty, and each item sits
/// in the column matching its own status field. Construction never fails:
/// items whose status is not a column (or whose id was already seen) are
/// dropped and counted in [`StatusPartition::dropped`].
#[derive(Debug, Clone)]
pub struct StatusPartition<T: BoardItem> {
    columns: Vec<Column<T>>,
    dropped: usize,
}

impl<T: BoardItem> PartialEq for StatusPartition<T> {
    fn eq(&self, other: &Self) -> bool {
        self.columns == other.columns
    }
}

impl<T: BoardItem> Default for StatusPartition<T> {
    fn default() -> Self {
        Self::build(Vec::new())
    }
}

impl<T: BoardItem> StatusPartition<T> {
    /// Partition over the full status enumeration, in its declared order.
    pub fn build(items: impl IntoIterator<Item = T>) -> Self {
        Self::with_columns(<T::Status as StatusKey>::ALL, items)
    }

    /// Partition over a configured list of columns. Repeated statuses in
    /// `statuses` collapse into the first occurrence.
    pub fn with_columns(statuses: &[T::Status], items: impl IntoIterator<Item = T>) -> Self {
        let mut columns: Vec<Column<T>> = Vec::with_capacity(statuses.len());
        for status in statuses {
            if !columns.iter().any(|column| column.status == *status) {
                columns.push(Column::empty(*status));
            }
        }

        let mut seen = HashSet::new();
        let mut unrecognized = 0usize;
        let mut duplicates = 0usize;
        for item in items {
            let status = item.status();
            let Some(column) = columns.iter_mut().find(|column| column.status == status) else {
                unrecognized += 1;
                continue;
            };
            if !seen.insert(item.id().clone()) {
                duplicates += 1;
                continue;
            }
            column.items.push(item);
        }

        if unrecognized > 0 || duplicates > 0 {
            warn!(
                unrecognized,
                duplicates, "board: dropped items that do not fit the configured columns"
            );
        }

        Self {
            columns,
            dropped: unrecognized + duplicates,
        }
    }

    pub fn columns(&self) -> &[Column<T>] {
        &self.columns
    }

    pub fn statuses(&self) -> impl Iterator<Item = T::Status> + '_ {
        self.columns.iter().map(Column::status)
    }

    pub fn column(&self, status: T::Status) -> Option<&Column<T>> {
        self.columns.iter().find(|column| column.status == status)
    }

    /// Items in `status`, or an empty slice when it is not a column here.
    pub fn items(&self, status: T::Status) -> &[T] {
        self.column(status).map(Column::items).unwrap_or(&[])
    }

    pub fn has_column(&self, status: T::Status) -> bool {
        self.column(status).is_some()
    }

    pub fn len(&self) -> usize {
        self.columns.iter().map(Column::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.iter().all(Column::is_empty)
    }

    /// Number of input items left out when this partition was built.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn contains(&self, id: &T::Id) -> bool {
        self.slot_of(id).is_some()
    }

    pub fn locate(&self, id: &T::Id) -> Option<Location<'_, T>> {
        let slot = self.slot_of(id)?;
        let column = &self.columns[slot.column];
        Some(Location {
            status: column.status,
            index: slot.index,
            item: &column.items[slot.index],
        })
    }

    /// Concatenation of all columns in column order.
    pub fn flatten(&self) -> Vec<T> {
        self.columns
            .iter()
            .flat_map(|column| column.items.iter().cloned())
            .collect()
    }

    fn slot_of(&self, id: &T::Id) -> Option<Slot> {
        self.columns
            .iter()
            .enumerate()
            .find_map(|(column, lane)| {
                lane.items
                    .iter()
                    .position(|item| item.id() == id)
                    .map(|index| Slot { column, index })
            })
    }

    fn column_index(&self, status: T::Status) -> Option<usize> {
        self.columns.iter().position(|column| column.status == status)
    }

    /// Index the item would occupy in `target_column` after the move.
    fn landing_index(
        &self,
        source: Slot,
        target_column: usize,
        target_index: Option<usize>,
    ) -> usize {
        let mut len = self.columns[target_column].items.len();
        if source.column == target_column {
            len -= 1;
        }
        target_index.map_or(len, |index| index.min(len))
    }
}

/// Free-function form of [`StatusPartition::locate`].
pub fn locate<'a, T: BoardItem>(
    partition: &'a StatusPartition<T>,
    id: &T::Id,
) -> Option<Location<'a, T>> {
    partition.locate(id)
}

/// Returns a new partition with `id` moved into `target` at `target_index`
/// (clamped to the column length; `None` appends).
///
/// The caller's partition is never modified. An unknown id or a target that
/// is not a column yields an unchanged copy.
pub fn move_item<T: BoardItem>(
    partition: &StatusPartition<T>,
    id: &T::Id,
    target: T::Status,
    target_index: Option<usize>,
) -> StatusPartition<T> {
    let (Some(source), Some(target_column)) =
        (partition.slot_of(id), partition.column_index(target))
    else {
        return partition.clone();
    };

    let at = partition.landing_index(source, target_column, target_index);
    let mut next = partition.clone();
    let mut item = next.columns[source.column].items.remove(source.index);
    item.set_status(target);
    next.columns[target_column].items.insert(at, item);
    next
}

/// True when moving `id` to (`target`, `target_index`) would leave it exactly
/// where it is. Callers use this to skip the remote update.
pub fn is_noop_move<T: BoardItem>(
    partition: &StatusPartition<T>,
    id: &T::Id,
    target: T::Status,
    target_index: Option<usize>,
) -> bool {
    let (Some(source), Some(target_column)) =
        (partition.slot_of(id), partition.column_index(target))
    else {
        return true;
    };
    source.column == target_column
        && partition.landing_index(source, target_column, target_index) == source.index
}

#[cfg(test)]
#[path = "tests/partition_tests.rs"]
mod tests;
