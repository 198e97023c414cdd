//! Row selection tracking across pages.

use std::collections::HashSet;

use serde::Serialize;

use crate::model::RowId;

/// Aggregate selection state of the visible rows, for the header checkbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectAllStatus {
    #[default]
    None,
    Partial,
    All,
}

/// Tracks selected rows by id.
///
/// Selection persists across page changes. The "select all" operations only
/// touch the ids they are given, which the caller takes from the current page.
#[derive(Debug, Clone, Default)]
pub struct SelectionTracker {
    selected: HashSet<RowId>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle selection for a row. Returns `true` if the row is now selected.
    pub fn toggle(&mut self, id: impl Into<RowId>) -> bool {
        let id = id.into();
        if self.selected.remove(&id) {
            false
        } else {
            self.selected.insert(id);
            true
        }
    }

    /// Check if a row is selected.
    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    /// Select every id in `visible`.
    pub fn select_all_visible<I, S>(&mut self, visible: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<RowId>,
    {
        self.selected.extend(visible.into_iter().map(Into::into));
    }

    /// Deselect every id in `visible`, keeping selections on other pages.
    pub fn deselect_all_visible<I, S>(&mut self, visible: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for id in visible {
            self.selected.remove(id.as_ref());
        }
    }

    /// Returns how many of `visible` are selected: none, some, or all.
    ///
    /// An empty page reports [`SelectAllStatus::None`].
    pub fn status<I, S>(&self, visible: I) -> SelectAllStatus
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let (mut total, mut hits) = (0usize, 0usize);
        for id in visible {
            total += 1;
            if self.selected.contains(id.as_ref()) {
                hits += 1;
            }
        }
        match hits {
            0 => SelectAllStatus::None,
            n if n == total => SelectAllStatus::All,
            _ => SelectAllStatus::Partial,
        }
    }

    /// Clear all selections.
    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Get all selected ids.
    pub fn selected_ids(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(String::as_str)
    }

    /// Drops ids that are not in `known`. Returns the number removed.
    ///
    /// Call after replacing the row set so stale ids do not leak into a
    /// `selected` export.
    pub fn retain_known(&mut self, known: &HashSet<RowId>) -> usize {
        let before = self.selected.len();
        self.selected.retain(|id| known.contains(id));
        before - self.selected.len()
    }
}
