//! List reconciliation
//!
//! Decides, for a list rendered by position, whether a new snapshot needs a
//! structural rebuild or only a patch of the positions that changed.

/// A position whose projected value changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemChange<T> {
    pub index: usize,
    pub previous: T,
    pub current: T,
}

/// What the renderer has to do for one snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderPlan<T> {
    /// Destroy every item node and create `items.len()` fresh ones in order
    Rebuild { items: Vec<T> },
    /// Write only the changed positions
    Patch { changes: Vec<ItemChange<T>> },
}

impl<T> RenderPlan<T> {
    pub fn is_rebuild(&self) -> bool {
        matches!(self, RenderPlan::Rebuild { .. })
    }

    /// `true` for a patch that writes nothing
    pub fn is_noop(&self) -> bool {
        matches!(self, RenderPlan::Patch { changes } if changes.is_empty())
    }
}

/// Tracks what a positional list currently shows.
///
/// Nothing is shown before the first [`reconcile`](Self::reconcile), so the
/// first snapshot always rebuilds, even an empty one.
#[derive(Debug, Clone)]
pub struct ListReconciler<T> {
    rendered: Option<Vec<T>>,
}

impl<T> Default for ListReconciler<T> {
    fn default() -> Self {
        Self { rendered: None }
    }
}

impl<T: Clone + PartialEq> ListReconciler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rendered items, `None` before the first render
    pub fn rendered_len(&self) -> Option<usize> {
        self.rendered.as_ref().map(Vec::len)
    }

    pub fn rendered(&self) -> Option<&[T]> {
        self.rendered.as_deref()
    }

    pub fn reconcile(&mut self, items: Vec<T>) -> RenderPlan<T> {
        let previous = match self.rendered.take() {
            Some(previous) if previous.len() == items.len() => previous,
            _ => {
                self.rendered = Some(items.clone());
                return RenderPlan::Rebuild { items };
            }
        };

        let changes = previous
            .into_iter()
            .zip(items.iter())
            .enumerate()
            .filter(|(_, (old, new))| old != *new)
            .map(|(index, (old, new))| ItemChange {
                index,
                previous: old,
                current: new.clone(),
            })
            .collect();

        self.rendered = Some(items);
        RenderPlan::Patch { changes }
    }

    /// Record that position `index` already shows `item`.
    ///
    /// Used when the operator edits an item in place, so that later patches
    /// compare against what is actually on screen.
    pub fn observe(&mut self, index: usize, item: T) -> bool {
        match self.rendered.as_mut().and_then(|items| items.get_mut(index)) {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        }
    }
}
