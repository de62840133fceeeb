//! Ordered list of files on the merge board
//!
//! The store either owns its list ([`Ownership::Local`]) or delegates it to an
//! external owner ([`Ownership::Delegated`]). In delegated mode every edit is
//! turned into a proposed file sequence for the owner, who answers by calling
//! [`OrderingStore::sync`] with the list it accepted.

use crate::types::{DocumentItem, ItemId, SourceFile};

/// Receives proposed file sequences when the list is owned elsewhere
pub trait ListOwner: Send {
    fn propose(&mut self, files: Vec<SourceFile>);
}

/// Who holds the source of truth for the item list
pub enum Ownership {
    Local,
    Delegated(Box<dyn ListOwner>),
}

impl Ownership {
    pub fn is_delegated(&self) -> bool {
        matches!(self, Ownership::Delegated(_))
    }
}

/// Single-step move direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Toward the start of the list
    Up,
    /// Toward the end of the list
    Down,
}

impl Direction {
    pub fn offset(self) -> isize {
        match self {
            Direction::Up => -1,
            Direction::Down => 1,
        }
    }
}

/// Result of resynchronizing with an externally supplied list
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub changed: bool,
    pub added: Vec<ItemId>,
    pub removed: Vec<ItemId>,
}

pub struct OrderingStore {
    items: Vec<DocumentItem>,
    ownership: Ownership,
    next_id: u64,
}

impl OrderingStore {
    pub fn new(ownership: Ownership) -> Self {
        Self {
            items: Vec::new(),
            ownership,
            next_id: 1,
        }
    }

    pub fn local() -> Self {
        Self::new(Ownership::Local)
    }

    pub fn delegated(owner: impl ListOwner + 'static) -> Self {
        Self::new(Ownership::Delegated(Box::new(owner)))
    }

    pub fn is_delegated(&self) -> bool {
        self.ownership.is_delegated()
    }

    pub fn items(&self) -> &[DocumentItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: ItemId) -> Option<&DocumentItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn position(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    pub fn ids(&self) -> Vec<ItemId> {
        self.items.iter().map(|item| item.id).collect()
    }

    fn fresh_id(&mut self) -> ItemId {
        let id = ItemId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Append files to the end of the list.
    ///
    /// Returns the ids of the new items. In delegated mode nothing is inserted
    /// until the owner syncs, so the returned list is empty.
    pub fn add_files(&mut self, files: Vec<SourceFile>) -> Vec<ItemId> {
        if files.is_empty() {
            return Vec::new();
        }

        if let Ownership::Delegated(owner) = &mut self.ownership {
            let mut proposed: Vec<SourceFile> =
                self.items.iter().map(|item| item.source.clone()).collect();
            proposed.extend(files);
            owner.propose(proposed);
            return Vec::new();
        }

        let mut added = Vec::with_capacity(files.len());
        for source in files {
            let id = self.fresh_id();
            self.items.push(DocumentItem { id, source });
            added.push(id);
        }
        added
    }

    /// Remove an item. Returns the removed item, or `None` if the id is unknown.
    ///
    /// In delegated mode the item is returned but stays in the list until the
    /// owner syncs.
    pub fn remove(&mut self, id: ItemId) -> Option<DocumentItem> {
        let index = self.position(id)?;

        if let Ownership::Delegated(owner) = &mut self.ownership {
            let proposed = self
                .items
                .iter()
                .filter(|item| item.id != id)
                .map(|item| item.source.clone())
                .collect();
            owner.propose(proposed);
            return Some(self.items[index].clone());
        }

        Some(self.items.remove(index))
    }

    /// Move an item one step, clamped at both ends. Returns whether the order changed.
    pub fn move_item(&mut self, id: ItemId, direction: Direction) -> bool {
        let Some(from) = self.position(id) else {
            return false;
        };
        let to = from as isize + direction.offset();
        if to < 0 || to as usize >= self.items.len() {
            return false;
        }
        self.apply_reorder(from, to as usize)
    }

    /// Splice the dragged item into the target's current position
    pub fn reorder_during_drag(&mut self, dragged: ItemId, target: ItemId) -> bool {
        if dragged == target {
            return false;
        }
        let (Some(from), Some(to)) = (self.position(dragged), self.position(target)) else {
            return false;
        };
        self.apply_reorder(from, to)
    }

    fn apply_reorder(&mut self, from: usize, to: usize) -> bool {
        if from == to {
            return false;
        }

        if let Ownership::Delegated(owner) = &mut self.ownership {
            let mut proposed: Vec<SourceFile> =
                self.items.iter().map(|item| item.source.clone()).collect();
            let moved = proposed.remove(from);
            proposed.insert(to, moved);
            owner.propose(proposed);
            return true;
        }

        let moved = self.items.remove(from);
        self.items.insert(to, moved);
        true
    }

    /// Empty the list. Returns the ids that were removed.
    pub fn clear(&mut self) -> Vec<ItemId> {
        if let Ownership::Delegated(owner) = &mut self.ownership {
            owner.propose(Vec::new());
            return self.ids();
        }
        self.items.drain(..).map(|item| item.id).collect()
    }

    /// Whether `files` describes exactly the current list
    pub fn matches(&self, files: &[SourceFile]) -> bool {
        self.items.len() == files.len()
            && self
                .items
                .iter()
                .zip(files)
                .all(|(item, file)| item.source.same_identity(file))
    }

    /// Adopt an externally supplied list.
    ///
    /// A content-equal list is ignored. Otherwise items are rebuilt in the given
    /// order, reusing the id of any current item with the same identity so that
    /// its thumbnail survives.
    pub fn sync(&mut self, files: Vec<SourceFile>) -> SyncOutcome {
        if self.matches(&files) {
            return SyncOutcome::default();
        }

        let mut previous: Vec<Option<DocumentItem>> =
            self.items.drain(..).map(Some).collect();
        let mut added = Vec::new();

        for source in files {
            let reused = previous.iter_mut().find_map(|slot| {
                if slot.as_ref().is_some_and(|item| item.source.same_identity(&source)) {
                    slot.take()
                } else {
                    None
                }
            });

            let id = match reused {
                Some(item) => item.id,
                None => {
                    let id = self.fresh_id();
                    added.push(id);
                    id
                }
            };
            self.items.push(DocumentItem { id, source });
        }

        let removed = previous.into_iter().flatten().map(|item| item.id).collect();

        SyncOutcome {
            changed: true,
            added,
            removed,
        }
    }
}

impl Default for OrderingStore {
    fn default() -> Self {
        Self::local()
    }
}
