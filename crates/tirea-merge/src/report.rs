//! Record of the mutations a merge performed.

use crate::Path;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of an applied mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// A leaf member was assigned from the patch graph.
    Updated,
    /// A configured override ran instead of plain assignment.
    Custom,
    /// A new element was appended to a collection.
    Added,
    /// An element was removed from a collection.
    Removed,
    /// A collection was emptied.
    Cleared,
}

/// One applied mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    /// Full path of the member or collection.
    pub path: Path,
    /// What happened there.
    pub kind: ChangeKind,
    /// Identity of the affected element, for collection changes on
    /// identified elements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
}

impl Change {
    /// Create a change record without an element identity.
    #[inline]
    pub fn new(path: Path, kind: ChangeKind) -> Self {
        Self {
            path,
            kind,
            id: None,
        }
    }

    /// Attach an element identity.
    #[inline]
    pub fn with_id(mut self, id: Option<Uuid>) -> Self {
        self.id = id;
        self
    }
}

/// Ordered list of the mutations a successful merge committed.
///
/// Changes are recorded in the order they were applied. An element added to a
/// collection is reported once as [`ChangeKind::Added`]; the leaf
/// assignments made while populating it are not reported separately.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeReport {
    changes: Vec<Change>,
}

impl MergeReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a change.
    #[inline]
    pub fn push(&mut self, change: Change) {
        self.changes.push(change);
    }

    /// All changes in application order.
    #[inline]
    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    /// Number of recorded changes.
    #[inline]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Check if nothing was changed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of changes of one kind.
    pub fn count(&self, kind: ChangeKind) -> usize {
        self.changes.iter().filter(|c| c.kind == kind).count()
    }

    /// Paths touched by changes of one kind.
    pub fn paths(&self, kind: ChangeKind) -> impl Iterator<Item = &Path> {
        self.changes
            .iter()
            .filter(move |c| c.kind == kind)
            .map(|c| &c.path)
    }

    /// Consume the report, returning the changes.
    pub fn into_changes(self) -> Vec<Change> {
        self.changes
    }
}

impl IntoIterator for MergeReport {
    type Item = Change;
    type IntoIter = std::vec::IntoIter<Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}
