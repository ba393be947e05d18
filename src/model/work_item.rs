use std::collections::BTreeSet;

/// Snapshot of a source item taken from a single detail fetch.
///
/// Never updated in place: a label added during migration only shows up after
/// a fresh fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Permanent URL of the item in the source system
    pub link: String,
    pub tags: BTreeSet<String>,
}

impl WorkItem {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}
