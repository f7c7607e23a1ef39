#![forbid(unsafe_code)]

//! Immutable document images.
//!
//! A [`Snapshot`] captures the host document's serialized content plus an
//! optional selection at one point in time. Snapshots are the unit stored in
//! [`SnapshotStack`](crate::stack::SnapshotStack): created on demand, never
//! mutated, dropped when evicted or superseded.
//!
//! Content is held as `Arc<str>`, so cloning a snapshot (stack traversal,
//! lock bookkeeping, burst handles) shares the underlying buffer instead of
//! copying it.
//!
//! # Invariants
//!
//! 1. A snapshot whose content could not be captured is never constructed:
//!    [`Snapshot::capture`] returns `None` instead.
//! 2. Content equality and selection equality are independent: two
//!    content-equal snapshots may differ in selection.
//! 3. Content arrives normalized from the host; equality here is plain
//!    string comparison.

use std::sync::Arc;

use crate::host::EditorHost;

/// One selection anchor: start/end offsets plus the path identifying the
/// node each offset is relative to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionMark {
    /// Offset of the selection start within its node.
    pub start_offset: usize,
    /// Offset of the selection end within its node.
    pub end_offset: usize,
    /// Path of the node containing the start offset.
    pub start_path: Vec<u32>,
    /// Path of the node containing the end offset.
    pub end_path: Vec<u32>,
}

impl SelectionMark {
    /// A collapsed caret mark at `offset` under `path`.
    #[must_use]
    pub fn caret(offset: usize, path: Vec<u32>) -> Self {
        Self {
            start_offset: offset,
            end_offset: offset,
            start_path: path.clone(),
            end_path: path,
        }
    }
}

/// An immutable content + selection image of the host document.
#[derive(Debug, Clone)]
pub struct Snapshot {
    content: Arc<str>,
    selection: Option<Vec<SelectionMark>>,
}

impl Snapshot {
    /// Build a snapshot from already-captured parts.
    #[must_use]
    pub fn new(content: impl Into<Arc<str>>, selection: Option<Vec<SelectionMark>>) -> Self {
        Self {
            content: content.into(),
            selection,
        }
    }

    /// Capture the current host state.
    ///
    /// Selection is skipped when `content_only` is set. Returns `None` when
    /// the host cannot produce content; callers must discard the attempt.
    #[must_use]
    pub fn capture(host: &dyn EditorHost, content_only: bool) -> Option<Self> {
        let content = host.capture_content()?;
        let selection = if content_only {
            None
        } else {
            host.capture_selection()
        };
        Some(Self {
            content: Arc::from(content),
            selection,
        })
    }

    /// The captured content.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// The captured selection marks, if any.
    #[must_use]
    pub fn selection(&self) -> Option<&[SelectionMark]> {
        self.selection.as_deref()
    }

    /// Normalized content comparison.
    #[must_use]
    pub fn equals_content(&self, other: &Self) -> bool {
        self.content == other.content
    }

    /// Selection comparison.
    ///
    /// True when both sides lack marks, or every mark pair matches on
    /// offsets and path identity. False when exactly one side lacks marks
    /// or any pair differs.
    #[must_use]
    pub fn equals_selection(&self, other: &Self) -> bool {
        match (&self.selection, &other.selection) {
            (None, None) => true,
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockEditor;

    fn caret_snapshot(content: &str, offset: usize) -> Snapshot {
        Snapshot::new(content, Some(vec![SelectionMark::caret(offset, vec![0])]))
    }

    #[test]
    fn capture_includes_selection() {
        let mut host = MockEditor::new("hello");
        host.set_caret(3);

        let snapshot = Snapshot::capture(&host, false).unwrap();
        assert_eq!(snapshot.content(), "hello");
        assert_eq!(snapshot.selection().unwrap().len(), 1);
        assert_eq!(snapshot.selection().unwrap()[0].start_offset, 3);
    }

    #[test]
    fn content_only_skips_selection() {
        let mut host = MockEditor::new("hello");
        host.set_caret(3);

        let snapshot = Snapshot::capture(&host, true).unwrap();
        assert_eq!(snapshot.content(), "hello");
        assert!(snapshot.selection().is_none());
    }

    #[test]
    fn capture_fails_soft() {
        let mut host = MockEditor::new("hello");
        host.set_fail_capture(true);
        assert!(Snapshot::capture(&host, false).is_none());
    }

    #[test]
    fn capture_without_selection_available() {
        let host = MockEditor::new("hello");
        let snapshot = Snapshot::capture(&host, false).unwrap();
        assert!(snapshot.selection().is_none());
    }

    #[test]
    fn content_equality() {
        let a = Snapshot::new("abc", None);
        let b = Snapshot::new("abc", None);
        let c = Snapshot::new("abd", None);
        assert!(a.equals_content(&b));
        assert!(!a.equals_content(&c));
    }

    #[test]
    fn selection_equality_both_absent() {
        let a = Snapshot::new("abc", None);
        let b = Snapshot::new("abc", None);
        assert!(a.equals_selection(&b));
    }

    #[test]
    fn selection_equality_one_absent() {
        let a = Snapshot::new("abc", None);
        let b = caret_snapshot("abc", 1);
        assert!(!a.equals_selection(&b));
        assert!(!b.equals_selection(&a));
    }

    #[test]
    fn selection_equality_matching_marks() {
        let a = caret_snapshot("abc", 2);
        let b = caret_snapshot("abc", 2);
        assert!(a.equals_selection(&b));
    }

    #[test]
    fn selection_equality_differing_offsets() {
        let a = caret_snapshot("abc", 1);
        let b = caret_snapshot("abc", 2);
        assert!(!a.equals_selection(&b));
    }

    #[test]
    fn selection_equality_differing_paths() {
        let a = Snapshot::new("abc", Some(vec![SelectionMark::caret(1, vec![0])]));
        let b = Snapshot::new("abc", Some(vec![SelectionMark::caret(1, vec![1])]));
        assert!(!a.equals_selection(&b));
    }

    #[test]
    fn selection_equality_length_mismatch() {
        let a = Snapshot::new("abc", Some(vec![SelectionMark::caret(1, vec![0])]));
        let b = Snapshot::new(
            "abc",
            Some(vec![
                SelectionMark::caret(1, vec![0]),
                SelectionMark::caret(2, vec![0]),
            ]),
        );
        assert!(!a.equals_selection(&b));
    }

    #[test]
    fn content_and_selection_are_independent() {
        let a = caret_snapshot("abc", 1);
        let b = caret_snapshot("abc", 2);
        assert!(a.equals_content(&b));
        assert!(!a.equals_selection(&b));
    }

    #[test]
    fn clone_shares_content() {
        let a = Snapshot::new("abc", None);
        let b = a.clone();
        assert!(std::ptr::eq(a.content(), b.content()));
    }
}
