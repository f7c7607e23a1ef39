#![forbid(unsafe_code)]

//! Host collaborator contract and outbound notifications.
//!
//! The engine never touches the document directly. Everything it needs from
//! the editor goes through [`EditorHost`]: capturing a content/selection
//! image, loading one back, and answering readiness questions. Everything it
//! has to say back travels as [`Notification`] values which the host drains
//! via [`UndoManager::take_notifications`](crate::UndoManager::take_notifications)
//! and dispatches on its own event bus.
//!
//! # Normalization
//!
//! Content returned by [`EditorHost::capture_content`] must already be
//! normalized: volatile attributes, transient markers, or other state that
//! should not count as a document change have to be stripped by the host
//! before returning. Snapshot equality is plain string comparison.

use std::fmt;

use crate::snapshot::SelectionMark;

/// Errors the host can report when loading a snapshot back into the
/// document.
///
/// Load failures are logged and surface as `false` from the traversal
/// operation that triggered them; they never propagate as panics or hard
/// errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The editable surface is not ready to accept content.
    NotReady,
    /// The selection marks do not resolve against the loaded content.
    InvalidSelection,
    /// Host-specific failure with a message.
    Other(String),
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotReady => write!(f, "editable surface not ready"),
            Self::InvalidSelection => write!(f, "selection marks do not resolve"),
            Self::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for HostError {}

/// Result type for host load operations.
pub type HostResult = Result<(), HostError>;

/// The editor the engine serves.
///
/// Implementations wrap the actual document surface. All methods are called
/// from the single logical control flow that drives the engine; no
/// synchronization is expected of the host.
pub trait EditorHost {
    /// Serialize the current document content, already normalized.
    ///
    /// Returns `None` when content cannot be captured (surface not built
    /// yet, wrong mode). Callers discard the capture attempt; `None` is
    /// never stored.
    fn capture_content(&self) -> Option<String>;

    /// The current selection marks, or `None` when there is no restorable
    /// selection.
    fn capture_selection(&self) -> Option<Vec<SelectionMark>>;

    /// Replace the document content with `content`.
    fn load_content(&mut self, content: &str) -> HostResult;

    /// Restore a previously captured selection.
    ///
    /// Only called after a successful [`load_content`](Self::load_content)
    /// and only when the snapshot carries marks; otherwise the host applies
    /// its own default caret placement.
    fn load_selection(&mut self, marks: &[SelectionMark]) -> HostResult;

    /// Whether the editable surface is initialized and ready.
    fn is_ready(&self) -> bool;

    /// Whether the editor is in an editable (non-read-only) mode.
    fn is_editable(&self) -> bool;
}

/// Outbound notification emitted by the engine.
///
/// The engine queues these; the host drains and relays them. Order in the
/// queue is emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Emitted immediately before the engine asks the host for a capture.
    BeforeSnapshot,
    /// Emitted after a capture attempt completes (successful or not).
    AfterSnapshot,
    /// The document content changed, or may be about to change. Cheap,
    /// non-blocking, and decoupled from snapshot capture; may fire more
    /// than once per actual change.
    ContentChanged,
    /// Undo/redo availability changed; drives the host's undo/redo
    /// affordances.
    StateChanged {
        /// An undo step is available.
        can_undo: bool,
        /// A redo step is available.
        can_redo: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_error_display() {
        assert_eq!(HostError::NotReady.to_string(), "editable surface not ready");
        assert!(
            HostError::InvalidSelection
                .to_string()
                .contains("selection marks")
        );
        assert_eq!(HostError::Other("boom".into()).to_string(), "boom");
    }

    #[test]
    fn host_error_is_std_error() {
        let err: Box<dyn std::error::Error> = Box::new(HostError::NotReady);
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn notification_equality() {
        assert_eq!(
            Notification::StateChanged {
                can_undo: true,
                can_redo: false
            },
            Notification::StateChanged {
                can_undo: true,
                can_redo: false
            }
        );
        assert_ne!(Notification::BeforeSnapshot, Notification::AfterSnapshot);
    }
}
