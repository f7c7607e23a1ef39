#![forbid(unsafe_code)]

//! Scriv undo/redo engine.
//!
//! Snapshot-based undo/redo for an interactive rich-content editor: the
//! engine captures content + selection images of the host document,
//! coalesces rapid input (character typing, delete/backspace bursts,
//! navigation) into semantically meaningful checkpoints, and steps backward
//! and forward through those checkpoints while keeping the visible document
//! and cursor consistent.
//!
//! # Key Components
//!
//! - [`Snapshot`] — immutable content + selection image with independent
//!   content and selection equality
//! - [`SnapshotStack`] — bounded chronological sequence with a traversal
//!   cursor; owns truncation-on-branch, deduplication, and eviction
//! - [`Coalescer`] — run-length state machine deciding when a burst of
//!   input becomes a checkpoint
//! - [`UndoManager`] — the orchestrator: save/update/undo/redo, nested
//!   lock regions, deferred typing-burst comparison
//! - [`EditorHost`] — the contract the embedding editor implements
//!
//! # How it fits together
//!
//! ```text
//! host input events ──► Coalescer ──► UndoManager ──► SnapshotStack
//!                                          │
//!                                          ▼
//!                                 Notification queue ──► host UI
//! ```
//!
//! The engine owns no editor state: every operation takes the host by
//! reference, so independent editor instances each run their own manager.
//! Everything is single-threaded and event-driven; the only deferred work
//! is the typing-burst comparison, which the host schedules and which
//! guards itself against staleness with a stack generation counter.
//!
//! # Quick Start
//!
//! ```ignore
//! use scriv_undo::{InputKind, UndoConfig, UndoManager};
//!
//! let mut manager = UndoManager::new(UndoConfig::default());
//!
//! // `host` implements scriv_undo::EditorHost.
//! manager.save(&mut host, false); // initial checkpoint
//!
//! // Per input event, classified by the host:
//! manager.begin_input(&mut host, InputKind::Character);
//! // ... host applies the keystroke to the document ...
//! manager.finish_input(&mut host, InputKind::Character);
//!
//! if manager.can_undo() {
//!     manager.undo(&mut host);
//! }
//!
//! for notification in manager.take_notifications() {
//!     // relay on the editor's own event bus
//! }
//! ```
//!
//! # Module Structure
//!
//! - [`snapshot`]: immutable document images
//! - [`stack`]: the bounded snapshot sequence and cursor
//! - [`coalesce`]: input classification and run-length coalescing
//! - [`manager`]: the orchestrator, configuration, and lock regions
//! - [`host`]: the host contract and outbound notifications
//! - [`testing`]: in-memory mock host for tests

pub mod coalesce;
pub mod host;
pub mod manager;
pub mod snapshot;
pub mod stack;
pub mod testing;

pub use coalesce::{Coalescer, InputKind, KeyClass, StrokeDecision, TypingDecision};
pub use host::{EditorHost, HostError, HostResult, Notification};
pub use manager::{TypingBurst, UndoConfig, UndoManager};
pub use snapshot::{SelectionMark, Snapshot};
pub use stack::{Direction, SnapshotStack};
