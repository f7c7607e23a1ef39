#![forbid(unsafe_code)]

//! The undo/redo orchestrator.
//!
//! [`UndoManager`] ties the pieces together: it consults the
//! [`Coalescer`](crate::coalesce::Coalescer) to decide when input bursts
//! become checkpoints, drives the [`SnapshotStack`], and reports state
//! transitions through a notification queue the host drains.
//!
//! ```text
//! host input events ──► Coalescer ──► UndoManager decision
//!                                       (save now / defer / merge)
//!                                          │
//!                                          ▼
//!                                    SnapshotStack
//!                                          │
//!                                          ▼
//!                              Notification queue ──► host UI
//! ```
//!
//! # Invariants
//!
//! 1. No stack mutation happens while a lock token is held; release at
//!    nesting level 0 may fold lock-period changes into the tip.
//! 2. `can_undo()`/`can_redo()` reflect neighbor availability after every
//!    operation that can change them.
//! 3. A deferred typing-burst comparison never commits once the stack
//!    generation has moved on.
//! 4. An uncapturable host image is discarded, never stored.
//!
//! # Failure Modes
//!
//! | Scenario | Behavior |
//! |----------|----------|
//! | save/update while locked | `false`/no-op, stack untouched |
//! | host not ready or read-only | `false`, stack untouched |
//! | capture returns no content | `false`, nothing stored |
//! | undo/redo with no reachable neighbor | `false` |
//! | stale deferred burst | silently dropped |
//! | host refuses a restore load | `false`, lock released, cursor unmoved |
//!
//! These are expected, frequent, benign states, not faults; none of them
//! raises an error.

use std::collections::VecDeque;
use std::fmt;

use crate::coalesce::{Coalescer, InputKind, KeyClass, StrokeDecision};
use crate::host::{EditorHost, Notification};
use crate::snapshot::Snapshot;
use crate::stack::{Direction, SnapshotStack};

/// Configuration for the undo manager.
#[derive(Debug, Clone)]
pub struct UndoConfig {
    /// Maximum number of snapshots kept on the stack.
    pub stack_capacity: usize,
    /// Raw keystrokes of one class per checkpoint.
    pub stroke_threshold: u32,
    /// Aggregated typed characters per checkpoint.
    pub typing_threshold: u32,
}

impl Default for UndoConfig {
    fn default() -> Self {
        Self {
            stack_capacity: 20,
            stroke_threshold: 5,
            typing_threshold: 25,
        }
    }
}

impl UndoConfig {
    /// Create a configuration with a custom stack capacity.
    #[must_use]
    pub fn new(stack_capacity: usize) -> Self {
        Self {
            stack_capacity,
            ..Self::default()
        }
    }

    /// Set the raw-key burst threshold.
    #[must_use]
    pub fn with_stroke_threshold(mut self, threshold: u32) -> Self {
        self.stroke_threshold = threshold;
        self
    }

    /// Set the aggregated typing threshold.
    #[must_use]
    pub fn with_typing_threshold(mut self, threshold: u32) -> Self {
        self.typing_threshold = threshold;
        self
    }
}

/// What to do with the stack tip when the outermost lock is released.
#[derive(Debug, Clone)]
enum PendingUnlock {
    /// Leave the tip alone.
    Skip,
    /// Always fold the lock-period state into the tip.
    Always,
    /// Fold only if content drifted from this pre-lock image.
    IfChanged(Snapshot),
}

/// Nested suppression region; stack mutation is forbidden while held.
#[derive(Debug)]
struct LockToken {
    level: u32,
    pending: PendingUnlock,
}

impl LockToken {
    fn transient() -> Self {
        Self {
            level: 1,
            pending: PendingUnlock::Skip,
        }
    }
}

/// Handle for a deferred typing-burst comparison.
///
/// [`UndoManager::record_typing`] hands one out when a burst begins; the
/// host's scheduler calls
/// [`UndoManager::complete_typing_burst`] with it after the edit has been
/// applied. The embedded generation makes a stale handle a guarded no-op.
#[derive(Debug, Clone)]
pub struct TypingBurst {
    before: Snapshot,
    generation: u64,
}

/// Orchestrator for snapshot save/traversal, burst coalescing, and lock
/// regions.
///
/// All operations take the host by reference; the manager owns no editor
/// state beyond its own stack and counters, so multiple independent editor
/// instances each get their own manager.
pub struct UndoManager {
    stack: SnapshotStack,
    coalescer: Coalescer,
    config: UndoConfig,
    enabled: bool,
    locked: Option<LockToken>,
    has_undo: bool,
    has_redo: bool,
    last_keydown: Option<Snapshot>,
    pending: VecDeque<Notification>,
}

impl fmt::Debug for UndoManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoManager")
            .field("depth", &self.stack.len())
            .field("cursor", &self.stack.cursor())
            .field("enabled", &self.enabled)
            .field("locked", &self.locked.as_ref().map(|token| token.level))
            .field("has_undo", &self.has_undo)
            .field("has_redo", &self.has_redo)
            .finish()
    }
}

impl Default for UndoManager {
    fn default() -> Self {
        Self::new(UndoConfig::default())
    }
}

impl UndoManager {
    /// Create a manager with the given configuration.
    #[must_use]
    pub fn new(config: UndoConfig) -> Self {
        Self {
            stack: SnapshotStack::new(config.stack_capacity),
            coalescer: Coalescer::new(config.stroke_threshold, config.typing_threshold),
            config,
            enabled: true,
            locked: None,
            has_undo: false,
            has_redo: false,
            last_keydown: None,
            pending: VecDeque::new(),
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Whether an undo step is available (gated by enablement).
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.enabled && self.has_undo
    }

    /// Whether a redo step is available (gated by enablement).
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.enabled && self.has_redo
    }

    /// Whether the manager reacts to undo/redo requests.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether a lock region is open.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked.is_some()
    }

    /// Whether a typing burst is open.
    #[must_use]
    pub fn is_typing(&self) -> bool {
        self.coalescer.is_typing()
    }

    /// Number of stored snapshots.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Current stack cursor, `None` when empty.
    #[must_use]
    pub fn cursor(&self) -> Option<usize> {
        self.stack.cursor()
    }

    /// The snapshot at the cursor.
    #[must_use]
    pub fn current(&self) -> Option<&Snapshot> {
        self.stack.current()
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &UndoConfig {
        &self.config
    }

    /// Drain all queued notifications, in emission order.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        self.pending.drain(..).collect()
    }

    // ========================================================================
    // Save / update
    // ========================================================================

    /// Capture and record a checkpoint.
    ///
    /// Returns `true` iff a new entry was pushed. See
    /// [`save_with`](Self::save_with) for the full rules.
    pub fn save(&mut self, host: &mut dyn EditorHost, content_only: bool) -> bool {
        self.save_with(host, content_only, None, true)
    }

    /// Record a checkpoint from `image`, or from a fresh capture when
    /// `image` is `None`.
    ///
    /// No-op while locked or when the host is not ready/editable. A capture
    /// that yields no content is discarded. Against the current entry:
    /// content-equal and (`content_only` or selection-equal) is a duplicate
    /// and is rejected; differing content emits
    /// [`Notification::ContentChanged`] first when `auto_notify` is set.
    /// After a push with `auto_notify`, undo/redo availability is recomputed
    /// from the stack neighbors and [`Notification::StateChanged`] goes out.
    pub fn save_with(
        &mut self,
        host: &mut dyn EditorHost,
        content_only: bool,
        image: Option<Snapshot>,
        auto_notify: bool,
    ) -> bool {
        if self.locked.is_some() || !host.is_ready() || !host.is_editable() {
            return false;
        }

        let image = match image {
            Some(image) => image,
            None => match self.capture(host, content_only) {
                Some(image) => image,
                None => return false,
            },
        };

        if let Some(current) = self.stack.current() {
            if image.equals_content(current) {
                if content_only {
                    return false;
                }
                if image.equals_selection(current) {
                    return false;
                }
            } else if auto_notify {
                self.pending.push_back(Notification::ContentChanged);
            }
        }

        self.stack.push(image);
        tracing::debug!(depth = self.stack.len(), content_only, "checkpoint recorded");

        if auto_notify {
            self.fire_change();
        }
        true
    }

    /// Fold the current host state into the tip entry.
    ///
    /// A run of selection-only variants of the same content collapses to one
    /// entry holding the newest selection. No-op while locked or when the
    /// stack is empty.
    pub fn update(&mut self, host: &mut dyn EditorHost) {
        self.update_with(host, None);
    }

    /// [`update`](Self::update) with an explicit replacement image.
    pub fn update_with(&mut self, host: &mut dyn EditorHost, image: Option<Snapshot>) {
        if self.locked.is_some() || self.stack.current().is_none() {
            return;
        }
        let image = match image {
            Some(image) => Some(image),
            None => self.capture(host, false),
        };
        let Some(image) = image else { return };

        let from = self.stack.run_start();
        self.stack.replace_range(from, image);
    }

    /// Replace the newest entry's selection with the host's current one,
    /// provided content did not change. Keeps caret moves out of the undo
    /// step count while preserving selection fidelity.
    pub fn amend_selection(&mut self, host: &mut dyn EditorHost) {
        if self.locked.is_some() || self.stack.is_empty() {
            return;
        }
        let Some(image) = self.capture(host, false) else {
            return;
        };
        let amend = match self.stack.last() {
            Some(last) => last.equals_content(&image) && !last.equals_selection(&image),
            None => false,
        };
        if amend {
            self.stack.amend_last(image);
        }
    }

    // ========================================================================
    // Traversal
    // ========================================================================

    /// Step backward to the nearest content-differing snapshot.
    ///
    /// Flushes any pending edit first so the current state becomes undoable
    /// too. Returns `false` when disabled, nothing to undo, or the restore
    /// failed.
    pub fn undo(&mut self, host: &mut dyn EditorHost) -> bool {
        if !self.can_undo() {
            return false;
        }
        self.save(host, true);
        let target = self
            .stack
            .neighbor(Direction::Backward)
            .map(|(index, entry)| (index, entry.clone()));
        match target {
            Some((index, snapshot)) => self.restore(host, index, &snapshot),
            None => false,
        }
    }

    /// Step forward to the nearest content-differing snapshot.
    ///
    /// Mirrors [`undo`](Self::undo), but re-checks availability after the
    /// flush: a divergent edit truncates the forward range, and redo must
    /// not cross that fresh branch.
    pub fn redo(&mut self, host: &mut dyn EditorHost) -> bool {
        if !self.can_redo() {
            return false;
        }
        self.save(host, true);
        if !self.can_redo() {
            return false;
        }
        let target = self
            .stack
            .neighbor(Direction::Forward)
            .map(|(index, entry)| (index, entry.clone()));
        match target {
            Some((index, snapshot)) => self.restore(host, index, &snapshot),
            None => false,
        }
    }

    fn restore(&mut self, host: &mut dyn EditorHost, index: usize, snapshot: &Snapshot) -> bool {
        // Transient lock: selection restoration side effects must not
        // mutate the stack mid-restore.
        self.locked = Some(LockToken::transient());
        let loaded = host.load_content(snapshot.content());
        let selected = match (&loaded, snapshot.selection()) {
            (Ok(()), Some(marks)) => host.load_selection(marks),
            _ => Ok(()),
        };
        self.locked = None;

        if let Err(error) = loaded {
            tracing::warn!(%error, "restore aborted: host refused content");
            return false;
        }
        if let Err(error) = selected {
            tracing::warn!(%error, "selection restore failed; host keeps its default caret");
        }

        self.stack.set_cursor(index);
        // The live document can drift from the stored snapshot while the
        // host re-applies selection; reconcile the entry with reality.
        self.update(host);
        self.fire_change();
        self.pending.push_back(Notification::ContentChanged);
        true
    }

    // ========================================================================
    // Lock regions
    // ========================================================================

    /// Open (or nest into) a do-not-record region.
    ///
    /// The outermost call fixes what happens at the matching release:
    /// `dont_update` remembers nothing; `force_update` always folds the
    /// unlock-time state into the tip; otherwise the tip is folded only if
    /// the pre-lock content matched it and then drifted during the lock.
    pub fn lock(&mut self, host: &mut dyn EditorHost, dont_update: bool, force_update: bool) {
        if let Some(token) = &mut self.locked {
            token.level += 1;
            return;
        }
        let pending = if dont_update {
            PendingUnlock::Skip
        } else if force_update {
            PendingUnlock::Always
        } else {
            // Content-only image: selection may be unreliable while the
            // host is about to mutate the document.
            let image = self.capture(host, true);
            match (image, self.stack.current()) {
                (Some(image), Some(current)) if current.equals_content(&image) => {
                    PendingUnlock::IfChanged(image)
                }
                _ => PendingUnlock::Skip,
            }
        };
        tracing::debug!(?pending, "undo manager locked");
        self.locked = Some(LockToken { level: 1, pending });
    }

    /// Release one nesting level; at level 0, resolve the remembered unlock
    /// action.
    pub fn unlock(&mut self, host: &mut dyn EditorHost) {
        let Some(mut token) = self.locked.take() else {
            return;
        };
        token.level -= 1;
        if token.level > 0 {
            self.locked = Some(token);
            return;
        }
        tracing::debug!("undo manager unlocked");
        match token.pending {
            PendingUnlock::Skip => {}
            PendingUnlock::Always => self.update(host),
            PendingUnlock::IfChanged(before) => {
                match self.capture(host, true) {
                    // Fold the drift introduced during the lock into the tip;
                    // an unchanged document needs nothing.
                    Some(now) if !now.equals_content(&before) => self.update(host),
                    _ => {}
                }
            }
        }
    }

    // ========================================================================
    // Input handling
    // ========================================================================

    /// Pre-event phase of an input notification.
    ///
    /// Key kinds capture the pre-event image (used to close a burst on a
    /// kind switch, and to detect functional keys that change nothing).
    /// Navigation with a pending run closes the burst here, before the
    /// caret moves.
    pub fn begin_input(&mut self, host: &mut dyn EditorHost, kind: InputKind) {
        match kind {
            InputKind::Character | InputKind::Functional | InputKind::Navigation => {
                self.last_keydown = self.capture(host, false);
                if kind == InputKind::Navigation && self.coalescer.has_pending_run() {
                    self.save(host, false);
                    self.coalescer.reset();
                }
            }
            _ => {}
        }
    }

    /// Post-event phase of an input notification, after the host applied
    /// the event's effect.
    pub fn finish_input(&mut self, host: &mut dyn EditorHost, kind: InputKind) {
        match kind {
            InputKind::Character => self.record_stroke(host, KeyClass::Character),
            InputKind::Functional => self.record_stroke(host, KeyClass::Functional),
            InputKind::Navigation => self.amend_selection(host),
            InputKind::Click => {
                self.save_with(host, true, None, false);
                self.coalescer.reset();
            }
            InputKind::Paste | InputKind::Drop => {
                // Checkpointing for these arrives through the command path;
                // only the cheap signal goes out here.
                self.pending.push_back(Notification::ContentChanged);
            }
            InputKind::Command => {
                self.save(host, false);
            }
        }
    }

    fn record_stroke(&mut self, host: &mut dyn EditorHost, class: KeyClass) {
        // A functional key that provably changed nothing records nothing.
        if class == KeyClass::Functional && self.stroke_changed_nothing(host) {
            return;
        }
        if !self.coalescer.is_typing() {
            self.on_typing_start();
        }
        match self.coalescer.record_stroke(class) {
            StrokeDecision::KindSwitch => {
                tracing::debug!("stroke class switched; closing burst with pre-event image");
                let image = self.last_keydown.clone();
                if !self.save_with(host, false, image, false) {
                    self.stack.truncate_forward();
                }
            }
            StrokeDecision::RunExceeded => {
                tracing::debug!(
                    threshold = self.config.stroke_threshold,
                    "stroke run exceeded; checkpointing"
                );
                self.save(host, false);
                self.coalescer.set_typing(true);
            }
            StrokeDecision::Accumulate => {}
        }
        self.pending.push_back(Notification::ContentChanged);
    }

    fn stroke_changed_nothing(&self, host: &dyn EditorHost) -> bool {
        match (&self.last_keydown, host.capture_content()) {
            (Some(before), Some(now)) => before.content() == now,
            _ => false,
        }
    }

    fn on_typing_start(&mut self) {
        self.coalescer.set_typing(true);
        self.has_undo = true;
        self.has_redo = false;
        self.notify_state();
    }

    // ========================================================================
    // Aggregated typing path
    // ========================================================================

    /// Feed one aggregated typing notification (hosts that cannot report
    /// individual strokes).
    ///
    /// When a burst begins, returns a [`TypingBurst`] holding the before
    /// image; the host's scheduler must pass it to
    /// [`complete_typing_burst`](Self::complete_typing_burst) once the edit
    /// has been applied. Threshold overruns checkpoint immediately.
    pub fn record_typing(
        &mut self,
        host: &mut dyn EditorHost,
        keystroke: u32,
        is_character: bool,
    ) -> Option<TypingBurst> {
        let decision = self.coalescer.record_typing(keystroke, is_character);
        let burst = if decision.begin_burst {
            self.capture(host, false).map(|before| TypingBurst {
                before,
                generation: self.stack.generation(),
            })
        } else {
            None
        };
        if decision.checkpoint {
            self.save_with(host, false, None, false);
        } else {
            self.pending.push_back(Notification::ContentChanged);
        }
        burst
    }

    /// Resolve a deferred typing-burst comparison.
    ///
    /// A burst whose generation no longer matches the stack is stale (some
    /// other checkpoint landed first) and is dropped. Otherwise the before
    /// image is recorded as a checkpoint iff the content actually changed.
    pub fn complete_typing_burst(
        &mut self,
        host: &mut dyn EditorHost,
        burst: TypingBurst,
    ) -> bool {
        if burst.generation != self.stack.generation() {
            tracing::debug!(
                scheduled = burst.generation,
                current = self.stack.generation(),
                "typing burst went stale; dropping"
            );
            return false;
        }
        let Some(now) = host.capture_content() else {
            return false;
        };
        if burst.before.content() == now {
            return false;
        }

        self.coalescer.set_typing(true);
        if !self.save_with(host, false, Some(burst.before), false) {
            self.stack.truncate_forward();
        }
        self.has_undo = true;
        self.has_redo = false;
        self.coalescer.reset_after_burst();
        self.notify_state();
        true
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Clear the stack, counters, flags, and any lock.
    pub fn reset(&mut self) {
        self.stack.reset();
        self.coalescer.reset();
        self.locked = None;
        self.has_undo = false;
        self.has_redo = false;
        self.last_keydown = None;
    }

    /// Gate the manager on the host's mode (read-only or non-editable modes
    /// disable undo/redo without dropping history).
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.notify_state();
    }

    // ========================================================================
    // Internal
    // ========================================================================

    fn capture(&mut self, host: &dyn EditorHost, content_only: bool) -> Option<Snapshot> {
        self.pending.push_back(Notification::BeforeSnapshot);
        let snapshot = Snapshot::capture(host, content_only);
        self.pending.push_back(Notification::AfterSnapshot);
        snapshot
    }

    fn fire_change(&mut self) {
        self.has_undo = self.stack.neighbor(Direction::Backward).is_some();
        self.has_redo = self.stack.neighbor(Direction::Forward).is_some();
        self.coalescer.reset();
        self.notify_state();
    }

    fn notify_state(&mut self) {
        let notification = Notification::StateChanged {
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
        };
        self.pending.push_back(notification);
    }
}

// ============================================================================
// Tests
// ============================================================================
