#![forbid(unsafe_code)]

//! Input coalescing: deciding when a run of keystrokes becomes a
//! checkpoint.
//!
//! Rapid low-level input (character typing, delete/backspace bursts) must
//! not produce one undo step per keystroke. The [`Coalescer`] tracks run
//! lengths per stroke class and tells the manager when a burst should close:
//!
//! - **Kind switch** — the stroke class changed (typing → deleting or the
//!   reverse); the open burst closes with the pre-event image.
//! - **Run exceeded** — the same class repeated up to the threshold; the
//!   burst closes with a fresh capture.
//! - **Accumulate** — keep counting; only a cheap "content possibly
//!   changed" signal goes out.
//!
//! Two paths exist with different thresholds: the raw-key path (default 5)
//! for hosts that report individual strokes, and the aggregated typing path
//! (default 25) for hosts that can only report "a character was typed".
//! Counters reset to 0 after an explicit re-save and to 1 after a kind
//! switch, so the stroke that triggered the switch counts as the first of
//! the new run.

/// Classification tag the host attaches to each input notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// A printable character key.
    Character,
    /// Delete or backspace.
    Functional,
    /// Caret movement (arrows, home/end, page up/down).
    Navigation,
    /// Pointer click inside the editable area.
    Click,
    /// Clipboard paste.
    Paste,
    /// Drag-and-drop into the document.
    Drop,
    /// An editor command that records its own checkpoint.
    Command,
}

impl InputKind {
    /// The stroke class this kind feeds, if any.
    #[must_use]
    pub fn class(self) -> Option<KeyClass> {
        match self {
            InputKind::Character => Some(KeyClass::Character),
            InputKind::Functional => Some(KeyClass::Functional),
            _ => None,
        }
    }
}

/// The two stroke classes tracked by the raw-key path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyClass {
    /// Content-producing keys.
    Character,
    /// Content-removing keys (delete/backspace).
    Functional,
}

impl KeyClass {
    fn index(self) -> usize {
        match self {
            KeyClass::Character => 0,
            KeyClass::Functional => 1,
        }
    }

    fn other(self) -> Self {
        match self {
            KeyClass::Character => KeyClass::Functional,
            KeyClass::Functional => KeyClass::Character,
        }
    }
}

/// Outcome of feeding one raw stroke to the coalescer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeDecision {
    /// The stroke class changed: close the burst with the pre-event image.
    KindSwitch,
    /// The run hit the threshold: checkpoint with a fresh capture.
    RunExceeded,
    /// Keep accumulating.
    Accumulate,
}

/// Outcome of feeding one aggregated typing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypingDecision {
    /// A typing burst starts here: capture a before-image and schedule the
    /// deferred comparison.
    pub begin_burst: bool,
    /// The accumulation counter ran over: checkpoint now.
    pub checkpoint: bool,
}

/// Run-length state for both coalescing paths.
#[derive(Debug)]
pub struct Coalescer {
    /// Consecutive strokes per class since the last checkpoint
    /// (index 0 = character, 1 = functional).
    strokes: [u32; 2],
    last_class: Option<KeyClass>,
    types_count: u32,
    modifiers_count: u32,
    last_keystroke: Option<u32>,
    was_character: bool,
    typing: bool,
    stroke_threshold: u32,
    typing_threshold: u32,
}

impl Coalescer {
    /// Create a coalescer with the given per-path thresholds.
    #[must_use]
    pub fn new(stroke_threshold: u32, typing_threshold: u32) -> Self {
        Self {
            strokes: [0, 0],
            last_class: None,
            types_count: 0,
            modifiers_count: 0,
            last_keystroke: None,
            was_character: false,
            typing: false,
            stroke_threshold,
            typing_threshold,
        }
    }

    // ========================================================================
    // Raw-key path
    // ========================================================================

    /// Feed one raw stroke of `class`.
    pub fn record_stroke(&mut self, class: KeyClass) -> StrokeDecision {
        let run = self.strokes[class.index()] + 1;
        let switched = self.last_class.is_some_and(|last| last != class);
        self.last_class = Some(class);

        if switched {
            self.strokes[class.other().index()] = 0;
            self.strokes[class.index()] = 1;
            return StrokeDecision::KindSwitch;
        }
        if run >= self.stroke_threshold {
            self.strokes[class.index()] = 0;
            return StrokeDecision::RunExceeded;
        }
        self.strokes[class.index()] = run;
        StrokeDecision::Accumulate
    }

    /// Whether either raw run counter is non-zero (navigation closes such a
    /// burst).
    #[must_use]
    pub fn has_pending_run(&self) -> bool {
        self.strokes[0] > 0 || self.strokes[1] > 0
    }

    // ========================================================================
    // Aggregated typing path
    // ========================================================================

    /// Feed one aggregated typing notification.
    ///
    /// `keystroke` is the host's opaque key identifier; it only matters for
    /// telling consecutive distinct functional keys apart.
    pub fn record_typing(&mut self, keystroke: u32, is_character: bool) -> TypingDecision {
        let modifier_snapshot = !is_character && self.last_keystroke != Some(keystroke);
        let started_typing = !self.typing || (is_character && !self.was_character);
        let begin_burst = started_typing || modifier_snapshot;

        self.last_keystroke = Some(keystroke);
        self.was_character = is_character;

        let checkpoint = if is_character {
            self.modifiers_count = 0;
            self.types_count += 1;
            if self.types_count > self.typing_threshold {
                self.types_count = 1;
                true
            } else {
                false
            }
        } else {
            self.types_count = 0;
            self.modifiers_count += 1;
            if self.modifiers_count > self.typing_threshold {
                self.modifiers_count = 1;
                true
            } else {
                false
            }
        };

        TypingDecision {
            begin_burst,
            checkpoint,
        }
    }

    // ========================================================================
    // State
    // ========================================================================

    /// Whether a typing burst is open.
    #[must_use]
    pub fn is_typing(&self) -> bool {
        self.typing
    }

    /// Force the typing flag (a checkpoint taken mid-burst resets state but
    /// the burst continues).
    pub fn set_typing(&mut self, typing: bool) {
        self.typing = typing;
    }

    /// Run length recorded for `class`.
    #[must_use]
    pub fn stroke_run(&self, class: KeyClass) -> u32 {
        self.strokes[class.index()]
    }

    /// Aggregated character count.
    #[must_use]
    pub fn types_count(&self) -> u32 {
        self.types_count
    }

    /// Aggregated functional-key count.
    #[must_use]
    pub fn modifiers_count(&self) -> u32 {
        self.modifiers_count
    }

    /// Reset all typing state: counters, class markers, the typing flag.
    pub fn reset(&mut self) {
        self.strokes = [0, 0];
        self.last_class = None;
        self.types_count = 0;
        self.modifiers_count = 0;
        self.last_keystroke = None;
        self.typing = false;
    }

    /// Restart the aggregated counters after a deferred burst checkpoint;
    /// the burst's own stroke counts as the first of the new run.
    pub fn reset_after_burst(&mut self) {
        self.types_count = 1;
        self.modifiers_count = 1;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn coalescer() -> Coalescer {
        Coalescer::new(5, 25)
    }

    #[test]
    fn first_stroke_accumulates() {
        let mut c = coalescer();
        assert_eq!(
            c.record_stroke(KeyClass::Character),
            StrokeDecision::Accumulate
        );
        assert_eq!(c.stroke_run(KeyClass::Character), 1);
    }

    #[test]
    fn run_of_six_checkpoints_at_five() {
        let mut c = coalescer();
        let decisions: Vec<_> = (0..6).map(|_| c.record_stroke(KeyClass::Character)).collect();
        assert_eq!(
            decisions,
            vec![
                StrokeDecision::Accumulate,
                StrokeDecision::Accumulate,
                StrokeDecision::Accumulate,
                StrokeDecision::Accumulate,
                StrokeDecision::RunExceeded,
                StrokeDecision::Accumulate,
            ]
        );
        // The sixth stroke starts a fresh run of 1.
        assert_eq!(c.stroke_run(KeyClass::Character), 1);
    }

    #[test]
    fn kind_switch_emits_before_counting() {
        let mut c = coalescer();
        c.record_stroke(KeyClass::Character);
        c.record_stroke(KeyClass::Character);
        assert_eq!(
            c.record_stroke(KeyClass::Functional),
            StrokeDecision::KindSwitch
        );
        assert_eq!(c.stroke_run(KeyClass::Character), 0);
        assert_eq!(c.stroke_run(KeyClass::Functional), 1);
    }

    #[test]
    fn switch_back_and_forth_keeps_runs_at_one() {
        let mut c = coalescer();
        c.record_stroke(KeyClass::Character);
        assert_eq!(
            c.record_stroke(KeyClass::Functional),
            StrokeDecision::KindSwitch
        );
        assert_eq!(
            c.record_stroke(KeyClass::Character),
            StrokeDecision::KindSwitch
        );
        assert_eq!(c.stroke_run(KeyClass::Character), 1);
        assert_eq!(c.stroke_run(KeyClass::Functional), 0);
    }

    #[test]
    fn threshold_applies_per_class() {
        let mut c = coalescer();
        for _ in 0..4 {
            assert_eq!(
                c.record_stroke(KeyClass::Functional),
                StrokeDecision::Accumulate
            );
        }
        assert_eq!(
            c.record_stroke(KeyClass::Functional),
            StrokeDecision::RunExceeded
        );
        assert_eq!(c.stroke_run(KeyClass::Functional), 0);
    }

    #[test]
    fn pending_run_reported() {
        let mut c = coalescer();
        assert!(!c.has_pending_run());
        c.record_stroke(KeyClass::Character);
        assert!(c.has_pending_run());
        c.reset();
        assert!(!c.has_pending_run());
    }

    #[test]
    fn reset_clears_class_marker() {
        let mut c = coalescer();
        c.record_stroke(KeyClass::Character);
        c.reset();
        // No kind switch after a reset; the marker is gone.
        assert_eq!(
            c.record_stroke(KeyClass::Functional),
            StrokeDecision::Accumulate
        );
    }

    #[test]
    fn typing_flag_roundtrip() {
        let mut c = coalescer();
        assert!(!c.is_typing());
        c.set_typing(true);
        assert!(c.is_typing());
        c.reset();
        assert!(!c.is_typing());
    }

    #[test]
    fn first_character_begins_burst() {
        let mut c = coalescer();
        let d = c.record_typing(65, true);
        assert!(d.begin_burst);
        assert!(!d.checkpoint);
    }

    #[test]
    fn continued_typing_does_not_begin_burst() {
        let mut c = coalescer();
        c.set_typing(true);
        c.record_typing(65, true);
        let d = c.record_typing(66, true);
        assert!(!d.begin_burst);
    }

    #[test]
    fn character_after_functional_begins_burst() {
        let mut c = coalescer();
        c.set_typing(true);
        c.record_typing(8, false);
        let d = c.record_typing(65, true);
        assert!(d.begin_burst);
    }

    #[test]
    fn distinct_functional_keystroke_begins_burst() {
        let mut c = coalescer();
        c.set_typing(true);
        c.record_typing(8, false);
        let same = c.record_typing(8, false);
        assert!(!same.begin_burst);
        let other = c.record_typing(46, false);
        assert!(other.begin_burst);
    }

    #[test]
    fn aggregated_characters_checkpoint_past_threshold() {
        let mut c = Coalescer::new(5, 25);
        c.set_typing(true);
        c.record_typing(65, true);
        for _ in 0..24 {
            let d = c.record_typing(65, true);
            assert!(!d.checkpoint);
        }
        // 26th accumulated character runs the counter over.
        let d = c.record_typing(65, true);
        assert!(d.checkpoint);
        assert_eq!(c.types_count(), 1);
    }

    #[test]
    fn character_resets_modifier_count_and_vice_versa() {
        let mut c = coalescer();
        c.record_typing(8, false);
        c.record_typing(8, false);
        assert_eq!(c.modifiers_count(), 2);
        c.record_typing(65, true);
        assert_eq!(c.modifiers_count(), 0);
        assert_eq!(c.types_count(), 1);
        c.record_typing(8, false);
        assert_eq!(c.types_count(), 0);
    }

    #[test]
    fn reset_after_burst_restarts_counts() {
        let mut c = coalescer();
        for _ in 0..10 {
            c.record_typing(65, true);
        }
        c.reset_after_burst();
        assert_eq!(c.types_count(), 1);
        assert_eq!(c.modifiers_count(), 1);
    }

    #[test]
    fn input_kind_classes() {
        assert_eq!(InputKind::Character.class(), Some(KeyClass::Character));
        assert_eq!(InputKind::Functional.class(), Some(KeyClass::Functional));
        assert_eq!(InputKind::Navigation.class(), None);
        assert_eq!(InputKind::Click.class(), None);
        assert_eq!(InputKind::Paste.class(), None);
        assert_eq!(InputKind::Drop.class(), None);
        assert_eq!(InputKind::Command.class(), None);
    }
}
