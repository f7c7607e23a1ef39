#![forbid(unsafe_code)]

//! Test support: a scriptable in-memory host.
//!
//! [`MockEditor`] stands in for a real editor surface in unit and
//! integration tests. It is not part of the editor integration surface;
//! downstream crates writing their own engine tests may use it too.

use crate::host::{EditorHost, HostError, HostResult};
use crate::snapshot::SelectionMark;

/// Scriptable in-memory [`EditorHost`].
#[derive(Debug)]
pub struct MockEditor {
    content: String,
    selection: Option<Vec<SelectionMark>>,
    ready: bool,
    editable: bool,
    fail_capture: bool,
    reject_loads: bool,
    loads: Vec<String>,
}

impl MockEditor {
    /// A ready, editable host holding `content`.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            selection: None,
            ready: true,
            editable: true,
            fail_capture: false,
            reject_loads: false,
            loads: Vec::new(),
        }
    }

    /// Current document content.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Replace the document content (simulates an edit the engine did not
    /// see).
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    /// Append text (simulates applying a typed character or paste).
    pub fn type_text(&mut self, text: &str) {
        self.content.push_str(text);
    }

    /// Remove the last character (simulates a backspace).
    pub fn backspace(&mut self) {
        self.content.pop();
    }

    /// Place a collapsed caret at `offset`.
    pub fn set_caret(&mut self, offset: usize) {
        self.selection = Some(vec![SelectionMark::caret(offset, vec![0])]);
    }

    /// Install explicit selection marks.
    pub fn set_selection(&mut self, marks: Vec<SelectionMark>) {
        self.selection = Some(marks);
    }

    /// Drop the selection entirely.
    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Toggle surface readiness.
    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    /// Toggle editable mode.
    pub fn set_editable(&mut self, editable: bool) {
        self.editable = editable;
    }

    /// Make content capture fail (host "not ready to serialize").
    pub fn set_fail_capture(&mut self, fail: bool) {
        self.fail_capture = fail;
    }

    /// Make load operations fail.
    pub fn set_reject_loads(&mut self, reject: bool) {
        self.reject_loads = reject;
    }

    /// Every content string loaded into this host, oldest first.
    #[must_use]
    pub fn loads(&self) -> &[String] {
        &self.loads
    }
}

impl EditorHost for MockEditor {
    fn capture_content(&self) -> Option<String> {
        if self.fail_capture || !self.ready {
            None
        } else {
            Some(self.content.clone())
        }
    }

    fn capture_selection(&self) -> Option<Vec<SelectionMark>> {
        self.selection.clone()
    }

    fn load_content(&mut self, content: &str) -> HostResult {
        if self.reject_loads {
            return Err(HostError::NotReady);
        }
        self.content = content.to_string();
        self.loads.push(content.to_string());
        Ok(())
    }

    fn load_selection(&mut self, marks: &[SelectionMark]) -> HostResult {
        if self.reject_loads {
            return Err(HostError::InvalidSelection);
        }
        self.selection = Some(marks.to_vec());
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn is_editable(&self) -> bool {
        self.editable
    }
}
