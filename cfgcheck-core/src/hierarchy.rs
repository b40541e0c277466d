//! Indentation-based nesting tracker.
//!
//! A `HierarchyTracker` follows one configuration file from top to bottom and
//! keeps a stack of open contexts. A line indented deeper than the current
//! nesting width opens a context named after the previous line; a shallower
//! line closes every context deeper than itself; an unindented line closes
//! everything. One tracker serves exactly one file.

use log::debug;

use crate::errors::AuditIssue;

/// An open context: the line that introduced it and the width of its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndentationFrame {
    pub context_line: String,
    pub indent_width: usize,
}

#[derive(Debug, Default)]
pub struct HierarchyTracker {
    source_id: String,
    frames: Vec<IndentationFrame>,
    current_width: usize,
    previous_line: String,
}

/// Counts leading whitespace characters.
pub fn indent_width(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

impl HierarchyTracker {
    pub fn new(source_id: impl Into<String>) -> Self {
        Self { source_id: source_id.into(), ..Default::default() }
    }

    /// Updates the stack for the indentation of `raw_line`.
    ///
    /// Must be called before the line's signature is built. Returns a
    /// structural warning when a dedent closes every open context while the
    /// line is still indented; parsing goes on with an empty parent chain.
    pub fn advance(&mut self, raw_line: &str, line_number: usize) -> Option<AuditIssue> {
        let width = indent_width(raw_line);

        if width == 0 {
            self.frames.clear();
            self.current_width = 0;
            return None;
        }

        if width > self.current_width {
            self.frames.push(IndentationFrame {
                context_line: self.previous_line.trim().to_string(),
                indent_width: width,
            });
            self.current_width = width;
            return None;
        }

        if width < self.current_width {
            while self.frames.last().is_some_and(|top| top.indent_width > width) {
                if let Some(frame) = self.frames.pop() {
                    debug!("{}: closing context '{}'", self.source_id, frame.context_line);
                }
            }
            self.current_width = width;
            if self.frames.is_empty() {
                return Some(
                    AuditIssue::StructuralWarning {
                        source_id: self.source_id.clone(),
                        line_number,
                        line: raw_line.trim().to_string(),
                        width,
                    }
                    .reported(),
                );
            }
        }
        None
    }

    /// Records the text a following, deeper line would use as its context.
    pub fn set_previous(&mut self, line: &str) {
        self.previous_line.clear();
        self.previous_line.push_str(line);
    }

    /// Ancestors of the current line, top level first.
    pub fn parent_chain(&self) -> Vec<String> {
        self.frames.iter().map(|f| f.context_line.clone()).collect()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn frames(&self) -> &[IndentationFrame] {
        &self.frames
    }
}
