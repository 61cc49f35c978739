//! Copy-to-clipboard affordances for rendered code blocks.
//!
//! Each closed code block in the latest bot message gets a numbered copy
//! trigger. A successful copy flips that trigger's label to "Copied!" for
//! two seconds (four UI ticks) before reverting. Clipboard failures go to
//! the log only; they never disturb the UI.

use std::collections::HashMap;

use tracing::warn;

/// Ticks the "Copied!" label stays up: 4 × 500 ms.
pub const FEEDBACK_TICKS: u8 = 4;

pub struct CopyButtons {
    clipboard: Option<arboard::Clipboard>,
    feedback: HashMap<usize, u8>,
}

impl CopyButtons {
    pub fn new() -> Self {
        let clipboard = match arboard::Clipboard::new() {
            Ok(clipboard) => Some(clipboard),
            Err(e) => {
                warn!("clipboard unavailable: {e}");
                None
            }
        };
        Self {
            clipboard,
            feedback: HashMap::new(),
        }
    }

    /// Copy `text` for the block at `index`. Failures are logged only.
    pub fn copy(&mut self, index: usize, text: &str) {
        let Some(clipboard) = self.clipboard.as_mut() else {
            warn!("copy ignored: clipboard unavailable");
            return;
        };
        match clipboard.set_text(text.to_string()) {
            Ok(()) => self.show_feedback(index),
            Err(e) => warn!("clipboard copy failed: {e}"),
        }
    }

    pub(crate) fn show_feedback(&mut self, index: usize) {
        self.feedback.insert(index, FEEDBACK_TICKS);
    }

    /// Label for the block at `index`, reflecting transient feedback.
    pub fn label(&self, index: usize) -> &'static str {
        if self.feedback.contains_key(&index) {
            "Copied!"
        } else {
            "copy"
        }
    }

    /// Advance feedback timers by one UI tick.
    pub fn tick(&mut self) {
        self.feedback.retain(|_, ticks| {
            *ticks = ticks.saturating_sub(1);
            *ticks > 0
        });
    }

    /// Drop all feedback, e.g. when a new message replaces the blocks.
    pub fn clear(&mut self) {
        self.feedback.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn without_clipboard() -> CopyButtons {
        CopyButtons {
            clipboard: None,
            feedback: HashMap::new(),
        }
    }

    #[test]
    fn copy_without_clipboard_does_not_panic_or_show_feedback() {
        let mut buttons = without_clipboard();
        buttons.copy(0, "fn main() {}");
        assert_eq!(buttons.label(0), "copy");
    }

    #[test]
    fn feedback_reverts_after_its_ticks_elapse() {
        let mut buttons = without_clipboard();
        buttons.show_feedback(1);
        assert_eq!(buttons.label(1), "Copied!");
        assert_eq!(buttons.label(0), "copy");

        for _ in 0..FEEDBACK_TICKS - 1 {
            buttons.tick();
            assert_eq!(buttons.label(1), "Copied!");
        }
        buttons.tick();
        assert_eq!(buttons.label(1), "copy");
    }

    #[test]
    fn repeated_copy_restarts_the_timer() {
        let mut buttons = without_clipboard();
        buttons.show_feedback(0);
        for _ in 0..FEEDBACK_TICKS - 1 {
            buttons.tick();
        }
        buttons.show_feedback(0);
        buttons.tick();
        assert_eq!(buttons.label(0), "Copied!");
    }

    #[test]
    fn clear_drops_all_feedback() {
        let mut buttons = without_clipboard();
        buttons.show_feedback(0);
        buttons.show_feedback(3);
        buttons.clear();
        assert_eq!(buttons.label(0), "copy");
        assert_eq!(buttons.label(3), "copy");
    }
}
