use base64::{Engine as _, engine::general_purpose};
use std::io::{self, Write};
use std::time::{Duration, Instant};

/// How long the "Copied!" marker stays up.
pub const COPIED_FEEDBACK: Duration = Duration::from_secs(2);

/// OSC 52 escape that asks the terminal to put `text` on the system
/// clipboard. Works over SSH and inside tmux with `set-clipboard on`.
pub fn osc52_sequence(text: &str) -> String {
    format!("\x1b]52;c;{}\x07", general_purpose::STANDARD.encode(text))
}

pub fn copy_to_clipboard(out: &mut impl Write, text: &str) -> io::Result<()> {
    out.write_all(osc52_sequence(text).as_bytes())?;
    out.flush()
}

/// Remembers what was copied last and when.
#[derive(Debug, Default)]
pub struct CopyFeedback {
    copied: Option<(String, Instant)>,
}

impl CopyFeedback {
    pub fn mark(&mut self, text: &str) {
        self.copied = Some((text.to_string(), Instant::now()));
    }

    pub fn is_copied(&self, text: &str) -> bool {
        self.is_copied_at(text, Instant::now())
    }

    fn is_copied_at(&self, text: &str, now: Instant) -> bool {
        match &self.copied {
            Some((copied, at)) => copied == text && now.duration_since(*at) < COPIED_FEEDBACK,
            None => false,
        }
    }

    pub fn clear_expired(&mut self) {
        let now = Instant::now();
        if let Some((_, at)) = &self.copied {
            if now.duration_since(*at) >= COPIED_FEEDBACK {
                self.copied = None;
            }
        }
    }
}
