//! Terminal styling for publish output
//!
//! Text is styled by the role it plays ([`Tone`]) through the [`Stylize`]
//! extension trait; node statuses get a symbol through [`status_marker`].
//! Whether color is emitted (`NO_COLOR`, `CLICOLOR_FORCE`, TTY) is decided
//! by `owo-colors` against the stream the text is written to.

use indicatif::ProgressStyle;
pub use owo_colors::Stream;
use owo_colors::{OwoColorize, Style};
use pubflow::types::Status;
use std::fmt::{self, Display};
use std::sync::OnceLock;

/// Role a piece of output plays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Item names, counts, paths (cyan)
    Accent,
    /// Passed nodes, finished runs (green)
    Success,
    /// Failed nodes and run errors (red, stderr)
    Error,
    /// Warnings and cancellation (yellow, stderr)
    Warn,
    /// Hints and secondary detail (dim)
    Muted,
    /// Headers and the current phase (bold)
    Emphasis,
}

impl Tone {
    const fn style(self) -> Style {
        match self {
            Self::Accent => Style::new().cyan(),
            Self::Success => Style::new().green(),
            Self::Error => Style::new().red(),
            Self::Warn => Style::new().yellow(),
            Self::Muted => Style::new().dimmed(),
            Self::Emphasis => Style::new().bold(),
        }
    }

    const fn stream(self) -> Stream {
        match self {
            Self::Error | Self::Warn => Stream::Stderr,
            _ => Stream::Stdout,
        }
    }
}

/// A value rendered in a [`Tone`]
#[derive(Clone, Debug)]
pub struct Styled<T> {
    value: T,
    tone: Tone,
    stream: Stream,
}

impl<T> Styled<T> {
    const fn new(value: T, tone: Tone) -> Self {
        Self {
            value,
            tone,
            stream: tone.stream(),
        }
    }

    /// Check color support against stderr instead
    #[must_use]
    pub const fn for_stderr(mut self) -> Self {
        self.stream = Stream::Stderr;
        self
    }
}

impl<T: Display> Display for Styled<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let style = self.tone.style();
        write!(
            f,
            "{}",
            self.value.if_supports_color(self.stream, |v| v.style(style))
        )
    }
}

/// Tone helpers for anything printable
pub trait Stylize: Display {
    /// Render in `tone`
    fn tone(&self, tone: Tone) -> Styled<&Self> {
        Styled::new(self, tone)
    }

    /// Item names, counts, paths
    fn accent(&self) -> Styled<&Self> {
        self.tone(Tone::Accent)
    }

    /// Passed nodes, finished runs
    fn success(&self) -> Styled<&Self> {
        self.tone(Tone::Success)
    }

    /// Failure text; checked against stderr
    fn error(&self) -> Styled<&Self> {
        self.tone(Tone::Error)
    }

    /// Warning text; checked against stderr
    fn warn(&self) -> Styled<&Self> {
        self.tone(Tone::Warn)
    }

    /// Hints and secondary detail
    fn muted(&self) -> Styled<&Self> {
        self.tone(Tone::Muted)
    }

    /// Headers
    fn emphasis(&self) -> Styled<&Self> {
        self.tone(Tone::Emphasis)
    }
}

impl<T: Display + ?Sized> Stylize for T {}

/// Symbol and tone for a node status
pub const fn status_marker(status: Status) -> Styled<&'static str> {
    match status {
        Status::Ready => Styled::new("·", Tone::Muted),
        Status::ValidatedStandalone | Status::Validated | Status::Finalized => {
            Styled::new("✓", Tone::Success)
        }
        Status::Published => Styled::new("↑", Tone::Accent),
        Status::ValidationError | Status::PublishError => Styled::new("✗", Tone::Error),
        Status::FinalizeError => Styled::new("!", Tone::Warn),
    }
}

/// Green check
pub const fn check() -> Styled<&'static str> {
    Styled::new("✓", Tone::Success)
}

/// Red cross
pub const fn cross() -> Styled<&'static str> {
    Styled::new("✗", Tone::Error)
}

/// Context header marker
pub const fn arrow() -> Styled<&'static str> {
    Styled::new("→", Tone::Accent)
}

/// List marker
pub const fn bullet() -> Styled<&'static str> {
    Styled::new("○", Tone::Muted)
}

/// Warning marker
pub const fn bang() -> Styled<&'static str> {
    Styled::new("!", Tone::Warn)
}

/// Per-phase bar: verb, bar, position and the node being processed
pub fn bar_style() -> ProgressStyle {
    static STYLE: OnceLock<ProgressStyle> = OnceLock::new();
    STYLE
        .get_or_init(|| {
            ProgressStyle::default_bar()
                .template("{prefix:>12.bold} {bar:30.cyan/blue} {pos}/{len} {wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> ")
        })
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_tones_check_stderr() {
        assert!(matches!(Tone::Error.stream(), Stream::Stderr));
        assert!(matches!(Tone::Warn.stream(), Stream::Stderr));
        assert!(matches!(Tone::Accent.stream(), Stream::Stdout));
        assert!(matches!("x".accent().for_stderr().stream, Stream::Stderr));
    }

    #[test]
    fn test_status_markers() {
        assert_eq!(status_marker(Status::Validated).tone, Tone::Success);
        assert_eq!(status_marker(Status::PublishError).tone, Tone::Error);
        assert_eq!(status_marker(Status::FinalizeError).value, "!");
    }
}
