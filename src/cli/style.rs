//! Terminal styling for command output
//!
//! Every piece of colored output has a [`Role`]; the role picks the color and
//! the stream whose color support is checked. `owo-colors` makes the final
//! call (`NO_COLOR`, `CLICOLOR`, `CLICOLOR_FORCE`, TTY detection).

use indicatif::{ProgressBar, ProgressStyle};
use std::fmt::{self, Display};
use std::sync::OnceLock;
use std::time::Duration;

pub use owo_colors::Stream;
use owo_colors::{OwoColorize, Style};

/// What a piece of output means
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// Project paths, merge request references, tag names
    Accent,
    /// Completed work
    Success,
    /// Failures
    Error,
    /// Dry-run and attention notices
    Warn,
    /// URLs, dates, hints
    Muted,
    /// Headers
    Emphasis,
}

impl Role {
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

    /// Failures and notices go to stderr, everything else to stdout
    const fn stream(self) -> Stream {
        match self {
            Self::Error | Self::Warn => Stream::Stderr,
            _ => Stream::Stdout,
        }
    }
}

/// A printable value tagged with its role
#[derive(Clone, Debug)]
pub struct Styled<T> {
    value: T,
    role: Role,
    stream: Stream,
}

impl<T> Styled<T> {
    const fn new(value: T, role: Role) -> Self {
        Self {
            value,
            role,
            stream: role.stream(),
        }
    }

    /// Check color support on stderr
    #[must_use]
    pub const fn for_stderr(mut self) -> Self {
        self.stream = Stream::Stderr;
        self
    }

    /// Check color support on stdout
    #[must_use]
    pub const fn for_stdout(mut self) -> Self {
        self.stream = Stream::Stdout;
        self
    }
}

impl<T: Display> Display for Styled<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let style = self.role.style();
        Display::fmt(
            &self.value.if_supports_color(self.stream, |v| v.style(style)),
            f,
        )
    }
}

/// Role shorthands for anything printable
pub trait Stylize: Display {
    /// Tag with an arbitrary role
    fn role(&self, role: Role) -> Styled<&Self> {
        Styled::new(self, role)
    }

    fn accent(&self) -> Styled<&Self> {
        self.role(Role::Accent)
    }

    fn success(&self) -> Styled<&Self> {
        self.role(Role::Success)
    }

    fn error(&self) -> Styled<&Self> {
        self.role(Role::Error)
    }

    fn warn(&self) -> Styled<&Self> {
        self.role(Role::Warn)
    }

    fn muted(&self) -> Styled<&Self> {
        self.role(Role::Muted)
    }

    fn emphasis(&self) -> Styled<&Self> {
        self.role(Role::Emphasis)
    }
}

impl<T: Display + ?Sized> Stylize for T {}

/// Done
pub const fn check() -> Styled<&'static str> {
    Styled::new("✓", Role::Success)
}

/// Failed (stderr)
pub const fn cross() -> Styled<&'static str> {
    Styled::new("✗", Role::Error)
}

/// A write that was performed or would be
pub const fn arrow() -> Styled<&'static str> {
    Styled::new("→", Role::Accent)
}

/// List item
pub const fn bullet() -> Styled<&'static str> {
    Styled::new("○", Role::Muted)
}

/// A URL, clickable (OSC 8) when the terminal behind `stream` supports it
pub fn hyperlink_url(stream: Stream, url: &str) -> String {
    let target = match stream {
        Stream::Stdout => supports_hyperlinks::Stream::Stdout,
        Stream::Stderr => supports_hyperlinks::Stream::Stderr,
    };
    if supports_hyperlinks::on(target) {
        terminal_link::Link::new(url, url).to_string()
    } else {
        url.to_string()
    }
}

/// Per-project spinner line: `⠋ group/app resolving milestone`
pub fn spinner_style() -> ProgressStyle {
    static STYLE: OnceLock<ProgressStyle> = OnceLock::new();
    STYLE
        .get_or_init(|| {
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
        })
        .clone()
}

/// Ticking spinner on stderr
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let bar = ProgressBar::new_spinner()
        .with_style(spinner_style())
        .with_message(message.into());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}
