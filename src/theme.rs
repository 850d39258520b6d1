//! Color palette definitions for pipsea's TUI.
//!
//! A single opinionated Tokyo Night palette used throughout the interface.
//! Colors are grouped into backgrounds, foregrounds, and accents for
//! highlighting and semantic states (severity badges, errors, status text).

use ratatui::style::Color;

use crate::state::Severity;

/// Application theme palette used by rendering code.
pub struct Theme {
    /// Primary background color for the canvas.
    pub base: Color,
    /// Elevated background used for the status bar.
    pub elevated: Color,
    /// Background for the highlighted (cursor) row.
    pub highlight: Color,
    /// Border color for unfocused panels.
    pub border: Color,
    /// Primary foreground text color.
    pub text: Color,
    /// Dimmed text for hints and low-emphasis content.
    pub text_dim: Color,
    /// Accent used for focus indicators and titles.
    pub blue: Color,
    /// Success/positive state color.
    pub green: Color,
    /// Patch-level update accent.
    pub teal: Color,
    /// Warning/attention state color.
    pub yellow: Color,
    /// Error/danger state color.
    pub red: Color,
    /// Accent for package names.
    pub purple: Color,
    /// Accent for version strings.
    pub cyan: Color,
    /// Accent for the text cursor and transient status messages.
    pub orange: Color,
}

impl Theme {
    /// Map an update severity to its badge color.
    #[must_use]
    pub fn severity_color(&self, severity: Option<Severity>) -> Color {
        match severity {
            Some(Severity::Patch) => self.teal,
            Some(Severity::Minor) => self.yellow,
            Some(Severity::Major) => self.red,
            _ => self.text_dim,
        }
    }
}

/// Construct a [`Color::Rgb`] from an 8-bit RGB triplet.
fn hex(rgb: (u8, u8, u8)) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

/// Return the application's theme palette.
#[must_use]
pub fn theme() -> Theme {
    Theme {
        base: hex((0x1a, 0x1b, 0x26)),
        elevated: hex((0x24, 0x28, 0x3b)),
        highlight: hex((0x2e, 0x32, 0x50)),
        border: hex((0x41, 0x48, 0x68)),
        text: hex((0xc0, 0xca, 0xf5)),
        text_dim: hex((0x56, 0x5f, 0x89)),
        blue: hex((0x7a, 0xa2, 0xf7)),
        green: hex((0x9e, 0xce, 0x6a)),
        teal: hex((0x2a, 0xc3, 0xde)),
        yellow: hex((0xe0, 0xaf, 0x68)),
        red: hex((0xf7, 0x76, 0x8e)),
        purple: hex((0xbb, 0x9a, 0xf7)),
        cyan: hex((0x7d, 0xcf, 0xff)),
        orange: hex((0xff, 0x9e, 0x64)),
    }
}
