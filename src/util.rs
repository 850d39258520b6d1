//! Small utility helpers shared by the networking, parsing, and UI layers.
//!
//! The functions in this module are intentionally lightweight so that hot
//! paths (per-keystroke rendering, version sorting) stay cheap.

use std::cmp::Ordering;

use unicode_width::UnicodeWidthChar;

/// Compare two dotted version strings numerically, component by component.
///
/// A leading `v` prefix is ignored. Components are split on `.` and parsed
/// as integers; a component that fails to parse counts as `0`, and missing
/// trailing components are treated as `0` (so `1.2` equals `1.2.0`).
#[must_use]
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let a = a.strip_prefix('v').unwrap_or(a);
    let b = b.strip_prefix('v').unwrap_or(b);
    let pa: Vec<&str> = a.split('.').collect();
    let pb: Vec<&str> = b.split('.').collect();
    for i in 0..pa.len().max(pb.len()) {
        let na: i64 = pa.get(i).and_then(|p| p.parse().ok()).unwrap_or(0);
        let nb: i64 = pb.get(i).and_then(|p| p.parse().ok()).unwrap_or(0);
        if na != nb {
            return na.cmp(&nb);
        }
    }
    Ordering::Equal
}

/// Truncate `s` to at most `max_width` display columns, appending `...` when
/// content was dropped.
///
/// Width is measured per character with `unicode-width` so wide glyphs do not
/// overflow list rows. For budgets of three columns or fewer the text is cut
/// without an ellipsis.
#[must_use]
pub fn truncate(s: &str, max_width: usize) -> String {
    let width: usize = s.chars().map(|c| c.width().unwrap_or(0)).sum();
    if width <= max_width {
        return s.to_string();
    }
    let budget = if max_width <= 3 { max_width } else { max_width - 3 };
    let mut out = String::new();
    let mut used = 0usize;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    if max_width > 3 {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// What: Numeric comparison ignores `v` prefixes and pads missing parts.
    #[test]
    fn compare_versions_orders_numerically() {
        assert_eq!(compare_versions("1.0.0", "1.0.0"), Ordering::Equal);
        assert_eq!(compare_versions("2.0.0", "1.0.0"), Ordering::Greater);
        assert_eq!(compare_versions("1.0.0", "2.0.0"), Ordering::Less);
        assert_eq!(compare_versions("1.2.0", "1.1.0"), Ordering::Greater);
        assert_eq!(compare_versions("1.0.5", "1.0.3"), Ordering::Greater);
        assert_eq!(compare_versions("1.2", "1.2.0"), Ordering::Equal);
        assert_eq!(compare_versions("v2.0", "1.9"), Ordering::Greater);
        assert_eq!(compare_versions("10.0", "9.9"), Ordering::Greater);
    }

    /// What: Truncation respects display width and only adds an ellipsis when
    /// something was dropped.
    #[test]
    fn truncate_bounds_display_width() {
        assert_eq!(truncate("short", 20), "short");
        assert_eq!(truncate("a longer description", 10), "a longe...");
        assert_eq!(truncate("abcdef", 3), "abc");
    }
}
