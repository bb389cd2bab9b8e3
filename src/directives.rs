//! Per-folder directive and order-file parsing.
//!
//! Every folder in either tree may carry a human-edited `.order` file:
//!
//! ```text
//! max_columns = 3          # directive block (leading lines only)
//! aspect_ratio = 4/5
//! title_display = 0
//! ------- Overrides above -------
//! Landscapes/              # ordered entry (trailing slash is ignored)
//! hero.jpg
//! .drafts                  # hidden-by-dot: excluded from output
//! ```
//!
//! ## Line Normalization
//!
//! Each line is trimmed, full-line `# comments` are dropped, inline comments
//! (`#` preceded by whitespace) are cut, trailing `/` are removed. Blank lines
//! vanish. A `#` glued to a name (`shot#2.jpg`) is part of the name.
//!
//! ## Classification
//!
//! - **Directive block**: consecutive directive lines at the *top* of the
//!   file. The block ends at the first non-directive line, or at a separator
//!   (which is consumed). Directives appearing later are ignored.
//! - **Separator**: three or more leading `-`/`=`, or any line containing
//!   "override above" (case-insensitive).
//! - **Hidden marker**: any line starting with `.`, anywhere in the file.
//!   The dot is stripped and the rest reduced to its lowercased basename.
//! - **Order entry**: everything else, in file order.
//!
//! Unrecognized or malformed directive values never fail parsing; the
//! directive is simply absent.

use crate::naming::basename;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Lowest and highest honored `max_columns` values.
pub const MIN_COLUMNS: u8 = 1;
pub const MAX_COLUMNS: u8 = 8;

const DIRECTIVE_KEYS: &[&str] = &["max_columns", "aspect_ratio", "title_display"];

/// Per-item aspect handling for a gallery grid.
///
/// Serialized as `"native"` or `"W/H"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AspectRatio {
    /// Respect each item's own aspect ratio (`aspect_ratio = 0`).
    Native,
    /// Force a `width/height` ratio on every tile.
    Ratio { width: u32, height: u32 },
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AspectRatio::Native => f.write_str("native"),
            AspectRatio::Ratio { width, height } => write!(f, "{width}/{height}"),
        }
    }
}

impl From<AspectRatio> for String {
    fn from(value: AspectRatio) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for AspectRatio {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value == "native" {
            return Ok(AspectRatio::Native);
        }
        parse_ratio(&value).ok_or_else(|| format!("invalid aspect ratio: {value}"))
    }
}

/// Tri-state title visibility; absence is modelled with `Option`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TitleDisplay {
    Hide,
    Show,
}

impl From<TitleDisplay> for u8 {
    fn from(value: TitleDisplay) -> Self {
        match value {
            TitleDisplay::Hide => 0,
            TitleDisplay::Show => 1,
        }
    }
}

impl TryFrom<u8> for TitleDisplay {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TitleDisplay::Hide),
            1 => Ok(TitleDisplay::Show),
            other => Err(format!("titleDisplay must be 0 or 1, got {other}")),
        }
    }
}

/// Resolved display overrides for one folder.
///
/// Each field is independent; no value is inherited from a parent folder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Directives {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_columns: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<AspectRatio>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_display: Option<TitleDisplay>,
}

impl Directives {
    /// Overlay every field `other` sets on top of `self`.
    fn merge(&mut self, other: Directives) {
        if other.max_columns.is_some() {
            self.max_columns = other.max_columns;
        }
        if other.aspect_ratio.is_some() {
            self.aspect_ratio = other.aspect_ratio;
        }
        if other.title_display.is_some() {
            self.title_display = other.title_display;
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Directives::default()
    }
}

/// Parse a single directive line.
///
/// Keys are case-insensitive and whitespace around `=` and `/` is allowed.
/// `max_columns` is clamped into `1..=8`; malformed values yield nothing.
pub fn parse_directive(line: &str) -> Directives {
    let mut out = Directives::default();
    let Some((key, value)) = line.trim().split_once('=') else {
        return out;
    };
    let value = value.trim();

    match key.trim().to_ascii_lowercase().as_str() {
        "max_columns" => out.max_columns = parse_columns(value),
        "aspect_ratio" => {
            out.aspect_ratio = if value == "0" {
                Some(AspectRatio::Native)
            } else {
                parse_ratio(value)
            }
        }
        "title_display" => {
            out.title_display = match value.to_ascii_lowercase().as_str() {
                "1" | "true" => Some(TitleDisplay::Show),
                "0" | "false" => Some(TitleDisplay::Hide),
                _ => None,
            }
        }
        _ => {}
    }
    out
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Digits only; out-of-range (including overflowing) values clamp.
fn parse_columns(value: &str) -> Option<u8> {
    if !is_digits(value) {
        return None;
    }
    let n = value.parse::<u64>().unwrap_or(u64::MAX);
    Some(n.clamp(MIN_COLUMNS as u64, MAX_COLUMNS as u64) as u8)
}

/// `W/H` with optional whitespace around the slash; zero sides are rejected.
fn parse_ratio(value: &str) -> Option<AspectRatio> {
    let (w, h) = value.split_once('/')?;
    let (w, h) = (w.trim(), h.trim());
    if !is_digits(w) || !is_digits(h) {
        return None;
    }
    let width = w.parse::<u32>().ok()?;
    let height = h.parse::<u32>().ok()?;
    if width == 0 || height == 0 {
        return None;
    }
    Some(AspectRatio::Ratio { width, height })
}

/// True when the line assigns one of the known directive keys.
pub fn is_directive_line(line: &str) -> bool {
    line.split_once('=').is_some_and(|(key, _)| {
        let key = key.trim_end().to_ascii_lowercase();
        DIRECTIVE_KEYS.contains(&key.as_str())
    })
}

/// `---`, `===`, `-=-` … (three or more leading rule characters), or any
/// line mentioning "override above".
pub fn is_separator_line(line: &str) -> bool {
    let rule_prefix = line.chars().take(3).filter(|c| matches!(c, '-' | '=')).count() == 3;
    rule_prefix || line.to_lowercase().contains("override above")
}

/// Normalize one raw line; returns an empty string for comment/blank lines.
pub fn normalize_line(raw: &str) -> &str {
    let line = raw.trim();
    if line.starts_with('#') {
        return "";
    }
    let mut cut = line.len();
    let mut prev_ws = false;
    for (i, c) in line.char_indices() {
        if c == '#' && prev_ws {
            cut = i;
            break;
        }
        prev_ws = c.is_whitespace();
    }
    line[..cut].trim().trim_end_matches('/').trim()
}

/// Parsed contents of one folder's `.order` file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFile {
    /// Ordered entries as written (already normalized), used as priority keys.
    pub order: Vec<String>,
    /// Directives from the leading block only.
    pub directives: Directives,
    /// Lowercased basenames marked hidden with a leading dot.
    pub hidden: HashSet<String>,
}

impl OrderFile {
    /// Parse the full text of an order file.
    pub fn parse(text: &str) -> Self {
        let lines: Vec<&str> = text
            .lines()
            .map(normalize_line)
            .filter(|l| !l.is_empty())
            .collect();

        let mut directives = Directives::default();
        let mut idx = 0;
        while idx < lines.len() {
            let line = lines[idx];
            if is_separator_line(line) {
                idx += 1;
                break;
            }
            if !is_directive_line(line) {
                break;
            }
            directives.merge(parse_directive(line));
            idx += 1;
        }

        let hidden = lines
            .iter()
            .filter_map(|l| l.strip_prefix('.'))
            .map(|rest| basename(rest).to_lowercase())
            .filter(|name| !name.is_empty())
            .collect();

        let order = lines[idx..]
            .iter()
            .filter(|l| !l.starts_with('.'))
            .filter(|l| !is_separator_line(l))
            .filter(|l| !is_directive_line(l))
            .map(|l| l.to_string())
            .collect();

        Self {
            order,
            directives,
            hidden,
        }
    }

    /// True when `name` (any case) was dot-marked in this file.
    pub fn is_hidden(&self, name: &str) -> bool {
        self.hidden.contains(&name.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Single directive lines
    // =========================================================================

    #[test]
    fn max_columns_clamps_low_and_high() {
        assert_eq!(parse_directive("max_columns=0").max_columns, Some(1));
        assert_eq!(parse_directive("max_columns=9").max_columns, Some(8));
        assert_eq!(parse_directive("max_columns = 3").max_columns, Some(3));
    }

    #[test]
    fn max_columns_non_numeric_is_absent() {
        assert_eq!(parse_directive("max_columns=abc"), Directives::default());
        assert_eq!(parse_directive("max_columns=-2"), Directives::default());
        assert_eq!(parse_directive("max_columns="), Directives::default());
    }

    #[test]
    fn max_columns_overflow_clamps_to_max() {
        assert_eq!(
            parse_directive("max_columns=99999999999999999999999").max_columns,
            Some(8)
        );
    }

    #[test]
    fn keys_are_case_insensitive() {
        assert_eq!(parse_directive("MAX_Columns=2").max_columns, Some(2));
        assert_eq!(
            parse_directive("Title_Display=TRUE").title_display,
            Some(TitleDisplay::Show)
        );
    }

    #[test]
    fn aspect_ratio_zero_means_native() {
        assert_eq!(
            parse_directive("aspect_ratio=0").aspect_ratio,
            Some(AspectRatio::Native)
        );
    }

    #[test]
    fn aspect_ratio_normalizes_spacing_and_leading_zeros() {
        let d = parse_directive("aspect_ratio = 04 /  5");
        assert_eq!(
            d.aspect_ratio,
            Some(AspectRatio::Ratio {
                width: 4,
                height: 5
            })
        );
        assert_eq!(d.aspect_ratio.unwrap().to_string(), "4/5");
    }

    #[test]
    fn aspect_ratio_rejects_malformed_and_zero_sides() {
        assert_eq!(parse_directive("aspect_ratio=wide").aspect_ratio, None);
        assert_eq!(parse_directive("aspect_ratio=4:5").aspect_ratio, None);
        assert_eq!(parse_directive("aspect_ratio=0/5").aspect_ratio, None);
        assert_eq!(parse_directive("aspect_ratio=00").aspect_ratio, None);
    }

    #[test]
    fn title_display_accepts_bools_and_bits() {
        assert_eq!(
            parse_directive("title_display=0").title_display,
            Some(TitleDisplay::Hide)
        );
        assert_eq!(
            parse_directive("title_display=false").title_display,
            Some(TitleDisplay::Hide)
        );
        assert_eq!(
            parse_directive("title_display=1").title_display,
            Some(TitleDisplay::Show)
        );
        assert_eq!(parse_directive("title_display=yes").title_display, None);
    }

    #[test]
    fn unrecognized_line_yields_nothing() {
        assert!(parse_directive("hero.jpg").is_empty());
        assert!(parse_directive("columns=3").is_empty());
    }

    // =========================================================================
    // Line classification
    // =========================================================================

    #[test]
    fn separators() {
        assert!(is_separator_line("---"));
        assert!(is_separator_line("=====  overrides  ====="));
        assert!(is_separator_line("-=-"));
        assert!(is_separator_line("Override above this line"));
        assert!(!is_separator_line("--"));
        assert!(!is_separator_line("a---"));
    }

    #[test]
    fn normalize_strips_comments_and_slashes() {
        assert_eq!(normalize_line("  Landscapes/  # the good ones"), "Landscapes");
        assert_eq!(normalize_line("# full comment"), "");
        assert_eq!(normalize_line("shot#2.jpg"), "shot#2.jpg");
        assert_eq!(normalize_line("dir//"), "dir");
        assert_eq!(normalize_line("   "), "");
    }

    // =========================================================================
    // Whole files
    // =========================================================================

    #[test]
    fn leading_block_is_honored() {
        let f = OrderFile::parse("max_columns=3\naspect_ratio=0\n---\nb.jpg\na.jpg\n");
        assert_eq!(f.directives.max_columns, Some(3));
        assert_eq!(f.directives.aspect_ratio, Some(AspectRatio::Native));
        assert_eq!(f.order, vec!["b.jpg", "a.jpg"]);
    }

    #[test]
    fn directives_after_separator_are_ignored() {
        let f = OrderFile::parse("a.jpg\n---\nmax_columns=3\n");
        assert_eq!(f.directives, Directives::default());
        assert_eq!(f.order, vec!["a.jpg"]);
    }

    #[test]
    fn directives_after_first_entry_are_ignored() {
        let f = OrderFile::parse("title_display=1\na.jpg\nmax_columns=2\n");
        assert_eq!(f.directives.title_display, Some(TitleDisplay::Show));
        assert_eq!(f.directives.max_columns, None);
        assert_eq!(f.order, vec!["a.jpg"]);
    }

    #[test]
    fn later_directive_in_block_wins() {
        let f = OrderFile::parse("max_columns=2\nmax_columns=5\n");
        assert_eq!(f.directives.max_columns, Some(5));
        assert!(f.order.is_empty());
    }

    #[test]
    fn hidden_markers_collected_from_whole_file() {
        let f = OrderFile::parse(".Drafts/\nmax_columns=2\na.jpg\n.sub/C.JPG # old\n");
        assert!(f.is_hidden("drafts"));
        assert!(f.is_hidden("c.jpg"));
        assert!(!f.is_hidden("a.jpg"));
        assert_eq!(f.order, vec!["a.jpg"]);
        // A leading hidden marker ends the directive block.
        assert_eq!(f.directives.max_columns, None);
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let f = OrderFile::parse("# header\n\nmax_columns=4 # four\n\n# note\nx.png\n");
        assert_eq!(f.directives.max_columns, Some(4));
        assert_eq!(f.order, vec!["x.png"]);
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(OrderFile::parse(""), OrderFile::default());
    }
}
