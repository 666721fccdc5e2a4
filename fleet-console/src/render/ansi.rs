//! ANSI SGR escape-sequence rendering
//!
//! Converts raw text containing SGR color/style sequences into escaped HTML
//! fragments. Upstream transports re-encode control characters in several
//! ways, so all known literal spellings are normalized to a real escape
//! character before parsing. Malformed sequences degrade to plain text;
//! this function never fails.

use regex::Regex;
use std::sync::OnceLock;

const ESC: char = '\u{1b}';

/// Matches a bracketed SGR code without its leading escape character,
/// e.g. `[31m` or `[1;32m`
fn bare_sgr() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[(?:\d+;)*\d+m").expect("valid SGR pattern"))
}

/// Active SGR attributes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Style {
    bold: bool,
    italic: bool,
    underline: bool,
    fg: Option<u8>,
    bg: Option<u8>,
}

impl Style {
    fn is_plain(&self) -> bool {
        *self == Style::default()
    }

    /// Apply one SGR code; unknown codes are ignored
    fn apply(&mut self, code: u16) {
        match code {
            0 => *self = Style::default(),
            1 => self.bold = true,
            3 => self.italic = true,
            4 => self.underline = true,
            30..=37 | 90..=97 => self.fg = Some(code as u8),
            40..=47 | 100..=107 => self.bg = Some(code as u8),
            _ => {}
        }
    }

    /// CSS class list for the active attributes
    fn classes(&self) -> String {
        let mut classes: Vec<String> = Vec::new();
        if self.bold {
            classes.push("ansi-bold".into());
        }
        if self.italic {
            classes.push("ansi-italic".into());
        }
        if self.underline {
            classes.push("ansi-underline".into());
        }
        if let Some(code) = self.fg {
            if code >= 90 {
                classes.push(format!("ansi-fg-bright-{}", color_name(code)));
            } else {
                classes.push(format!("ansi-fg-{}", color_name(code)));
            }
        }
        if let Some(code) = self.bg {
            if code >= 100 {
                classes.push(format!("ansi-bg-bright-{}", color_name(code)));
            } else {
                classes.push(format!("ansi-bg-{}", color_name(code)));
            }
        }
        classes.join(" ")
    }
}

fn color_name(code: u8) -> &'static str {
    match code % 10 {
        0 => "black",
        1 => "red",
        2 => "green",
        3 => "yellow",
        4 => "blue",
        5 => "magenta",
        6 => "cyan",
        _ => "white",
    }
}

/// Normalize literal escape spellings into real escape characters and
/// reinsert a missing escape before a bare bracketed code like `[31m`
fn normalize_escapes(text: &str) -> String {
    let text = text
        .replace("\\u001b", "\u{1b}")
        .replace("\\x1b", "\u{1b}")
        .replace("\\033", "\u{1b}")
        .replace("\\n", "\n")
        .replace("\\r", "\r");

    let mut out = String::with_capacity(text.len() + 4);
    let mut last = 0;
    for m in bare_sgr().find_iter(&text) {
        out.push_str(&text[last..m.start()]);
        if !text[..m.start()].ends_with(ESC) {
            out.push(ESC);
        }
        out.push_str(m.as_str());
        last = m.end();
    }
    out.push_str(&text[last..]);
    out
}

/// Escape HTML-significant characters
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Parse `ESC [ code (; code)* m` with `start` indexing the escape
/// character. Returns the codes and the index just past the trailing `m`,
/// or `None` when the sequence is malformed or unterminated.
fn parse_sgr(chars: &[char], start: usize) -> Option<(Vec<u16>, usize)> {
    let mut i = start + 1;
    if chars.get(i) != Some(&'[') {
        return None;
    }
    i += 1;

    let mut params = String::new();
    while let Some(&c) = chars.get(i) {
        match c {
            '0'..='9' | ';' => {
                params.push(c);
                i += 1;
            }
            'm' => {
                // `ESC[m` is shorthand for reset
                if params.is_empty() {
                    return Some((vec![0], i + 1));
                }
                let mut codes = Vec::new();
                for part in params.split(';') {
                    codes.push(part.parse::<u16>().ok()?);
                }
                return Some((codes, i + 1));
            }
            _ => return None,
        }
    }
    None
}

/// Flush the pending text run, escaped and wrapped in a span when any
/// style is active
fn flush(out: &mut String, run: &mut String, style: Style) {
    if run.is_empty() {
        return;
    }
    let escaped = escape_html(run);
    if style.is_plain() {
        out.push_str(&escaped);
    } else {
        out.push_str("<span class=\"");
        out.push_str(&style.classes());
        out.push_str("\">");
        out.push_str(&escaped);
        out.push_str("</span>");
    }
    run.clear();
}

/// Render raw text containing ANSI SGR sequences into an escaped HTML
/// fragment. Pure and deterministic: identical input yields identical
/// output, and user-supplied markup characters can never break out of the
/// fragment structure because text is escaped before spans are added.
pub fn ansi_to_html(text: &str) -> String {
    let normalized = normalize_escapes(text);
    let chars: Vec<char> = normalized.chars().collect();

    let mut out = String::with_capacity(normalized.len());
    let mut style = Style::default();
    let mut run = String::new();

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == ESC {
            match parse_sgr(&chars, i) {
                Some((codes, next)) => {
                    flush(&mut out, &mut run, style);
                    for code in codes {
                        style.apply(code);
                    }
                    i = next;
                }
                None => {
                    // Malformed sequence: keep the character as plain text
                    // and carry on with the rest of the line
                    run.push(c);
                    i += 1;
                }
            }
        } else {
            run.push(c);
            i += 1;
        }
    }
    flush(&mut out, &mut run, style);
    out
}
