//! The read-only, indexed sequence of script command lines.

use std::sync::OnceLock;

use regex::Regex;

/// A worker's script: an ordered list of raw lines plus the line number
/// the first of them occupies in the original test file (used only for
/// error reporting).
#[derive(Debug, Clone)]
pub struct Script {
    lines: Vec<String>,
    start_offset: usize,
    cursor: usize,
}

impl Script {
    pub fn new(lines: Vec<String>, start_offset: usize) -> Self {
        Self {
            lines,
            start_offset,
            cursor: 0,
        }
    }

    /// The 1-indexed line number of the command most recently returned by
    /// [`Script::next_command`], or of the position a failure occurred at.
    pub fn current_line_number(&self) -> usize {
        self.start_offset + self.cursor
    }

    /// Reads and normalizes the next non-empty command, advancing the
    /// cursor past it (and past any comment/blank lines skipped along the
    /// way). Returns `None` at end-of-script.
    pub fn next_command(&mut self) -> Option<String> {
        loop {
            if self.cursor >= self.lines.len() {
                return None;
            }
            let raw = self.lines[self.cursor].clone();
            self.cursor += 1;
            let cleaned = normalize(&raw);
            if !cleaned.is_empty() {
                return Some(cleaned);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|l| normalize(l).is_empty())
    }
}

fn collapse_spaces_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("  +").expect("fixed regex"))
}

/// Tabs become single spaces, a leading `#` blanks the whole line, and
/// runs of two-or-more spaces collapse to one.
fn normalize(text: &str) -> String {
    let text = text.replace('\t', " ");
    let trimmed = text.trim();
    if trimmed.starts_with('#') {
        return String::new();
    }
    collapse_spaces_regex().replace_all(trimmed, " ").into_owned()
}

/// Splits a block of text into non-trailing-empty lines, the way the test
/// file reader breaks a section into a `Script`'s raw lines.
pub fn breakup(text: &str) -> Vec<String> {
    let trimmed = text.trim_end();
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split('\n').map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_tabs_and_runs_of_spaces() {
        let mut s = Script::new(vec!["a\t\tb   c".to_string()], 1);
        assert_eq!(s.next_command().unwrap(), "a b c");
    }

    #[test]
    fn skips_comments_and_blanks() {
        let mut s = Script::new(
            vec!["# comment".to_string(), "".to_string(), "real".to_string()],
            1,
        );
        assert_eq!(s.next_command().unwrap(), "real");
        assert_eq!(s.current_line_number(), 4);
    }

    #[test]
    fn end_of_script_returns_none() {
        let mut s = Script::new(vec![], 1);
        assert_eq!(s.next_command(), None);
    }

    #[test]
    fn empty_detects_only_comments_and_blanks() {
        let s = Script::new(vec!["# a".to_string(), "   ".to_string()], 1);
        assert!(s.is_empty());
    }

    #[test]
    fn breakup_splits_on_newlines_and_drops_trailing_blank() {
        assert_eq!(breakup("a\nb\n"), vec!["a", "b"]);
        assert_eq!(breakup(""), Vec::<String>::new());
    }
}
