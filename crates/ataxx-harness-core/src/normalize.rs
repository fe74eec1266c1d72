//! Output-line normalization shared by the Line Pump (which applies it once
//! on read) and the script interpreter's `@<`/`@?` handlers (which apply it
//! again defensively — the operation is idempotent).

use std::sync::OnceLock;

use regex::Regex;

fn prefix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^.*:\s*").expect("fixed regex"))
}

fn spaces_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("  +").expect("fixed regex"))
}

fn fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*===").expect("fixed regex"))
}

fn interesting_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)wins|passes|moves|draw|Exception in thread").expect("fixed regex")
    })
}

/// Strips a leading `PREFIX:` annotation (greedy, matching up to the last
/// colon on the line), the way logging-prefixed player programs are
/// tolerated.
pub fn strip_prefix_annotation(line: &str) -> String {
    prefix_regex().replace(line, "").into_owned()
}

/// Tabs become spaces, runs of two-or-more spaces collapse to one, and
/// trailing whitespace is dropped.
pub fn normalize_output_line(line: &str) -> String {
    let collapsed = spaces_regex().replace_all(&line.replace('\t', " "), " ");
    collapsed.trim_end().to_string()
}

/// Whether a normalized line opens or closes a fenced (`===`) passthrough
/// block.
pub fn is_fence_marker(line: &str) -> bool {
    fence_regex().is_match(line)
}

/// Whether a normalized line is "interesting" enough to enqueue outside a
/// fenced block.
pub fn is_interesting(line: &str) -> bool {
    interesting_regex().is_match(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_greedy_prefix() {
        assert_eq!(strip_prefix_annotation("engine: Red wins."), "Red wins.");
    }

    #[test]
    fn collapses_tabs_and_runs() {
        assert_eq!(normalize_output_line("a\t\tb   c  "), "a b c");
    }

    #[test]
    fn detects_fence_markers() {
        assert!(is_fence_marker("  === board ==="));
        assert!(!is_fence_marker("Red wins."));
    }

    #[test]
    fn detects_interesting_lines_case_insensitively() {
        assert!(is_interesting("RED WINS."));
        assert!(is_interesting("Exception in thread main"));
        assert!(!is_interesting("debug: nothing to see here"));
    }
}
