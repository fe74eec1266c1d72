//! Splitting a test file's raw text into one or two workers' scripts.

use std::sync::OnceLock;
use std::time::Duration;

use ataxx_harness_core::limits::DEFAULT_TOTAL_TIME_SECS;
use ataxx_harness_core::script::breakup;
use regex::Regex;

/// The result of splitting a test file: either a single worker's lines, or
/// two workers' lines plus the second's starting line number in the
/// original file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sections {
    One(Vec<String>),
    Two { first: Vec<String>, second: Vec<String>, second_start_offset: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTest {
    pub total_time: Duration,
    pub sections: Sections,
}

fn total_time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s+total-time\s+(\d+)").expect("fixed regex"))
}

fn separator_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^ *-{10,} *$\n?").expect("fixed regex"))
}

/// Parses a test file's full text into its total-time budget and one or
/// two workers' worth of script lines.
pub fn parse_test_file(text: &str) -> ParsedTest {
    let total_time = match total_time_re().captures(text) {
        Some(caps) => caps[1].parse().unwrap_or(DEFAULT_TOTAL_TIME_SECS),
        None => DEFAULT_TOTAL_TIME_SECS,
    };

    let sections = match separator_re().find(text) {
        Some(m) => {
            let before = &text[..m.start()];
            let after = &text[m.end()..];
            let first = breakup(before);
            let second_start_offset = first.len() + 1;
            Sections::Two {
                first,
                second: breakup(after),
                second_start_offset,
            }
        }
        None => Sections::One(breakup(text)),
    };

    ParsedTest {
        total_time: Duration::from_secs(total_time),
        sections,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_worker_with_default_total_time() {
        let parsed = parse_test_file("/bin/echo hi\n@< hi\n");
        assert_eq!(parsed.total_time, Duration::from_secs(120));
        assert_eq!(
            parsed.sections,
            Sections::One(vec!["/bin/echo hi".to_string(), "@< hi".to_string()])
        );
    }

    #[test]
    fn reads_total_time_directive() {
        let parsed = parse_test_file("   total-time 45\n/bin/cat\n");
        assert_eq!(parsed.total_time, Duration::from_secs(45));
    }

    #[test]
    fn splits_on_separator_with_correct_offset() {
        let text = "/bin/prog1\n@red...\n----------\n/bin/prog2\n@recv blue...\n";
        let parsed = parse_test_file(text);
        match parsed.sections {
            Sections::Two { first, second, second_start_offset } => {
                assert_eq!(first, vec!["/bin/prog1".to_string(), "@red...".to_string()]);
                assert_eq!(
                    second,
                    vec!["/bin/prog2".to_string(), "@recv blue...".to_string()]
                );
                assert_eq!(second_start_offset, 3);
            }
            Sections::One(_) => panic!("expected two sections"),
        }
    }

    #[test]
    fn short_dash_run_is_not_a_separator() {
        let text = "/bin/prog1\n---\nmore text\n";
        let parsed = parse_test_file(text);
        assert!(matches!(parsed.sections, Sections::One(_)));
    }
}
