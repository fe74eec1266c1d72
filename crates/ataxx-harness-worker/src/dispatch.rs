//! The script-command dispatch table: an ordered, first-match-wins parse
//! from a normalized command line to a [`Command`], with no hidden
//! regex-capture state (see the core crate's design notes on replacing a
//! shared `last_match` with explicit return values).

use std::sync::OnceLock;

use ataxx_harness_core::Color;
use regex::Regex;

/// An optional trailing pattern a terminal line must match, e.g. the
/// `<regex?>` suffix on `@red...`, `@send red...`, etc. Blank (or absent)
/// means "no constraint".
pub type EndPattern = Option<String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SetTime(String),
    TotalTime(String),
    ExpectLiteral(String),
    ExpectRegex(String),
    SelfPlay { start: Color, end_pattern: EndPattern },
    SendMoves { first_mover: Color, end_pattern: EndPattern },
    RecvMoves { first_mover: Color, end_pattern: EndPattern },
    BadDirective,
    Raw(String),
}

fn end_pattern_from(raw: &str) -> EndPattern {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

macro_rules! table_regex {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new($pat).expect("fixed regex"))
        }
    };
}

table_regex!(set_time_re, r"^@time ([\d.]+)");
table_regex!(total_time_re, r"^@total-time (\d+)");
table_regex!(output_re, r"^@([<?])(.*)$");
table_regex!(self_play_re, r"^@(red|blue)\.\.\.\s*(.*)$");
table_regex!(send_re, r"^@send (red|blue)\.\.\.\s*(.*)$");
table_regex!(recv_re, r"^@recv (red|blue)\.\.\.\s*(.*)$");
table_regex!(any_directive_re, r"^@");

/// Parses one already-normalized command line into a [`Command`], trying
/// patterns in the fixed order from the spec's dispatch table.
pub fn parse_command(line: &str) -> Command {
    if let Some(caps) = set_time_re().captures(line) {
        return Command::SetTime(caps[1].to_string());
    }
    if let Some(caps) = total_time_re().captures(line) {
        return Command::TotalTime(caps[1].to_string());
    }
    if let Some(caps) = output_re().captures(line) {
        // `@<`/`@?` payloads are conventionally written with a separating
        // space (`@< hello`); trim it so the literal/regex lines up with
        // an already-normalized output line.
        let payload = caps[2].trim_start().to_string();
        return match &caps[1] {
            "<" => Command::ExpectLiteral(payload),
            _ => Command::ExpectRegex(payload),
        };
    }
    if let Some(caps) = self_play_re().captures(line) {
        let start = Color::parse(&caps[1]).expect("regex only captures red|blue");
        return Command::SelfPlay {
            start,
            end_pattern: end_pattern_from(&caps[2]),
        };
    }
    if let Some(caps) = send_re().captures(line) {
        let first_mover = Color::parse(&caps[1]).expect("regex only captures red|blue");
        return Command::SendMoves {
            first_mover,
            end_pattern: end_pattern_from(&caps[2]),
        };
    }
    if let Some(caps) = recv_re().captures(line) {
        let first_mover = Color::parse(&caps[1]).expect("regex only captures red|blue");
        return Command::RecvMoves {
            first_mover,
            end_pattern: end_pattern_from(&caps[2]),
        };
    }
    if any_directive_re().is_match(line) {
        return Command::BadDirective;
    }
    Command::Raw(line.to_string())
}
