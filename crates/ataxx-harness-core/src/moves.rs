//! Move syntax: what a player program is allowed to print when asked for
//! a move, and nothing about whether the move is legal on the board.

use std::sync::OnceLock;

use regex::Regex;

use crate::HarnessError;

const SQUARE_PAIR: &str = "[a-g][1-7]-[a-g][1-7]";

/// One of the two players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Red,
    Blue,
}

impl Color {
    pub fn opposite(self) -> Color {
        match self {
            Color::Red => Color::Blue,
            Color::Blue => Color::Red,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Color::Red => "Red",
            Color::Blue => "Blue",
        }
    }

    pub fn parse(s: &str) -> Option<Color> {
        match s {
            "red" | "Red" => Some(Color::Red),
            "blue" | "Blue" => Some(Color::Blue),
            _ => None,
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a parsed move line says, independent of whose turn it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveKind {
    /// A `<Color> wins.` or `Draw.` line. The game is over.
    Terminal,
    /// A `<Color> passes.` line.
    Pass,
    /// A `<Color> moves <square>-<square>.` line; the payload is the
    /// `<square>-<square>` text.
    Move(String),
}

/// A move line together with its classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMove {
    /// The raw line as the program emitted it (trailing whitespace
    /// stripped), used for peer-agreement comparisons.
    pub raw: String,
    pub kind: MoveKind,
}

fn pattern_for(color: Color) -> &'static Regex {
    static RED: OnceLock<Regex> = OnceLock::new();
    static BLUE: OnceLock<Regex> = OnceLock::new();
    let cell = match color {
        Color::Red => &RED,
        Color::Blue => &BLUE,
    };
    cell.get_or_init(|| {
        let name = color.as_str();
        let src = format!(
            r"^(?:((?:Red|Blue) wins|Draw)|{name} (passes)|{name} moves ({SQUARE_PAIR}))\.$"
        );
        Regex::new(&src).expect("move pattern is a fixed valid regex")
    })
}

/// Checks that `line` is a syntactically valid move line for `who`.
///
/// Mirrors the original `check_move`: a terminal line may announce either
/// color's win (or a draw) regardless of whose turn it nominally was.
pub fn check_move(who: Color, line: &str) -> Result<ParsedMove, HarnessError> {
    let trimmed = line.trim_end();
    let caps = pattern_for(who).captures(trimmed).ok_or_else(|| {
        HarnessError::error(format!("invalid move for {} ({})", who.as_str().to_lowercase(), trimmed))
    })?;
    let kind = if caps.get(1).is_some() {
        MoveKind::Terminal
    } else if caps.get(2).is_some() {
        MoveKind::Pass
    } else {
        MoveKind::Move(caps.get(3).unwrap().as_str().to_string())
    };
    Ok(ParsedMove {
        raw: trimmed.to_string(),
        kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_a_move_line() {
        let m = check_move(Color::Red, "Red moves b2-c3.").unwrap();
        assert_eq!(m.kind, MoveKind::Move("b2-c3".to_string()));
    }

    #[test]
    fn accepts_a_pass() {
        let m = check_move(Color::Blue, "Blue passes.").unwrap();
        assert_eq!(m.kind, MoveKind::Pass);
    }

    #[test]
    fn accepts_either_colors_win_as_terminal() {
        assert_eq!(check_move(Color::Red, "Blue wins.").unwrap().kind, MoveKind::Terminal);
        assert_eq!(check_move(Color::Blue, "Draw.").unwrap().kind, MoveKind::Terminal);
    }

    #[test]
    fn rejects_the_wrong_colors_move() {
        let err = check_move(Color::Red, "Blue moves a1-a2.").unwrap_err();
        assert!(err.message().starts_with("invalid move for red"));
    }

    #[test]
    fn rejects_garbage() {
        assert!(check_move(Color::Red, "hello there").is_err());
    }
}
