/// A worker's final classification, and a match's aggregate classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    Fail,
    Error,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Outcome::Ok => "OK",
            Outcome::Fail => "FAIL",
            Outcome::Error => "ERROR",
        };
        write!(f, "{s}")
    }
}

/// The single message a worker posts to the termination channel, exactly
/// once, when its script interpreter exits.
#[derive(Debug, Clone)]
pub struct TerminationMessage {
    pub title: String,
    pub outcome: Outcome,
    pub detail: Option<String>,
    pub line: Option<usize>,
}

impl TerminationMessage {
    pub fn ok(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            outcome: Outcome::Ok,
            detail: None,
            line: None,
        }
    }

    pub fn from_error(title: impl Into<String>, err: &crate::HarnessError, line: usize) -> Self {
        Self {
            title: title.into(),
            outcome: if err.is_fail() { Outcome::Fail } else { Outcome::Error },
            detail: Some(err.message().to_string()),
            line: Some(line),
        }
    }

    /// Renders as `"<text> near line <n>"`, or `""` for an OK message.
    pub fn describe(&self) -> String {
        match (&self.detail, self.line) {
            (Some(text), Some(line)) => format!("{text} near line {line}"),
            (Some(text), None) => text.clone(),
            (None, _) => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HarnessError;

    #[test]
    fn ok_message_has_no_detail() {
        let msg = TerminationMessage::ok("Prog1");
        assert_eq!(msg.outcome, Outcome::Ok);
        assert_eq!(msg.describe(), "");
    }

    #[test]
    fn error_message_renders_near_line() {
        let err = HarnessError::error("timed out waiting for output");
        let msg = TerminationMessage::from_error("Prog1", &err, 7);
        assert_eq!(msg.outcome, Outcome::Error);
        assert_eq!(msg.describe(), "timed out waiting for output near line 7");
    }

    #[test]
    fn fail_message_maps_to_fail_outcome() {
        let err = HarnessError::fail("bad command in script");
        let msg = TerminationMessage::from_error("Prog2", &err, 3);
        assert_eq!(msg.outcome, Outcome::Fail);
    }
}
