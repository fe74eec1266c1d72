/// The two ways a worker's script interpretation can unwind.
///
/// `Error` covers environmental or tested-program misbehavior (timeouts,
/// non-zero exit, malformed moves); `Fail` covers script-author mistakes
/// (bad directives, bad regexes, output mismatches, an empty script).
/// Both carry the message text that becomes a [`crate::TerminationMessage`]
/// detail.
#[derive(thiserror::Error, Debug, Clone)]
pub enum HarnessError {
    #[error("{0}")]
    Error(String),
    #[error("{0}")]
    Fail(String),
}

impl HarnessError {
    pub fn error(msg: impl Into<String>) -> Self {
        Self::Error(msg.into())
    }

    pub fn fail(msg: impl Into<String>) -> Self {
        Self::Fail(msg.into())
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, Self::Fail(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Error(s) | Self::Fail(s) => s,
        }
    }
}
