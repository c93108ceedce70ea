//! Values returned by step and fixture actions.

use crate::result::Code;

/// Value a step or fixture action resolves to.
///
/// Absence of an explicit signal ([`Done`]) defaults to [`Code::Pass`].
///
/// [`Done`]: Outcome::Done
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// No explicit signal; treated as [`Code::Pass`].
    Done,

    /// A bare result code.
    Code(Code),

    /// A result code with a human-readable message.
    Message(Code, String),

    /// Operator interrupt: the current testcase stops, its teardown still
    /// runs, then the whole suite aborts.
    Interrupted,
}

impl Outcome {
    /// Explicit success.
    #[must_use]
    pub const fn pass() -> Self {
        Self::Code(Code::Pass)
    }

    /// Failure with a message.
    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self::Message(Code::Fail, message.into())
    }

    /// Skip request, honored by init fixtures.
    #[must_use]
    pub const fn skip() -> Self {
        Self::Code(Code::Skipped)
    }

    /// Splits into `(code, message)`, substituting `default_msg` when no
    /// message was attached.
    ///
    /// [`Interrupted`] reads as [`Code::Abort`] for result bookkeeping; the
    /// interrupt itself is propagated separately.
    ///
    /// [`Interrupted`]: Outcome::Interrupted
    #[must_use]
    pub fn split(self, default_msg: &str) -> (Code, String) {
        match self {
            Self::Done => (Code::Pass, default_msg.to_owned()),
            Self::Code(code) => (code, default_msg.to_owned()),
            Self::Message(code, msg) => (code, msg),
            Self::Interrupted => (Code::Abort, "operator interrupt".to_owned()),
        }
    }
}

impl From<()> for Outcome {
    fn from((): ()) -> Self {
        Self::Done
    }
}

impl From<Code> for Outcome {
    fn from(code: Code) -> Self {
        Self::Code(code)
    }
}

impl From<(Code, String)> for Outcome {
    fn from((code, msg): (Code, String)) -> Self {
        Self::Message(code, msg)
    }
}

impl From<(Code, &str)> for Outcome {
    fn from((code, msg): (Code, &str)) -> Self {
        Self::Message(code, msg.to_owned())
    }
}
