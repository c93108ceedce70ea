//! Structured outcomes of steps, testcases and whole suite runs.

use std::time::{Duration, SystemTime};

use derive_more::with_trait::Display;

use crate::step::StepTag;

/// Result code of a step, fixture or testcase.
///
/// Codes form a closed set with an explicit severity order used for worst-of
/// aggregation: [`Pass`] < [`Fail`] < [`Abort`] < [`TopoFail`] < [`ConnFail`]
/// < [`Unknown`]. [`Skipped`] stands outside the order and never wins a
/// comparison against a non-skipped code.
///
/// [`Pass`]: Code::Pass
/// [`Fail`]: Code::Fail
/// [`Abort`]: Code::Abort
/// [`TopoFail`]: Code::TopoFail
/// [`ConnFail`]: Code::ConnFail
/// [`Unknown`]: Code::Unknown
/// [`Skipped`]: Code::Skipped
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Code {
    /// A step or fixture explicitly signaled success, or returned no
    /// explicit code at all.
    #[display("PASS")]
    Pass,

    /// A checked condition was not met, or a step explicitly returned a
    /// failure.
    #[display("FAIL")]
    Fail,

    /// Any other uncaught fault inside a step: the step logic itself is
    /// unreliable, not merely a checked condition.
    #[display("ABORT")]
    Abort,

    /// Environment-initialization fault, settable by fixtures and the
    /// topology integration, never by ordinary steps.
    #[display("TOPO_FAIL")]
    TopoFail,

    /// Connectivity fault, settable by fixtures and the connection
    /// integration, never by ordinary steps.
    #[display("CONN_FAIL")]
    ConnFail,

    /// No trustworthy result is available yet (or an integration reported a
    /// value it could not interpret). Aggregated as a failing state.
    #[display("UNKNOWN")]
    Unknown,

    /// Init fixtures requested a skip: no steps ran, cleanup was still
    /// attempted, and the run is excluded from pass/fail statistics.
    #[display("SKIPPED")]
    Skipped,
}

impl Code {
    /// Rank of this code in the worst-of total order.
    ///
    /// [`Skipped`] ranks lowest because it only survives aggregation when
    /// every compared code is [`Skipped`].
    ///
    /// [`Skipped`]: Code::Skipped
    #[must_use]
    pub const fn severity(self) -> u8 {
        match self {
            Self::Skipped | Self::Pass => 0,
            Self::Fail => 1,
            Self::Abort => 2,
            Self::TopoFail => 3,
            Self::ConnFail => 4,
            Self::Unknown => 5,
        }
    }

    /// Combines two codes, keeping the one indicating the more severe
    /// outcome. [`Skipped`] is excluded from the comparison unless both
    /// sides are [`Skipped`].
    ///
    /// [`Skipped`]: Code::Skipped
    #[must_use]
    pub fn worst(self, other: Self) -> Self {
        match (self, other) {
            (Self::Skipped, b) => b,
            (a, Self::Skipped) => a,
            (a, b) if b.severity() > a.severity() => b,
            (a, _) => a,
        }
    }

    /// Indicates whether this code is [`Pass`].
    ///
    /// [`Pass`]: Code::Pass
    #[must_use]
    pub const fn is_pass(self) -> bool {
        matches!(self, Self::Pass)
    }

    /// Indicates whether this code counts against the run (anything but
    /// [`Pass`] and [`Skipped`]).
    ///
    /// [`Pass`]: Code::Pass
    /// [`Skipped`]: Code::Skipped
    #[must_use]
    pub const fn is_failing(self) -> bool {
        !matches!(self, Self::Pass | Self::Skipped)
    }
}

/// Stage a testcase run is currently in.
///
/// [`Finished`] is always reached: teardown and reporting have a unique
/// author that runs regardless of how earlier stages terminate.
///
/// [`Finished`]: Stage::Finished
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Stage {
    /// The testcase has not started yet.
    #[display("Not started")]
    NotRun,

    /// Init fixtures are being applied.
    #[display("Initialization")]
    Init,

    /// Steps are executing.
    #[display("Running Steps")]
    Step,

    /// Cleanup fixtures are being torn down.
    #[display("Cleaning up")]
    Clean,

    /// The run is over and the result is final.
    #[display("Finished")]
    Finished,
}

/// Phase a failure annotation points at.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum Phase {
    /// Init fixture application.
    #[display("init")]
    Init,

    /// The step with the given sequence id.
    #[display("step{_0}")]
    Step(u32),

    /// Cleanup fixture teardown.
    #[display("cleanup")]
    Cleanup,
}

/// One failure annotation of a [`CaseResult`].
#[derive(Clone, Debug, PartialEq)]
pub struct Failure {
    /// Phase the failure happened in.
    pub phase: Phase,

    /// Human-readable description, sufficient to pinpoint the root cause
    /// without a re-run.
    pub description: String,
}

/// Result of a single step or sub-step.
#[derive(Clone, Debug)]
pub struct StepResult {
    /// Identity of the step or sub-step.
    pub tag: StepTag,

    /// Description the step was registered with.
    pub desc: String,

    /// Final result code.
    pub code: Code,

    /// Error text, empty on success.
    pub error: String,

    /// When execution of this step began.
    pub started_at: SystemTime,

    /// When execution of this step finished.
    pub finished_at: SystemTime,
}

impl StepResult {
    pub(crate) fn new(tag: StepTag, desc: impl Into<String>) -> Self {
        let now = SystemTime::now();
        Self {
            tag,
            desc: desc.into(),
            code: Code::Pass,
            error: String::new(),
            started_at: now,
            finished_at: now,
        }
    }

    /// Wall-clock time this step took.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.finished_at
            .duration_since(self.started_at)
            .unwrap_or_default()
    }
}

/// Final result of one testcase run.
#[derive(Clone, Debug)]
pub struct CaseResult {
    /// Testcase name.
    pub name: String,

    /// Final result code. Defaults to [`Code::Unknown`] until the run
    /// decides otherwise.
    pub code: Code,

    /// Stage the run finished in.
    pub stage: Stage,

    /// Number of step groups the testcase declares.
    pub step_count: usize,

    /// Number of step groups that actually executed.
    pub step_run: usize,

    /// Ordered failure annotations, one per failed phase.
    pub failed_on: Vec<Failure>,

    /// Per-step sub-step results, in execution order.
    pub step_results: Vec<Vec<StepResult>>,

    /// When the run began.
    pub started_at: SystemTime,

    /// When the run finished.
    pub finished_at: SystemTime,
}

impl CaseResult {
    pub(crate) fn new(name: impl Into<String>, step_count: usize) -> Self {
        let now = SystemTime::now();
        Self {
            name: name.into(),
            code: Code::Unknown,
            stage: Stage::NotRun,
            step_count,
            step_run: 0,
            failed_on: Vec::new(),
            step_results: Vec::new(),
            started_at: now,
            finished_at: now,
        }
    }

    /// Result for a testcase that never ran (unresolvable or failed
    /// topology), carrying only the given code.
    pub(crate) fn unrun(name: impl Into<String>, step_count: usize, code: Code) -> Self {
        let mut res = Self::new(name, step_count);
        res.code = code;
        res.stage = Stage::Finished;
        res
    }

    /// Wall-clock time the whole run took, truncated to seconds.
    #[must_use]
    pub fn duration(&self) -> Duration {
        let d = self
            .finished_at
            .duration_since(self.started_at)
            .unwrap_or_default();
        Duration::from_secs(d.as_secs())
    }

    /// Human-readable status name of the final code.
    #[must_use]
    pub fn status(&self) -> String {
        self.code.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worst_prefers_more_severe_code() {
        assert_eq!(Code::Pass.worst(Code::Fail), Code::Fail);
        assert_eq!(Code::Fail.worst(Code::Pass), Code::Fail);
        assert_eq!(Code::Fail.worst(Code::Abort), Code::Abort);
        assert_eq!(Code::Abort.worst(Code::TopoFail), Code::TopoFail);
        assert_eq!(Code::TopoFail.worst(Code::ConnFail), Code::ConnFail);
        assert_eq!(Code::ConnFail.worst(Code::Unknown), Code::Unknown);
    }

    #[test]
    fn skipped_never_wins_against_real_codes() {
        assert_eq!(Code::Skipped.worst(Code::Pass), Code::Pass);
        assert_eq!(Code::Fail.worst(Code::Skipped), Code::Fail);
        assert_eq!(Code::Skipped.worst(Code::Skipped), Code::Skipped);
    }

    #[test]
    fn status_names_match_report_vocabulary() {
        assert_eq!(Code::Pass.to_string(), "PASS");
        assert_eq!(Code::TopoFail.to_string(), "TOPO_FAIL");
        assert_eq!(Code::ConnFail.to_string(), "CONN_FAIL");
        assert_eq!(Code::Skipped.to_string(), "SKIPPED");
    }
}
