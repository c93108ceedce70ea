//! Structured progress events handed to a [`Writer`].
//!
//! [`Writer`]: crate::writer::Writer

use crate::{
    result::{CaseResult, StepResult},
    step::StepTag,
    suite::Histogram,
};

/// One progress notification of a suite run.
///
/// Events borrow from the engine's state; writers that need to retain data
/// copy what they keep.
#[derive(Clone, Copy, Debug)]
pub enum Event<'a> {
    /// Ordering finished, execution is about to start.
    SuiteStarted {
        /// Number of scheduled testcases.
        cases: usize,
    },

    /// A topology is about to be initialized.
    TopologyInit {
        /// Topology identifier.
        name: &'a str,
    },

    /// A topology finished initializing.
    TopologyReady {
        /// Topology identifier.
        name: &'a str,
    },

    /// Topology initialization or cleanup failed.
    TopologyFailed {
        /// Topology identifier.
        name: &'a str,
        /// Fault description.
        error: &'a str,
    },

    /// A topology was cleaned up after its group's last testcase.
    TopologyCleaned {
        /// Topology identifier.
        name: &'a str,
    },

    /// A testcase run started.
    CaseStarted {
        /// Testcase name.
        name: &'a str,
        /// Testcase description.
        description: &'a str,
    },

    /// An init fixture is about to run.
    FixtureSetup {
        /// Testcase name.
        case: &'a str,
        /// Fixture entry name.
        fixture: &'a str,
    },

    /// A cleanup fixture is about to run.
    FixtureTeardown {
        /// Testcase name.
        case: &'a str,
        /// Fixture entry name.
        fixture: &'a str,
    },

    /// A step group started.
    StepStarted {
        /// Testcase name.
        case: &'a str,
        /// Step identity.
        tag: StepTag,
    },

    /// A step or sub-step finished.
    StepFinished {
        /// Testcase name.
        case: &'a str,
        /// The finished step's result.
        result: &'a StepResult,
    },

    /// A testcase run finished, in any stage outcome.
    CaseFinished {
        /// The final result.
        result: &'a CaseResult,
    },

    /// All testcases finished.
    SuiteFinished {
        /// Histogram of final statuses.
        histogram: &'a Histogram,
        /// Overall suite success.
        success: bool,
    },
}
