//! Engine-internal error types.

use derive_more::with_trait::{Display, Error};

/// Errors raised by the orchestration engine itself.
///
/// Faults inside user-provided steps and fixtures are captured into result
/// codes instead; only configuration defects, scheduling-invariant
/// violations and operator interrupts surface as errors.
#[derive(Clone, Debug, Display, Error, Eq, PartialEq)]
pub enum EngineError {
    /// A testcase definition declares no steps at all.
    #[display("no steps defined in testcase `{name}`")]
    NoSteps {
        /// Name of the offending testcase.
        name: String,
    },

    /// A step name does not follow the `step<N>[_<M>]` convention.
    #[display("step name `{name}` not supported")]
    BadStepName {
        /// The rejected name.
        name: String,
    },

    /// A testcase without a topology binding was scheduled. Such
    /// definitions are libraries for derivation, not runnable testcases.
    #[display("testcase `{name}` has no topology binding")]
    NoTopology {
        /// Name of the offending testcase.
        name: String,
    },

    /// The fixture chain remembered by the scheduler is not a prefix of the
    /// current testcase's chain.
    #[display("former fixture chain not cleaned up properly")]
    ChainMismatch,

    /// An operator interrupt aborted the suite. Teardown of the current
    /// testcase has already been attempted when this is raised.
    #[display("operator interrupt")]
    Interrupted,
}
