//! Test-orchestration engine for procedural, stateful integration tests run
//! against shared device topologies.
//!
//! Testcases are built from ordered [`step`]s and an inherited chain of
//! [`fixture`]s; the [`Suite`] groups them by topology, keeps shared
//! fixture-chain prefixes alive between adjacent runs, and aggregates every
//! final result code into a [`Histogram`].
//!
//! ```rust
//! use futures::FutureExt as _;
//! use maestro::{
//!     step::{Context, Outcome, StepSet},
//!     topology::NoopResolver,
//!     writer::Discard,
//!     Case, RunOpts, Suite,
//! };
//!
//! # fn main() -> Result<(), maestro::EngineError> {
//! fn step1(_: Context<'_, ()>) -> futures::future::LocalBoxFuture<'_, Outcome> {
//!     async { Outcome::Done }.boxed_local()
//! }
//!
//! let case = Case::builder("smoke")
//!     .topology("loopback")
//!     .steps(StepSet::new().step(1, "does nothing", step1))
//!     .build()?;
//!
//! let mut suite = Suite::new((), NoopResolver, Discard);
//! suite.schedule(case)?;
//! let success = futures::executor::block_on(suite.run(RunOpts::default()))?;
//! assert!(success);
//! # Ok(()) }
//! ```

#![deny(rust_2018_idioms, unused_crate_dependencies)]
#![forbid(unsafe_code)]

pub mod callback;
pub mod debug;
pub mod error;
pub mod event;
pub mod fixture;
mod macros;
pub mod result;
mod runner;
pub mod step;
pub mod suite;
pub mod testcase;
pub mod topology;
pub mod writer;

#[cfg(test)]
use tokio as _;

#[doc(inline)]
pub use self::{
    error::EngineError,
    event::Event,
    fixture::{Fixture, FixtureChain, FixtureFn},
    result::{CaseResult, Code, Failure, Phase, Stage, StepResult},
    step::{Context, Outcome, Params, StepFn, StepSet, StepTag},
    suite::{Histogram, RunOpts, Suite},
    testcase::{Case, CaseBuilder},
    topology::{EnvFault, Resolver, Topology},
    writer::Writer,
};

/// Panic-payload marker distinguishing a failed [`check!`] from an arbitrary
/// fault.
pub const CHECK_FAILED: &str = "maestro: check failed";
