//! Pluggable pause-on-fail capability.
//!
//! When pause-on-fail is enabled, the engine invokes the registered hook at
//! step fault sites. The hook may block its calling task for human input;
//! the engine only knows it may suspend there. Headless operation never
//! requires a hook.

use async_trait::async_trait;

use crate::{result::Stage, step::StepTag};

/// Location and context of a caught fault.
#[derive(Clone, Copy, Debug)]
pub struct FaultSite<'a> {
    /// Name of the testcase the fault happened in.
    pub case: &'a str,

    /// Stage of the run.
    pub stage: Stage,

    /// Step identity, when the fault happened inside a step.
    pub tag: Option<StepTag>,

    /// Captured fault message.
    pub message: &'a str,
}

/// Interactive breakpoint invoked at fault sites under pause-on-fail.
#[async_trait(?Send)]
pub trait DebugHook {
    /// Called at a fault site; may suspend until a human resumes the run.
    async fn pause(&self, site: FaultSite<'_>);
}

/// Hook that never suspends, for headless operation.
pub struct Headless;

#[async_trait(?Send)]
impl DebugHook for Headless {
    async fn pause(&self, _: FaultSite<'_>) {}
}
