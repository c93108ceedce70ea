//! Testcase definitions and the run state machine.
//!
//! A testcase runs init fixtures, then its steps, then cleanup fixtures.
//! Teardown and final reporting have a unique author: they execute
//! regardless of how initialization or the steps terminate, including on an
//! operator interrupt, which is re-raised only after teardown completed.

use std::{panic::AssertUnwindSafe, time::SystemTime};

use futures::FutureExt as _;

use crate::{
    debug::DebugHook,
    error::EngineError,
    event::Event,
    fixture::{AppliedChain, Fixture, FixtureChain},
    result::{CaseResult, Code, Failure, Phase, Stage},
    runner,
    step::{Context, Outcome, Params, StepFn, StepSet, StepTag},
    suite::RunOpts,
    writer::Writer,
};

/// One procedural testcase: ordered steps bound to a topology, with a
/// fixture chain derived from the definition's ancestry.
///
/// Definitions are immutable once built; the suite creates no per-run copy
/// because the run mutates only its own [`CaseResult`].
pub struct Case<W> {
    name: String,
    description: String,
    topology: Option<String>,
    chain: FixtureChain<W>,
    steps: StepSet<W>,
    params: Params,
    continue_on_fail: bool,
    connect_devices: bool,
}

impl<W> Case<W> {
    /// Starts building a testcase definition.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> CaseBuilder<W> {
        CaseBuilder {
            name: name.into(),
            description: String::new(),
            topology: None,
            chain: FixtureChain::new(),
            steps: StepSet::new(),
            params: Params::new(),
            continue_on_fail: false,
            connect_devices: true,
        }
    }

    /// Testcase name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Topology identifier this testcase is bound to. A definition without
    /// one is library-only and cannot be scheduled.
    #[must_use]
    pub fn topology(&self) -> Option<&str> {
        self.topology.as_deref()
    }

    /// The full fixture chain, outermost ancestor first.
    #[must_use]
    pub fn chain(&self) -> &FixtureChain<W> {
        &self.chain
    }

    /// Fixture chain entry names, used for scheduling adjacency.
    #[must_use]
    pub fn chain_names(&self) -> Vec<String> {
        self.chain.names()
    }

    /// Instantiation parameters.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Whether remaining steps still run after one fails.
    #[must_use]
    pub const fn continue_on_fail(&self) -> bool {
        self.continue_on_fail
    }

    /// Whether topology init should establish device sessions.
    #[must_use]
    pub const fn connect_devices(&self) -> bool {
        self.connect_devices
    }

    /// Number of declared step groups.
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub(crate) async fn run(
        &self,
        world: &W,
        opts: &RunOpts,
        continue_on_fail: bool,
        hook: Option<&dyn DebugHook>,
        writer: &mut dyn Writer,
        applied: &mut AppliedChain<W>,
        next_chain: &[String],
    ) -> RunEnd {
        let mut result = CaseResult::new(&self.name, self.steps.len());
        writer
            .handle_event(Event::CaseStarted {
                name: &self.name,
                description: &self.description,
            })
            .await;
        result.stage = Stage::Init;
        result.code = Code::Pass;

        let cx = Context { world, params: &self.params };
        let mut interrupted = false;
        let mut next = next_chain;

        if applied.is_prefix_of(&self.chain) {
            interrupted = self.initialize(cx, writer, applied, &mut result).await;
            if interrupted {
                next = &[];
            } else if result.code.is_pass() {
                interrupted = self
                    .run_steps(cx, opts, continue_on_fail, hook, writer, &mut result)
                    .await;
                if interrupted {
                    next = &[];
                }
            }
        } else {
            // Scheduling-invariant violation: surface it as a testcase-level
            // fault and tear down everything previously recorded.
            next = &[];
            result.code = Code::Abort;
            result.failed_on.push(Failure {
                phase: Phase::Init,
                description: EngineError::ChainMismatch.to_string(),
            });
        }

        interrupted |= self.teardown(cx, writer, applied, next, &mut result).await;

        result.finished_at = SystemTime::now();
        result.stage = Stage::Finished;
        writer.handle_event(Event::CaseFinished { result: &result }).await;
        if interrupted {
            RunEnd::Interrupted(result)
        } else {
            RunEnd::Completed(result)
        }
    }

    /// Applies the suffix of the chain not covered by `applied`, outermost
    /// first. Returns whether an interrupt was observed.
    async fn initialize(
        &self,
        cx: Context<'_, W>,
        writer: &mut dyn Writer,
        applied: &mut AppliedChain<W>,
        result: &mut CaseResult,
    ) -> bool {
        let already = applied.len();
        for fixture in self.chain.entries().iter().skip(already) {
            if let Some(setup) = fixture.setup_fn() {
                writer
                    .handle_event(Event::FixtureSetup {
                        case: &self.name,
                        fixture: fixture.name(),
                    })
                    .await;
                let caught = AssertUnwindSafe(setup(cx)).catch_unwind().await;
                match caught {
                    Ok(Outcome::Interrupted) => {
                        result.code = Code::Abort;
                        result.failed_on.push(Failure {
                            phase: Phase::Init,
                            description: EngineError::Interrupted.to_string(),
                        });
                        return true;
                    }
                    Ok(outcome) => {
                        let (code, msg) = outcome.split("testcase initialization failed");
                        if code == Code::Skipped {
                            result.code = Code::Skipped;
                            return false;
                        }
                        if !code.is_pass() {
                            result.code = code;
                            result.failed_on.push(Failure {
                                phase: Phase::Init,
                                description: msg,
                            });
                            return false;
                        }
                    }
                    Err(payload) => {
                        result.code = Code::Abort;
                        result.failed_on.push(Failure {
                            phase: Phase::Init,
                            description: runner::panic_message(&payload),
                        });
                        return false;
                    }
                }
            }
            applied.apply(fixture);
        }
        false
    }

    /// Executes step groups in ascending sequence-id order. Returns whether
    /// an interrupt was observed.
    async fn run_steps(
        &self,
        cx: Context<'_, W>,
        opts: &RunOpts,
        continue_on_fail: bool,
        hook: Option<&dyn DebugHook>,
        writer: &mut dyn Writer,
        result: &mut CaseResult,
    ) -> bool {
        result.stage = Stage::Step;
        for (id, subs) in self.steps.iter() {
            writer
                .handle_event(Event::StepStarted {
                    case: &self.name,
                    tag: StepTag::step(id),
                })
                .await;
            let report = runner::run_step(cx, &self.name, subs, opts.pause_on_fail, hook).await;
            result.step_run += 1;
            for sub in &report.results {
                writer
                    .handle_event(Event::StepFinished {
                        case: &self.name,
                        result: sub,
                    })
                    .await;
            }
            result.step_results.push(report.results);
            if report.interrupted {
                result.code = result.code.worst(report.code);
                result.failed_on.push(Failure {
                    phase: Phase::Step(id),
                    description: report.message,
                });
                return true;
            }
            if !report.code.is_pass() {
                result.code = result.code.worst(report.code);
                result.failed_on.push(Failure {
                    phase: Phase::Step(id),
                    description: report.message,
                });
                if !continue_on_fail {
                    break;
                }
            }
        }
        false
    }

    /// Tears down the tail of the applied chain not shared with the next
    /// testcase's chain, innermost first. Failures are annotated but never
    /// change the already-decided result code, and never block teardown of
    /// the remaining entries. Returns whether an interrupt was observed.
    async fn teardown(
        &self,
        cx: Context<'_, W>,
        writer: &mut dyn Writer,
        applied: &mut AppliedChain<W>,
        next_chain: &[String],
        result: &mut CaseResult,
    ) -> bool {
        result.stage = Stage::Clean;
        let mut interrupted = false;
        let keep = applied.common_prefix(next_chain);
        while applied.len() > keep {
            let Some(entry) = applied.pop() else { break };
            let Some(teardown) = entry.teardown else { continue };
            writer
                .handle_event(Event::FixtureTeardown {
                    case: &self.name,
                    fixture: &entry.name,
                })
                .await;
            let caught = AssertUnwindSafe(teardown(cx)).catch_unwind().await;
            match caught {
                Ok(Outcome::Interrupted) => interrupted = true,
                Ok(outcome) => {
                    let (code, msg) = outcome.split("testcase cleaning up failed");
                    if code.is_failing() {
                        result.failed_on.push(Failure {
                            phase: Phase::Cleanup,
                            description: format!("teardown of `{}` failed: {msg}", entry.name),
                        });
                    }
                }
                Err(payload) => {
                    result.failed_on.push(Failure {
                        phase: Phase::Cleanup,
                        description: format!(
                            "teardown of `{}` panicked: {}",
                            entry.name,
                            runner::panic_message(&payload),
                        ),
                    });
                }
            }
        }
        interrupted
    }
}

// Implemented manually to omit a redundant `W: Debug` trait bound.
impl<W> std::fmt::Debug for Case<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Case")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("topology", &self.topology)
            .field("chain", &self.chain)
            .field("steps", &self.steps)
            .field("params", &self.params)
            .field("continue_on_fail", &self.continue_on_fail)
            .field("connect_devices", &self.connect_devices)
            .finish()
    }
}

// Implemented manually to omit a redundant `W: Clone` trait bound.
impl<W> Clone for Case<W> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            description: self.description.clone(),
            topology: self.topology.clone(),
            chain: self.chain.clone(),
            steps: self.steps.clone(),
            params: self.params.clone(),
            continue_on_fail: self.continue_on_fail,
            connect_devices: self.connect_devices,
        }
    }
}

/// How a testcase run ended, from the scheduler's point of view.
pub(crate) enum RunEnd {
    /// The run completed; the suite continues with the next testcase.
    Completed(CaseResult),
    /// An operator interrupt was observed; teardown already ran, the suite
    /// must abort after recording the result.
    Interrupted(CaseResult),
}

/// Builder of a [`Case`] definition.
pub struct CaseBuilder<W> {
    name: String,
    description: String,
    topology: Option<String>,
    chain: FixtureChain<W>,
    steps: StepSet<W>,
    params: Params,
    continue_on_fail: bool,
    connect_devices: bool,
}

impl<W> CaseBuilder<W> {
    /// Sets the human-readable description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Binds the testcase to a topology identifier.
    #[must_use]
    pub fn topology(mut self, id: impl Into<String>) -> Self {
        self.topology = Some(id.into());
        self
    }

    /// Replaces the fixture chain, typically with a parent definition's
    /// chain to express the "extends" relation.
    #[must_use]
    pub fn chain(mut self, chain: FixtureChain<W>) -> Self {
        self.chain = chain;
        self
    }

    /// Appends a fixture entry at the innermost position of the chain.
    #[must_use]
    pub fn fixture(mut self, fixture: Fixture<W>) -> Self {
        self.chain = self.chain.entry(fixture);
        self
    }

    /// Sets the step registration table.
    #[must_use]
    pub fn steps(mut self, steps: StepSet<W>) -> Self {
        self.steps = steps;
        self
    }

    /// Registers a step by its conventional name, `step<N>` or
    /// `step<N>_<M>`.
    ///
    /// # Errors
    ///
    /// [`EngineError::BadStepName`] if the name does not encode a step id.
    pub fn named_step(
        mut self,
        name: &str,
        desc: impl Into<String>,
        func: StepFn<W>,
    ) -> Result<Self, EngineError> {
        self.steps = self.steps.named(name, desc, func)?;
        Ok(self)
    }

    /// Sets one instantiation parameter.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key, value);
        self
    }

    /// Keeps running remaining steps after a step fails.
    #[must_use]
    pub const fn continue_on_fail(mut self, enabled: bool) -> Self {
        self.continue_on_fail = enabled;
        self
    }

    /// Controls whether topology init establishes device sessions.
    #[must_use]
    pub const fn connect_devices(mut self, enabled: bool) -> Self {
        self.connect_devices = enabled;
        self
    }

    /// Finishes the definition.
    ///
    /// # Errors
    ///
    /// [`EngineError::NoSteps`] if no steps were registered: a testcase with
    /// zero steps is a hard configuration error.
    pub fn build(self) -> Result<Case<W>, EngineError> {
        if self.steps.is_empty() {
            return Err(EngineError::NoSteps { name: self.name });
        }
        Ok(Case {
            name: self.name,
            description: self.description,
            topology: self.topology,
            chain: self.chain,
            steps: self.steps,
            params: self.params,
            continue_on_fail: self.continue_on_fail,
            connect_devices: self.connect_devices,
        })
    }
}
