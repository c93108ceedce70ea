//! Suite scheduling and execution.
//!
//! The suite orders scheduled testcases into topology groups, drives each
//! group's topology lifecycle, threads the running fixture-chain state
//! between consecutive testcases, and aggregates every final result code
//! into a histogram.

use std::mem;

use linked_hash_map::LinkedHashMap;
use smart_default::SmartDefault;

use crate::{
    callback::{Notice, Point, Registry},
    debug::DebugHook,
    error::EngineError,
    event::Event,
    fixture::AppliedChain,
    result::{CaseResult, Code, Failure, Phase},
    testcase::{Case, RunEnd},
    topology::{NoopResolver, Resolver},
    writer::Writer,
};

/// Per-run execution options.
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct RunOpts {
    /// Substitutes real environment interaction with a no-op stand-in and
    /// forces continue-on-fail, so every step's logic gets exercised.
    pub dry_run: bool,

    /// Invokes the registered debug hook at step fault sites.
    pub pause_on_fail: bool,

    /// Initializes the first scheduled group's topology, then stops without
    /// running any testcase. Leaves the topology up for manual use.
    pub topo_only: bool,

    /// Overrides every testcase's own continue-on-fail setting when set.
    #[default(None)]
    pub continue_on_fail: Option<bool>,
}

/// Histogram of final result statuses, keyed by human-readable status name
/// in first-seen order.
#[derive(Clone, Debug, Default)]
pub struct Histogram {
    counts: LinkedHashMap<String, usize>,
}

impl Histogram {
    pub(crate) fn record(&mut self, code: Code) {
        *self.counts.entry(code.to_string()).or_insert(0) += 1;
    }

    /// Count recorded under the given status name.
    #[must_use]
    pub fn get(&self, status: &str) -> usize {
        self.counts.get(status).copied().unwrap_or(0)
    }

    /// Status names with their counts, in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Total number of recorded testcases.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Indicates whether nothing was recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Overall suite success: every status key is either `PASS` or
    /// `SKIPPED`. Vacuously true for an empty suite.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.counts.keys().all(|k| k == "PASS" || k == "SKIPPED")
    }
}

/// Executor of scheduled testcases.
///
/// Owns the shared world, the topology resolver and the progress sink; all
/// three are handed to it once, at construction, and torn down with it when
/// the run completes.
pub struct Suite<W, Wr> {
    world: W,
    writer: Wr,
    resolver: Box<dyn Resolver>,
    hook: Option<Box<dyn DebugHook>>,
    callbacks: Registry,
    cases: Vec<Case<W>>,
    results: Vec<CaseResult>,
}

impl<W, Wr: Writer + 'static> Suite<W, Wr> {
    /// Creates a suite around a shared world, a topology resolver and a
    /// progress sink.
    #[must_use]
    pub fn new(world: W, resolver: impl Resolver + 'static, writer: Wr) -> Self {
        Self {
            world,
            writer,
            resolver: Box::new(resolver),
            hook: None,
            callbacks: Registry::default(),
            cases: Vec::new(),
            results: Vec::new(),
        }
    }

    /// Attaches the debug hook invoked at fault sites under pause-on-fail.
    #[must_use]
    pub fn debug_hook(mut self, hook: impl DebugHook + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    /// Registers a lifecycle callback. Any number of handlers may subscribe
    /// to one point; they run in registration order.
    pub fn register_callback(
        &mut self,
        point: Point,
        handler: impl Fn(Notice<'_>) + 'static,
    ) {
        self.callbacks.register(point, handler);
    }

    /// Schedules a testcase.
    ///
    /// # Errors
    ///
    /// [`EngineError::NoTopology`] if the definition carries no topology
    /// binding: such definitions are libraries for derivation, not
    /// schedulable testcases.
    pub fn schedule(&mut self, case: Case<W>) -> Result<(), EngineError> {
        if case.topology().is_none() {
            return Err(EngineError::NoTopology {
                name: case.name().to_owned(),
            });
        }
        self.cases.push(case);
        Ok(())
    }

    /// The shared world.
    #[must_use]
    pub fn world(&self) -> &W {
        &self.world
    }

    /// Results of every testcase recorded so far, in execution order.
    #[must_use]
    pub fn results(&self) -> &[CaseResult] {
        &self.results
    }

    /// The progress sink.
    #[must_use]
    pub fn writer(&self) -> &Wr {
        &self.writer
    }

    /// Runs every scheduled testcase and returns overall suite success.
    ///
    /// Topology groups run sequentially, smaller groups first; within one
    /// group, testcases sharing a fixture-chain prefix run adjacently so
    /// the shared prefix's environment survives between them. A topology
    /// initialization fault marks the whole group `TOPO_FAIL` and the run
    /// moves to the next group.
    ///
    /// # Errors
    ///
    /// [`EngineError::Interrupted`] if an operator interrupt surfaced from a
    /// testcase. The interrupted testcase's teardown and its group's
    /// topology cleanup have already run, and its result is recorded.
    pub async fn run(&mut self, opts: RunOpts) -> Result<bool, EngineError> {
        let Self {
            world,
            writer,
            resolver,
            hook,
            callbacks,
            cases,
            results,
        } = self;

        let groups = order(mem::take(cases));
        let names = groups
            .iter()
            .flatten()
            .map(|case| case.name().to_owned())
            .collect::<Vec<_>>();
        callbacks.emit(Point::OnCasesLoad, Notice::CasesLoad { cases: &names });
        writer
            .handle_event(Event::SuiteStarted { cases: names.len() })
            .await;

        let noop = NoopResolver;
        let resolver: &dyn Resolver = if opts.dry_run {
            &noop
        } else {
            resolver.as_ref()
        };
        let forced_continue = if opts.dry_run {
            Some(true)
        } else {
            opts.continue_on_fail
        };

        let mut histogram = Histogram::default();
        let mut interrupted = false;
        let mut topo_ready_stop = false;

        'groups: for group in &groups {
            let Some(first) = group.first() else { continue };
            let topo_id = first.topology().unwrap_or("");

            let Some(topology) = resolver.resolve(topo_id) else {
                // Unknown identifier: the group is skipped, not failed.
                for case in group {
                    let result =
                        CaseResult::unrun(case.name(), case.step_count(), Code::Skipped);
                    writer.handle_event(Event::CaseFinished { result: &result }).await;
                    histogram.record(result.code);
                    results.push(result);
                }
                continue;
            };

            callbacks.emit(Point::BeforeTopoInit, Notice::Topology { name: topo_id });
            writer.handle_event(Event::TopologyInit { name: topo_id }).await;
            if let Err(fault) = topology.init(!first.connect_devices()).await {
                writer
                    .handle_event(Event::TopologyFailed {
                        name: topo_id,
                        error: &fault.to_string(),
                    })
                    .await;
                let code = fault.code();
                for case in group {
                    let result = CaseResult::unrun(case.name(), case.step_count(), code);
                    writer.handle_event(Event::CaseFinished { result: &result }).await;
                    histogram.record(result.code);
                    results.push(result);
                }
                continue;
            }
            callbacks.emit(Point::OnTopoInit, Notice::Topology { name: topo_id });
            writer.handle_event(Event::TopologyReady { name: topo_id }).await;

            if opts.topo_only {
                // Leave the topology up and stop before any testcase runs;
                // the report still fires below.
                topo_ready_stop = true;
                break;
            }

            let mut applied = AppliedChain::new();
            for (idx, case) in group.iter().enumerate() {
                // The upcoming testcase's chain decides how much of the
                // applied chain survives this run's teardown. Group
                // boundaries always force full teardown.
                let next_chain = group
                    .get(idx + 1)
                    .map(Case::chain_names)
                    .unwrap_or_default();

                callbacks.emit(
                    Point::BeforeCaseRun,
                    Notice::CaseRun { name: case.name(), result: None },
                );
                let continue_on_fail =
                    forced_continue.unwrap_or_else(|| case.continue_on_fail());
                let end = case
                    .run(
                        world,
                        &opts,
                        continue_on_fail,
                        hook.as_deref(),
                        writer,
                        &mut applied,
                        &next_chain,
                    )
                    .await;
                let (mut result, case_interrupted) = match end {
                    RunEnd::Completed(result) => (result, false),
                    RunEnd::Interrupted(result) => (result, true),
                };

                let last_in_group = idx + 1 == group.len();
                if last_in_group || case_interrupted {
                    if let Err(fault) = topology.clean().await {
                        writer
                            .handle_event(Event::TopologyFailed {
                                name: topo_id,
                                error: &fault.to_string(),
                            })
                            .await;
                        // The fault degrades the adjacent testcase's code;
                        // its step outcomes stay recorded.
                        result.code = Code::TopoFail;
                        result.failed_on.push(Failure {
                            phase: Phase::Cleanup,
                            description: fault.to_string(),
                        });
                    } else {
                        writer
                            .handle_event(Event::TopologyCleaned { name: topo_id })
                            .await;
                    }
                }

                histogram.record(result.code);
                callbacks.emit(
                    Point::OnCaseRun,
                    Notice::CaseRun {
                        name: case.name(),
                        result: Some(&result),
                    },
                );
                results.push(result);

                if case_interrupted {
                    interrupted = true;
                    break 'groups;
                }
            }
        }

        *cases = groups.into_iter().flatten().collect();
        if interrupted {
            return Err(EngineError::Interrupted);
        }

        callbacks.emit(Point::OnReport, Notice::Report { histogram: &histogram });
        let success = topo_ready_stop || histogram.is_success();
        writer
            .handle_event(Event::SuiteFinished {
                histogram: &histogram,
                success,
            })
            .await;
        Ok(success)
    }
}

/// Orders scheduled testcases for execution.
///
/// Testcases are grouped by topology identifier; within each group they are
/// sorted by fixture-chain names so shared prefixes become adjacent; groups
/// themselves run in ascending case-count order. The count ordering is a
/// heuristic (fail small suites fast), not a correctness requirement.
fn order<W>(cases: Vec<Case<W>>) -> Vec<Vec<Case<W>>> {
    let mut by_topology: LinkedHashMap<String, Vec<Case<W>>> = LinkedHashMap::new();
    for case in cases {
        by_topology
            .entry(case.topology().unwrap_or("").to_owned())
            .or_insert_with(Vec::new)
            .push(case);
    }
    let mut groups = by_topology.into_iter().map(|(_, g)| g).collect::<Vec<_>>();
    for group in &mut groups {
        group.sort_by_cached_key(Case::chain_names);
    }
    groups.sort_by_key(Vec::len);
    groups
}

#[cfg(test)]
mod tests {
    use futures::{future::LocalBoxFuture, FutureExt as _};

    use super::*;
    use crate::step::{Context, Outcome, StepSet};

    fn noop_step(_: Context<'_, ()>) -> LocalBoxFuture<'_, Outcome> {
        async { Outcome::Done }.boxed_local()
    }

    fn case(name: &str, topology: &str, chain: &[&str]) -> Case<()> {
        let mut builder = Case::builder(name)
            .topology(topology)
            .steps(StepSet::new().step(1, "", noop_step));
        for entry in chain {
            builder = builder.fixture(crate::fixture::Fixture::new(*entry));
        }
        builder.build().expect("valid definition")
    }

    #[test]
    fn ordering_groups_by_topology_and_sorts_chains() {
        let groups = order(vec![
            case("c", "big", &["Base", "L2"]),
            case("a", "small", &["Base"]),
            case("d", "big", &["Base"]),
            case("b", "big", &["Alt"]),
        ]);

        let names = groups
            .iter()
            .map(|g| g.iter().map(Case::name).collect::<Vec<_>>())
            .collect::<Vec<_>>();
        // Smaller group first; within a group, chains sort lexicographically
        // so shared prefixes become adjacent.
        assert_eq!(names, vec![vec!["a"], vec!["b", "d", "c"]]);
    }

    #[test]
    fn histogram_success_requires_only_pass_and_skipped() {
        let mut histogram = Histogram::default();
        assert!(histogram.is_success());

        histogram.record(Code::Pass);
        histogram.record(Code::Skipped);
        histogram.record(Code::Pass);
        assert!(histogram.is_success());
        assert_eq!(histogram.get("PASS"), 2);
        assert_eq!(histogram.get("SKIPPED"), 1);
        assert_eq!(histogram.total(), 3);

        histogram.record(Code::Fail);
        assert!(!histogram.is_success());
    }
}
