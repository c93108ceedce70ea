use std::cell::RefCell;

use futures::{future::LocalBoxFuture, FutureExt as _};
use maestro::{
    step::{Context, Outcome, StepSet},
    topology::NoopResolver,
    writer::Discard,
    Case, Code, EngineError, Fixture, Phase, RunOpts, Stage, Suite,
};

#[derive(Debug, Default)]
struct World {
    log: RefCell<Vec<String>>,
}

impl World {
    fn push(&self, entry: &str) {
        self.log.borrow_mut().push(entry.to_owned());
    }
}

fn suite(case: Case<World>) -> Suite<World, Discard> {
    let mut suite = Suite::new(World::default(), NoopResolver, Discard);
    suite.schedule(case).expect("topology-bound testcase");
    suite
}

fn outer_setup(cx: Context<'_, World>) -> LocalBoxFuture<'_, Outcome> {
    async move {
        cx.world.push("Outer.setup");
        Outcome::pass()
    }
    .boxed_local()
}

fn outer_teardown(cx: Context<'_, World>) -> LocalBoxFuture<'_, Outcome> {
    async move {
        cx.world.push("Outer.teardown");
        Outcome::pass()
    }
    .boxed_local()
}

fn inner_setup(cx: Context<'_, World>) -> LocalBoxFuture<'_, Outcome> {
    async move {
        cx.world.push("Inner.setup");
        Outcome::pass()
    }
    .boxed_local()
}

fn inner_teardown(cx: Context<'_, World>) -> LocalBoxFuture<'_, Outcome> {
    async move {
        cx.world.push("Inner.teardown");
        Outcome::pass()
    }
    .boxed_local()
}

fn inner_setup_failing(cx: Context<'_, World>) -> LocalBoxFuture<'_, Outcome> {
    async move {
        cx.world.push("Inner.setup");
        Outcome::fail("vlan allocation failed")
    }
    .boxed_local()
}

fn inner_setup_panicking(cx: Context<'_, World>) -> LocalBoxFuture<'_, Outcome> {
    async move {
        cx.world.push("Inner.setup");
        panic!("console unreachable");
    }
    .boxed_local()
}

fn step1(cx: Context<'_, World>) -> LocalBoxFuture<'_, Outcome> {
    async move {
        cx.world.push("step1");
        Outcome::Done
    }
    .boxed_local()
}

fn step2(cx: Context<'_, World>) -> LocalBoxFuture<'_, Outcome> {
    async move {
        cx.world.push("step2");
        Outcome::Done
    }
    .boxed_local()
}

fn step1_failing(cx: Context<'_, World>) -> LocalBoxFuture<'_, Outcome> {
    async move {
        cx.world.push("step1");
        Outcome::fail("port did not come up")
    }
    .boxed_local()
}

fn step1_panicking(cx: Context<'_, World>) -> LocalBoxFuture<'_, Outcome> {
    async move {
        cx.world.push("step1");
        panic!("lost device session");
    }
    .boxed_local()
}

fn step1_checking(_: Context<'_, World>) -> LocalBoxFuture<'_, Outcome> {
    async {
        maestro::check!(1 == 2, "expected port count 2");
        Outcome::Done
    }
    .boxed_local()
}

fn step1_interrupting(cx: Context<'_, World>) -> LocalBoxFuture<'_, Outcome> {
    async move {
        cx.world.push("step1");
        Outcome::Interrupted
    }
    .boxed_local()
}

fn chained(name: &str, steps: StepSet<World>) -> Case<World> {
    Case::builder(name)
        .topology("t1")
        .fixture(Fixture::new("Outer").setup(outer_setup).teardown(outer_teardown))
        .fixture(Fixture::new("Inner").setup(inner_setup).teardown(inner_teardown))
        .steps(steps)
        .build()
        .expect("valid definition")
}

#[tokio::test]
async fn passing_case_runs_phases_in_order() {
    let case = chained(
        "happy",
        StepSet::new().step(1, "first", step1).step(2, "second", step2),
    );
    let mut suite = suite(case);

    let success = suite.run(RunOpts::default()).await.expect("no interrupt");

    assert!(success);
    assert_eq!(
        *suite.world().log.borrow(),
        vec![
            "Outer.setup",
            "Inner.setup",
            "step1",
            "step2",
            "Inner.teardown",
            "Outer.teardown",
        ],
    );
    let result = &suite.results()[0];
    assert_eq!(result.code, Code::Pass);
    assert_eq!(result.stage, Stage::Finished);
    assert_eq!(result.step_run, 2);
    assert_eq!(result.step_count, 2);
    assert!(result.failed_on.is_empty());
}

#[tokio::test]
async fn failing_init_fixture_skips_steps_but_tears_down_applied_entries() {
    let case = Case::builder("bad_init")
        .topology("t1")
        .fixture(Fixture::new("Outer").setup(outer_setup).teardown(outer_teardown))
        .fixture(Fixture::new("Inner").setup(inner_setup_failing).teardown(inner_teardown))
        .steps(StepSet::new().step(1, "never runs", step1))
        .build()
        .expect("valid definition");
    let mut suite = suite(case);

    let success = suite.run(RunOpts::default()).await.expect("no interrupt");

    assert!(!success);
    // The entry whose setup failed was never applied, so only `Outer` is
    // torn down.
    assert_eq!(
        *suite.world().log.borrow(),
        vec!["Outer.setup", "Inner.setup", "Outer.teardown"],
    );
    let result = &suite.results()[0];
    assert_eq!(result.code, Code::Fail);
    assert_eq!(result.step_run, 0);
    assert_eq!(result.failed_on.len(), 1);
    assert_eq!(result.failed_on[0].phase, Phase::Init);
    assert_eq!(result.failed_on[0].description, "vlan allocation failed");
}

#[tokio::test]
async fn panicking_init_fixture_aborts_the_case() {
    let case = Case::builder("wild_init")
        .topology("t1")
        .fixture(Fixture::new("Outer").setup(outer_setup).teardown(outer_teardown))
        .fixture(Fixture::new("Inner").setup(inner_setup_panicking).teardown(inner_teardown))
        .steps(StepSet::new().step(1, "never runs", step1))
        .build()
        .expect("valid definition");
    let mut suite = suite(case);

    let success = suite.run(RunOpts::default()).await.expect("no interrupt");

    assert!(!success);
    assert_eq!(
        *suite.world().log.borrow(),
        vec!["Outer.setup", "Inner.setup", "Outer.teardown"],
    );
    let result = &suite.results()[0];
    assert_eq!(result.code, Code::Abort);
    assert_eq!(result.step_run, 0);
    assert_eq!(result.failed_on[0].phase, Phase::Init);
    assert_eq!(result.failed_on[0].description, "console unreachable");
}

#[tokio::test]
async fn failing_step_stops_later_steps_but_not_teardown() {
    let case = chained(
        "fails",
        StepSet::new()
            .step(1, "fails", step1_failing)
            .step(2, "never runs", step2),
    );
    let mut suite = suite(case);

    let success = suite.run(RunOpts::default()).await.expect("no interrupt");

    assert!(!success);
    assert_eq!(
        *suite.world().log.borrow(),
        vec!["Outer.setup", "Inner.setup", "step1", "Inner.teardown", "Outer.teardown"],
    );
    let result = &suite.results()[0];
    assert_eq!(result.code, Code::Fail);
    assert_eq!(result.step_run, 1);
    assert_eq!(result.failed_on.len(), 1);
    assert_eq!(result.failed_on[0].phase, Phase::Step(1));
    assert_eq!(result.failed_on[0].description, "port did not come up");
}

#[tokio::test]
async fn continue_on_fail_runs_remaining_steps() {
    let case = Case::builder("continues")
        .topology("t1")
        .continue_on_fail(true)
        .steps(
            StepSet::new()
                .step(1, "fails", step1_failing)
                .step(2, "still runs", step2),
        )
        .build()
        .expect("valid definition");
    let mut suite = suite(case);

    let success = suite.run(RunOpts::default()).await.expect("no interrupt");

    assert!(!success);
    assert_eq!(*suite.world().log.borrow(), vec!["step1", "step2"]);
    let result = &suite.results()[0];
    assert_eq!(result.code, Code::Fail);
    assert_eq!(result.step_run, 2);
}

#[tokio::test]
async fn panic_inside_step_aborts_the_case() {
    let case = chained("panics", StepSet::new().step(1, "panics", step1_panicking));
    let mut suite = suite(case);

    let success = suite.run(RunOpts::default()).await.expect("no interrupt");

    assert!(!success);
    let result = &suite.results()[0];
    assert_eq!(result.code, Code::Abort);
    assert_eq!(result.failed_on[0].phase, Phase::Step(1));
    assert_eq!(result.failed_on[0].description, "lost device session");
    // Teardown still ran.
    assert_eq!(
        suite.world().log.borrow().last().map(String::as_str),
        Some("Outer.teardown"),
    );
}

#[tokio::test]
async fn failed_check_is_a_failure_not_an_abort() {
    let case = chained("checks", StepSet::new().step(1, "checks", step1_checking));
    let mut suite = suite(case);

    suite.run(RunOpts::default()).await.expect("no interrupt");

    let result = &suite.results()[0];
    assert_eq!(result.code, Code::Fail);
    assert!(result.failed_on[0].description.starts_with("Assertion fail:"));
    assert!(result.failed_on[0].description.contains("expected port count 2"));
}

#[tokio::test]
async fn interrupt_tears_down_then_aborts_the_suite() {
    let interrupting = chained(
        "interrupts",
        StepSet::new()
            .step(1, "interrupts", step1_interrupting)
            .step(2, "never runs", step2),
    );
    let follower = Case::builder("never_runs")
        .topology("t1")
        // Sorts after the interrupting case's chain.
        .fixture(Fixture::new("Zz"))
        .steps(StepSet::new().step(1, "unreached", step2))
        .build()
        .expect("valid definition");

    let mut suite = suite(interrupting);
    suite.schedule(follower).expect("topology-bound testcase");

    let err = suite.run(RunOpts::default()).await.expect_err("interrupt");
    assert_eq!(err, EngineError::Interrupted);

    // The interrupted case's full teardown still ran, and its result was
    // recorded; the follower never started.
    assert_eq!(
        *suite.world().log.borrow(),
        vec!["Outer.setup", "Inner.setup", "step1", "Inner.teardown", "Outer.teardown"],
    );
    assert_eq!(suite.results().len(), 1);
    let result = &suite.results()[0];
    assert_eq!(result.name, "interrupts");
    assert_eq!(result.code, Code::Abort);
    assert_eq!(result.step_run, 1);
}
