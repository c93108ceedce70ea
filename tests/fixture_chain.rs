use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use async_trait::async_trait;
use futures::{future::LocalBoxFuture, FutureExt as _};
use maestro::{
    step::{Context, Outcome, StepSet},
    topology::{EnvFault, Resolver, Topology},
    writer::{Discard, Ext as _, Summarize},
    Case, Code, Fixture, RunOpts, Suite,
};

#[derive(Debug, Default)]
struct World {
    log: RefCell<Vec<String>>,
}

impl World {
    fn push(&self, entry: &str) {
        self.log.borrow_mut().push(entry.to_owned());
    }

    fn count(&self, entry: &str) -> usize {
        self.log.borrow().iter().filter(|e| *e == entry).count()
    }
}

#[derive(Debug, Default)]
struct Counts {
    init: Cell<usize>,
    clean: Cell<usize>,
}

struct Counting {
    name: String,
    counts: Rc<Counts>,
}

#[async_trait(?Send)]
impl Topology for Counting {
    fn name(&self) -> &str {
        &self.name
    }

    async fn init(&self, _disconnected: bool) -> Result<(), EnvFault> {
        self.counts.init.set(self.counts.init.get() + 1);
        Ok(())
    }

    async fn clean(&self) -> Result<(), EnvFault> {
        self.counts.clean.set(self.counts.clean.get() + 1);
        Ok(())
    }
}

struct CountingResolver {
    counts: Rc<Counts>,
}

impl Resolver for CountingResolver {
    fn resolve(&self, id: &str) -> Option<Rc<dyn Topology>> {
        Some(Rc::new(Counting {
            name: id.to_owned(),
            counts: Rc::clone(&self.counts),
        }))
    }
}

fn base_setup(cx: Context<'_, World>) -> LocalBoxFuture<'_, Outcome> {
    async move {
        cx.world.push("Base.setup");
        Outcome::pass()
    }
    .boxed_local()
}

fn base_teardown(cx: Context<'_, World>) -> LocalBoxFuture<'_, Outcome> {
    async move {
        cx.world.push("Base.teardown");
        Outcome::pass()
    }
    .boxed_local()
}

fn l2_setup(cx: Context<'_, World>) -> LocalBoxFuture<'_, Outcome> {
    async move {
        cx.world.push("L2.setup");
        Outcome::pass()
    }
    .boxed_local()
}

fn l2_teardown(cx: Context<'_, World>) -> LocalBoxFuture<'_, Outcome> {
    async move {
        cx.world.push("L2.teardown");
        Outcome::pass()
    }
    .boxed_local()
}

fn l3_setup(cx: Context<'_, World>) -> LocalBoxFuture<'_, Outcome> {
    async move {
        cx.world.push("L3.setup");
        Outcome::pass()
    }
    .boxed_local()
}

fn l3_teardown(cx: Context<'_, World>) -> LocalBoxFuture<'_, Outcome> {
    async move {
        cx.world.push("L3.teardown");
        Outcome::pass()
    }
    .boxed_local()
}

fn step_a1(cx: Context<'_, World>) -> LocalBoxFuture<'_, Outcome> {
    async move {
        cx.world.push("a.step1");
        Outcome::Done
    }
    .boxed_local()
}

fn step_a2(cx: Context<'_, World>) -> LocalBoxFuture<'_, Outcome> {
    async move {
        cx.world.push("a.step2");
        Outcome::Done
    }
    .boxed_local()
}

fn step_b1(cx: Context<'_, World>) -> LocalBoxFuture<'_, Outcome> {
    async move {
        cx.world.push("b.step1");
        Outcome::Done
    }
    .boxed_local()
}

fn base() -> Fixture<World> {
    Fixture::new("Base").setup(base_setup).teardown(base_teardown)
}

#[tokio::test]
async fn shared_ancestry_prefix_is_set_up_once() {
    let counts = Rc::new(Counts::default());
    let mut suite = Suite::new(
        World::default(),
        CountingResolver { counts: Rc::clone(&counts) },
        Discard.summarized(),
    );

    let a = Case::builder("a")
        .topology("t1")
        .fixture(base())
        .steps(StepSet::new().step(1, "", step_a1).step(2, "", step_a2))
        .build()
        .expect("valid definition");
    let b = Case::builder("b")
        .topology("t1")
        .chain(a.chain().clone())
        .steps(StepSet::new().step(1, "", step_b1))
        .build()
        .expect("valid definition");
    suite.schedule(a).expect("topology-bound testcase");
    suite.schedule(b).expect("topology-bound testcase");

    let success = suite.run(RunOpts::default()).await.expect("no interrupt");

    assert!(success);
    assert_eq!(suite.writer().stats().passed, 2);
    assert_eq!(suite.writer().stats().total(), 2);
    assert_eq!(counts.init.get(), 1);
    assert_eq!(counts.clean.get(), 1);

    // Base is set up once for both testcases and torn down once, after the
    // group's last testcase.
    assert_eq!(
        *suite.world().log.borrow(),
        vec!["Base.setup", "a.step1", "a.step2", "b.step1", "Base.teardown"],
    );
}

#[tokio::test]
async fn only_the_unshared_chain_suffix_is_cycled() {
    let counts = Rc::new(Counts::default());
    let mut suite: Suite<World, Summarize<Discard>> = Suite::new(
        World::default(),
        CountingResolver { counts: Rc::clone(&counts) },
        Discard.summarized(),
    );

    let shallow = Case::builder("shallow")
        .topology("t1")
        .fixture(base())
        .steps(StepSet::new().step(1, "", step_a1))
        .build()
        .expect("valid definition");
    let l2 = Case::builder("l2")
        .topology("t1")
        .chain(shallow.chain().clone())
        .fixture(Fixture::new("L2").setup(l2_setup).teardown(l2_teardown))
        .steps(StepSet::new().step(1, "", step_a2))
        .build()
        .expect("valid definition");
    let l3 = Case::builder("l3")
        .topology("t1")
        .chain(shallow.chain().clone())
        .fixture(Fixture::new("L3").setup(l3_setup).teardown(l3_teardown))
        .steps(StepSet::new().step(1, "", step_b1))
        .build()
        .expect("valid definition");
    for case in [shallow, l2, l3] {
        suite.schedule(case).expect("topology-bound testcase");
    }

    let success = suite.run(RunOpts::default()).await.expect("no interrupt");

    assert!(success);
    assert_eq!(suite.writer().stats().passed, 3);
    // Chains sort so shared prefixes are adjacent: [Base] < [Base, L2]
    // < [Base, L3]. Between l2 and l3 only the L2 entry is torn down.
    assert_eq!(
        *suite.world().log.borrow(),
        vec![
            "Base.setup",
            "a.step1",
            "L2.setup",
            "a.step2",
            "L2.teardown",
            "L3.setup",
            "b.step1",
            "L3.teardown",
            "Base.teardown",
        ],
    );
    assert_eq!(suite.world().count("Base.setup"), 1);
    assert_eq!(suite.world().count("Base.teardown"), 1);
}

#[tokio::test]
async fn teardown_failure_is_recorded_but_does_not_fail_the_case() {
    fn bad_teardown(cx: Context<'_, World>) -> LocalBoxFuture<'_, Outcome> {
        async move {
            cx.world.push("Flaky.teardown");
            Outcome::fail("lingering session")
        }
        .boxed_local()
    }

    let counts = Rc::new(Counts::default());
    let mut suite = Suite::new(
        World::default(),
        CountingResolver { counts },
        Discard,
    );
    let case = Case::builder("flaky_cleanup")
        .topology("t1")
        .fixture(base())
        .fixture(Fixture::new("Flaky").teardown(bad_teardown))
        .steps(StepSet::new().step(1, "", step_a1))
        .build()
        .expect("valid definition");
    suite.schedule(case).expect("topology-bound testcase");

    let success = suite.run(RunOpts::default()).await.expect("no interrupt");

    // The run itself passed; the teardown fault is an annotation only, and
    // the outer entry was still torn down afterwards.
    assert!(success);
    let result = &suite.results()[0];
    assert_eq!(result.code, Code::Pass);
    assert_eq!(result.failed_on.len(), 1);
    assert!(result.failed_on[0]
        .description
        .contains("teardown of `Flaky` failed: lingering session"));
    assert_eq!(
        suite.world().log.borrow().last().map(String::as_str),
        Some("Base.teardown"),
    );
}
