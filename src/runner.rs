//! Step execution.
//!
//! A step with a single sub-step runs in the caller's context; a step with
//! multiple sub-steps launches every member as an independent concurrent
//! task and joins them all before aggregating. A fault in one sub-step
//! never prevents collection of its siblings.

use std::{any::Any, panic::AssertUnwindSafe, time::SystemTime};

use futures::{future, FutureExt as _};

use crate::{
    debug::{DebugHook, FaultSite},
    result::{Code, Stage, StepResult},
    step::{Context, Outcome, SubStep},
    CHECK_FAILED,
};

pub(crate) type PanicPayload = Box<dyn Any + Send + 'static>;

/// Aggregate of one executed step group.
pub(crate) struct StepReport {
    /// Worst code among all sub-steps, skips excluded.
    pub(crate) code: Code,
    /// Aggregate message: the sub-step message for a single sub-step,
    /// `<tag>:<status>` pairs in completion order for a parallel group.
    pub(crate) message: String,
    /// Per-sub-step results in completion order.
    pub(crate) results: Vec<StepResult>,
    /// An operator interrupt was observed.
    pub(crate) interrupted: bool,
}

pub(crate) fn panic_message(err: &PanicPayload) -> String {
    if let Some(string) = err.downcast_ref::<String>() {
        string.clone()
    } else if let Some(string) = err.downcast_ref::<&str>() {
        (*string).to_owned()
    } else {
        "(Could not resolve panic payload)".to_owned()
    }
}

/// Maps a caught panic to a result code.
///
/// Assertion-style payloads (std `assert!` family and this crate's `check!`
/// marker) indicate a checked condition that was not met; anything else
/// means the step logic itself is unreliable.
fn classify_panic(err: &PanicPayload) -> (Code, String) {
    let msg = panic_message(err);
    if msg.starts_with(CHECK_FAILED) || msg.starts_with("assertion") {
        (Code::Fail, format!("Assertion fail: {msg}"))
    } else {
        (Code::Abort, msg)
    }
}

pub(crate) async fn run_step<W>(
    cx: Context<'_, W>,
    case: &str,
    subs: &[SubStep<W>],
    pause_on_fail: bool,
    hook: Option<&dyn DebugHook>,
) -> StepReport {
    if let [sub] = subs {
        run_single(cx, case, sub, pause_on_fail, hook).await
    } else {
        run_parallel(cx, subs).await
    }
}

async fn run_single<W>(
    cx: Context<'_, W>,
    case: &str,
    sub: &SubStep<W>,
    pause_on_fail: bool,
    hook: Option<&dyn DebugHook>,
) -> StepReport {
    let mut result = StepResult::new(sub.tag(), sub.desc());
    let caught = AssertUnwindSafe(sub.func()(cx)).catch_unwind().await;
    result.finished_at = SystemTime::now();

    let mut interrupted = false;
    let (code, message) = match caught {
        Ok(Outcome::Interrupted) => {
            interrupted = true;
            Outcome::Interrupted.split(sub.desc())
        }
        Ok(outcome) => outcome.split(sub.desc()),
        Err(payload) => classify_panic(&payload),
    };
    // Explicit failing returns pause too, not just panics; an interrupt is
    // an operator request to leave, never a fault to inspect.
    if pause_on_fail && code.is_failing() && !interrupted {
        if let Some(hook) = hook {
            let site = FaultSite {
                case,
                stage: Stage::Step,
                tag: Some(sub.tag()),
                message: &message,
            };
            hook.pause(site).await;
        }
    }
    result.code = code;
    if code.is_failing() {
        result.error = message.clone();
    }
    StepReport {
        code,
        message,
        results: vec![result],
        interrupted,
    }
}

async fn run_parallel<W>(cx: Context<'_, W>, subs: &[SubStep<W>]) -> StepReport {
    let tasks = subs.iter().map(|sub| {
        let fut = AssertUnwindSafe(sub.func()(cx)).catch_unwind();
        async move {
            let mut result = StepResult::new(sub.tag(), sub.desc());
            let caught = fut.await;
            result.finished_at = SystemTime::now();
            (result, caught)
        }
    });

    // Every task is joined: an abandoned sub-step would leave the shared
    // environment in an undefined state.
    let finished = future::join_all(tasks).await;

    let mut code = Code::Pass;
    let mut interrupted = false;
    let mut pieces = Vec::with_capacity(finished.len());
    let mut results = Vec::with_capacity(finished.len());
    for (mut result, caught) in finished {
        let (sub_code, msg) = match caught {
            Ok(Outcome::Interrupted) => {
                interrupted = true;
                Outcome::Interrupted.split(&result.desc)
            }
            Ok(outcome) => {
                let desc = result.desc.clone();
                outcome.split(&desc)
            }
            Err(payload) => classify_panic(&payload),
        };
        result.code = sub_code;
        if sub_code.is_failing() {
            result.error = msg;
        }
        pieces.push(format!("{}:{}", result.tag, sub_code));
        code = code.worst(sub_code);
        results.push(result);
    }

    StepReport {
        code,
        message: pieces.join("; "),
        results,
        interrupted,
    }
}
