//! Suite lifecycle callbacks.
//!
//! The scheduler exposes a fixed set of extension points; any number of
//! handlers may be registered per point and run in registration order.
//! Handlers must not block indefinitely; the engine does not enforce a
//! timeout.

use std::collections::HashMap;

use crate::{result::CaseResult, suite::Histogram};

/// Fixed extension points of the suite scheduler.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Point {
    /// After testcases are ordered, before execution starts.
    OnCasesLoad,

    /// Before a topology initializes.
    BeforeTopoInit,

    /// After a topology initialized successfully.
    OnTopoInit,

    /// Before each testcase run.
    BeforeCaseRun,

    /// After each testcase run.
    OnCaseRun,

    /// After the full report is aggregated.
    OnReport,
}

/// Payload handed to a callback handler.
#[derive(Clone, Copy, Debug)]
pub enum Notice<'a> {
    /// Scheduled testcase names in execution order ([`Point::OnCasesLoad`]).
    CasesLoad {
        /// Ordered testcase names.
        cases: &'a [String],
    },

    /// Topology lifecycle ([`Point::BeforeTopoInit`], [`Point::OnTopoInit`]).
    Topology {
        /// Topology identifier.
        name: &'a str,
    },

    /// Testcase lifecycle ([`Point::BeforeCaseRun`], [`Point::OnCaseRun`]).
    CaseRun {
        /// Testcase name.
        name: &'a str,
        /// The result, present only after the run.
        result: Option<&'a CaseResult>,
    },

    /// Final aggregation ([`Point::OnReport`]).
    Report {
        /// Histogram of final statuses.
        histogram: &'a Histogram,
    },
}

type Handler = Box<dyn Fn(Notice<'_>)>;

/// Ordered multi-subscriber handler registry.
#[derive(Default)]
pub(crate) struct Registry {
    slots: HashMap<Point, Vec<Handler>>,
}

impl Registry {
    pub(crate) fn register(&mut self, point: Point, handler: impl Fn(Notice<'_>) + 'static) {
        self.slots.entry(point).or_default().push(Box::new(handler));
    }

    pub(crate) fn emit(&self, point: Point, notice: Notice<'_>) {
        if let Some(handlers) = self.slots.get(&point) {
            for handler in handlers {
                handler(notice);
            }
        }
    }
}
