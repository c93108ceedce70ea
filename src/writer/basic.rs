//! Default [`Writer`] implementation.

use std::ops::Deref;

use async_trait::async_trait;
use console::{Style, Term};
use itertools::Itertools as _;

use crate::{
    event::Event,
    result::{CaseResult, Code, StepResult},
    writer::Writer,
};

/// Default [`Writer`] implementation, rendering progress to a terminal.
#[derive(Clone, Debug)]
pub struct Basic {
    terminal: Term,
    ok: Style,
    skipped: Style,
    err: Style,
}

#[async_trait(?Send)]
impl Writer for Basic {
    async fn handle_event(&mut self, ev: Event<'_>) {
        match ev {
            Event::SuiteStarted { cases } => {
                self.write(&format!("Running {cases} testcases"));
            }
            Event::TopologyInit { name } => {
                self.write(&format!("Topology {name}: initializing"));
            }
            Event::TopologyReady { name } => {
                self.write_ok(&format!("Topology {name}: ready"));
            }
            Event::TopologyFailed { name, error } => {
                self.write_err(&format!("Topology {name}: {error}"));
            }
            Event::TopologyCleaned { name } => {
                self.write(&format!("Topology {name}: cleaned"));
            }
            Event::CaseStarted { name, description } => {
                self.case_started(name, description);
            }
            Event::FixtureSetup { fixture, .. } => {
                self.write(&format!("  setup: {fixture}"));
            }
            Event::FixtureTeardown { fixture, .. } => {
                self.write(&format!("  teardown: {fixture}"));
            }
            Event::StepStarted { tag, .. } => {
                self.write(&format!("  {tag}"));
            }
            Event::StepFinished { result, .. } => self.step_finished(result),
            Event::CaseFinished { result } => self.case_finished(result),
            Event::SuiteFinished { histogram, success } => {
                let summary = histogram
                    .iter()
                    .map(|(status, count)| format!("{status}: {count}"))
                    .join(", ");
                self.write(&format!("Summary: {summary}"));
                if success {
                    self.write_ok("Suite passed");
                } else {
                    self.write_err("Suite failed");
                }
            }
        }
    }
}

impl Default for Basic {
    fn default() -> Self {
        Self {
            terminal: Term::stdout(),
            ok: Style::new().green(),
            skipped: Style::new().cyan(),
            err: Style::new().red(),
        }
    }
}

impl Deref for Basic {
    type Target = Term;

    fn deref(&self) -> &Self::Target {
        &self.terminal
    }
}

impl Basic {
    /// Creates a new [`Basic`] writer on stdout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn style_for(&self, code: Code) -> &Style {
        match code {
            Code::Pass => &self.ok,
            Code::Skipped => &self.skipped,
            _ => &self.err,
        }
    }

    fn write(&self, line: &str) {
        self.write_line(line).unwrap();
    }

    fn write_ok(&self, line: &str) {
        self.write(&format!("{}", self.ok.apply_to(line)));
    }

    fn write_err(&self, line: &str) {
        self.write(&format!("{}", self.err.apply_to(line)));
    }

    fn case_started(&self, name: &str, description: &str) {
        self.write_ok(&format!("Testcase: {name}"));
        if !description.is_empty() {
            self.write(&format!("  {description}"));
        }
    }

    fn step_finished(&self, result: &StepResult) {
        let line = format!(
            "  {} {} ({})",
            result.tag,
            result.code,
            humantime::format_duration(result.duration()),
        );
        self.write(&format!("{}", self.style_for(result.code).apply_to(line)));
        if result.code.is_failing() {
            self.write_err(&format!("    {}", result.error));
        }
    }

    fn case_finished(&self, result: &CaseResult) {
        let line = format!(
            "Testcase {} {} ({} of {} steps, {})",
            result.name,
            result.code,
            result.step_run,
            result.step_count,
            humantime::format_duration(result.duration()),
        );
        self.write(&format!("{}", self.style_for(result.code).apply_to(line)));
        for failure in &result.failed_on {
            self.write_err(&format!("  {}: {}", failure.phase, failure.description));
        }
    }
}
