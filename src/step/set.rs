//! Step registration table.
//!
//! The external authoring convention (`step<N>` / `step<N>_<M>`) is resolved
//! once, at definition-load time, into a typed structure; no name matching
//! happens at run time.

use std::{collections::BTreeMap, fmt};

use futures::future::LocalBoxFuture;
use lazy_regex::regex_captures;

use super::{Context, Outcome, StepTag};
use crate::error::EngineError;

/// Alias for a step action bound to a testcase's shared context.
pub type StepFn<W> = for<'a> fn(Context<'a, W>) -> LocalBoxFuture<'a, Outcome>;

/// A single registered sub-step.
pub struct SubStep<W> {
    tag: StepTag,
    desc: String,
    func: StepFn<W>,
}

impl<W> SubStep<W> {
    /// Identity of this sub-step.
    #[must_use]
    pub const fn tag(&self) -> StepTag {
        self.tag
    }

    /// Description this sub-step was registered with.
    #[must_use]
    pub fn desc(&self) -> &str {
        &self.desc
    }

    pub(crate) const fn func(&self) -> StepFn<W> {
        self.func
    }
}

// Implemented manually to omit a redundant `W: Clone` trait bound, imposed
// by `#[derive(Clone)]`.
impl<W> Clone for SubStep<W> {
    fn clone(&self) -> Self {
        Self {
            tag: self.tag,
            desc: self.desc.clone(),
            func: self.func,
        }
    }
}

impl<W> fmt::Debug for SubStep<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubStep")
            .field("tag", &self.tag)
            .field("desc", &self.desc)
            .finish_non_exhaustive()
    }
}

/// Ordered set of a testcase's steps.
///
/// Steps are grouped by sequence id: a group with a single member runs alone
/// in the caller's context, a group with multiple members runs as parallel
/// sub-steps. Registration is deterministic and idempotent: the same
/// registrations always yield the same grouping.
pub struct StepSet<W> {
    groups: BTreeMap<u32, Vec<SubStep<W>>>,
}

// Implemented manually to omit redundant `W: Clone`/`W: Default` trait
// bounds.
impl<W> Clone for StepSet<W> {
    fn clone(&self) -> Self {
        Self {
            groups: self.groups.clone(),
        }
    }
}

impl<W> Default for StepSet<W> {
    fn default() -> Self {
        Self {
            groups: BTreeMap::new(),
        }
    }
}

impl<W> fmt::Debug for StepSet<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.groups.iter().map(|(id, subs)| (id, subs.len())))
            .finish()
    }
}

impl<W> StepSet<W> {
    /// Creates a new empty [`StepSet`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a sequential step with the given sequence id.
    #[must_use]
    pub fn step(mut self, id: u32, desc: impl Into<String>, func: StepFn<W>) -> Self {
        self.groups.entry(id).or_default().push(SubStep {
            tag: StepTag::step(id),
            desc: desc.into(),
            func,
        });
        self
    }

    /// Registers one member of a parallel group.
    ///
    /// All members registered under the same sequence id run concurrently.
    #[must_use]
    pub fn sub_step(
        mut self,
        id: u32,
        sub: u32,
        desc: impl Into<String>,
        func: StepFn<W>,
    ) -> Self {
        self.groups.entry(id).or_default().push(SubStep {
            tag: StepTag::sub_step(id, sub),
            desc: desc.into(),
            func,
        });
        self
    }

    /// Registers a step by its conventional name, `step<N>` or
    /// `step<N>_<M>`.
    ///
    /// # Errors
    ///
    /// [`EngineError::BadStepName`] if the name does not encode a step id.
    pub fn named(
        self,
        name: &str,
        desc: impl Into<String>,
        func: StepFn<W>,
    ) -> Result<Self, EngineError> {
        let bad = || EngineError::BadStepName { name: name.to_owned() };
        let (_, id, sub) = regex_captures!(r"^step(\d+)(?:_(\d+))?$", name).ok_or_else(bad)?;
        let id: u32 = id.parse().map_err(|_| bad())?;
        if sub.is_empty() {
            Ok(self.step(id, desc, func))
        } else {
            let sub: u32 = sub.parse().map_err(|_| bad())?;
            Ok(self.sub_step(id, sub, desc, func))
        }
    }

    /// Number of step groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Indicates whether no steps are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Iterates over step groups in ascending sequence-id order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (u32, &[SubStep<W>])> {
        self.groups.iter().map(|(id, subs)| (*id, subs.as_slice()))
    }
}
