//! Typed step identities, execution context and the registration table.

pub mod context;
pub mod outcome;
pub mod set;

use std::fmt;

#[doc(inline)]
pub use self::{
    context::{Context, Params},
    outcome::Outcome,
    set::{StepFn, StepSet, SubStep},
};

/// Identity of a step or sub-step: a sequence id plus an optional sub id.
///
/// Steps are totally ordered by sequence id. Sub-steps of the same step share
/// the sequence id and have no defined order among themselves.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct StepTag {
    /// Sequence id of the step.
    pub id: u32,

    /// Sub id inside a parallel group, if any.
    pub sub: Option<u32>,
}

impl StepTag {
    /// Tag of a purely sequential step.
    #[must_use]
    pub const fn step(id: u32) -> Self {
        Self { id, sub: None }
    }

    /// Tag of one member of a parallel group.
    #[must_use]
    pub const fn sub_step(id: u32, sub: u32) -> Self {
        Self { id, sub: Some(sub) }
    }
}

impl fmt::Display for StepTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step{}", self.id)?;
        if let Some(sub) = self.sub {
            write!(f, "_{sub}")?;
        }
        Ok(())
    }
}
