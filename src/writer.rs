//! Progress sinks for suite [`Event`]s.
//!
//! The engine functions fully when the sink is [`Discard`]; every writer is
//! strictly observational and never influences scheduling or results.

pub mod basic;
pub mod discard;
pub mod summarize;

use async_trait::async_trait;
use sealed::sealed;

use crate::event::Event;

#[doc(inline)]
pub use self::{
    basic::Basic,
    discard::Discard,
    summarize::{Stats, Summarize},
};

/// Writer of suite [`Event`]s to some output.
#[async_trait(?Send)]
pub trait Writer {
    /// Handles the given [`Event`].
    async fn handle_event(&mut self, ev: Event<'_>);
}

/// Extension of [`Writer`] allowing its summarization.
#[sealed]
pub trait Ext: Writer + Sized {
    /// Wraps this [`Writer`] to count per-testcase outcomes.
    ///
    /// See [`Summarize`] for more information.
    #[must_use]
    fn summarized(self) -> Summarize<Self>;
}

#[sealed]
impl<T: Writer + Sized> Ext for T {
    fn summarized(self) -> Summarize<Self> {
        Summarize::new(self)
    }
}
