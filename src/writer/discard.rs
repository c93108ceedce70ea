//! No-op [`Writer`] implementation.

use async_trait::async_trait;

use crate::{event::Event, writer::Writer};

/// [`Writer`] dropping every event.
#[derive(Clone, Copy, Debug)]
pub struct Discard;

#[async_trait(?Send)]
impl Writer for Discard {
    /// Does nothing.
    async fn handle_event(&mut self, _: Event<'_>) {
        // Intentionally no-op.
    }
}
