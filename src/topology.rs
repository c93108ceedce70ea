//! Topology collaborator contracts.
//!
//! A topology is the shared environment a group of testcases runs against,
//! initialized once before the group's first testcase and cleaned once after
//! its last. The engine only drives the lifecycle; device and connection
//! handling live behind these traits.

use std::rc::Rc;

use async_trait::async_trait;
use derive_more::with_trait::{Display, Error};

use crate::result::Code;

/// Fault raised by the environment integration layer.
#[derive(Clone, Debug, Display, Error, Eq, PartialEq)]
pub enum EnvFault {
    /// Topology setup or teardown failed.
    #[display("topology fault: {_0}")]
    Topology(#[error(not(source))] String),

    /// A device connection could not be established or was lost.
    #[display("connection fault: {_0}")]
    Connection(#[error(not(source))] String),
}

impl EnvFault {
    /// Result code this fault maps to.
    #[must_use]
    pub const fn code(&self) -> Code {
        match self {
            Self::Topology(_) => Code::TopoFail,
            Self::Connection(_) => Code::ConnFail,
        }
    }
}

/// Shared environment a group of testcases runs against.
#[async_trait(?Send)]
pub trait Topology {
    /// Identifier testcases bind to.
    fn name(&self) -> &str;

    /// Brings the environment up. With `disconnected` set, device sessions
    /// are not established.
    async fn init(&self, disconnected: bool) -> Result<(), EnvFault>;

    /// Tears the environment down.
    async fn clean(&self) -> Result<(), EnvFault>;
}

/// Maps topology identifiers to [`Topology`] instances.
pub trait Resolver {
    /// Resolves an identifier; `None` if no such topology is known.
    fn resolve(&self, id: &str) -> Option<Rc<dyn Topology>>;
}

/// No-op [`Topology`] substituting real environment interaction during dry
/// runs.
pub struct Noop {
    name: String,
}

impl Noop {
    /// Creates a no-op topology answering to the given identifier.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait(?Send)]
impl Topology for Noop {
    fn name(&self) -> &str {
        &self.name
    }

    async fn init(&self, _disconnected: bool) -> Result<(), EnvFault> {
        Ok(())
    }

    async fn clean(&self) -> Result<(), EnvFault> {
        Ok(())
    }
}

/// [`Resolver`] answering every identifier with a [`Noop`] topology.
pub struct NoopResolver;

impl Resolver for NoopResolver {
    fn resolve(&self, id: &str) -> Option<Rc<dyn Topology>> {
        Some(Rc::new(Noop::new(id)))
    }
}
