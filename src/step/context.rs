//! Execution context handed to step and fixture actions.

use std::collections::HashMap;

/// Opaque instantiation parameters of a testcase.
///
/// Parameters are attached to the definition when the case is scheduled and
/// are read-only afterwards.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Params(HashMap<String, String>);

impl Params {
    /// Creates an empty parameter map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a parameter, replacing any previous value under the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        _ = self.0.insert(key.into(), value.into());
    }

    /// Looks up a parameter by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Indicates whether no parameters are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(key, value)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Context a step or fixture action runs in: the shared world of its
/// testcase plus the instantiation parameters.
///
/// Sub-steps of one parallel group receive the same [`Context`] and must not
/// depend on one another's side effects.
pub struct Context<'c, W> {
    /// Shared state of the testcase (devices, sessions, scratch data).
    pub world: &'c W,

    /// Instantiation parameters of the testcase.
    pub params: &'c Params,
}

// Implemented manually to omit redundant `W: Clone`/`W: Copy` trait bounds,
// imposed by `#[derive(Clone, Copy)]`.
impl<W> Clone for Context<'_, W> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<W> Copy for Context<'_, W> {}
