//! Fixture chains.
//!
//! A testcase's ancestry yields an ordered list of setup/teardown
//! obligations, outermost ancestor first. Consecutive testcases sharing a
//! prefix of that list keep the shared prefix's environment alive across
//! runs: setup executes only for the suffix not yet applied, teardown only
//! for the suffix not shared with the upcoming testcase.

use std::fmt;

use futures::future::LocalBoxFuture;

use crate::step::{Context, Outcome};

/// Alias for a fixture action bound to a testcase's shared context.
pub type FixtureFn<W> = for<'a> fn(Context<'a, W>) -> LocalBoxFuture<'a, Outcome>;

/// Setup/teardown logic attached to one level of a testcase's ancestry.
pub struct Fixture<W> {
    name: String,
    setup: Option<FixtureFn<W>>,
    teardown: Option<FixtureFn<W>>,
}

impl<W> Fixture<W> {
    /// Creates a fixture entry with neither setup nor teardown.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            setup: None,
            teardown: None,
        }
    }

    /// Attaches a setup action.
    #[must_use]
    pub fn setup(mut self, func: FixtureFn<W>) -> Self {
        self.setup = Some(func);
        self
    }

    /// Attaches a teardown action.
    #[must_use]
    pub fn teardown(mut self, func: FixtureFn<W>) -> Self {
        self.teardown = Some(func);
        self
    }

    /// Name of the ancestry level this entry belongs to. Chains are compared
    /// entry-by-entry by this name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) const fn setup_fn(&self) -> Option<FixtureFn<W>> {
        self.setup
    }

    pub(crate) const fn teardown_fn(&self) -> Option<FixtureFn<W>> {
        self.teardown
    }
}

// Implemented manually to omit a redundant `W: Debug` trait bound.
impl<W> fmt::Debug for Fixture<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fixture")
            .field("name", &self.name)
            .field("setup", &self.setup.is_some())
            .field("teardown", &self.teardown.is_some())
            .finish()
    }
}

// Implemented manually to omit a redundant `W: Clone` trait bound.
impl<W> Clone for Fixture<W> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            setup: self.setup,
            teardown: self.teardown,
        }
    }
}

/// The full ordered sequence of fixture entries for one testcase,
/// outermost ancestor first.
///
/// Built once at definition time from the declared "extends" relation; a
/// derived testcase starts from its parent's chain and appends its own
/// entry.
pub struct FixtureChain<W> {
    entries: Vec<Fixture<W>>,
}

impl<W> FixtureChain<W> {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry at the innermost position.
    #[must_use]
    pub fn entry(mut self, fixture: Fixture<W>) -> Self {
        self.entries.push(fixture);
        self
    }

    /// All entries, outermost first.
    #[must_use]
    pub fn entries(&self) -> &[Fixture<W>] {
        &self.entries
    }

    /// Entry names, outermost first.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|fx| fx.name.clone()).collect()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Indicates whether the chain has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// Implemented manually to omit a redundant `W: Debug` trait bound.
impl<W> fmt::Debug for FixtureChain<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.entries).finish()
    }
}

impl<W> Default for FixtureChain<W> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<W> Clone for FixtureChain<W> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

/// One fixture entry that has actually been applied, remembered together
/// with its own teardown action.
///
/// Keeping the action (not just the name) lets a chain-prefix violation
/// still tear down everything previously recorded, even when the current
/// testcase's chain no longer knows those entries.
pub(crate) struct AppliedEntry<W> {
    pub(crate) name: String,
    pub(crate) teardown: Option<FixtureFn<W>>,
}

/// The scheduler's memory of which fixture entries are currently applied,
/// outermost first.
///
/// Mutated only by the control thread between and during testcase runs,
/// never concurrently.
pub struct AppliedChain<W> {
    entries: Vec<AppliedEntry<W>>,
}

impl<W> AppliedChain<W> {
    /// Creates an empty applied chain.
    #[must_use]
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Number of applied entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Indicates whether nothing is applied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Applied entry names, outermost first.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Checks the scheduling invariant: every applied entry must agree in
    /// name and position with the given full chain.
    #[must_use]
    pub fn is_prefix_of(&self, chain: &FixtureChain<W>) -> bool {
        self.entries.len() <= chain.entries.len()
            && self
                .entries
                .iter()
                .zip(&chain.entries)
                .all(|(applied, own)| applied.name == own.name)
    }

    /// Length of the longest common prefix with the given entry names,
    /// compared by name at matching positions.
    #[must_use]
    pub fn common_prefix(&self, names: &[String]) -> usize {
        self.entries
            .iter()
            .zip(names)
            .take_while(|(applied, name)| applied.name == **name)
            .count()
    }

    pub(crate) fn apply(&mut self, fixture: &Fixture<W>) {
        self.entries.push(AppliedEntry {
            name: fixture.name.clone(),
            teardown: fixture.teardown,
        });
    }

    pub(crate) fn pop(&mut self) -> Option<AppliedEntry<W>> {
        self.entries.pop()
    }

    #[cfg(test)]
    pub(crate) fn push_raw(&mut self, name: impl Into<String>, teardown: Option<FixtureFn<W>>) {
        self.entries.push(AppliedEntry {
            name: name.into(),
            teardown,
        });
    }
}

impl<W> Default for AppliedChain<W> {
    fn default() -> Self {
        Self::new()
    }
}
