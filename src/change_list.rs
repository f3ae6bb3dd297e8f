//! Change lists: the plan that turns a fetched snapshot into the next one.

use std::fmt;
use std::ops::BitOr;

use crate::record::Record;

/// What happens to a record when the change list is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeState {
    /// Record is kept as is.
    NoChange,
    /// Record is dropped from the zone.
    Delete,
    /// Record is added to the zone.
    Create,
}

impl ChangeState {
    const fn bit(self) -> u8 {
        match self {
            ChangeState::NoChange => 1,
            ChangeState::Delete => 1 << 1,
            ChangeState::Create => 1 << 2,
        }
    }
}

impl fmt::Display for ChangeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChangeState::NoChange => "no-change",
            ChangeState::Delete => "delete",
            ChangeState::Create => "create",
        })
    }
}

/// A set of [`ChangeState`]s, built with `|`.
///
/// ```
/// use zone_reconcile::change_list::{ChangeState, StateSet};
///
/// let set = ChangeState::Delete | ChangeState::Create;
/// assert!(set.contains(ChangeState::Create));
/// assert!(!set.contains(ChangeState::NoChange));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StateSet(u8);

impl StateSet {
    /// Set containing nothing.
    pub const EMPTY: StateSet = StateSet(0);

    /// Records that end up in the submitted snapshot.
    pub const APPLIED: StateSet = StateSet(ChangeState::NoChange.bit() | ChangeState::Create.bit());

    /// Records that differ from the fetched snapshot.
    pub const CHANGED: StateSet = StateSet(ChangeState::Delete.bit() | ChangeState::Create.bit());

    /// True when `state` is a member.
    pub fn contains(self, state: ChangeState) -> bool {
        self.0 & state.bit() != 0
    }
}

impl From<ChangeState> for StateSet {
    fn from(state: ChangeState) -> Self {
        StateSet(state.bit())
    }
}

impl BitOr for ChangeState {
    type Output = StateSet;

    fn bitor(self, rhs: ChangeState) -> StateSet {
        StateSet(self.bit() | rhs.bit())
    }
}

impl BitOr<ChangeState> for StateSet {
    type Output = StateSet;

    fn bitor(self, rhs: ChangeState) -> StateSet {
        StateSet(self.0 | rhs.bit())
    }
}

/// One record and what happens to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    /// The record.
    pub record: Record,
    /// Its planned state.
    pub state: ChangeState,
}

/// Ordered list of planned record changes.
///
/// Built once per attempt from a freshly fetched snapshot. Entries keep
/// insertion order; kept records come first in store order, followed by the
/// records being created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeList {
    entries: Vec<ChangeRecord>,
}

impl ChangeList {
    /// Create an empty change list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty change list with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Append a record with its planned state.
    pub fn push(&mut self, record: Record, state: ChangeState) {
        self.entries.push(ChangeRecord { record, state });
    }

    /// All entries in order.
    pub fn entries(&self) -> &[ChangeRecord] {
        &self.entries
    }

    /// Records whose state is in `states`, in order.
    pub fn iter(&self, states: impl Into<StateSet>) -> impl Iterator<Item = &Record> {
        let states = states.into();
        self.entries
            .iter()
            .filter(move |entry| states.contains(entry.state))
            .map(|entry| &entry.record)
    }

    /// Number of entries whose state is in `states`.
    pub fn count(&self, states: impl Into<StateSet>) -> usize {
        self.iter(states).count()
    }

    /// Records being created.
    pub fn creates(&self) -> Vec<Record> {
        self.list(ChangeState::Create)
    }

    /// Records being deleted.
    pub fn deletes(&self) -> Vec<Record> {
        self.list(ChangeState::Delete)
    }

    /// The snapshot to write back: kept and created records.
    pub fn apply_list(&self) -> Vec<Record> {
        self.list(StateSet::APPLIED)
    }

    /// True when applying the list would change the zone.
    pub fn has_changes(&self) -> bool {
        self.iter(StateSet::CHANGED).next().is_some()
    }

    /// Total number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the list holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn list(&self, states: impl Into<StateSet>) -> Vec<Record> {
        self.iter(states).cloned().collect()
    }
}
