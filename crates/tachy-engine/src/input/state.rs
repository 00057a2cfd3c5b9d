use std::collections::HashMap;
use std::hash::Hash;

use crate::time::ClockSample;

/// Up/down state of one key or button.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TransitionState {
    pub is_down: bool,
    /// Time of the last Up→Down or Down→Up change.
    pub last_transition: ClockSample,
}

/// Identifier → state table.
///
/// Identifiers never seen are up. Repeated same-direction updates leave the
/// recorded transition time untouched.
#[derive(Debug, Clone)]
pub struct StateTable<K> {
    entries: HashMap<K, TransitionState>,
}

impl<K> Default for StateTable<K> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Copy + Eq + Hash> StateTable<K> {
    /// Applies a press or release. Returns `true` when the state changed.
    pub fn apply(&mut self, id: K, down: bool, at: ClockSample) -> bool {
        let entry = self.entries.entry(id).or_insert(TransitionState {
            is_down: false,
            last_transition: ClockSample::ZERO,
        });
        if entry.is_down == down {
            return false;
        }
        entry.is_down = down;
        entry.last_transition = at;
        true
    }

    #[inline]
    pub fn is_down(&self, id: K) -> bool {
        self.entries.get(&id).is_some_and(|s| s.is_down)
    }

    pub fn get(&self, id: K) -> Option<TransitionState> {
        self.entries.get(&id).copied()
    }

    /// Identifiers currently down.
    pub fn held(&self) -> impl Iterator<Item = K> + '_ {
        self.entries
            .iter()
            .filter(|(_, s)| s.is_down)
            .map(|(k, _)| *k)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
