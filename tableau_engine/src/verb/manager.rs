//! Per-entity verb tables.
//!
//! Every actor and scene (and the world itself, for global verbs) owns a
//! [`VerbManager`]. Verbs are keyed by id plus an optional owner state and an
//! optional interaction target, and lookups fall back through the wildcard
//! combinations in a fixed order.

use super::Verb;

use log::debug;
use serde::{Deserialize, Serialize};

use std::collections::HashMap;
use std::fmt;

/// Lookup key of a verb. `None` in `state` or `target` is a wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VerbKey {
    pub id: String,
    pub state: Option<String>,
    pub target: Option<String>,
}

impl VerbKey {
    pub fn new(id: impl Into<String>, state: Option<&str>, target: Option<&str>) -> Self {
        Self {
            id: id.into(),
            state: state.map(str::to_string),
            target: target.map(str::to_string),
        }
    }

    /// Keys to try for a lookup, most specific first:
    /// `(id, state, target)`, `(id, state, *)`, `(id, *, target)`, `(id, *, *)`.
    fn candidates(id: &str, state: Option<&str>, target: Option<&str>) -> Vec<VerbKey> {
        let mut keys = Vec::with_capacity(4);
        for s in [state, None] {
            for t in [target, None] {
                let key = VerbKey::new(id, s, t);
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        keys
    }
}

impl fmt::Display for VerbKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}/{}]",
            self.id,
            self.state.as_deref().unwrap_or("*"),
            self.target.as_deref().unwrap_or("*")
        )
    }
}

/// The verbs owned by one actor, scene or the world.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Verb>", into = "Vec<Verb>")]
pub struct VerbManager {
    verbs: HashMap<VerbKey, Verb>,
}

impl VerbManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.verbs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verbs.is_empty()
    }

    /// Register a verb. A verb with the same key is replaced and returned.
    pub fn add_verb(&mut self, verb: Verb) -> Option<Verb> {
        let key = verb.key();
        let previous = self.verbs.insert(key.clone(), verb);
        if previous.is_some() {
            debug!("verb {key} redefined");
        }
        previous
    }

    /// Resolve the key that a lookup for `(id, state, target)` would select.
    pub fn resolve_key(&self, id: &str, state: Option<&str>, target: Option<&str>) -> Option<VerbKey> {
        self.resolve_key_with(id, state, target, &[])
    }

    /// Like [`VerbManager::resolve_key`], but treats the `lent` keys as present even though
    /// they have been taken out of the table for execution.
    pub fn resolve_key_with(
        &self,
        id: &str,
        state: Option<&str>,
        target: Option<&str>,
        lent: &[&VerbKey],
    ) -> Option<VerbKey> {
        VerbKey::candidates(id, state, target)
            .into_iter()
            .find(|key| self.verbs.contains_key(key) || lent.contains(&key))
    }

    pub fn get_verb(&self, id: &str, state: Option<&str>, target: Option<&str>) -> Option<&Verb> {
        let key = self.resolve_key(id, state, target)?;
        self.verbs.get(&key)
    }

    pub fn get_verb_mut(&mut self, id: &str, state: Option<&str>, target: Option<&str>) -> Option<&mut Verb> {
        let key = self.resolve_key(id, state, target)?;
        self.verbs.get_mut(&key)
    }

    pub fn get(&self, key: &VerbKey) -> Option<&Verb> {
        self.verbs.get(key)
    }

    pub fn get_mut(&mut self, key: &VerbKey) -> Option<&mut Verb> {
        self.verbs.get_mut(key)
    }

    /// Remove a verb so it can run with mutable access to the rest of the world.
    pub fn take(&mut self, key: &VerbKey) -> Option<Verb> {
        self.verbs.remove(key)
    }

    /// Put back a verb previously removed with [`VerbManager::take`].
    ///
    /// If a verb with the same key was registered in the meantime, the newer definition is
    /// kept and the returned verb is dropped. Returns whether the verb was put back.
    pub fn restore(&mut self, verb: Verb) -> bool {
        let key = verb.key();
        if self.verbs.contains_key(&key) {
            debug!("verb {key} was redefined while running; keeping the new definition");
            return false;
        }
        self.verbs.insert(key, verb);
        true
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> Vec<&VerbKey> {
        let mut keys: Vec<_> = self.verbs.keys().collect();
        keys.sort();
        keys
    }

    /// Verbs in key order.
    pub fn verbs(&self) -> impl Iterator<Item = &Verb> {
        self.keys().into_iter().filter_map(move |key| self.verbs.get(key))
    }

    /// Keys of every verb currently parked on a suspending action.
    pub fn suspended_keys(&self) -> Vec<VerbKey> {
        self.verbs()
            .filter(|verb| verb.is_suspended())
            .map(Verb::key)
            .collect()
    }
}

impl From<Vec<Verb>> for VerbManager {
    fn from(list: Vec<Verb>) -> Self {
        let mut manager = VerbManager::new();
        for verb in list {
            manager.add_verb(verb);
        }
        manager
    }
}

impl From<VerbManager> for Vec<Verb> {
    fn from(manager: VerbManager) -> Self {
        let mut list: Vec<Verb> = manager.verbs.into_values().collect();
        list.sort_by_key(Verb::key);
        list
    }
}
