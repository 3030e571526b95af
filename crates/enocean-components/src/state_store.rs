//! Published entity states
//!
//! Entities publish their observable state here after every update. The
//! store keeps the latest state per unique id and fires a `state_changed`
//! event on the dispatcher's event stream, but only when the state value or
//! its attributes actually changed.

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use enocean_core::events::{IntegrationEvent, StateChangedData};
use enocean_dispatcher::SharedDispatcher;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, trace};

/// Observable state of an entity
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntityState {
    pub state: String,
    #[serde(default)]
    pub attributes: HashMap<String, Value>,
}

impl EntityState {
    pub fn new(state: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            attributes: HashMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone)]
struct StoredState {
    state: EntityState,
    last_changed: DateTime<Utc>,
}

/// Latest published state of every entity
pub struct StateStore {
    states: DashMap<String, StoredState>,
    dispatcher: SharedDispatcher,
}

impl StateStore {
    pub fn new(dispatcher: SharedDispatcher) -> Self {
        Self {
            states: DashMap::new(),
            dispatcher,
        }
    }

    /// Publish the state of an entity
    ///
    /// Returns `true` and fires STATE_CHANGED if the state differs from the
    /// previously published one.
    #[instrument(skip(self, state), fields(unique_id = %unique_id))]
    pub fn set(&self, unique_id: &str, state: EntityState) -> bool {
        let now = Utc::now();
        let stored = StoredState {
            state: state.clone(),
            last_changed: now,
        };

        let old_state = match self.states.entry(unique_id.to_string()) {
            Entry::Occupied(mut entry) => {
                if entry.get().state == state {
                    trace!("State unchanged");
                    return false;
                }
                Some(std::mem::replace(entry.get_mut(), stored).state.state)
            }
            Entry::Vacant(entry) => {
                entry.insert(stored);
                None
            }
        };

        debug!(state = %state.state, old_state = ?old_state, "Publishing entity state");

        self.dispatcher
            .fire(IntegrationEvent::StateChanged(StateChangedData {
                unique_id: unique_id.to_string(),
                old_state,
                new_state: state.state,
                attributes: state.attributes,
                last_changed: now,
            }));
        true
    }

    pub fn get(&self, unique_id: &str) -> Option<EntityState> {
        self.states.get(unique_id).map(|s| s.state.clone())
    }

    /// The state value, or None if the entity never published
    pub fn get_state(&self, unique_id: &str) -> Option<String> {
        self.states.get(unique_id).map(|s| s.state.state.clone())
    }

    pub fn last_changed(&self, unique_id: &str) -> Option<DateTime<Utc>> {
        self.states.get(unique_id).map(|s| s.last_changed)
    }

    /// Forget an entity's state
    pub fn remove(&self, unique_id: &str) -> Option<EntityState> {
        self.states.remove(unique_id).map(|(_, s)| s.state)
    }

    pub fn all_unique_ids(&self) -> Vec<String> {
        self.states.iter().map(|r| r.key().clone()).collect()
    }

    pub fn entity_count(&self) -> usize {
        self.states.len()
    }

    /// Fire an integration event on the dispatcher's event stream
    pub fn fire(&self, event: IntegrationEvent) {
        self.dispatcher.fire(event);
    }
}

/// Thread-safe wrapper for StateStore
pub type SharedStateStore = Arc<StateStore>;
