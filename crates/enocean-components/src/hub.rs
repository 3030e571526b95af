//! The EnOcean hub
//!
//! The hub owns the entities of a config entry, indexed by device id. It
//! consumes telegrams from the dispatcher's `ReceiveMessage` signal in
//! arrival order and routes each to the entities of its sender.

use dashmap::DashMap;
use enocean_config_entries::{ConfigEntry, DeviceConfig, WatchdogConfig};
use enocean_core::{EnOceanId, Telegram};
use enocean_dispatcher::{SharedDispatcher, Signal, TelegramSender};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::entity::EntityContext;
use crate::platform::{entities_for_device, Platform};
use crate::state_store::{SharedStateStore, StateStore};

pub struct Hub {
    dispatcher: SharedDispatcher,
    ctx: EntityContext,
    devices: DashMap<EnOceanId, Vec<Arc<Platform>>>,
}

impl Hub {
    pub fn new(dispatcher: SharedDispatcher) -> Self {
        let states = Arc::new(StateStore::new(dispatcher.clone()));
        let sender: Arc<dyn TelegramSender> = dispatcher.clone();
        Self {
            ctx: EntityContext::new(sender, states),
            dispatcher,
            devices: DashMap::new(),
        }
    }

    pub fn states(&self) -> &SharedStateStore {
        self.ctx.states()
    }

    pub fn dispatcher(&self) -> &SharedDispatcher {
        &self.dispatcher
    }

    /// Create the entities of every configured device
    ///
    /// Returns the number of entities created.
    pub fn setup_entry(&self, entry: &ConfigEntry) -> usize {
        let count: usize = entry
            .options
            .devices
            .iter()
            .map(|device| self.add_device(device, entry.data.watchdog))
            .sum();
        info!(
            entry_id = %entry.entry_id,
            devices = self.devices.len(),
            entities = count,
            "EnOcean entry set up"
        );
        count
    }

    /// Replace all entities after the entry's options changed
    pub fn reload(&self, entry: &ConfigEntry) -> usize {
        let ids: Vec<EnOceanId> = self.devices.iter().map(|r| *r.key()).collect();
        for id in ids {
            self.remove_device(&id);
        }
        self.setup_entry(entry)
    }

    /// Create and register the entities of one device
    pub fn add_device(&self, device: &DeviceConfig, watchdog: WatchdogConfig) -> usize {
        if self.devices.contains_key(&device.id) {
            warn!(device_id = %device.id, "Device already set up");
            return 0;
        }

        let entities: Vec<Arc<Platform>> = entities_for_device(device, &self.ctx, watchdog)
            .into_iter()
            .map(Arc::new)
            .collect();
        if entities.is_empty() {
            return 0;
        }

        let count = entities.len();
        self.devices.insert(device.id, entities.clone());
        for entity in &entities {
            entity.on_added();
        }
        count
    }

    /// Remove a device's entities and their published states
    pub fn remove_device(&self, id: &EnOceanId) -> bool {
        let Some((_, entities)) = self.devices.remove(id) else {
            return false;
        };
        for entity in &entities {
            entity.on_removed();
            self.states().remove(entity.unique_id());
        }
        debug!(device_id = %id, "Removed device");
        true
    }

    /// Route a received telegram to the entities of its sender
    ///
    /// Returns `false` if the sender is not a configured device.
    pub fn handle_telegram(&self, telegram: &Telegram) -> bool {
        let entities = match self.devices.get(&telegram.sender) {
            Some(entities) => entities.clone(),
            None => {
                trace!(sender = %telegram.sender, "Telegram from unknown device");
                return false;
            }
        };
        for entity in &entities {
            entity.handle_telegram(telegram);
        }
        true
    }

    pub fn entities(&self, id: &EnOceanId) -> Vec<Arc<Platform>> {
        self.devices
            .get(id)
            .map(|e| e.clone())
            .unwrap_or_default()
    }

    pub fn entity(&self, unique_id: &str) -> Option<Arc<Platform>> {
        self.devices
            .iter()
            .flat_map(|r| r.value().clone())
            .find(|e| e.unique_id() == unique_id)
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn entity_count(&self) -> usize {
        self.devices.iter().map(|r| r.value().len()).sum()
    }

    /// Consume `ReceiveMessage` telegrams until `token` is cancelled
    pub fn spawn(self: &Arc<Self>, token: CancellationToken) -> JoinHandle<()> {
        let hub = Arc::clone(self);
        let mut rx = self.dispatcher.subscribe(Signal::ReceiveMessage);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    received = rx.recv() => match received {
                        Ok(telegram) => {
                            hub.handle_telegram(&telegram);
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "Telegram receiver lagged");
                        }
                        Err(RecvError::Closed) => break,
                    },
                }
            }
            debug!("Hub receive loop stopped");
        })
    }

    /// Remove all devices, disarming their watchdogs
    pub fn shutdown(&self) {
        let ids: Vec<EnOceanId> = self.devices.iter().map(|r| *r.key()).collect();
        for id in ids {
            self.remove_device(&id);
        }
    }
}
