//! Common test utilities for EnOcean entity tests
//!
//! Provides a recording transport and builders for devices and telegrams.

#![allow(dead_code)]

use enocean_components::{EntityContext, StateStore};
use enocean_config_entries::DeviceConfig;
use enocean_core::{EnOceanId, Eep, Rorg, Telegram};
use enocean_dispatcher::{Dispatcher, SharedDispatcher, TelegramSender};
use std::sync::{Arc, Mutex};

pub const COVER_ID: EnOceanId = EnOceanId::new([0x01, 0xA2, 0xB3, 0x04]);
pub const SENDER_ID: EnOceanId = EnOceanId::new([0xFF, 0xAA, 0x80, 0x01]);

/// Transport stand-in that records every telegram handed to it
#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<Telegram>>,
}

impl RecordingSender {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sent(&self) -> Vec<Telegram> {
        self.sent.lock().unwrap().clone()
    }

    pub fn count(&self, predicate: impl Fn(&Telegram) -> bool) -> usize {
        self.sent.lock().unwrap().iter().filter(|t| predicate(t)).count()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

impl TelegramSender for RecordingSender {
    fn send_telegram(&self, telegram: Telegram) {
        self.sent.lock().unwrap().push(telegram);
    }
}

/// Entity context that records outbound telegrams
pub fn recording_context() -> (EntityContext, Arc<RecordingSender>, SharedDispatcher) {
    let dispatcher = Arc::new(Dispatcher::new());
    let states = Arc::new(StateStore::new(dispatcher.clone()));
    let sender = RecordingSender::new();
    let ctx = EntityContext::new(sender.clone(), states);
    (ctx, sender, dispatcher)
}

pub fn device(id: EnOceanId, eep: &str, name: &str) -> DeviceConfig {
    let eep: Eep = eep.parse().unwrap();
    DeviceConfig::new(id, eep, name)
}

pub fn cover_device() -> DeviceConfig {
    device(COVER_ID, "D2-05-00", "Kitchen blind").with_sender_id(SENDER_ID)
}

/// D2-05-00 position reply for a platform position (0 = closed)
pub fn position_report(id: EnOceanId, position: u8) -> Telegram {
    Telegram::new(Rorg::Vld, vec![100 - position, 0x7F, 0x00, 0x04], id)
}

pub fn is_query(t: &Telegram) -> bool {
    t.rorg == Rorg::Vld && t.payload == [0x03]
}

pub fn is_stop(t: &Telegram) -> bool {
    t.rorg == Rorg::Vld && t.payload == [0x02]
}

pub fn is_set_position(t: &Telegram) -> bool {
    t.rorg == Rorg::Vld && t.payload.len() == 4 && t.payload[3] & 0x0F == 0x01
}
