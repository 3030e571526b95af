//! EnOcean covers (EEP D2-05-00, blinds control for position and angle)
//!
//! The device only tells us where it is; it never says whether it is moving
//! or has stopped. Direction is inferred from consecutive position reports,
//! and a stop is detected when the same non-terminal position is reported
//! twice in a row. If reports cease altogether, the watchdog polls the
//! position and, after too many unanswered queries, declares the position
//! unknown.
//!
//! Positions follow the platform convention (0 = closed, 100 = open). On the
//! wire they are inverted: the device reports and accepts `100 - position`.

use enocean_config_entries::{DeviceConfig, WatchdogConfig};
use enocean_core::{EnOceanId, Rorg, Telegram};
use serde::Serialize;
use serde_json::json;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::entity::{lock, EntityContext, EntityInfo};
use crate::state_store::EntityState;
use crate::watchdog::{self, Tick, WatchdogTimer};

/// Highest valid position
pub const MAX_POSITION: u8 = 100;

/// Angle value meaning "leave the slat angle unchanged"
const ANGLE_NO_CHANGE: u8 = 127;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoverError {
    #[error("position {0} is outside 0..=100")]
    PositionOutOfRange(u8),
}

/// Commands understood by D2-05-00 actuators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverCommand {
    /// Move to a device-side position (0 = open, 100 = closed)
    SetPosition(u8),
    Stop,
    QueryPosition,
}

impl CoverCommand {
    /// Command id carried in the low nibble of the last byte
    pub fn code(&self) -> u8 {
        match self {
            CoverCommand::SetPosition(_) => 1,
            CoverCommand::Stop => 2,
            CoverCommand::QueryPosition => 3,
        }
    }

    /// VLD payload of the command, channel 0
    pub fn payload(&self) -> Vec<u8> {
        match self {
            // POS, ANGLE, REPO/LOCK, CHN/CMD
            CoverCommand::SetPosition(pos) => vec![*pos, ANGLE_NO_CHANGE, 0x00, self.code()],
            CoverCommand::Stop | CoverCommand::QueryPosition => vec![self.code()],
        }
    }

    pub fn telegram(&self, sender: EnOceanId, destination: EnOceanId) -> Telegram {
        Telegram::new(Rorg::Vld, self.payload(), sender).to(destination)
    }
}

/// Observable state of a cover
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CoverState {
    /// 0..=100, `None` when unknown
    pub position: Option<u8>,
    pub is_closed: Option<bool>,
    pub is_opening: bool,
    pub is_closing: bool,
}

impl CoverState {
    fn set_position(&mut self, position: Option<u8>) {
        self.position = position;
        self.is_closed = position.map(|p| p == 0);
    }

    fn set_motion(&mut self, opening: bool, closing: bool) {
        self.is_opening = opening;
        self.is_closing = closing;
    }

    /// State value as shown by the platform
    pub fn state(&self) -> &'static str {
        if self.is_opening {
            "opening"
        } else if self.is_closing {
            "closing"
        } else {
            match self.is_closed {
                Some(true) => "closed",
                Some(false) => "open",
                None => enocean_core::STATE_UNKNOWN,
            }
        }
    }

    fn entity_state(&self) -> EntityState {
        EntityState::new(self.state()).with_attribute("current_position", json!(self.position))
    }
}

/// Mutable tracking state, guarded by the cover's lock
#[derive(Debug)]
struct Tracker {
    state: CoverState,
    command_in_flight: bool,
    stop_suspected: bool,
    watchdog: WatchdogTimer,
}

/// What to do once the lock is released
#[derive(Debug, Default)]
struct Effects {
    start_watchdog: Option<CancellationToken>,
    publish: bool,
}

impl Tracker {
    fn new(config: WatchdogConfig) -> Self {
        Self {
            state: CoverState::default(),
            command_in_flight: false,
            stop_suspected: false,
            watchdog: WatchdogTimer::new(config),
        }
    }

    /// Record a movement command about to be sent
    fn command(&mut self, opening: bool, closing: bool) -> Option<CancellationToken> {
        self.command_in_flight = true;
        self.state.set_motion(opening, closing);
        self.watchdog.arm_or_feed()
    }

    fn forget_position(&mut self) {
        self.stop_suspected = false;
        self.state.set_position(None);
        self.state.set_motion(false, false);
    }

    fn stop(&mut self) {
        self.watchdog.disarm();
        self.command_in_flight = true;
        self.state.set_motion(false, false);
    }

    /// Interpret a position report (platform convention)
    fn report(&mut self, reported: u8) -> Effects {
        let mut effects = Effects::default();

        match self.state.position {
            // Nothing to compare against yet
            None => self.command_in_flight = false,
            // Echo of our own command
            Some(_) if self.command_in_flight => self.command_in_flight = false,
            Some(_) if reported == 0 || reported == MAX_POSITION => {
                self.stop_suspected = false;
                self.state.set_motion(false, false);
                self.watchdog.disarm();
            }
            Some(current) if reported == current => {
                if self.stop_suspected {
                    self.stop_suspected = false;
                    self.state.set_motion(false, false);
                    self.watchdog.disarm();
                } else {
                    self.stop_suspected = true;
                    effects.start_watchdog = self.watchdog.arm_or_feed();
                    return effects;
                }
            }
            Some(current) => {
                // Suspicion only holds across consecutive identical reports
                self.stop_suspected = false;
                self.state.set_motion(reported > current, reported < current);
                effects.start_watchdog = self.watchdog.arm_or_feed();
            }
        }

        self.state.set_position(Some(reported));
        effects.publish = true;
        effects
    }
}

struct Shared {
    info: EntityInfo,
    sender_id: EnOceanId,
    ctx: EntityContext,
    tracker: Mutex<Tracker>,
}

/// A D2-05-00 cover entity
///
/// Cloning yields another handle to the same cover.
#[derive(Clone)]
pub struct Cover {
    shared: Arc<Shared>,
}

impl Cover {
    pub fn new(device: &DeviceConfig, ctx: EntityContext, watchdog: WatchdogConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                info: EntityInfo::for_device(device, None, None),
                sender_id: device.sender_or_default(),
                ctx,
                tracker: Mutex::new(Tracker::new(watchdog)),
            }),
        }
    }

    pub fn info(&self) -> &EntityInfo {
        &self.shared.info
    }

    pub fn state(&self) -> CoverState {
        lock(&self.shared.tracker).state
    }

    pub fn command_in_flight(&self) -> bool {
        lock(&self.shared.tracker).command_in_flight
    }

    pub fn stop_suspected(&self) -> bool {
        lock(&self.shared.tracker).stop_suspected
    }

    pub fn watchdog_enabled(&self) -> bool {
        lock(&self.shared.tracker).watchdog.is_enabled()
    }

    pub fn queries_remaining(&self) -> u32 {
        lock(&self.shared.tracker).watchdog.queries_remaining()
    }

    /// Query the position after the cover was added
    pub fn on_added(&self) {
        let token = lock(&self.shared.tracker).watchdog.arm_or_feed();
        self.start_watchdog(token);
    }

    /// Stop tracking: the watchdog is disarmed
    pub fn on_removed(&self) {
        lock(&self.shared.tracker).watchdog.disarm();
    }

    pub fn open(&self) {
        debug!(device_id = %self.shared.info.device_id, "Opening cover");
        self.move_to(CoverCommand::SetPosition(0), |t| t.command(true, false));
    }

    pub fn close(&self) {
        debug!(device_id = %self.shared.info.device_id, "Closing cover");
        self.move_to(CoverCommand::SetPosition(MAX_POSITION), |t| {
            t.command(false, true)
        });
    }

    /// Move to `target` (0 = closed, 100 = open)
    ///
    /// With an unknown current position no direction is assumed.
    pub fn set_position(&self, target: u8) -> Result<(), CoverError> {
        if target > MAX_POSITION {
            return Err(CoverError::PositionOutOfRange(target));
        }
        debug!(device_id = %self.shared.info.device_id, target, "Setting cover position");

        self.move_to(CoverCommand::SetPosition(MAX_POSITION - target), |t| {
            match t.state.position {
                Some(current) => t.command(target > current, target < current),
                None => t.command(false, false),
            }
        });
        Ok(())
    }

    pub fn stop(&self) {
        debug!(device_id = %self.shared.info.device_id, "Stopping cover");
        {
            let mut tracker = lock(&self.shared.tracker);
            tracker.stop();
            self.publish(&tracker.state);
        }
        self.send(CoverCommand::Stop);
    }

    /// Handle a telegram sent by the device
    pub fn handle_telegram(&self, telegram: &Telegram) {
        if telegram.rorg != Rorg::Vld {
            trace!(rorg = ?telegram.rorg, "Ignoring non-VLD telegram");
            return;
        }
        let Some(raw) = telegram.byte(0) else {
            return;
        };
        if raw > MAX_POSITION {
            debug!(device_id = %self.shared.info.device_id, raw, "Ignoring position outside 0..=100");
            return;
        }
        self.position_reported(MAX_POSITION - raw);
    }

    /// Interpret a decoded position report (0 = closed, 100 = open)
    pub fn position_reported(&self, reported: u8) {
        let effects = {
            let mut tracker = lock(&self.shared.tracker);
            let effects = tracker.report(reported);
            trace!(
                device_id = %self.shared.info.device_id,
                reported,
                state = ?tracker.state,
                "Position report"
            );
            if effects.publish {
                self.publish(&tracker.state);
            }
            effects
        };
        self.start_watchdog(effects.start_watchdog);
    }

    fn move_to<F>(&self, command: CoverCommand, record: F)
    where
        F: FnOnce(&mut Tracker) -> Option<CancellationToken>,
    {
        let token = {
            let mut tracker = lock(&self.shared.tracker);
            let token = record(&mut *tracker);
            self.publish(&tracker.state);
            token
        };
        self.start_watchdog(token);
        self.send(command);
    }

    fn start_watchdog(&self, token: Option<CancellationToken>) {
        let Some(token) = token else {
            return;
        };
        let period = lock(&self.shared.tracker).watchdog.config().interval();
        let cover = self.clone();
        watchdog::spawn(token, period, move |token| cover.watchdog_tick(token));
    }

    /// One watchdog wake-up; returns whether the task keeps running
    fn watchdog_tick(&self, token: &CancellationToken) -> bool {
        let tick = {
            let mut tracker = lock(&self.shared.tracker);
            if token.is_cancelled() {
                return false;
            }
            tracker.watchdog.tick()
        };

        match tick {
            Tick::Disabled => false,
            Tick::Waiting => true,
            Tick::Query => {
                self.send(CoverCommand::QueryPosition);
                true
            }
            Tick::Exhausted => {
                self.send(CoverCommand::QueryPosition);
                self.give_up();
                false
            }
        }
    }

    /// Forget the position after the last query went unanswered
    fn give_up(&self) {
        let mut tracker = lock(&self.shared.tracker);
        // A report that re-armed the watchdog meanwhile wins
        if tracker.watchdog.is_enabled() {
            return;
        }
        debug!(
            device_id = %self.shared.info.device_id,
            "Watchdog query limit reached, position unknown"
        );
        tracker.forget_position();
        self.publish(&tracker.state);
    }

    fn send(&self, command: CoverCommand) {
        trace!(device_id = %self.shared.info.device_id, ?command, "Sending cover command");
        self.shared
            .ctx
            .send(command.telegram(self.shared.sender_id, self.shared.info.device_id));
    }

    fn publish(&self, state: &CoverState) {
        self.shared.ctx.publish(&self.shared.info, state.entity_state());
    }
}
