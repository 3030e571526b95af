//! EnOcean entity platforms
//!
//! Entities translate telegrams of configured devices into observable state
//! and user commands into telegrams:
//!
//! - [`Cover`]: D2-05-00 blinds, with motion tracking and a stop watchdog
//! - [`Switch`]: D2-01 actuators, one entity per channel
//! - [`Light`]: Eltako FUD61NPN dimmers
//! - [`BinarySensor`]: F6-02 rocker switches
//! - [`Sensor`]: temperature, humidity, power and window handle sensors
//!
//! The [`Hub`] owns the entities and routes received telegrams to them.

pub mod binary_sensor;
pub mod cover;
pub mod entity;
pub mod hub;
pub mod light;
pub mod platform;
pub mod sensor;
pub mod state_store;
pub mod switch;
pub mod watchdog;

pub use binary_sensor::BinarySensor;
pub use cover::{Cover, CoverCommand, CoverError, CoverState};
pub use entity::{DeviceInfo, EntityContext, EntityInfo};
pub use hub::Hub;
pub use light::Light;
pub use platform::{entities_for_device, Platform};
pub use sensor::{HandlePosition, Sensor, SensorKind, SensorValue};
pub use state_store::{EntityState, SharedStateStore, StateStore};
pub use switch::Switch;
pub use watchdog::{Tick, WatchdogTimer};
