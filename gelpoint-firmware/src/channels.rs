//! Inter-task communication
//!
//! Defines the statics shared between Embassy tasks. Each has exactly one
//! writer: the sampling task owns the sensor cache, the e-stop watcher owns
//! the latch, the button task feeds operator commands.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::Channel;

use gelpoint_core::safety::EstopLatch;
use gelpoint_drivers::sensor::SensorCache;

use crate::board;

/// Channel capacity for operator commands
const COMMAND_CHANNEL_SIZE: usize = 4;

/// Operator panel commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum OperatorCommand {
    Start,
    Stop,
    /// Reset a fault, or acknowledge a completed cycle
    Reset,
}

/// Emergency-stop latch, written by the e-stop watcher only
pub static ESTOP: EstopLatch = EstopLatch::new();

/// Latest sensor samples, written by the sampling task only
pub static SENSOR_CACHE: Mutex<CriticalSectionRawMutex, RefCell<SensorCache>> =
    Mutex::new(RefCell::new(SensorCache::empty()));

/// Commands from the operator panel
pub static COMMAND_CHANNEL: Channel<CriticalSectionRawMutex, OperatorCommand, COMMAND_CHANNEL_SIZE> =
    Channel::new();

/// Size the sensor cache for this board; call once before spawning tasks
pub fn init_sensor_cache() {
    SENSOR_CACHE.lock(|cache| {
        *cache.borrow_mut() = SensorCache::new(
            board::ZONE_COUNT,
            board::VACUUM_CHANNELS,
            board::PRESSURE_CHANNELS,
        );
    });
}
