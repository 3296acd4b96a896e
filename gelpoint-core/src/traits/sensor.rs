//! Sensor collaborator trait

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Errors that can occur when sampling a sensor channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SensorError {
    /// Sensor disconnected (open circuit)
    OpenCircuit,
    /// Sensor shorted to ground
    ShortCircuit,
    /// Reading out of expected range
    OutOfRange,
    /// No sample has been taken yet
    NotReady,
    /// Channel index does not exist on this board
    NoSuchChannel,
}

/// Latest-sample access to the autoclave's sensors
///
/// Every read must be non-blocking and bounded-time. Implementations return
/// the most recent cached sample; the sampling itself happens elsewhere
/// (an ADC task on target, a plant model in tests).
pub trait Sensors {
    /// Zone temperature in °C
    fn read_zone_temperature(&mut self, zone: usize) -> Result<f32, SensorError>;

    /// Bag vacuum in mmHg below atmosphere (0 = vented, 760 = full vacuum)
    fn read_vacuum(&mut self, channel: usize) -> Result<f32, SensorError>;

    /// Vessel gauge pressure in psi
    fn read_pressure(&mut self, channel: usize) -> Result<f32, SensorError>;

    /// Door interlock line; `true` when the door is closed and locked
    fn door_closed(&mut self) -> bool;
}
