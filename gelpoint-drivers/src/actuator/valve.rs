//! Solenoid valve output
//!
//! On/off valve driven through a GPIO pin (directly or via SSR/MOSFET).

use embedded_hal::digital::OutputPin;

/// Solenoid valve on a GPIO pin
///
/// `inverted` drives the pin low to open, for active-low driver boards.
/// A write error leaves the logical state unchanged.
pub struct SolenoidValve<P> {
    pin: P,
    /// If true, valve OPEN = pin LOW
    inverted: bool,
    /// Current logical state (true = open)
    open: bool,
}

impl<P: OutputPin> SolenoidValve<P> {
    /// Create a valve, starting in the given position
    ///
    /// # Arguments
    /// - `pin`: The GPIO pin to control
    /// - `inverted`: If true, valve is OPEN when pin is LOW
    /// - `open`: Initial position
    pub fn new(pin: P, inverted: bool, open: bool) -> Self {
        let mut valve = Self {
            pin,
            inverted,
            open: !open,
        };
        // A failed initial write still records the requested position
        if valve.set_open(open).is_err() {
            valve.open = open;
        }
        valve
    }

    /// Vent-style valve: active-high, starts open
    pub fn normally_open(pin: P) -> Self {
        Self::new(pin, false, true)
    }

    /// Active-high, starts closed
    pub fn normally_closed(pin: P) -> Self {
        Self::new(pin, false, false)
    }

    pub fn set_open(&mut self, open: bool) -> Result<(), P::Error> {
        if open != self.inverted {
            self.pin.set_high()?;
        } else {
            self.pin.set_low()?;
        }
        self.open = open;
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}
