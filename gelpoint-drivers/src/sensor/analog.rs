//! Linear analog transducers
//!
//! Thermocouple amplifiers, vacuum gauges and pressure transmitters all
//! present a voltage (or a 4-20 mA loop across a shunt) proportional to the
//! measured quantity. One linear map covers them; the presets below fix the
//! spans for the parts the board is built around.

use gelpoint_core::traits::SensorError;

/// ADC reading trait for platform abstraction
pub trait AdcReader {
    /// Read ADC value (12-bit, 0-4095)
    #[allow(clippy::result_unit_err)]
    fn read(&mut self) -> Result<u16, ()>;
}

/// Raw counts within this margin of either rail are treated as a wiring fault
const RAIL_MARGIN: u16 = 10;

/// Raw ADC counts to engineering units
///
/// `raw_low..=raw_high` maps onto `value_low..=value_high`. Readings at the
/// rails are reported as open or short circuit; readings between a rail and
/// the span (a 4-20 mA loop reading 2 mA, say) are out of range.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinearTransducer {
    pub raw_low: u16,
    pub raw_high: u16,
    pub value_low: f32,
    pub value_high: f32,
    /// Full-scale ADC count
    pub adc_max: u16,
    /// Whether a floating input pulls to the top rail
    ///
    /// AD8495 boards pull an open thermocouple high; a broken current loop
    /// reads zero.
    pub open_reads_high: bool,
}

impl LinearTransducer {
    /// AD8495 K-type amplifier at 5 mV/°C, 3.3 V ADC reference
    ///
    /// Span 0 °C to 600 °C over 0-3.0 V.
    pub const fn ad8495() -> Self {
        Self {
            raw_low: 0,
            raw_high: 3723,
            value_low: 0.0,
            value_high: 600.0,
            adc_max: 4096,
            open_reads_high: true,
        }
    }

    /// 4-20 mA vacuum transducer across a 150 Ω shunt, 0-760 mmHg
    pub const fn vacuum_4_20ma() -> Self {
        Self {
            raw_low: 745,
            raw_high: 3723,
            value_low: 0.0,
            value_high: 760.0,
            adc_max: 4096,
            open_reads_high: false,
        }
    }

    /// 4-20 mA pressure transmitter across a 150 Ω shunt, 0-150 psig
    pub const fn pressure_4_20ma() -> Self {
        Self {
            raw_low: 745,
            raw_high: 3723,
            value_low: 0.0,
            value_high: 150.0,
            adc_max: 4096,
            open_reads_high: false,
        }
    }

    /// Convert a raw reading
    pub fn convert(&self, raw: u16) -> Result<f32, SensorError> {
        let top = self.adc_max.saturating_sub(RAIL_MARGIN);
        if raw >= top {
            return Err(if self.open_reads_high {
                SensorError::OpenCircuit
            } else {
                SensorError::ShortCircuit
            });
        }
        if raw < RAIL_MARGIN && self.raw_low >= RAIL_MARGIN {
            return Err(if self.open_reads_high {
                SensorError::ShortCircuit
            } else {
                SensorError::OpenCircuit
            });
        }

        // Allow a few counts of slop either side of the span for offset error
        let slop = RAIL_MARGIN as i32;
        let raw_i = raw as i32;
        if raw_i < self.raw_low as i32 - slop || raw_i > self.raw_high as i32 + slop {
            return Err(SensorError::OutOfRange);
        }

        let span_raw = (self.raw_high as f32) - (self.raw_low as f32);
        if span_raw <= 0.0 {
            return Err(SensorError::OutOfRange);
        }
        let fraction = ((raw as f32) - (self.raw_low as f32)) / span_raw;
        let fraction = fraction.clamp(0.0, 1.0);
        Ok(self.value_low + fraction * (self.value_high - self.value_low))
    }
}

/// One ADC input paired with its transducer
pub struct AnalogChannel<ADC> {
    adc: ADC,
    transducer: LinearTransducer,
}

impl<ADC: AdcReader> AnalogChannel<ADC> {
    pub fn new(adc: ADC, transducer: LinearTransducer) -> Self {
        Self { adc, transducer }
    }

    /// Take one sample and convert it
    ///
    /// A failed ADC conversion reads as out of range.
    pub fn sample(&mut self) -> Result<f32, SensorError> {
        let raw = self.adc.read().map_err(|_| SensorError::OutOfRange)?;
        self.transducer.convert(raw)
    }

    pub fn transducer(&self) -> &LinearTransducer {
        &self.transducer
    }
}

/// Dummy ADC for testing (returns a fixed value)
#[cfg(test)]
pub struct DummyAdc(pub u16);

#[cfg(test)]
impl AdcReader for DummyAdc {
    fn read(&mut self) -> Result<u16, ()> {
        Ok(self.0)
    }
}
