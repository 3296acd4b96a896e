//! Sensor sampling task
//!
//! Samples every analog channel and the door line once per base tick and
//! publishes the results to the sensor cache. The control task never waits
//! on the ADC.

use defmt::*;
use embassy_rp::adc::{Adc, Async, Channel};
use embassy_rp::gpio::Input;
use embassy_time::{Duration, Ticker};

use gelpoint_core::traits::SensorError;
use gelpoint_drivers::sensor::LinearTransducer;

use crate::board::{self, ZONE_COUNT};
use crate::channels::SENSOR_CACHE;

/// ADC inputs in board order
pub struct AnalogInputs {
    pub zones: [Channel<'static>; ZONE_COUNT],
    pub vacuum: Channel<'static>,
    pub pressure: Channel<'static>,
}

async fn sample(
    adc: &mut Adc<'static, Async>,
    channel: &mut Channel<'static>,
    transducer: &LinearTransducer,
) -> Result<f32, SensorError> {
    match adc.read(channel).await {
        Ok(raw) => transducer.convert(raw),
        Err(_) => Err(SensorError::OutOfRange),
    }
}

#[embassy_executor::task]
pub async fn sensor_task(
    mut adc: Adc<'static, Async>,
    mut inputs: AnalogInputs,
    door: Input<'static>,
    period_ms: u32,
) {
    info!("Sensor task started, {}ms period", period_ms);

    let mut ticker = Ticker::every(Duration::from_millis(period_ms as u64));
    let mut zone_ok = [true; ZONE_COUNT];

    loop {
        let mut zones = [Err(SensorError::NotReady); ZONE_COUNT];
        for (i, (slot, channel)) in zones.iter_mut().zip(inputs.zones.iter_mut()).enumerate() {
            *slot = sample(&mut adc, channel, &board::THERMOCOUPLE).await;

            // Log edges only; the controller counts the streak
            match (zone_ok[i], *slot) {
                (true, Err(e)) => warn!("Zone {} thermocouple: {}", i, e),
                (false, Ok(_)) => info!("Zone {} thermocouple recovered", i),
                _ => {}
            }
            zone_ok[i] = slot.is_ok();
        }
        let vacuum = sample(&mut adc, &mut inputs.vacuum, &board::VACUUM_GAUGE).await;
        let pressure = sample(&mut adc, &mut inputs.pressure, &board::PRESSURE_GAUGE).await;
        // Switch to ground when the door is closed and locked
        let door_closed = door.is_low();

        SENSOR_CACHE.lock(|cache| {
            let mut cache = cache.borrow_mut();
            for (i, sample) in zones.iter().enumerate() {
                cache.set_zone(i, *sample);
            }
            cache.set_vacuum(0, vacuum);
            cache.set_pressure(0, pressure);
            cache.set_door_closed(door_closed);
        });

        ticker.next().await;
    }
}
