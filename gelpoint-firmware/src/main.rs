//! Gelpoint - Autoclave Cure Controller Firmware
//!
//! Main firmware binary for the two-zone RP2040 autoclave board. Drives a
//! single embedded recipe through the cure controller in gelpoint-core.
//!
//! Named after the gel point, the moment a thermoset resin stops flowing
//! and starts to hold its shape.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::adc::{Adc, Channel, InterruptHandler as AdcInterruptHandler};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::pwm::Pwm;
use heapless::Vec;
use {defmt_rtt as _, panic_probe as _};

use gelpoint_core::config::{parse_recipe, Recipe};
use gelpoint_drivers::actuator::{ActuatorBank, PwmPower, SolenoidValve};

mod board;
mod channels;
mod tasks;

/// Embedded recipe (compiled into firmware)
/// Edit recipe.toml and rebuild to change it
const EMBEDDED_RECIPE: &str = include_str!("../recipe.toml");

bind_interrupts!(struct Irqs {
    ADC_IRQ_FIFO => AdcInterruptHandler;
});

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Gelpoint firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // Outputs come up off before anything can command them
    let (heater_0, heater_1) =
        Pwm::new_output_ab(p.PWM_SLICE1, p.PIN_2, p.PIN_3, board::heater_pwm_config()).split();
    let (pump, valve) =
        Pwm::new_output_ab(p.PWM_SLICE2, p.PIN_4, p.PIN_5, board::drive_pwm_config()).split();

    let mut heaters = Vec::new();
    for output in [heater_0, heater_1] {
        let _ = heaters.push(PwmPower::new(unwrap!(output)));
    }

    // Vent is a normally-open valve: de-energised is open
    let vent = SolenoidValve::new(Output::new(p.PIN_6, Level::Low), true, true);
    let relief = SolenoidValve::normally_closed(Output::new(p.PIN_7, Level::Low));

    let actuators = ActuatorBank::new(
        heaters,
        PwmPower::new(unwrap!(pump)),
        PwmPower::new(unwrap!(valve)),
        vent,
        relief,
    );
    info!("Actuators initialized, all outputs off");

    // Safety inputs
    let estop_line = Input::new(p.PIN_11, Pull::Up);
    let door = Input::new(p.PIN_10, Pull::Up);

    let buttons = tasks::Buttons {
        start: Input::new(p.PIN_12, Pull::Up),
        stop: Input::new(p.PIN_13, Pull::Up),
        reset: Input::new(p.PIN_14, Pull::Up),
    };

    // Thermocouple amplifiers and 4-20 mA transducers on ADC0-3
    let adc = Adc::new(p.ADC, Irqs, embassy_rp::adc::Config::default());
    let inputs = tasks::AnalogInputs {
        zones: [
            Channel::new_pin(p.PIN_26, Pull::None),
            Channel::new_pin(p.PIN_27, Pull::None),
        ],
        vacuum: Channel::new_pin(p.PIN_28, Pull::None),
        pressure: Channel::new_pin(p.PIN_29, Pull::None),
    };
    info!("ADC initialized");

    channels::init_sensor_cache();
    let recipe = load_recipe();
    let tick_ms = board::controller_config().schedule.tick_ms;

    // The e-stop watcher goes first so the latch is live before control starts
    unwrap!(spawner.spawn(tasks::estop_task(estop_line)));
    unwrap!(spawner.spawn(tasks::sensor_task(adc, inputs, door, tick_ms)));
    unwrap!(spawner.spawn(tasks::buttons_task(buttons)));
    unwrap!(spawner.spawn(tasks::control_task(recipe, actuators)));

    info!("All tasks spawned, firmware running");

    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

/// Parse the embedded recipe
///
/// A recipe that fails to parse leaves the board idle with starts refused;
/// build.rs catches most problems before they get this far.
fn load_recipe() -> Option<Recipe> {
    match parse_recipe(EMBEDDED_RECIPE) {
        Ok(recipe) => {
            info!(
                "Embedded recipe: {} ({} segments)",
                recipe.profile.name.as_str(),
                recipe.profile.len()
            );
            Some(recipe)
        }
        Err(e) => {
            error!("Failed to parse embedded recipe: {}", e);
            None
        }
    }
}
