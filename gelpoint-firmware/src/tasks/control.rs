//! Cure control task
//!
//! Owns the controller and every actuator. Runs the controller tick on a
//! fixed `Ticker` at the base tick period, after draining any operator
//! commands that arrived since the last tick.

use defmt::*;
use embassy_time::{Duration, Ticker, Timer};

use gelpoint_core::config::Recipe;
use gelpoint_core::control::average_temperature;
use gelpoint_core::state::ProcessState;
use gelpoint_core::traits::Actuators;
use gelpoint_core::CureController;

use crate::board::{self, BoardActuators};
use crate::channels::{OperatorCommand, COMMAND_CHANNEL, ESTOP, SENSOR_CACHE};

/// Base ticks between status log lines
const STATUS_EVERY: u32 = 600;

#[embassy_executor::task]
pub async fn control_task(recipe: Option<Recipe>, mut actuators: BoardActuators) {
    info!("Control task started");

    let config = board::controller_config();
    let mut controller = match CureController::new(config, board::safety_limits(), &ESTOP) {
        Ok(controller) => controller,
        Err(e) => {
            error!("Board configuration rejected: {}", e);
            park(&mut actuators).await;
            return;
        }
    };

    match recipe {
        Some(recipe) => {
            // Rejection is logged by the controller; starts then fail with NoRecipe
            let _ = controller.load_recipe(recipe);
        }
        None => warn!("No recipe loaded; cycle start disabled"),
    }

    let mut ticker = Ticker::every(Duration::from_millis(config.schedule.tick_ms as u64));
    let mut ticks: u32 = 0;

    loop {
        ticker.next().await;

        while let Ok(command) = COMMAND_CHANNEL.try_receive() {
            handle_command(&mut controller, &mut actuators, command);
        }

        // Tick on a copy so the sampling task is never held off
        let mut sensors = SENSOR_CACHE.lock(|cache| cache.borrow().clone());
        controller.tick(&mut sensors, &mut actuators);

        ticks = ticks.wrapping_add(1);
        if ticks % STATUS_EVERY == 0 {
            log_status(&controller, &actuators);
        }
    }
}

fn handle_command(
    controller: &mut CureController<'_>,
    actuators: &mut BoardActuators,
    command: OperatorCommand,
) {
    let result = match command {
        OperatorCommand::Start => controller.start_cycle(),
        OperatorCommand::Stop => controller.stop_cycle(actuators),
        OperatorCommand::Reset if controller.state() == ProcessState::Complete => {
            controller.acknowledge()
        }
        OperatorCommand::Reset => controller.reset_fault(),
    };
    if result.is_ok() {
        info!("{} accepted in {}", command, controller.state());
    }
}

fn log_status(controller: &CureController<'_>, actuators: &BoardActuators) {
    let status = controller.status();
    let cure = controller.cure();
    info!(
        "{} seg {} {}% | {}°C {}mmHg {}psi | alpha {} | alarms {} | write errors {}",
        status.state,
        status.current_segment,
        status.completion_percent,
        average_temperature(controller.zones()),
        controller.vacuum_pressure().vacuum_measured,
        controller.vacuum_pressure().pressure_measured,
        cure.degree_of_cure,
        controller.alarms().len(),
        actuators.write_errors()
    );
}

/// Hold every output safe forever; the board is unusable
async fn park(actuators: &mut BoardActuators) {
    loop {
        for zone in 0..board::ZONE_COUNT {
            actuators.set_heater_power(zone, 0.0);
        }
        actuators.set_vacuum_pump(0.0);
        actuators.set_pressure_valve(0.0);
        actuators.open_vent(true);
        actuators.open_pressure_relief(true);
        Timer::after_secs(1).await;
    }
}
