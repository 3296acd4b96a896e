//! Operator panel buttons
//!
//! Start, Stop and Reset are momentary switches to ground. A press is
//! accepted once it has held through the debounce window, then the task
//! waits for release before listening again.

use defmt::*;
use embassy_futures::select::{select3, Either3};
use embassy_rp::gpio::Input;
use embassy_time::Timer;

use crate::channels::{OperatorCommand, COMMAND_CHANNEL};

const DEBOUNCE_MS: u64 = 30;

pub struct Buttons {
    pub start: Input<'static>,
    pub stop: Input<'static>,
    pub reset: Input<'static>,
}

impl Buttons {
    fn pin(&mut self, command: OperatorCommand) -> &mut Input<'static> {
        match command {
            OperatorCommand::Start => &mut self.start,
            OperatorCommand::Stop => &mut self.stop,
            OperatorCommand::Reset => &mut self.reset,
        }
    }
}

#[embassy_executor::task]
pub async fn buttons_task(mut buttons: Buttons) {
    info!("Button task started");

    loop {
        let command = match select3(
            buttons.start.wait_for_falling_edge(),
            buttons.stop.wait_for_falling_edge(),
            buttons.reset.wait_for_falling_edge(),
        )
        .await
        {
            Either3::First(()) => OperatorCommand::Start,
            Either3::Second(()) => OperatorCommand::Stop,
            Either3::Third(()) => OperatorCommand::Reset,
        };

        Timer::after_millis(DEBOUNCE_MS).await;
        let pin = buttons.pin(command);
        if pin.is_high() {
            // Bounce
            continue;
        }

        debug!("Button: {}", command);
        if COMMAND_CHANNEL.try_send(command).is_err() {
            warn!("Command queue full, dropped {}", command);
        }

        pin.wait_for_high().await;
    }
}
