//! Emergency-stop line watcher
//!
//! The e-stop loop is normally closed to ground; a pressed button or a cut
//! wire lets the pull-up take the line high. The GPIO edge interrupt wakes
//! this task, which only ever writes the latch. The control task samples
//! the latch at the start of every tick.

use defmt::*;
use embassy_rp::gpio::Input;
use embassy_time::Timer;

use crate::channels::ESTOP;

/// Line must stay low this long before the latch is released
const RELEASE_SETTLE_MS: u64 = 200;

#[embassy_executor::task]
pub async fn estop_task(mut line: Input<'static>) {
    info!("E-stop watcher started");

    loop {
        if line.is_high() {
            if !ESTOP.is_asserted() {
                warn!("E-stop asserted");
            }
            ESTOP.assert();

            line.wait_for_low().await;
            Timer::after_millis(RELEASE_SETTLE_MS).await;
            if line.is_low() {
                ESTOP.release();
                info!("E-stop released");
            }
        } else {
            line.wait_for_high().await;
        }
    }
}
