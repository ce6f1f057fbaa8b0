use embedded_hal::delay::DelayNs;

use crate::port::IrPort;
use crate::transceiver::IrTransceiver;

/// Runs a blocking loop that repeatedly calls `tick()` on the provided port.
///
/// This is a simple timing loop for use in environments where interrupts are
/// unavailable or undesired, such as bring-up on a new board. It drives the
/// port's timing using a delay provider implementing
/// `embedded_hal::delay::DelayNs`.
///
/// # Arguments
/// - `port`: A mutable reference to an `IrPort` instance.
/// - `delay`: A delay provider implementing `DelayNs`, typically from the HAL.
/// - `tick_us`: The delay between each tick call, in microseconds. Subtract
///   the measured duration of `tick()` from the tick length.
///
/// # Example
/// ```rust,ignore
/// use hexir::timer::run_ir_tick_loop;
/// let mut port = IrPort::new(leds, PortConfig::new());
/// run_ir_tick_loop(&mut port, &mut delay, 110);
/// ```
///
/// # Notes
/// - This loop never returns; there is no main loop left to run a tile.
///   Use [`run_ir_ticks`] to interleave ticking with other work.
pub fn run_ir_tick_loop<D: DelayNs, T: IrTransceiver>(
    port: &mut IrPort<T>,
    delay: &mut D,
    tick_us: u32,
) -> ! {
    loop {
        port.tick();
        delay.delay_us(tick_us);
    }
}

/// Calls `tick()` `count` times, `tick_us` microseconds apart.
pub fn run_ir_ticks<D: DelayNs, T: IrTransceiver>(
    port: &mut IrPort<T>,
    delay: &mut D,
    tick_us: u32,
    count: u32,
) {
    for _ in 0..count {
        port.tick();
        delay.delay_us(tick_us);
    }
}
