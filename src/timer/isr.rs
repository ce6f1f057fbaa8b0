use crate::config::PortConfig;
use crate::port::{IrPort, SharedIrPort};
use crate::transceiver::IrTransceiver;

/// Used to initialize the global static `SharedIrPort` for use with
/// `critical_section`.
///
/// # Returns
/// * An empty port slot
///
/// # Example
/// ```rust,ignore
/// use hexir::port::SharedIrPort;
/// use some_board::Leds;
///
/// static IR_PORT: SharedIrPort<Leds> = global_ir_port_init::<Leds>();
/// ```
pub const fn global_ir_port_init<T: IrTransceiver>() -> SharedIrPort<T> {
    SharedIrPort::new()
}

/// Installs a new port in the global slot.
///
/// # Arguments
/// * The global static `SharedIrPort`
/// * The transceiver driving the six face LEDs
/// * The port settings; `tick_us` must match the timer interrupt period
///
/// # Example
/// ```rust,ignore
/// fn main() {
///     global_ir_port_setup(&IR_PORT, leds, PortConfig::new());
/// }
/// ```
pub fn global_ir_port_setup<T: IrTransceiver>(
    global_port: &'static SharedIrPort<T>,
    transceiver: T,
    config: PortConfig,
) {
    if global_port.install(IrPort::new(transceiver, config)).is_some() {
        warn!("IR port replaced");
    }
}

/// Runs the tick at each interrupt
///
/// # Arguments
/// * The global static `SharedIrPort`
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn TIMER1_COMPA() {
///     global_ir_timer_tick(&IR_PORT);
/// }
/// ```
pub fn global_ir_timer_tick<T: IrTransceiver>(global_port: &'static SharedIrPort<T>) {
    global_port.tick();
}
