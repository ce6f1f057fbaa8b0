/// Declares a static global `IR_PORT` instance protected by a `critical_section` mutex.
///
/// This macro creates a `static` singleton `IR_PORT` suitable for use in
/// interrupt-based environments, where both the main loop and an ISR need
/// to safely access the shared port state.
///
/// # Arguments
/// - `$t`: The concrete transceiver type (must implement `IrTransceiver`)
///
/// # Example
/// ```rust,ignore
/// init_ir_port!(LedTransceiver<FacePin, Delay>);
/// ```
#[macro_export]
macro_rules! init_ir_port {
    ( $t:ty ) => {
        pub static IR_PORT: $crate::port::SharedIrPort<$t> = $crate::port::SharedIrPort::new();
    };
}

/// Installs a new port in the global `IR_PORT` declared by `init_ir_port!`.
///
/// # Arguments
/// - `$transceiver`: The transceiver driving the face LEDs
/// - `$config`: Optional `PortConfig`; the defaults are used when omitted
///
/// # Example
/// ```rust,ignore
/// fn main() {
///     setup_ir_port!(leds);
///     // or
///     setup_ir_port!(leds, PortConfig::new().with_framing(Framing::RawBytes));
/// }
/// ```
///
/// # Notes
/// - Requires `init_ir_port!` to have been used earlier.
/// - A port installed earlier is dropped.
#[macro_export]
macro_rules! setup_ir_port {
    ( $transceiver:expr ) => {
        $crate::setup_ir_port!($transceiver, $crate::config::PortConfig::new())
    };
    ( $transceiver:expr, $config:expr ) => {{
        let _ = IR_PORT.install($crate::port::IrPort::new($transceiver, $config));
    }};
}

/// Calls `tick()` on the global `IR_PORT` if it has been set up.
///
/// This macro is intended to be invoked from the timer ISR that fires once
/// per tick.
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn TIMER1_COMPA() {
///     tick_ir_timer!();
/// }
/// ```
///
/// # Notes
/// - Safe to call before `setup_ir_port!`; it does nothing until then.
#[macro_export]
macro_rules! tick_ir_timer {
    () => {
        IR_PORT.tick()
    };
}

#[cfg(test)]
mod tests {
    use crate::config::{Framing, PortConfig};
    use crate::time::Clock;
    use crate::transceiver::{FaceMask, IrTransceiver};

    #[derive(Debug)]
    pub struct Dark;

    impl IrTransceiver for Dark {
        fn sample(&mut self) -> FaceMask {
            0
        }

        fn flash(&mut self, _faces: FaceMask) {}
    }

    init_ir_port!(Dark);

    #[test]
    fn test_port_macros() {
        tick_ir_timer!();
        assert_eq!(IR_PORT.millis(), 0);

        setup_ir_port!(Dark, PortConfig::new().with_framing(Framing::RawBytes));
        assert_eq!(
            IR_PORT.with(|port| port.config().framing),
            Some(Framing::RawBytes)
        );
        for _ in 0..2_000 {
            tick_ir_timer!();
        }
        assert_eq!(IR_PORT.millis(), 256);

        setup_ir_port!(Dark);
        assert_eq!(IR_PORT.with(|port| port.config().framing), Some(Framing::Packets));
    }
}
