//! Fixed pin assignment of the SenseEdge user project.
//!
//! Configured once at bring-up, before the pipeline is enabled. The RX pin
//! is assigned but never driven or read by the control program.

/// Pin direction, from the controller's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinDirection {
    /// Driven by external hardware, read by the chip.
    Input,
    /// Driven by the chip.
    Output,
}

/// ADC serial data in (MISO).
pub const ADC_MISO: u8 = 0;
/// ADC serial clock out.
pub const ADC_SCLK: u8 = 1;
/// ADC chip select out, active low.
pub const ADC_CS_N: u8 = 2;
/// Alarm output (LED / buzzer).
pub const ALARM_OUT: u8 = 3;
/// Status LED.
pub const STATUS_LED: u8 = 4;
/// Telemetry transmit.
pub const UART_TX: u8 = 5;
/// Telemetry receive (assigned, unused by the control loop).
pub const UART_RX: u8 = 6;

/// One row of the fixed pin assignment.
#[derive(Debug, Clone, Copy)]
pub struct PinAssignment {
    /// User-project pin number.
    pub pin: u8,
    /// Required direction.
    pub direction: PinDirection,
    /// Human-readable role.
    pub role: &'static str,
}

/// The complete assignment, in pin order.
pub const PIN_ASSIGNMENTS: [PinAssignment; 7] = [
    PinAssignment { pin: ADC_MISO, direction: PinDirection::Input, role: "ADC data in" },
    PinAssignment { pin: ADC_SCLK, direction: PinDirection::Output, role: "ADC clock" },
    PinAssignment { pin: ADC_CS_N, direction: PinDirection::Output, role: "ADC chip select" },
    PinAssignment { pin: ALARM_OUT, direction: PinDirection::Output, role: "alarm" },
    PinAssignment { pin: STATUS_LED, direction: PinDirection::Output, role: "status LED" },
    PinAssignment { pin: UART_TX, direction: PinDirection::Output, role: "telemetry TX" },
    PinAssignment { pin: UART_RX, direction: PinDirection::Input, role: "telemetry RX (unused)" },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_pin_assigned_exactly_once() {
        let mut seen = [false; 7];
        for a in &PIN_ASSIGNMENTS {
            let idx = usize::from(a.pin);
            assert!(!seen[idx], "pin {idx} assigned twice");
            seen[idx] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn directions_match_roles() {
        for a in &PIN_ASSIGNMENTS {
            let expected = match a.pin {
                ADC_MISO | UART_RX => PinDirection::Input,
                _ => PinDirection::Output,
            };
            assert_eq!(a.direction, expected, "pin {}", a.pin);
        }
    }
}
