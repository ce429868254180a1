//! Telemetry wire protocol
//!
//! Renders pipeline results as the CRLF-terminated line protocol the
//! monitoring side expects:
//!
//! ```text
//! SenseEdge v1.0 Online
//! Monitoring vibration...
//! CLASS:HEALTHY CONF:196 ALARM:0
//! CLASS:BEARING_WEAR CONF:201 ALARM:1
//! *** ALARM: Fault detected! ***
//! Class: BEARING_WEAR
//! ```
//!
//! The `ALARM:` digit mirrors the `STATUS` alarm bit at the time the
//! result was sampled; the alarm banner is gated on the alarm IRQ flag,
//! so it appears once per alarm assertion rather than on every line while
//! the condition persists.

use crate::pipeline::CycleOutcome;
use crate::serial::{TxLine, UartTx};
use senseedge_chip::regs;
use tracing::{debug, warn};

/// First banner line, sent once at startup.
pub const BANNER_LINE_1: &str = "SenseEdge v1.0 Online";

/// Second banner line, sent once at startup.
pub const BANNER_LINE_2: &str = "Monitoring vibration...";

/// Emitted before a class line whose cycle exhausted the poll budget.
pub const TIMEOUT_WARNING: &str = "WARN: Pipeline timeout";

/// First line of the alarm banner.
pub const ALARM_BANNER: &str = "*** ALARM: Fault detected! ***";

/// Formats cycle outcomes onto a serial line
#[derive(Debug)]
pub struct Reporter<L: TxLine> {
    tx: UartTx<L>,
}

impl<L: TxLine> Reporter<L> {
    /// Wrap a transmitter.
    pub fn new(tx: UartTx<L>) -> Self {
        Self { tx }
    }

    /// Send the two-line startup banner.
    pub fn banner(&mut self) {
        self.tx.send_line(BANNER_LINE_1);
        self.tx.send_line(BANNER_LINE_2);
    }

    /// Report one cycle.
    ///
    /// A timed-out cycle still gets its class line (the registers hold
    /// the previous result), prefixed with the timeout warning.
    pub fn report(&mut self, outcome: &CycleOutcome) {
        if outcome.timed_out {
            self.tx.send_line(TIMEOUT_WARNING);
        }

        self.tx.send_str("CLASS:");
        self.tx.send_str(outcome.class.name());
        self.tx.send_str(" CONF:");
        self.tx.send_dec(u32::from(outcome.confidence));
        self.tx.send_str(" ALARM:");
        self.tx.send_byte(if outcome.alarm { b'1' } else { b'0' });
        self.tx.send_str("\r\n");

        if outcome.irq_flags & regs::irq::ALARM != 0 {
            self.tx.send_line(ALARM_BANNER);
            self.tx.send_str("Class: ");
            self.tx.send_str(outcome.class.name());
            self.tx.send_str("\r\n");
            warn!("Alarm reported: {} conf {}", outcome.class, outcome.confidence);
        } else {
            debug!(
                "Reported {} conf {} alarm {}",
                outcome.class, outcome.confidence, outcome.alarm
            );
        }
    }

    /// Direct access to the transmitter
    pub fn tx_mut(&mut self) -> &mut UartTx<L> {
        &mut self.tx
    }

    /// Consume the reporter, returning the transmitter.
    pub fn into_tx(self) -> UartTx<L> {
        self.tx
    }
}
