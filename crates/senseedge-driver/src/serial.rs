//! Bit-banged 8N1 serial telemetry
//!
//! The board routes telemetry over a plain GPIO driven as a UART TX line:
//! one start bit (low), eight data bits LSB-first, one stop bit (high),
//! no parity. [`UartTx`] produces that waveform over any [`TxLine`] and
//! carries the wire formatting helpers (hex and decimal rendering).
//!
//! Timing is wall-clock spin-waiting per bit, which is how a pin with no
//! hardware UART behind it has to be driven. Tests use
//! [`SerialTiming::immediate`] plus [`CaptureLine`] to record and decode
//! the waveform without waiting.

// Digit and nibble extractions below are masked to fit before the cast
#![allow(clippy::cast_possible_truncation)]

use crate::error::{Result, SenseEdgeError};
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;
use std::time::{Duration, Instant};

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Something that can drive a logic level
pub trait TxLine: std::fmt::Debug {
    /// Drive the line high (`true`) or low (`false`).
    fn set_level(&mut self, high: bool);
}

/// Per-bit timing for the serial waveform
#[derive(Debug, Clone, Copy)]
pub struct SerialTiming {
    /// Duration of one bit slot
    pub bit_period: Duration,
}

impl SerialTiming {
    /// Timing for a standard baud rate (rounded to whole nanoseconds).
    ///
    /// # Panics
    ///
    /// Panics if `baud` is zero.
    #[must_use]
    pub const fn from_baud(baud: u32) -> Self {
        assert!(baud > 0, "baud rate must be nonzero");
        let nanos = (1_000_000_000 + baud as u64 / 2) / baud as u64;
        Self {
            bit_period: Duration::from_nanos(nanos),
        }
    }

    /// Zero bit period: no waiting. For tests and captures.
    #[must_use]
    pub const fn immediate() -> Self {
        Self {
            bit_period: Duration::ZERO,
        }
    }
}

impl Default for SerialTiming {
    fn default() -> Self {
        Self::from_baud(115_200)
    }
}

/// Serial transmitter over a [`TxLine`]
#[derive(Debug)]
pub struct UartTx<L: TxLine> {
    line: L,
    timing: SerialTiming,
}

impl<L: TxLine> UartTx<L> {
    /// Wrap a line with explicit timing. The line should already be idle
    /// high.
    pub fn new(line: L, timing: SerialTiming) -> Self {
        Self { line, timing }
    }

    /// Transmit one byte, framed 8N1.
    pub fn send_byte(&mut self, byte: u8) {
        self.line.set_level(false); // start
        self.hold();
        for bit in 0..8 {
            self.line.set_level(byte & (1 << bit) != 0);
            self.hold();
        }
        self.line.set_level(true); // stop
        self.hold();
    }

    /// Transmit a string, byte by byte.
    pub fn send_str(&mut self, s: &str) {
        for byte in s.bytes() {
            self.send_byte(byte);
        }
    }

    /// Transmit a string followed by CRLF.
    pub fn send_line(&mut self, s: &str) {
        self.send_str(s);
        self.send_str("\r\n");
    }

    /// Transmit `0x` plus exactly eight uppercase hex digits.
    pub fn send_hex(&mut self, value: u32) {
        self.send_str("0x");
        for i in (0..8).rev() {
            let digit = ((value >> (i * 4)) & 0xF) as usize;
            self.send_byte(HEX_DIGITS[digit]);
        }
    }

    /// Transmit a decimal number with no padding or sign.
    pub fn send_dec(&mut self, mut value: u32) {
        if value == 0 {
            self.send_byte(b'0');
            return;
        }
        // u32::MAX has 10 digits
        let mut buf = [0u8; 10];
        let mut len = 0;
        while value > 0 {
            buf[len] = b'0' + (value % 10) as u8;
            value /= 10;
            len += 1;
        }
        while len > 0 {
            len -= 1;
            self.send_byte(buf[len]);
        }
    }

    /// Direct access to the underlying line
    pub fn line_mut(&mut self) -> &mut L {
        &mut self.line
    }

    /// Consume the transmitter, returning the line.
    pub fn into_line(self) -> L {
        self.line
    }

    fn hold(&self) {
        if self.timing.bit_period.is_zero() {
            return;
        }
        let deadline = Instant::now() + self.timing.bit_period;
        while Instant::now() < deadline {
            std::hint::spin_loop();
        }
    }
}

/// Line that records every level transition; for tests and console output
#[derive(Debug, Default)]
pub struct CaptureLine {
    levels: Vec<bool>,
}

impl CaptureLine {
    /// Empty capture.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded bit slots, oldest first.
    #[must_use]
    pub fn levels(&self) -> &[bool] {
        &self.levels
    }

    /// Take the recorded slots, leaving the capture empty.
    pub fn drain(&mut self) -> Vec<bool> {
        std::mem::take(&mut self.levels)
    }
}

impl TxLine for CaptureLine {
    fn set_level(&mut self, high: bool) {
        self.levels.push(high);
    }
}

/// Decode captured bit slots back into bytes.
///
/// Scans for start bits, assembles eight data bits LSB-first, and keeps
/// the byte only if the stop slot is high. Trailing partial frames are
/// dropped.
#[must_use]
pub fn decode_frames(levels: &[bool]) -> Vec<u8> {
    let mut bytes = Vec::new();
    let mut i = 0;
    while i < levels.len() {
        if levels[i] {
            // Idle high between frames
            i += 1;
            continue;
        }
        if i + 10 > levels.len() {
            break;
        }
        let mut byte = 0u8;
        for bit in 0..8 {
            if levels[i + 1 + bit] {
                byte |= 1 << bit;
            }
        }
        if levels[i + 9] {
            bytes.push(byte);
        }
        i += 10;
    }
    bytes
}

/// Decode captured bit slots into text (lossy UTF-8).
#[must_use]
pub fn decode_to_string(levels: &[bool]) -> String {
    String::from_utf8_lossy(&decode_frames(levels)).into_owned()
}

/// TX line backed by a sysfs GPIO value file
#[derive(Debug)]
pub struct GpioTxLine {
    value: File,
    gpio: u32,
}

impl GpioTxLine {
    /// Open `/sys/class/gpio/gpioN/value` for an already-exported,
    /// output-configured GPIO.
    ///
    /// # Errors
    ///
    /// Returns `SenseEdgeError::Gpio` if the value file cannot be opened.
    pub fn open(gpio: u32) -> Result<Self> {
        Self::open_at(Path::new("/sys/class/gpio"), gpio)
    }

    /// Open the value file under an alternate GPIO tree.
    ///
    /// # Errors
    ///
    /// Returns `SenseEdgeError::Gpio` if the value file cannot be opened.
    pub fn open_at(root: &Path, gpio: u32) -> Result<Self> {
        let path = root.join(format!("gpio{gpio}")).join("value");
        let value = OpenOptions::new()
            .write(true)
            .open(&path)
            .map_err(|e| SenseEdgeError::gpio(gpio, format!("open {}: {e}", path.display())))?;
        tracing::debug!("Telemetry TX on gpio{gpio}");
        Ok(Self { value, gpio })
    }

    /// GPIO number behind this line
    #[must_use]
    pub const fn gpio(&self) -> u32 {
        self.gpio
    }
}

impl TxLine for GpioTxLine {
    fn set_level(&mut self, high: bool) {
        // The per-bit hot path cannot propagate errors; a wedged GPIO
        // shows up as garbled telemetry
        let _ = self.value.seek(SeekFrom::Start(0));
        let _ = self.value.write_all(if high { b"1" } else { b"0" });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture() -> UartTx<CaptureLine> {
        UartTx::new(CaptureLine::new(), SerialTiming::immediate())
    }

    #[test]
    fn byte_framing_is_8n1_lsb_first() {
        let mut tx = capture();
        tx.send_byte(0x55);
        // start, 1,0,1,0,1,0,1,0 (LSB first), stop
        assert_eq!(
            tx.into_line().levels(),
            [false, true, false, true, false, true, false, true, false, true]
        );
    }

    #[test]
    fn hex_is_fixed_width_uppercase() {
        let mut tx = capture();
        tx.send_hex(0x1A);
        tx.send_hex(0);
        tx.send_hex(0xDEAD_BEEF);
        let text = decode_to_string(tx.into_line().levels());
        assert_eq!(text, "0x0000001A0x000000000xDEADBEEF");
    }

    #[test]
    fn decimal_has_no_padding() {
        let mut tx = capture();
        tx.send_dec(0);
        tx.send_byte(b' ');
        tx.send_dec(42);
        tx.send_byte(b' ');
        tx.send_dec(u32::MAX);
        let text = decode_to_string(tx.into_line().levels());
        assert_eq!(text, "0 42 4294967295");
    }

    #[test]
    fn lines_are_crlf_terminated() {
        let mut tx = capture();
        tx.send_line("CLASS:HEALTHY CONF:37 ALARM:0");
        let text = decode_to_string(tx.into_line().levels());
        assert_eq!(text, "CLASS:HEALTHY CONF:37 ALARM:0\r\n");
    }

    #[test]
    fn decoder_drops_frames_with_bad_stop_bits() {
        let mut levels = Vec::new();
        // 'A' = 0x41, valid frame
        levels.push(false);
        for bit in 0..8 {
            levels.push(0x41u8 & (1 << bit) != 0);
        }
        levels.push(true);
        // 'B' with a low stop slot
        levels.push(false);
        for bit in 0..8 {
            levels.push(0x42u8 & (1 << bit) != 0);
        }
        levels.push(false);

        assert_eq!(decode_frames(&levels), b"A");
    }

    #[test]
    fn standard_baud_rounds_to_whole_nanoseconds() {
        assert_eq!(
            SerialTiming::from_baud(115_200).bit_period,
            Duration::from_nanos(8681)
        );
        assert_eq!(
            SerialTiming::from_baud(9600).bit_period,
            Duration::from_nanos(104_167)
        );
    }

    #[test]
    fn gpio_line_rewrites_the_value_file() {
        let root = std::env::temp_dir().join(format!("senseedge-gpio-{}", std::process::id()));
        let dir = root.join("gpio22");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("value"), "0").unwrap();

        let mut line = GpioTxLine::open_at(&root, 22).unwrap();
        assert_eq!(line.gpio(), 22);
        line.set_level(true);
        assert_eq!(std::fs::read_to_string(dir.join("value")).unwrap(), "1");
        line.set_level(false);
        assert_eq!(std::fs::read_to_string(dir.join("value")).unwrap(), "0");

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn missing_gpio_is_a_gpio_error() {
        let root = std::env::temp_dir().join(format!(
            "senseedge-gpio-missing-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&root).unwrap();

        let err = GpioTxLine::open_at(&root, 5).unwrap_err();
        assert!(matches!(err, SenseEdgeError::Gpio { pin: 5, .. }));

        let _ = std::fs::remove_dir_all(&root);
    }
}
