//! Register map for the SenseEdge Wishbone peripheral.
//!
//! Nine word-sized registers at byte offsets `0x00..=0x20` from the base of
//! the mapped window. On the reference SoC the window sits at the user
//! project Wishbone base, [`WB_BASE`].
//!
//! ```text
//! 0x00  CTRL          R/W  [0]=enable
//! 0x04  STATUS        R    [0]=enable [1]=fft_busy [2]=nn_busy [3]=fe_busy [4]=alarm
//! 0x08  CLASS_RESULT  R    [1:0]=class_id [9:2]=confidence
//! 0x0C  ALARM_CFG     R/W  [7:0]=threshold [11:8]=consecutive_faults
//! 0x10  FFT_DATA      R    16-bit magnitude, auto-increment; any write resets the pointer
//! 0x14  FEATURE_DATA  R    8-bit feature, auto-increment; any write resets the pointer
//! 0x18  IRQ_FLAGS     R/W  [0]=class_done [1]=alarm_irq (write-1-to-clear)
//! 0x1C  CLK_DIV       R/W  [15:0]=ADC sample-clock divider
//! 0x20  NN_WEIGHTS    W    [15:8]=parameter address [7:0]=parameter value
//! ```

// Decoded fields are masked to their documented widths before narrowing.
#![allow(clippy::cast_possible_truncation)]

/// Wishbone user-project base address on the reference SoC.
pub const WB_BASE: usize = 0x3000_0000;

/// Size of the register window in bytes.
pub const WINDOW_BYTES: usize = 0x24;

// ── Control and status ───────────────────────────────────────────────────────

/// Control register. Bit 0 enables the acquisition pipeline.
pub const CTRL: usize = 0x00;

/// Status register (read-only). See the [`status`] bit definitions.
pub const STATUS: usize = 0x04;

/// Latest classification result (read-only). Decode with [`class_id`] and
/// [`confidence`].
pub const CLASS_RESULT: usize = 0x08;

/// Alarm configuration. Pack with [`pack_alarm_config`].
pub const ALARM_CFG: usize = 0x0C;

// ── Data ports ───────────────────────────────────────────────────────────────

/// FFT magnitude port (read-only). Each read returns the next 16-bit bin;
/// any write resets the read pointer to bin 0.
pub const FFT_DATA: usize = 0x10;

/// Feature port (read-only). Each read returns the next 8-bit feature; any
/// write resets the read pointer to feature 0.
pub const FEATURE_DATA: usize = 0x14;

// ── Interrupts ───────────────────────────────────────────────────────────────

/// IRQ flag register, write-1-to-clear. See the [`irq`] bit definitions.
pub const IRQ_FLAGS: usize = 0x18;

// ── Sampling ─────────────────────────────────────────────────────────────────

/// ADC sample-clock divider, 16 bits.
pub const CLK_DIV: usize = 0x1C;

// ── Parameter memory port ────────────────────────────────────────────────────

/// Parameter write port (write-only). Pack with [`pack_weight_write`].
pub const NN_WEIGHTS: usize = 0x20;

// ── Data port depths ─────────────────────────────────────────────────────────

/// Number of 16-bit magnitude bins behind [`FFT_DATA`].
pub const FFT_BIN_COUNT: usize = 32;

/// Number of feature bytes behind [`FEATURE_DATA`].
pub const FEATURE_COUNT: usize = 8;

// ── Control register bit definitions ─────────────────────────────────────────

pub mod ctrl {
    //! [`CTRL`](super::CTRL) bits.

    /// Enable the acquisition pipeline.
    pub const ENABLE: u32 = 1 << 0;
}

// ── Status register bit definitions ──────────────────────────────────────────

pub mod status {
    //! [`STATUS`](super::STATUS) bits.

    /// Pipeline enable readback.
    pub const ENABLE: u32 = 1 << 0;
    /// FFT stage busy.
    pub const FFT_BUSY: u32 = 1 << 1;
    /// Neural-network stage busy.
    pub const NN_BUSY: u32 = 1 << 2;
    /// Feature-extractor stage busy.
    pub const FE_BUSY: u32 = 1 << 3;
    /// Alarm condition latched.
    pub const ALARM: u32 = 1 << 4;
}

// ── IRQ flag bit definitions ─────────────────────────────────────────────────

pub mod irq {
    //! [`IRQ_FLAGS`](super::IRQ_FLAGS) bits. Write-1-to-clear.

    /// A classification result is ready.
    pub const CLASS_DONE: u32 = 1 << 0;
    /// Alarm edge: the consecutive-fault count reached the configured limit.
    pub const ALARM: u32 = 1 << 1;
}

// ── Packed-field helpers ─────────────────────────────────────────────────────
// Pure bit masking, exact inverses of the hardware's interpretation.

/// Pack the alarm configuration word: confidence threshold in bits [7:0],
/// consecutive-fault count in bits [11:8].
#[must_use]
pub const fn pack_alarm_config(threshold: u8, fault_count: u8) -> u32 {
    ((fault_count as u32 & 0xF) << 8) | threshold as u32
}

/// Pack a parameter write: memory address in bits [15:8], value in bits
/// [7:0] (two's complement).
#[must_use]
pub const fn pack_weight_write(addr: u8, value: i8) -> u32 {
    ((addr as u32) << 8) | value as u8 as u32
}

/// Pack a result word the way the classifier does: confidence in bits
/// [9:2], class id in bits [1:0].
#[must_use]
pub const fn pack_class_result(class_id: u8, confidence: u8) -> u32 {
    ((confidence as u32) << 2) | (class_id as u32 & 0x3)
}

/// Extract the 2-bit class id from a [`CLASS_RESULT`] word.
#[must_use]
pub const fn class_id(result: u32) -> u8 {
    (result & 0x3) as u8
}

/// Extract the 8-bit confidence from a [`CLASS_RESULT`] word.
#[must_use]
pub const fn confidence(result: u32) -> u8 {
    ((result >> 2) & 0xFF) as u8
}
